use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by the state model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A caller-supplied argument is malformed.
    #[error("invalid argument `{param}`: {reason}")]
    InvalidArgument { param: &'static str, reason: String },

    /// A dot-path cannot be used for writing.
    #[error("invalid path: {0:?}")]
    InvalidPath(String),
}
