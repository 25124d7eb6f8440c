//! Error types for state units.

use thiserror::Error;

/// Result type for unit operations.
pub type UnitResult<T> = Result<T, UnitError>;

/// Errors that can occur reading or writing a unit.
#[derive(Debug, Error)]
pub enum UnitError {
    /// The key does not exist, or the value is not an object.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// A caller-supplied argument is malformed.
    #[error("invalid argument `{param}`: {reason}")]
    InvalidArgument { param: &'static str, reason: String },

    /// A container rejected a child of the wrong kind.
    #[error("child type `{found}` not accepted (expected one of: {})", expected.join(", "))]
    TypeViolation { found: String, expected: Vec<String> },

    /// The timestamp behavior could not be parsed.
    #[error(transparent)]
    InvalidTimestampBehavior(#[from] ctxsync_types::Error),
}

impl UnitError {
    pub(crate) fn invalid(param: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            param,
            reason: reason.into(),
        }
    }
}
