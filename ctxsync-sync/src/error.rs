//! Error and outcome types for the sync layer.
//!
//! Hard failures (malformed caller input, misuse) are [`SyncError`]s.
//! Soft failures (state that is not ready yet) are not errors: operations
//! return [`SyncOutcome::Skipped`] and log a warning.

use crate::backend::BackendError;
use ctxsync_model::ModelError;
use ctxsync_types::Millis;
use ctxsync_unit::UnitError;
use std::fmt;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Hard failures.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A caller-supplied argument has the wrong type or shape.
    #[error("invalid argument `{param}`: {reason}")]
    InvalidArgument { param: &'static str, reason: String },

    /// A required argument is empty or absent.
    #[error("missing argument `{0}`")]
    MissingArgument(&'static str),

    /// No remote root is active and nothing is cached.
    #[error("remote context is not initialized")]
    Uninitialized,

    /// The remote value does not have the shape the operation needs.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// The backend refused a synchronous write.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A state unit rejected the incoming value.
    #[error("state unit error: {0}")]
    Unit(#[from] UnitError),
}

impl SyncError {
    pub(crate) fn invalid(param: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            param,
            reason: reason.into(),
        }
    }
}

impl From<ModelError> for SyncError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::InvalidArgument { param, reason } => Self::InvalidArgument { param, reason },
            ModelError::InvalidPath(path) => {
                Self::invalid("path", format!("cannot write to {path:?}"))
            }
        }
    }
}

/// Why an operation degraded to a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoftFailure {
    /// No root has been selected with `set_remote_root`.
    NoActiveRoot,
    /// The backend has nothing under the remote key, or nothing is cached.
    NoRemoteContext,
    /// The remote value exists but is not an object.
    RemoteNotObject,
    /// The requested root name is not one the resolver can serve.
    UnresolvedRoot(String),
    /// Validation failed with `throw_errors` disabled.
    RejectedInput(&'static str),
}

impl fmt::Display for SoftFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoActiveRoot => f.write_str("no active remote root"),
            Self::NoRemoteContext => f.write_str("no remote context"),
            Self::RemoteNotObject => f.write_str("remote context is not an object"),
            Self::UnresolvedRoot(name) => write!(f, "unresolved root {name:?}"),
            Self::RejectedInput(param) => write!(f, "rejected input `{param}`"),
        }
    }
}

/// What a sync operation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Local data was written to the remote, stamped with `date_modified`.
    Pushed { date_modified: Millis },
    /// Remote data was copied into local state, stamped with `date_modified`.
    Pulled { date_modified: Millis },
    /// The remote object was rewritten directly (path update or clear).
    Written { date_modified: Millis },
    /// Timestamps matched; nothing moved.
    Unchanged,
    /// The operation degraded to a no-op.
    Skipped(SoftFailure),
}

impl SyncOutcome {
    /// True if data moved in either direction.
    #[must_use]
    pub fn is_transfer(&self) -> bool {
        matches!(
            self,
            Self::Pushed { .. } | Self::Pulled { .. } | Self::Written { .. }
        )
    }
}
