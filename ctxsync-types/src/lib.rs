//! Core type definitions for ctxsync.
//!
//! This crate defines the small, backend-agnostic types shared by the rest of
//! the workspace:
//! - Millisecond clocks ([`Clock`], [`SystemClock`], [`ManualClock`])
//! - Write-time timestamp policy ([`TimestampBehavior`])
//! - Sync session identifiers (UUID v7)

mod behavior;
mod clock;
mod ids;

pub use behavior::TimestampBehavior;
pub use clock::{now_millis, Clock, ManualClock, Millis, SharedClock, SystemClock};
pub use ids::SessionId;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid session id: {0}")]
    InvalidSessionId(#[from] uuid::Error),

    #[error("invalid timestamp behavior: {0}")]
    InvalidTimestampBehavior(String),
}
