//! Precondition checks shared by every public entry point.
//!
//! Each check returns `Ok(true)` when it passes. On failure it either returns
//! the error (`throw_errors = true`) or logs a warning and returns
//! `Ok(false)`, leaving the caller to degrade gracefully.

use crate::{SyncError, SyncResult};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validator {
    throw_errors: bool,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Validator {
    #[must_use]
    pub const fn new(throw_errors: bool) -> Self {
        Self { throw_errors }
    }

    #[must_use]
    pub const fn throws(&self) -> bool {
        self.throw_errors
    }

    /// `value` must be a JSON object.
    pub fn require_object(&self, value: &Value, param: &'static str) -> SyncResult<bool> {
        if value.is_object() {
            return Ok(true);
        }
        self.fail(SyncError::invalid(
            param,
            format!("expected an object, got {}", kind_of(value)),
        ))
    }

    /// `value` must be a JSON string.
    pub fn require_string(&self, value: &Value, param: &'static str) -> SyncResult<bool> {
        if value.is_string() {
            return Ok(true);
        }
        self.fail(SyncError::invalid(
            param,
            format!("expected a string, got {}", kind_of(value)),
        ))
    }

    /// `value` must be a non-empty string. Failure is `InvalidArgument`.
    pub fn require_non_empty(&self, value: &str, param: &'static str) -> SyncResult<bool> {
        if !value.is_empty() {
            return Ok(true);
        }
        self.fail(SyncError::invalid(param, "must be a non-empty string"))
    }

    /// `value` must be given and non-empty. Failure is `MissingArgument`.
    pub fn require_present(&self, value: Option<&str>, param: &'static str) -> SyncResult<bool> {
        match value {
            Some(v) if !v.is_empty() => Ok(true),
            _ => self.fail(SyncError::MissingArgument(param)),
        }
    }

    fn fail(&self, err: SyncError) -> SyncResult<bool> {
        if self.throw_errors {
            Err(err)
        } else {
            warn!("validation failed: {err}");
            Ok(false)
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
