//! Engine configuration.

use crate::SyncResult;
use crate::validate::Validator;
use ctxsync_model::PathResolver;
use serde::{Deserialize, Serialize};

/// Configuration for the sync engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Key (dot-path) under which the remote object lives in the backend.
    pub remote_key: String,
    /// Root used by [`crate::SyncEngine::use_root_or_default`] when the
    /// requested one does not resolve.
    pub default_root: String,
    /// Raise validation failures as errors instead of logging them.
    pub throw_errors: bool,
    /// Let path reads fall back to a backend's `get(key)` accessor.
    pub getter_fallback: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            remote_key: "context".to_string(),
            default_root: "user".to_string(),
            throw_errors: true,
            getter_fallback: true,
        }
    }
}

impl SyncConfig {
    /// Parses a JSON config document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> SyncResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn validator(&self) -> Validator {
        Validator::new(self.throw_errors)
    }

    #[must_use]
    pub fn path_resolver(&self) -> PathResolver {
        PathResolver::new(self.getter_fallback)
    }
}
