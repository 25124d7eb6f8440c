//! Maps root names to backend handles.
//!
//! Host objects are injected through [`HostRoots`]; the resolver never
//! reaches for ambient globals.

use crate::backend::{
    BackendAccess, BackendHandle, MemoryRegistry, MemoryStore, RootKind, SharedObject,
};
use crate::validate::Validator;
use crate::{SyncError, SyncResult};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// The host objects available to a resolver, one per root kind.
#[derive(Debug, Clone, Default)]
pub struct HostRoots {
    roots: BTreeMap<RootKind, BackendAccess>,
}

impl HostRoots {
    #[must_use]
    pub fn builder() -> HostRootsBuilder {
        HostRootsBuilder::default()
    }

    /// Every root wired to a fresh in-memory backend: a registry for `game`,
    /// keyed stores for `user`, `local` and `session`, plain objects for the
    /// rest.
    #[must_use]
    pub fn in_memory(namespace: &str) -> Self {
        let mut builder = Self::builder();
        for kind in RootKind::ALL {
            builder = match kind {
                RootKind::Game => builder.with(kind, BackendAccess::registry(MemoryRegistry::new(), namespace)),
                RootKind::User | RootKind::LocalStorage | RootKind::SessionStorage => {
                    builder.with(kind, BackendAccess::keyed(MemoryStore::new()))
                }
                RootKind::World | RootKind::Canvas | RootKind::Ui | RootKind::ModuleNamespace => {
                    builder.with(kind, BackendAccess::DirectFields(SharedObject::new()))
                }
            };
        }
        builder.build()
    }

    #[must_use]
    pub fn get(&self, kind: RootKind) -> Option<&BackendAccess> {
        self.roots.get(&kind)
    }

    /// Root kinds that have a host object.
    pub fn kinds(&self) -> impl Iterator<Item = RootKind> + '_ {
        self.roots.keys().copied()
    }
}

#[derive(Debug, Default)]
pub struct HostRootsBuilder {
    roots: BTreeMap<RootKind, BackendAccess>,
}

impl HostRootsBuilder {
    /// Wires `kind` to `access`, replacing any previous wiring.
    #[must_use]
    pub fn with(mut self, kind: RootKind, access: BackendAccess) -> Self {
        self.roots.insert(kind, access);
        self
    }

    #[must_use]
    pub fn build(self) -> HostRoots {
        HostRoots { roots: self.roots }
    }
}

/// Resolves source names (`game`, `user`, ...) to handles.
#[derive(Debug, Clone, Default)]
pub struct BackendResolver {
    roots: HostRoots,
    validator: Validator,
}

impl BackendResolver {
    #[must_use]
    pub fn new(roots: HostRoots) -> Self {
        Self {
            roots,
            validator: Validator::default(),
        }
    }

    #[must_use]
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    #[must_use]
    pub fn roots(&self) -> &HostRoots {
        &self.roots
    }

    /// Resolves a name. Unknown names and roots without a host object are
    /// `None`, never an error.
    #[must_use]
    pub fn resolve(&self, source: &str) -> Option<BackendHandle> {
        let Some(kind) = RootKind::from_source_name(source) else {
            debug!(source, "unknown root name");
            return None;
        };
        match self.roots.get(kind) {
            Some(access) => {
                debug!(root = %kind, strategy = %access.strategy(), "resolved root");
                Some(BackendHandle::new(kind, access.clone()))
            }
            None => {
                warn!(root = %kind, "root has no host object");
                None
            }
        }
    }

    /// Resolves a dynamically typed name. A non-string is a hard
    /// `InvalidArgument` (or `Ok(None)` with a warning when the validator does
    /// not throw).
    pub fn resolve_value(&self, source: &Value) -> SyncResult<Option<BackendHandle>> {
        if !self.validator.require_string(source, "sourceName")? {
            return Ok(None);
        }
        Ok(source.as_str().and_then(|s| self.resolve(s)))
    }

    /// Resolves `source`, falling back to `fallback` when it does not resolve.
    #[must_use]
    pub fn resolve_or(&self, source: &str, fallback: &str) -> Option<BackendHandle> {
        self.resolve(source).or_else(|| {
            debug!(source, fallback, "falling back");
            self.resolve(fallback)
        })
    }

    /// Like [`BackendResolver::resolve`] but reports a miss as an error.
    pub fn require(&self, source: &str) -> SyncResult<BackendHandle> {
        self.resolve(source)
            .ok_or_else(|| SyncError::invalid("sourceName", format!("{source:?} does not resolve")))
    }
}
