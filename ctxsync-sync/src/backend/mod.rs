//! Backend roots and how to read and write them.
//!
//! A backend is whatever host object the remote context lives in. The engine
//! never inspects it at call time: the access strategy is fixed when the root
//! is resolved and carried in [`BackendAccess`].

mod memory;

pub use memory::{MemoryRegistry, MemoryStore, SharedObject};

use async_trait::async_trait;
use ctxsync_model::Lookup;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Result type for backend writes.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors a backend may raise on write.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The backend refused the key or value.
    #[error("write to `{key}` rejected: {reason}")]
    Rejected { key: String, reason: String },

    /// The backend is not reachable.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// The fixed set of roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RootKind {
    Game,
    User,
    World,
    Canvas,
    Ui,
    LocalStorage,
    SessionStorage,
    ModuleNamespace,
}

impl RootKind {
    /// Every root, in declaration order.
    pub const ALL: [RootKind; 8] = [
        Self::Game,
        Self::User,
        Self::World,
        Self::Canvas,
        Self::Ui,
        Self::LocalStorage,
        Self::SessionStorage,
        Self::ModuleNamespace,
    ];

    /// The source name callers use for this root.
    #[must_use]
    pub const fn source_name(self) -> &'static str {
        match self {
            Self::Game => "game",
            Self::User => "user",
            Self::World => "world",
            Self::Canvas => "canvas",
            Self::Ui => "ui",
            Self::LocalStorage => "local",
            Self::SessionStorage => "session",
            Self::ModuleNamespace => "module",
        }
    }

    /// Maps a source name to a root. Case-sensitive; unknown names are `None`.
    #[must_use]
    pub fn from_source_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.source_name() == name)
    }
}

impl fmt::Display for RootKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source_name())
    }
}

impl FromStr for RootKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_source_name(s).ok_or_else(|| s.to_string())
    }
}

/// A store read and written through `get(key)` / `set(key, value)`.
pub trait KeyedStore: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&self, key: &str, value: Value) -> BackendResult<()>;

    /// All keys, for snapshots. Stores that cannot list keys return none.
    fn keys(&self) -> Vec<String> {
        Vec::new()
    }
}

/// A settings registry: namespaced reads, and writes that complete
/// asynchronously.
#[async_trait]
pub trait SettingsRegistry: Send + Sync + fmt::Debug {
    fn get(&self, namespace: &str, key: &str) -> Option<Value>;

    async fn set(&self, namespace: &str, key: &str, value: Value) -> BackendResult<()>;
}

/// Label for how a backend is accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessStrategy {
    DirectFields,
    KeyedAccessor,
    Registry,
}

impl fmt::Display for AccessStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectFields => f.write_str("direct-fields"),
            Self::KeyedAccessor => f.write_str("keyed-accessor"),
            Self::Registry => f.write_str("registry"),
        }
    }
}

/// A backend together with the way it must be accessed.
#[derive(Debug, Clone)]
pub enum BackendAccess {
    /// A plain object; fields are read and assigned directly.
    DirectFields(SharedObject),
    /// A map-like store with `get`/`set`.
    KeyedAccessor(Arc<dyn KeyedStore>),
    /// A registry needing `set(namespace, key, value)`.
    Registry {
        registry: Arc<dyn SettingsRegistry>,
        namespace: String,
    },
}

impl BackendAccess {
    pub fn keyed(store: impl KeyedStore + 'static) -> Self {
        Self::KeyedAccessor(Arc::new(store))
    }

    pub fn registry(registry: impl SettingsRegistry + 'static, namespace: impl Into<String>) -> Self {
        Self::Registry {
            registry: Arc::new(registry),
            namespace: namespace.into(),
        }
    }

    #[must_use]
    pub fn strategy(&self) -> AccessStrategy {
        match self {
            Self::DirectFields(_) => AccessStrategy::DirectFields,
            Self::KeyedAccessor(_) => AccessStrategy::KeyedAccessor,
            Self::Registry { .. } => AccessStrategy::Registry,
        }
    }
}

impl Lookup for BackendAccess {
    fn own(&self, key: &str) -> Option<Value> {
        match self {
            Self::DirectFields(object) => object.get_field(key),
            Self::KeyedAccessor(_) | Self::Registry { .. } => None,
        }
    }

    fn getter(&self, key: &str) -> Option<Value> {
        match self {
            Self::DirectFields(_) => None,
            Self::KeyedAccessor(store) => store.get(key),
            Self::Registry {
                registry,
                namespace,
            } => registry.get(namespace, key),
        }
    }

    fn snapshot(&self) -> Value {
        match self {
            Self::DirectFields(object) => Value::Object(object.snapshot()),
            Self::KeyedAccessor(store) => Value::Object(
                store
                    .keys()
                    .into_iter()
                    .filter_map(|k| store.get(&k).map(|v| (k, v)))
                    .collect::<Map<String, Value>>(),
            ),
            Self::Registry { .. } => Value::Null,
        }
    }
}

/// A resolved root.
#[derive(Debug, Clone)]
pub struct BackendHandle {
    kind: RootKind,
    access: BackendAccess,
}

impl BackendHandle {
    #[must_use]
    pub fn new(kind: RootKind, access: BackendAccess) -> Self {
        Self { kind, access }
    }

    #[must_use]
    pub fn kind(&self) -> RootKind {
        self.kind
    }

    #[must_use]
    pub fn access(&self) -> &BackendAccess {
        &self.access
    }

    #[must_use]
    pub fn strategy(&self) -> AccessStrategy {
        self.access.strategy()
    }
}
