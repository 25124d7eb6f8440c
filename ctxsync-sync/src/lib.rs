//! Backend resolution and last-write-wins sync for ctxsync.
//!
//! # Architecture
//!
//! - **Backend**: the host objects a context can live in, and how each one is
//!   read and written (direct fields, keyed `get`/`set`, settings registry)
//! - **Resolver**: maps a root name such as `"user"` to a backend handle
//! - **Engine**: push, pull and timestamp-driven sync between a
//!   [`ctxsync_model::LocalState`] and the active root
//! - **Validator**: precondition checks that either fail hard or warn
//!
//! # Example
//!
//! ```
//! use ctxsync_model::LocalState;
//! use ctxsync_sync::{BackendResolver, HostRoots, RootOptions, SyncConfig, SyncEngine};
//! use serde_json::json;
//!
//! let resolver = BackendResolver::new(HostRoots::in_memory("demo"));
//! let mut engine = SyncEngine::new(resolver, SyncConfig::default());
//! engine.set_remote_root("user", RootOptions::default()).unwrap();
//!
//! let mut local = LocalState::default();
//! local.set_data("theme", json!("dark")).unwrap();
//! engine.push_state(&local).unwrap();
//!
//! assert_eq!(engine.get_remote(Some("theme")).unwrap(), Some(json!("dark")));
//! ```

pub mod backend;
mod config;
mod engine;
mod error;
mod resolver;
mod units;
mod validate;

pub use backend::{
    AccessStrategy, BackendAccess, BackendError, BackendHandle, BackendResult, KeyedStore,
    MemoryRegistry, MemoryStore, RootKind, SettingsRegistry, SharedObject,
};
pub use config::SyncConfig;
pub use engine::{RootOptions, SyncEngine};
pub use error::{SoftFailure, SyncError, SyncOutcome, SyncResult};
pub use resolver::{BackendResolver, HostRoots, HostRootsBuilder};
pub use validate::Validator;
