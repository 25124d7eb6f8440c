//! State model for ctxsync.
//!
//! Defines the shapes that move between the client and a remote root:
//! - [`LocalState`]: the client-side context (`data`, `flags`, `dateModified`)
//! - [`StateInitializer`]: seeds a local state from defaults or a saved object
//! - [`remote`]: helpers for the remote object and its `dateModified` field
//! - [`PathResolver`]: dot-path reads and writes over JSON and keyed backends

mod error;
mod local;
mod path;
pub mod remote;

pub use error::{ModelError, ModelResult};
pub use local::{LocalState, StateInitializer};
pub use path::{Lookup, PathResolver};
pub use remote::DATE_MODIFIED;
