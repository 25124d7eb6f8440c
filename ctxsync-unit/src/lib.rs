//! Typed state units for ctxsync.
//!
//! A [`StateUnit`] wraps a value together with its creation, modification and
//! access timestamps. Units come in two kinds:
//!
//! - **Property**: a leaf. Any value may be stored.
//! - **Container**: a parent. Children assigned into it must be of an
//!   accepted kind (see [`ChildPolicy`]), so a container built to hold
//!   properties cannot silently end up holding other containers.
//!
//! Values are [`UnitValue`]s, which mirror JSON but can also hold nested
//! units. [`UnitValue::to_json`] flattens a tree of units back to plain JSON
//! for persistence.

mod error;
mod policy;
mod unit;
mod value;

pub use error::{UnitError, UnitResult};
pub use policy::ChildPolicy;
pub use unit::{Projection, SetOptions, StateUnit, StateUnitBuilder, UnitKind};
pub use value::UnitValue;

/// Option key that sets a unit's default timestamp behavior.
pub const TIMESTAMP_BEHAVIOR_OPTION: &str = "timestampBehavior";
