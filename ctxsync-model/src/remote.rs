//! The remote object: application fields plus `dateModified`.
//!
//! `dateModified` is the only field conflict resolution looks at. A missing
//! or non-integer value reads as 0, which loses to any real timestamp.

use ctxsync_types::Millis;
use serde_json::{Map, Value};

/// Key of the last-modified timestamp on remote objects.
pub const DATE_MODIFIED: &str = "dateModified";

/// Reads `dateModified`, defaulting to 0.
#[must_use]
pub fn date_modified_of(object: &Map<String, Value>) -> Millis {
    object
        .get(DATE_MODIFIED)
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

/// Sets `dateModified`.
pub fn stamp(object: &mut Map<String, Value>, ts: Millis) {
    object.insert(DATE_MODIFIED.to_string(), Value::from(ts));
}

/// Returns the object without its `dateModified` field.
#[must_use]
pub fn strip_meta(mut object: Map<String, Value>) -> Map<String, Value> {
    object.remove(DATE_MODIFIED);
    object
}
