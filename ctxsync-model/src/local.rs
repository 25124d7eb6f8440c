//! The client-side context.

use crate::remote::DATE_MODIFIED;
use crate::{ModelError, ModelResult, PathResolver};
use ctxsync_types::{Millis, SharedClock};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Local, mutable context kept in step with a remote root.
///
/// Every mutation of `data` or `flags` moves `date_modified` to the clock's
/// current time; that timestamp is what sync compares against the remote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalState {
    #[serde(default)]
    data: Map<String, Value>,
    #[serde(default)]
    flags: Map<String, Value>,
    #[serde(default)]
    date_modified: Millis,
    #[serde(skip)]
    clock: SharedClock,
}

impl Default for LocalState {
    fn default() -> Self {
        Self::new(SharedClock::default())
    }
}

impl LocalState {
    /// An empty state that has never been modified (`date_modified == 0`).
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self {
            data: Map::new(),
            flags: Map::new(),
            date_modified: 0,
            clock,
        }
    }

    /// Replaces the clock used to stamp mutations.
    #[must_use]
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    #[must_use]
    pub fn flags(&self) -> &Map<String, Value> {
        &self.flags
    }

    #[must_use]
    pub fn date_modified(&self) -> Millis {
        self.date_modified
    }

    /// Overrides the modification timestamp without touching the contents.
    pub fn set_date_modified(&mut self, ts: Millis) {
        self.date_modified = ts;
    }

    /// Reads a dot-path inside `data`.
    #[must_use]
    pub fn get_data(&self, path: &str) -> Option<Value> {
        PathResolver::default().resolve(&self.data, path)
    }

    /// Writes a dot-path inside `data`, creating intermediate objects.
    pub fn set_data(&mut self, path: &str, value: Value) -> ModelResult<()> {
        PathResolver::default().set(&mut self.data, path, value)?;
        self.touch();
        Ok(())
    }

    /// Removes a dot-path from `data`.
    pub fn remove_data(&mut self, path: &str) -> Option<Value> {
        let removed = PathResolver::default().remove(&mut self.data, path);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    /// Replaces all of `data`.
    pub fn replace_data(&mut self, data: Map<String, Value>) {
        self.data = data;
        self.touch();
    }

    /// Shallow-merges `incoming` over `data` (incoming wins).
    pub fn merge_data(&mut self, incoming: Map<String, Value>) {
        self.data.extend(incoming);
        self.touch();
    }

    #[must_use]
    pub fn flag(&self, key: &str) -> Option<&Value> {
        self.flags.get(key)
    }

    pub fn set_flag(&mut self, key: impl Into<String>, value: Value) {
        self.flags.insert(key.into(), value);
        self.touch();
    }

    pub fn remove_flag(&mut self, key: &str) -> Option<Value> {
        let removed = self.flags.remove(key);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    /// The state as a JSON object: `{"data", "flags", "dateModified"}`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        out.insert("data".into(), Value::Object(self.data.clone()));
        out.insert("flags".into(), Value::Object(self.flags.clone()));
        out.insert(DATE_MODIFIED.into(), Value::from(self.date_modified));
        Value::Object(out)
    }

    fn touch(&mut self) {
        self.date_modified = self.clock.now_millis();
    }
}

/// Accepts either the full `{"data", "flags", "dateModified"}` shape or a bare
/// object, which is taken as `data` (its `dateModified`, if any, is lifted
/// out).
impl TryFrom<Value> for LocalState {
    type Error = ModelError;

    fn try_from(value: Value) -> ModelResult<Self> {
        let mut object = match value {
            Value::Object(object) => object,
            other => {
                return Err(ModelError::InvalidArgument {
                    param: "localState",
                    reason: format!("expected an object, got {}", type_name(&other)),
                });
            }
        };
        let date_modified = object
            .remove(DATE_MODIFIED)
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        let structured = object.contains_key("data") || object.contains_key("flags");
        let (data, flags) = if structured {
            let data = take_object(&mut object, "data")?;
            let flags = take_object(&mut object, "flags")?;
            (data, flags)
        } else {
            (object, Map::new())
        };

        Ok(Self {
            data,
            flags,
            date_modified,
            clock: SharedClock::default(),
        })
    }
}

fn take_object(object: &mut Map<String, Value>, key: &'static str) -> ModelResult<Map<String, Value>> {
    match object.remove(key) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(ModelError::InvalidArgument {
            param: key,
            reason: format!("expected an object, got {}", type_name(&other)),
        }),
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Builds [`LocalState`]s from defaults.
#[derive(Debug, Clone, Default)]
pub struct StateInitializer {
    default_data: Map<String, Value>,
    default_flags: Map<String, Value>,
    clock: SharedClock,
}

impl StateInitializer {
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self {
            default_data: Map::new(),
            default_flags: Map::new(),
            clock,
        }
    }

    /// Data used when no seed is given.
    #[must_use]
    pub fn with_default_data(mut self, data: Map<String, Value>) -> Self {
        self.default_data = data;
        self
    }

    /// Flags used when no seed is given.
    #[must_use]
    pub fn with_default_flags(mut self, flags: Map<String, Value>) -> Self {
        self.default_flags = flags;
        self
    }

    /// Creates a local state from `seed`, or from the defaults if `None`.
    ///
    /// A fresh state carries the seed's `dateModified`, or 0, so that the
    /// first sync against an existing remote pulls instead of overwriting it.
    pub fn initialize(&self, seed: Option<Value>) -> ModelResult<LocalState> {
        let state = match seed {
            Some(value) => LocalState::try_from(value)?.with_clock(self.clock.clone()),
            None => LocalState {
                data: self.default_data.clone(),
                flags: self.default_flags.clone(),
                date_modified: 0,
                clock: self.clock.clone(),
            },
        };
        debug!(
            keys = state.data.len(),
            flags = state.flags.len(),
            date_modified = state.date_modified,
            "initialized local state"
        );
        Ok(state)
    }
}
