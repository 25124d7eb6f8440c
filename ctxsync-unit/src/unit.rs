//! The state unit: a value plus creation, modification and access times.

use crate::{ChildPolicy, TIMESTAMP_BEHAVIOR_OPTION, UnitError, UnitResult, UnitValue};
use ctxsync_types::{Millis, SharedClock, TimestampBehavior};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// The two kinds of unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Leaf value, no child checks.
    Property,
    /// Parent value whose children must match a [`ChildPolicy`].
    Container,
}

impl UnitKind {
    /// The variant name children are checked against.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Property => "Property",
            Self::Container => "Container",
        }
    }
}

/// Per-write options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Overrides the unit's default timestamp behavior for this write.
    pub timestamp_behavior: Option<TimestampBehavior>,
}

impl SetOptions {
    /// Write without touching the modified timestamp.
    #[must_use]
    pub fn keep() -> Self {
        Self {
            timestamp_behavior: Some(TimestampBehavior::Keep),
        }
    }

    /// Write and set the modified timestamp to `ts`.
    #[must_use]
    pub fn explicit(ts: Millis) -> Self {
        Self {
            timestamp_behavior: Some(TimestampBehavior::Explicit(ts)),
        }
    }

    /// Reads options from a JSON object such as `{"timestampBehavior": "keep"}`.
    pub fn from_json(value: &Value) -> UnitResult<Self> {
        let Some(map) = value.as_object() else {
            return Err(UnitError::invalid("opts", "options must be an object"));
        };
        let timestamp_behavior = map
            .get(TIMESTAMP_BEHAVIOR_OPTION)
            .map(TimestampBehavior::try_from)
            .transpose()?;
        Ok(Self { timestamp_behavior })
    }
}

/// Which parts of a unit [`StateUnit::get_property`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    pub value: bool,
    pub timestamps: bool,
    pub options: bool,
    /// Update the access timestamp while projecting.
    pub record_access: bool,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            value: true,
            timestamps: true,
            options: false,
            record_access: true,
        }
    }
}

/// A typed value wrapper with timestamp metadata.
///
/// Invariant: `timestamp_created <= timestamp_modified`. Reads through
/// [`StateUnit::get`] move `timestamp_accessed` forward; [`StateUnit::peek`]
/// does not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateUnit {
    kind: UnitKind,
    value: UnitValue,
    #[serde(default)]
    options: Map<String, Value>,
    timestamp_created: Millis,
    timestamp_modified: Millis,
    timestamp_accessed: Millis,
    #[serde(default)]
    timestamp_behavior: TimestampBehavior,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    child_policy: Option<ChildPolicy>,
    #[serde(skip)]
    clock: SharedClock,
}

impl StateUnit {
    /// Creates a property holding `value`, stamped with the current time.
    pub fn property(value: impl Into<UnitValue>) -> Self {
        Self::assemble(
            UnitKind::Property,
            value.into(),
            Map::new(),
            None,
            TimestampBehavior::default(),
            None,
            SharedClock::default(),
        )
    }

    /// Creates an empty container (an empty object) with the given policy.
    #[must_use]
    pub fn container(policy: ChildPolicy) -> Self {
        Self::assemble(
            UnitKind::Container,
            UnitValue::object(),
            Map::new(),
            None,
            TimestampBehavior::default(),
            Some(policy),
            SharedClock::default(),
        )
    }

    /// Starts building a unit of the given kind.
    #[must_use]
    pub fn builder(kind: UnitKind) -> StateUnitBuilder {
        StateUnitBuilder::new(kind)
    }

    fn assemble(
        kind: UnitKind,
        value: UnitValue,
        options: Map<String, Value>,
        created: Option<Millis>,
        timestamp_behavior: TimestampBehavior,
        child_policy: Option<ChildPolicy>,
        clock: SharedClock,
    ) -> Self {
        let created = created.unwrap_or_else(|| clock.now_millis());
        Self {
            kind,
            value,
            options,
            timestamp_created: created,
            timestamp_modified: created,
            timestamp_accessed: created,
            timestamp_behavior,
            child_policy,
            clock,
        }
    }

    // ── Accessors ────────────────────────────────────────────────

    #[must_use]
    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    #[must_use]
    pub fn timestamp_created(&self) -> Millis {
        self.timestamp_created
    }

    #[must_use]
    pub fn timestamp_modified(&self) -> Millis {
        self.timestamp_modified
    }

    #[must_use]
    pub fn timestamp_accessed(&self) -> Millis {
        self.timestamp_accessed
    }

    #[must_use]
    pub fn timestamp_behavior(&self) -> TimestampBehavior {
        self.timestamp_behavior
    }

    /// Changes the default behavior used by writes without an override.
    pub fn set_timestamp_behavior(&mut self, behavior: TimestampBehavior) {
        self.timestamp_behavior = behavior;
    }

    /// The child policy, for containers.
    #[must_use]
    pub fn child_policy(&self) -> Option<&ChildPolicy> {
        self.child_policy.as_ref()
    }

    #[must_use]
    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    /// Sets a metadata option. Setting `timestampBehavior` also changes the
    /// unit's default behavior, and fails if the value does not parse.
    pub fn set_option(&mut self, key: impl Into<String>, value: Value) -> UnitResult<()> {
        let key = key.into();
        if key == TIMESTAMP_BEHAVIOR_OPTION {
            self.timestamp_behavior = TimestampBehavior::try_from(&value)?;
        }
        self.options.insert(key, value);
        Ok(())
    }

    /// Replaces the clock used for stamping (shared with nested writes made
    /// through this unit only).
    pub fn set_clock(&mut self, clock: SharedClock) {
        self.clock = clock;
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Reads the whole value (`key = None`) or one key of an object value,
    /// recording an access.
    pub fn get(&mut self, key: Option<&str>) -> UnitResult<&UnitValue> {
        self.touch();
        self.peek(key)
    }

    /// Like [`StateUnit::get`] but leaves the access timestamp alone.
    pub fn peek(&self, key: Option<&str>) -> UnitResult<&UnitValue> {
        match key {
            None => Ok(&self.value),
            Some(k) => self
                .value
                .as_object()
                .and_then(|map| map.get(k))
                .ok_or_else(|| UnitError::KeyNotFound(k.to_string())),
        }
    }

    /// The whole value, without recording an access.
    #[must_use]
    pub fn peek_value(&self) -> &UnitValue {
        &self.value
    }

    /// Snapshot of the unit as a JSON map.
    ///
    /// Keys: `value`, `timestampCreated`, `timestampModified`,
    /// `timestampAccessed`, `options`, each present only if requested.
    pub fn get_property(&mut self, projection: Projection) -> Map<String, Value> {
        if projection.record_access {
            self.touch();
        }
        self.snapshot(projection)
    }

    /// [`StateUnit::get_property`] without recording access, regardless of
    /// `projection.record_access`.
    #[must_use]
    pub fn snapshot(&self, projection: Projection) -> Map<String, Value> {
        let mut out = Map::new();
        if projection.value {
            out.insert("value".into(), self.value.to_json());
        }
        if projection.timestamps {
            out.insert("timestampCreated".into(), self.timestamp_created.into());
            out.insert("timestampModified".into(), self.timestamp_modified.into());
            out.insert("timestampAccessed".into(), self.timestamp_accessed.into());
        }
        if projection.options {
            out.insert("options".into(), Value::Object(self.options.clone()));
        }
        out
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Replaces the whole value (`key = None`) or sets one key of an object
    /// value.
    pub fn set(&mut self, key: Option<&str>, value: UnitValue, opts: SetOptions) -> UnitResult<()> {
        match key {
            None => self.set_value(value, opts),
            Some(k) => self.set_key(k, value, opts),
        }
    }

    /// Replaces the whole value.
    pub fn set_value(&mut self, value: UnitValue, opts: SetOptions) -> UnitResult<()> {
        if let Some(policy) = &self.child_policy {
            policy.check_value(&value).inspect_err(|e| {
                debug!(kind = self.kind.name(), "rejected value: {e}");
            })?;
        }
        self.value = value;
        self.stamp(opts);
        Ok(())
    }

    /// Sets one key of an object value.
    pub fn set_key(&mut self, key: &str, value: UnitValue, opts: SetOptions) -> UnitResult<()> {
        if self.value.as_object().is_none() {
            return Err(UnitError::invalid(
                "value",
                format!("cannot set `{key}` on a {} value", self.value.variant_name()),
            ));
        }
        if key.is_empty() {
            return Err(UnitError::invalid("key", "must be a non-empty string"));
        }
        if let Some(policy) = &self.child_policy {
            policy.check_child(&value).inspect_err(|e| {
                debug!(kind = self.kind.name(), key, "rejected child: {e}");
            })?;
        }
        if let Some(map) = self.value.as_object_mut() {
            map.insert(key.to_string(), value);
        }
        self.stamp(opts);
        Ok(())
    }

    /// Removes one key of an object value and returns what it held.
    pub fn remove_key(&mut self, key: &str, opts: SetOptions) -> UnitResult<UnitValue> {
        let removed = self
            .value
            .as_object_mut()
            .and_then(|map| map.remove(key))
            .ok_or_else(|| UnitError::KeyNotFound(key.to_string()))?;
        self.stamp(opts);
        Ok(removed)
    }

    fn stamp(&mut self, opts: SetOptions) {
        let behavior = opts.timestamp_behavior.unwrap_or(self.timestamp_behavior);
        let next = behavior.apply(self.timestamp_modified, self.clock.now_millis());
        self.timestamp_modified = next.max(self.timestamp_created);
    }

    fn touch(&mut self) {
        self.timestamp_accessed = self.timestamp_accessed.max(self.clock.now_millis());
    }
}

/// Builder for [`StateUnit`].
#[derive(Debug, Clone)]
pub struct StateUnitBuilder {
    kind: UnitKind,
    value: Option<UnitValue>,
    options: Map<String, Value>,
    created: Option<Millis>,
    behavior: Option<TimestampBehavior>,
    policy: ChildPolicy,
    clock: SharedClock,
}

impl StateUnitBuilder {
    fn new(kind: UnitKind) -> Self {
        Self {
            kind,
            value: None,
            options: Map::new(),
            created: None,
            behavior: None,
            policy: ChildPolicy::default(),
            clock: SharedClock::default(),
        }
    }

    /// Initial value. Defaults to null for properties, `{}` for containers.
    pub fn value(mut self, value: impl Into<UnitValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Creation timestamp. Defaults to the clock's now.
    pub fn created_at(mut self, ts: Millis) -> Self {
        self.created = Some(ts);
        self
    }

    /// Free-form options. A `timestampBehavior` entry sets the default
    /// behavior unless [`StateUnitBuilder::timestamp_behavior`] is also used.
    pub fn options(mut self, options: Map<String, Value>) -> Self {
        self.options = options;
        self
    }

    pub fn timestamp_behavior(mut self, behavior: TimestampBehavior) -> Self {
        self.behavior = Some(behavior);
        self
    }

    /// Accepted child variant names (containers only).
    pub fn accept<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy.accepted = names.into_iter().map(Into::into).collect();
        self
    }

    /// See [`ChildPolicy::enforce_only_for_object_values`].
    pub fn enforce_only_for_object_values(mut self, only_objects: bool) -> Self {
        self.policy.enforce_only_for_object_values = only_objects;
        self
    }

    pub fn clock(mut self, clock: impl Into<SharedClock>) -> Self {
        self.clock = clock.into();
        self
    }

    /// Builds the unit, checking the initial value against the child policy.
    pub fn build(self) -> UnitResult<StateUnit> {
        let behavior = match self.behavior {
            Some(b) => b,
            None => self
                .options
                .get(TIMESTAMP_BEHAVIOR_OPTION)
                .map(TimestampBehavior::try_from)
                .transpose()?
                .unwrap_or_default(),
        };
        let (value, policy) = match self.kind {
            UnitKind::Property => (self.value.unwrap_or_default(), None),
            UnitKind::Container => {
                let value = self.value.unwrap_or_else(UnitValue::object);
                self.policy.check_value(&value)?;
                (value, Some(self.policy))
            }
        };
        Ok(StateUnit::assemble(
            self.kind,
            value,
            self.options,
            self.created,
            behavior,
            policy,
            self.clock,
        ))
    }
}
