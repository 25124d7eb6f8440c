//! Child-type enforcement for container units.

use crate::{UnitError, UnitKind, UnitResult, UnitValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which kinds of children a container accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildPolicy {
    /// Accepted variant names (`"Property"`, `"Container"`, `"Object"`, ...).
    pub accepted: BTreeSet<String>,
    /// Skip the check when the assigned value is not an object or array.
    pub enforce_only_for_object_values: bool,
}

impl Default for ChildPolicy {
    fn default() -> Self {
        Self::accepting([UnitKind::Property.name(), UnitKind::Container.name()])
    }
}

impl ChildPolicy {
    /// A policy accepting the given variant names, enforced only for object
    /// values.
    pub fn accepting<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            accepted: names.into_iter().map(Into::into).collect(),
            enforce_only_for_object_values: true,
        }
    }

    /// Returns true if `name` is an accepted variant.
    #[must_use]
    pub fn accepts(&self, name: &str) -> bool {
        self.accepted.contains(name)
    }

    /// Checks a whole replacement value.
    ///
    /// An object or array assigned as the container's value is a collection of
    /// children; each entry is checked on its own.
    pub fn check_value(&self, value: &UnitValue) -> UnitResult<()> {
        match value {
            UnitValue::Object(map) => map.values().try_for_each(|v| self.check_child(v)),
            UnitValue::Array(items) => items.iter().try_for_each(|v| self.check_child(v)),
            other => self.check_child(other),
        }
    }

    /// Checks a single child. Arrays are checked element by element.
    pub fn check_child(&self, child: &UnitValue) -> UnitResult<()> {
        match child {
            UnitValue::Array(items) => items.iter().try_for_each(|v| self.check_child(v)),
            other if self.enforce_only_for_object_values && !other.is_object_like() => Ok(()),
            other => {
                let found = other.variant_name();
                if self.accepts(found) {
                    Ok(())
                } else {
                    Err(UnitError::TypeViolation {
                        found: found.to_string(),
                        expected: self.accepted.iter().cloned().collect(),
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StateUnit;
    use serde_json::json;

    #[test]
    fn default_accepts_both_unit_kinds() {
        let policy = ChildPolicy::default();
        assert!(policy.accepts("Property"));
        assert!(policy.accepts("Container"));
        assert!(!policy.accepts("Object"));
    }

    #[test]
    fn scalars_skipped_when_enforcing_only_objects() {
        let policy = ChildPolicy::accepting(["Property"]);
        assert!(policy.check_child(&UnitValue::from(json!(3))).is_ok());
    }

    #[test]
    fn scalars_checked_when_enforcing_everything() {
        let mut policy = ChildPolicy::accepting(["Property"]);
        policy.enforce_only_for_object_values = false;
        let err = policy.check_child(&UnitValue::from(json!("x"))).unwrap_err();
        assert!(matches!(err, UnitError::TypeViolation { ref found, .. } if found == "string"));
    }

    #[test]
    fn nested_arrays_are_walked() {
        let policy = ChildPolicy::accepting(["Property"]);
        let bad = UnitValue::Array(vec![
            StateUnit::property(json!(1)).into(),
            UnitValue::Array(vec![StateUnit::container(ChildPolicy::default()).into()]),
        ]);
        assert!(policy.check_child(&bad).is_err());
    }
}
