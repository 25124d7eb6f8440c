use crate::StateUnit;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The value held by a [`StateUnit`].
///
/// Plain JSON objects and arrays are kept as `Object` and `Array` so that
/// units can be nested anywhere inside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnitValue {
    /// A nested unit.
    Unit(Box<StateUnit>),
    /// An ordered list of values.
    Array(Vec<UnitValue>),
    /// A string-keyed map of values.
    Object(BTreeMap<String, UnitValue>),
    /// Any non-container JSON value (null, bool, number, string).
    Scalar(Value),
}

impl UnitValue {
    /// An empty object.
    #[must_use]
    pub fn object() -> Self {
        Self::Object(BTreeMap::new())
    }

    /// The JSON null scalar.
    #[must_use]
    pub const fn null() -> Self {
        Self::Scalar(Value::Null)
    }

    /// Name this value declares when checked against a [`crate::ChildPolicy`].
    ///
    /// Units report their kind, plain objects report `"Object"`, arrays report
    /// `"Array"` and scalars report their JSON type.
    #[must_use]
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::Unit(unit) => unit.kind().name(),
            Self::Array(_) => "Array",
            Self::Object(_) => "Object",
            Self::Scalar(Value::Null) => "null",
            Self::Scalar(Value::Bool(_)) => "boolean",
            Self::Scalar(Value::Number(_)) => "number",
            Self::Scalar(Value::String(_)) => "string",
            // `From<Value>` never builds these, but a hand-built scalar can.
            Self::Scalar(Value::Array(_)) => "Array",
            Self::Scalar(Value::Object(_)) => "Object",
        }
    }

    /// True for units, objects and arrays.
    #[must_use]
    pub fn is_object_like(&self) -> bool {
        match self {
            Self::Unit(_) | Self::Array(_) | Self::Object(_) => true,
            Self::Scalar(v) => v.is_object() || v.is_array(),
        }
    }

    /// Returns the map if this is a plain object.
    #[must_use]
    pub fn as_object(&self) -> Option<&BTreeMap<String, UnitValue>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    pub(crate) fn as_object_mut(&mut self) -> Option<&mut BTreeMap<String, UnitValue>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the nested unit, if any.
    #[must_use]
    pub fn as_unit(&self) -> Option<&StateUnit> {
        match self {
            Self::Unit(unit) => Some(unit),
            _ => None,
        }
    }

    /// Flattens this value to plain JSON, replacing each unit by its value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Unit(unit) => unit.peek_value().to_json(),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<String, Value>>(),
            ),
            Self::Scalar(v) => v.clone(),
        }
    }
}

impl Default for UnitValue {
    fn default() -> Self {
        Self::null()
    }
}

impl From<Value> for UnitValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
            scalar => Self::Scalar(scalar),
        }
    }
}

impl From<StateUnit> for UnitValue {
    fn from(unit: StateUnit) -> Self {
        Self::Unit(Box::new(unit))
    }
}

impl From<Vec<UnitValue>> for UnitValue {
    fn from(items: Vec<UnitValue>) -> Self {
        Self::Array(items)
    }
}

impl From<BTreeMap<String, UnitValue>> for UnitValue {
    fn from(map: BTreeMap<String, UnitValue>) -> Self {
        Self::Object(map)
    }
}
