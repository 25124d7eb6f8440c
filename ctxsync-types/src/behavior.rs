//! Write-time timestamp policy.

use crate::{Error, Millis, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// What a write does to a unit's modified timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampBehavior {
    /// Set the modified timestamp to the current time.
    #[default]
    Update,
    /// Leave the modified timestamp untouched.
    Keep,
    /// Set the modified timestamp to the given value.
    Explicit(Millis),
}

impl TimestampBehavior {
    /// Computes the modified timestamp after a write.
    #[must_use]
    pub fn apply(self, current: Millis, now: Millis) -> Millis {
        match self {
            Self::Update => now,
            Self::Keep => current,
            Self::Explicit(ts) => ts,
        }
    }
}

impl fmt::Display for TimestampBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Update => f.write_str("update"),
            Self::Keep => f.write_str("keep"),
            Self::Explicit(ts) => write!(f, "{ts}"),
        }
    }
}

impl FromStr for TimestampBehavior {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "update" => Ok(Self::Update),
            "keep" => Ok(Self::Keep),
            other => other
                .parse::<Millis>()
                .map(Self::Explicit)
                .map_err(|_| Error::InvalidTimestampBehavior(other.to_string())),
        }
    }
}

/// Accepts `"update"`, `"keep"`, or a non-negative integer timestamp.
impl TryFrom<&Value> for TimestampBehavior {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => s.parse(),
            Value::Number(n) => n
                .as_u64()
                .map(Self::Explicit)
                .ok_or_else(|| Error::InvalidTimestampBehavior(n.to_string())),
            other => Err(Error::InvalidTimestampBehavior(other.to_string())),
        }
    }
}
