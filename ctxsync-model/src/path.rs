//! Dot-path resolution.
//!
//! Paths look like `"audio.volume"` or `"tokens.0.name"`. Reads walk own
//! properties first; when a node has no such property but exposes a getter
//! (a keyed backend), the getter is tried if fallback is enabled. A path that
//! cannot be followed resolves to `None`, which callers keep distinct from a
//! found `null` (`Some(Value::Null)`).

use crate::{ModelError, ModelResult};
use serde_json::{Map, Value};
use tracing::debug;

/// Something a path can start from.
pub trait Lookup {
    /// Reads an own property.
    fn own(&self, key: &str) -> Option<Value>;

    /// Reads through a `get(key)`-style accessor. `None` if there is no
    /// accessor or it has nothing under `key`.
    fn getter(&self, _key: &str) -> Option<Value> {
        None
    }

    /// The whole node, returned for an empty path.
    fn snapshot(&self) -> Value;
}

impl Lookup for Value {
    fn own(&self, key: &str) -> Option<Value> {
        step(self, key).cloned()
    }

    fn snapshot(&self) -> Value {
        self.clone()
    }
}

impl Lookup for Map<String, Value> {
    fn own(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }

    fn snapshot(&self) -> Value {
        Value::Object(self.clone())
    }
}

/// Resolves and writes dot-separated paths.
#[derive(Debug, Clone, Copy)]
pub struct PathResolver {
    getter_fallback: bool,
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(true)
    }
}

impl PathResolver {
    #[must_use]
    pub const fn new(getter_fallback: bool) -> Self {
        Self { getter_fallback }
    }

    #[must_use]
    pub const fn getter_fallback(&self) -> bool {
        self.getter_fallback
    }

    /// Borrowing read over plain JSON. An empty path returns `root`.
    pub fn get<'a>(&self, root: &'a Value, path: &str) -> Option<&'a Value> {
        segments(path).try_fold(root, |node, seg| step(node, seg))
    }

    /// Read starting from any [`Lookup`]. An empty path returns the root's
    /// snapshot.
    pub fn resolve<L: Lookup + ?Sized>(&self, root: &L, path: &str) -> Option<Value> {
        let mut segs = segments(path);
        let Some(first) = segs.next() else {
            return Some(root.snapshot());
        };
        let head = match root.own(first) {
            Some(v) => v,
            None if self.getter_fallback => root.getter(first)?,
            None => return None,
        };
        let rest: Vec<&str> = segs.collect();
        if rest.is_empty() {
            return Some(head);
        }
        rest.into_iter()
            .try_fold(&head, |node, seg| step(node, seg))
            .cloned()
    }

    /// True if `path` resolves (even to `null`).
    pub fn has<L: Lookup + ?Sized>(&self, root: &L, path: &str) -> bool {
        self.resolve(root, path).is_some()
    }

    /// Writes `value` at `path`, creating intermediate objects for segments
    /// that are missing or hold a non-object value.
    pub fn set(&self, target: &mut Map<String, Value>, path: &str, value: Value) -> ModelResult<()> {
        let parts: Vec<&str> = path.split('.').collect();
        if path.is_empty() || parts.iter().any(|p| p.is_empty()) {
            return Err(ModelError::InvalidPath(path.to_string()));
        }
        set_in(target, &parts, value);
        Ok(())
    }

    /// Removes the value at `path` and returns it.
    pub fn remove(&self, target: &mut Map<String, Value>, path: &str) -> Option<Value> {
        let parts: Vec<&str> = path.split('.').collect();
        let (last, parents) = parts.split_last()?;
        let mut node = target;
        for seg in parents {
            node = node.get_mut(*seg)?.as_object_mut()?;
        }
        node.remove(*last)
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|_| !path.is_empty())
}

fn step<'a>(node: &'a Value, seg: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(seg),
        Value::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn set_in(node: &mut Map<String, Value>, parts: &[&str], value: Value) {
    match parts {
        [] => {}
        [last] => {
            node.insert((*last).to_string(), value);
        }
        [head, rest @ ..] => {
            let slot = node
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(child) = slot {
                set_in(child, rest, value);
            } else {
                debug!(segment = *head, "replacing non-object path segment");
                let mut child = Map::new();
                set_in(&mut child, rest, value);
                *slot = Value::Object(child);
            }
        }
    }
}
