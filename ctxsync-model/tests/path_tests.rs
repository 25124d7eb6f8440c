use ctxsync_model::{Lookup, ModelError, PathResolver};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// A map-like node that only answers through its getter.
struct KeyedNode(HashMap<String, Value>);

impl Lookup for KeyedNode {
    fn own(&self, _key: &str) -> Option<Value> {
        None
    }

    fn getter(&self, key: &str) -> Option<Value> {
        self.0.get(key).cloned()
    }

    fn snapshot(&self) -> Value {
        Value::Object(self.0.clone().into_iter().collect())
    }
}

fn keyed() -> KeyedNode {
    let mut m = HashMap::new();
    m.insert("settings".to_string(), json!({"theme": {"dark": true}, "empty": null}));
    KeyedNode(m)
}

// ── Reads over JSON ──────────────────────────────────────────────

#[test]
fn empty_path_returns_root() {
    let root = json!({"a": 1});
    let r = PathResolver::default();
    assert_eq!(r.get(&root, ""), Some(&root));
    assert_eq!(r.resolve(&root, ""), Some(root.clone()));
}

#[test]
fn nested_object_path() {
    let root = json!({"a": {"b": {"c": 5}}});
    assert_eq!(PathResolver::default().get(&root, "a.b.c"), Some(&json!(5)));
}

#[test]
fn array_index_segment() {
    let root = json!({"tokens": [{"name": "x"}, {"name": "y"}]});
    let r = PathResolver::default();
    assert_eq!(r.get(&root, "tokens.1.name"), Some(&json!("y")));
    assert_eq!(r.get(&root, "tokens.9.name"), None);
    assert_eq!(r.get(&root, "tokens.first"), None);
}

#[test]
fn missing_is_distinct_from_null() {
    let root = json!({"present": null});
    let r = PathResolver::default();
    assert_eq!(r.resolve(&root, "present"), Some(Value::Null));
    assert_eq!(r.resolve(&root, "absent"), None);
    assert!(r.has(&root, "present"));
    assert!(!r.has(&root, "absent"));
}

#[test]
fn descending_through_scalar_is_not_found() {
    let root = json!({"a": 3});
    assert_eq!(PathResolver::default().resolve(&root, "a.b"), None);
}

// ── Getter fallback ──────────────────────────────────────────────

#[test]
fn getter_fallback_reads_keyed_node() {
    let node = keyed();
    let r = PathResolver::new(true);
    assert_eq!(r.resolve(&node, "settings.theme.dark"), Some(json!(true)));
    assert_eq!(r.resolve(&node, "settings.empty"), Some(Value::Null));
    assert_eq!(r.resolve(&node, "settings.nope"), None);
    assert_eq!(r.resolve(&node, "other"), None);
}

#[test]
fn getter_fallback_disabled() {
    let node = keyed();
    let r = PathResolver::new(false);
    assert!(!r.getter_fallback());
    assert_eq!(r.resolve(&node, "settings.theme.dark"), None);
}

#[test]
fn map_lookup() {
    let mut map = Map::new();
    map.insert("k".into(), json!({"v": 1}));
    assert_eq!(PathResolver::default().resolve(&map, "k.v"), Some(json!(1)));
}

// ── Writes ───────────────────────────────────────────────────────

#[test]
fn set_creates_intermediate_objects() {
    let mut target = Map::new();
    PathResolver::default().set(&mut target, "a.b.c", json!(5)).unwrap();
    assert_eq!(Value::Object(target), json!({"a": {"b": {"c": 5}}}));
}

#[test]
fn set_keeps_sibling_fields() {
    let mut target = json!({"a": {"x": 1}}).as_object().unwrap().clone();
    PathResolver::default().set(&mut target, "a.y", json!(2)).unwrap();
    assert_eq!(Value::Object(target), json!({"a": {"x": 1, "y": 2}}));
}

#[test]
fn set_replaces_scalar_intermediate() {
    let mut target = json!({"a": 7}).as_object().unwrap().clone();
    PathResolver::default().set(&mut target, "a.b", json!(true)).unwrap();
    assert_eq!(Value::Object(target), json!({"a": {"b": true}}));
}

#[test]
fn set_rejects_empty_segments() {
    let r = PathResolver::default();
    let mut target = Map::new();
    for bad in ["", "a..b", ".a", "a."] {
        assert!(
            matches!(r.set(&mut target, bad, json!(1)), Err(ModelError::InvalidPath(_))),
            "{bad:?} should be rejected"
        );
    }
    assert!(target.is_empty());
}

#[test]
fn remove_nested() {
    let mut target = json!({"a": {"b": 1, "c": 2}}).as_object().unwrap().clone();
    let r = PathResolver::default();
    assert_eq!(r.remove(&mut target, "a.b"), Some(json!(1)));
    assert_eq!(r.remove(&mut target, "a.zz"), None);
    assert_eq!(Value::Object(target), json!({"a": {"c": 2}}));
}

proptest! {
    #[test]
    fn set_then_resolve(segments in prop::collection::vec("[a-z]{1,6}", 1..6), n in any::<i64>()) {
        let path = segments.join(".");
        let mut target = Map::new();
        let r = PathResolver::default();
        r.set(&mut target, &path, json!(n)).unwrap();
        prop_assert_eq!(r.resolve(&target, &path), Some(json!(n)));
    }
}
