use ctxsync_sync::{
    AccessStrategy, BackendAccess, BackendResolver, HostRoots, MemoryStore, RootKind,
    SharedObject, SyncError, Validator,
};
use serde_json::json;

fn resolver() -> BackendResolver {
    BackendResolver::new(HostRoots::in_memory("ctxsync"))
}

// ── Name resolution ──────────────────────────────────────────────

#[test]
fn every_source_name_resolves() {
    let r = resolver();
    for kind in RootKind::ALL {
        let handle = r.resolve(kind.source_name()).unwrap();
        assert_eq!(handle.kind(), kind);
    }
}

#[test]
fn in_memory_roots_pick_strategies() {
    let r = resolver();
    let strategy = |name: &str| r.resolve(name).unwrap().strategy();

    assert_eq!(strategy("game"), AccessStrategy::Registry);
    assert_eq!(strategy("user"), AccessStrategy::KeyedAccessor);
    assert_eq!(strategy("local"), AccessStrategy::KeyedAccessor);
    assert_eq!(strategy("session"), AccessStrategy::KeyedAccessor);
    assert_eq!(strategy("world"), AccessStrategy::DirectFields);
    assert_eq!(strategy("canvas"), AccessStrategy::DirectFields);
    assert_eq!(strategy("ui"), AccessStrategy::DirectFields);
    assert_eq!(strategy("module"), AccessStrategy::DirectFields);
}

#[test]
fn unknown_name_is_unresolved_not_an_error() {
    let r = resolver();
    assert!(r.resolve("bogus").is_none());
    assert!(r.resolve("User").is_none());
    assert!(r.resolve("").is_none());
}

#[test]
fn non_string_name_is_invalid_argument() {
    let r = resolver();
    for bad in [json!(42), json!(null), json!({"name": "user"}), json!(["user"])] {
        assert!(matches!(
            r.resolve_value(&bad),
            Err(SyncError::InvalidArgument {
                param: "sourceName",
                ..
            })
        ));
    }
}

#[test]
fn string_value_resolves_like_str() {
    let r = resolver();
    let handle = r.resolve_value(&json!("world")).unwrap().unwrap();
    assert_eq!(handle.kind(), RootKind::World);
    assert!(r.resolve_value(&json!("bogus")).unwrap().is_none());
}

#[test]
fn warning_validator_downgrades_non_string() {
    let r = resolver().with_validator(Validator::new(false));
    assert!(r.resolve_value(&json!(42)).unwrap().is_none());
}

#[test]
fn unwired_root_is_unresolved() {
    let roots = HostRoots::builder()
        .with(RootKind::User, BackendAccess::keyed(MemoryStore::new()))
        .build();
    let r = BackendResolver::new(roots);

    assert!(r.resolve("user").is_some());
    assert!(r.resolve("world").is_none());
    assert_eq!(r.roots().kinds().collect::<Vec<_>>(), vec![RootKind::User]);
}

#[test]
fn resolve_or_applies_fallback() {
    let r = resolver();
    assert_eq!(r.resolve_or("bogus", "user").unwrap().kind(), RootKind::User);
    assert_eq!(r.resolve_or("world", "user").unwrap().kind(), RootKind::World);
    assert!(r.resolve_or("bogus", "nowhere").is_none());
}

#[test]
fn require_reports_a_miss() {
    let r = resolver();
    assert!(r.require("ui").is_ok());
    assert!(matches!(
        r.require("bogus"),
        Err(SyncError::InvalidArgument {
            param: "sourceName",
            ..
        })
    ));
}

// ── Handles ──────────────────────────────────────────────────────

#[test]
fn handles_share_the_host_object() {
    let object = SharedObject::new();
    let roots = HostRoots::builder()
        .with(RootKind::World, BackendAccess::DirectFields(object.clone()))
        .build();
    let handle = BackendResolver::new(roots).resolve("world").unwrap();

    let BackendAccess::DirectFields(resolved) = handle.access() else {
        panic!("expected direct fields");
    };
    resolved.set_field("weather", json!("rain"));
    assert_eq!(object.get_field("weather"), Some(json!("rain")));
}

#[test]
fn root_kind_parses_source_names() {
    assert_eq!("local".parse::<RootKind>(), Ok(RootKind::LocalStorage));
    assert_eq!("module".parse::<RootKind>(), Ok(RootKind::ModuleNamespace));
    assert!("Local".parse::<RootKind>().is_err());
    assert_eq!(RootKind::SessionStorage.to_string(), "session");
}
