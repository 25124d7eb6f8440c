use ctxsync_sync::{
    BackendAccess, BackendResolver, HostRoots, KeyedStore, MemoryStore, RootKind, RootOptions,
    SoftFailure, SyncConfig, SyncEngine, SyncError, SyncOutcome,
};
use ctxsync_types::ManualClock;
use ctxsync_unit::{SetOptions, StateUnit, UnitError, UnitKind, UnitValue};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn local_engine(clock: &ManualClock) -> (SyncEngine, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let roots = HostRoots::builder()
        .with(RootKind::LocalStorage, BackendAccess::KeyedAccessor(store.clone()))
        .build();
    let mut engine =
        SyncEngine::new(BackendResolver::new(roots), SyncConfig::default()).with_clock(clock.clone());
    engine.set_remote_root("local", RootOptions::default()).unwrap();
    (engine, store)
}

fn settings_container(clock: &ManualClock) -> StateUnit {
    StateUnit::builder(UnitKind::Container)
        .accept(["Property"])
        .clock(clock.clone())
        .build()
        .unwrap()
}

// ── push_unit ────────────────────────────────────────────────────

#[test]
fn push_unit_stamps_remote_with_modified_time() {
    let clock = ManualClock::new(100);
    let (mut engine, store) = local_engine(&clock);
    let mut unit = settings_container(&clock);
    clock.set(200);
    unit.set_key("volume", StateUnit::property(json!(3)).into(), SetOptions::default())
        .unwrap();

    clock.set(900);
    assert_eq!(
        engine.push_unit(&unit).unwrap(),
        SyncOutcome::Pushed { date_modified: 200 }
    );
    assert_eq!(store.get("context"), Some(json!({"volume": 3, "dateModified": 200})));
}

#[test]
fn push_unit_requires_an_object_value() {
    let clock = ManualClock::new(1);
    let (mut engine, _) = local_engine(&clock);
    assert!(matches!(
        engine.push_unit(&StateUnit::property(json!(5))),
        Err(SyncError::InvalidArgument { param: "unit", .. })
    ));
}

// ── pull_unit ────────────────────────────────────────────────────

#[test]
fn pull_unit_wraps_fields_in_properties() {
    let clock = ManualClock::new(100);
    let (mut engine, store) = local_engine(&clock);
    store.set("context", json!({"volume": 7, "dateModified": 500})).unwrap();
    let mut unit = settings_container(&clock);

    assert_eq!(
        engine.pull_unit(&mut unit).unwrap(),
        SyncOutcome::Pulled { date_modified: 500 }
    );
    assert_eq!(unit.timestamp_modified(), 500);
    assert_eq!(unit.peek_value().to_json(), json!({"volume": 7}));
    let volume = unit.peek(Some("volume")).unwrap();
    assert_eq!(volume.as_unit().map(StateUnit::kind), Some(UnitKind::Property));
}

#[test]
fn pull_unit_into_property_takes_the_object() {
    let clock = ManualClock::new(100);
    let (mut engine, store) = local_engine(&clock);
    store.set("context", json!({"a": [1, 2], "dateModified": 300})).unwrap();
    let mut unit = StateUnit::builder(UnitKind::Property)
        .clock(clock.clone())
        .build()
        .unwrap();

    engine.pull_unit(&mut unit).unwrap();
    assert_eq!(unit.peek_value().to_json(), json!({"a": [1, 2]}));
    assert_eq!(unit.timestamp_modified(), 300);
}

#[test]
fn pull_unit_respects_the_child_policy() {
    let clock = ManualClock::new(100);
    let (mut engine, store) = local_engine(&clock);
    store.set("context", json!({"volume": 7, "dateModified": 500})).unwrap();
    let mut unit = StateUnit::builder(UnitKind::Container)
        .accept(["Container"])
        .clock(clock.clone())
        .build()
        .unwrap();

    let err = engine.pull_unit(&mut unit).unwrap_err();
    assert!(matches!(
        err,
        SyncError::Unit(UnitError::TypeViolation { ref found, .. }) if found == "Property"
    ));
    assert_eq!(unit.peek_value(), &UnitValue::object());
    assert_eq!(unit.timestamp_modified(), 100);
}

#[test]
fn pull_unit_without_remote_is_skipped() {
    let clock = ManualClock::new(100);
    let (mut engine, _) = local_engine(&clock);
    let mut unit = settings_container(&clock);
    assert_eq!(
        engine.pull_unit(&mut unit).unwrap(),
        SyncOutcome::Skipped(SoftFailure::NoRemoteContext)
    );
}

#[test]
fn pull_unit_older_than_creation_restamps_the_remote() {
    let clock = ManualClock::new(100);
    let (mut engine, store) = local_engine(&clock);
    store.set("context", json!({"volume": 2, "dateModified": 40})).unwrap();
    let mut unit = settings_container(&clock);

    assert_eq!(
        engine.pull_unit(&mut unit).unwrap(),
        SyncOutcome::Pulled { date_modified: 100 }
    );
    assert_eq!(unit.peek_value().to_json(), json!({"volume": 2}));
    assert_eq!(store.get("context"), Some(json!({"volume": 2, "dateModified": 100})));
    assert_eq!(engine.sync_unit(&mut unit).unwrap(), SyncOutcome::Unchanged);
}

// ── sync_unit ────────────────────────────────────────────────────

#[test]
fn sync_unit_pushes_newer_unit_once() {
    let clock = ManualClock::new(100);
    let (mut engine, store) = local_engine(&clock);
    store.set("context", json!({"dateModified": 50})).unwrap();
    let mut unit = settings_container(&clock);
    unit.set_key("theme", StateUnit::property(json!("dark")).into(), SetOptions::default())
        .unwrap();

    assert_eq!(
        engine.sync_unit(&mut unit).unwrap(),
        SyncOutcome::Pushed { date_modified: 100 }
    );
    assert_eq!(store.get("context"), Some(json!({"theme": "dark", "dateModified": 100})));
    assert_eq!(engine.sync_unit(&mut unit).unwrap(), SyncOutcome::Unchanged);
}

#[test]
fn sync_unit_pulls_newer_remote_once() {
    let clock = ManualClock::new(100);
    let (mut engine, store) = local_engine(&clock);
    let mut unit = settings_container(&clock);
    store.set("context", json!({"theme": "light", "dateModified": 400})).unwrap();

    assert_eq!(
        engine.sync_unit(&mut unit).unwrap(),
        SyncOutcome::Pulled { date_modified: 400 }
    );
    assert_eq!(unit.peek_value().to_json(), json!({"theme": "light"}));
    assert_eq!(engine.sync_unit(&mut unit).unwrap(), SyncOutcome::Unchanged);
}
