use ctxsync_types::SessionId;
use std::collections::HashSet;

#[test]
fn session_id_new_is_unique() {
    let ids: HashSet<_> = (0..100).map(|_| SessionId::new()).collect();
    assert_eq!(ids.len(), 100);
}

#[test]
fn session_id_from_uuid_roundtrip() {
    let uuid = uuid::Uuid::now_v7();
    assert_eq!(SessionId::from_uuid(uuid).as_uuid(), uuid);
}

#[test]
fn session_id_display_and_parse() {
    let id = SessionId::new();
    let parsed: SessionId = id.to_string().parse().unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn session_id_parse_invalid() {
    assert!("not-a-uuid".parse::<SessionId>().is_err());
}

#[test]
fn session_id_serde_is_transparent() {
    let id = SessionId::new();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{id}\""));
}
