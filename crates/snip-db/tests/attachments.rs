// End-to-end tests for the attachment store against an in-memory database.

use snip_core::Attachment;
use snip_db::{Db, DbError};
use uuid::Uuid;

const ID_A: &str = "65f6930f-7e21-4b61-a610-24f44ae2fb08";
const ID_B: &str = "990a917e-66d2-40c9-a6f0-bb9bb2e436c4";
const ID_C: &str = "412f7ca8-824c-4c70-80f0-4cbb2e4bd3e2";

fn make_attachment(id: &str, name: &str, data: &[u8]) -> Attachment {
    let mut a = Attachment::new();
    a.uuid = Uuid::try_parse(id).unwrap();
    a.snip_uuid = Uuid::new_v4();
    a.name = name.to_string();
    a.data = data.to_vec();
    a.size = data.len() as u64;
    a
}

fn seeded_db() -> Db {
    let db = Db::open_in_memory().unwrap();
    db.insert_attachment(&make_attachment(ID_A, "first.pdf", b"alpha"))
        .unwrap();
    db.insert_attachment(&make_attachment(ID_B, "second.png", b"bravo"))
        .unwrap();
    db.insert_attachment(&make_attachment(ID_C, "", b"charlie"))
        .unwrap();
    db
}

#[test]
fn round_trip_preserves_every_field() {
    let db = Db::open_in_memory().unwrap();

    let a = make_attachment(ID_A, "udhr.pdf", &[0u8, 255, 10, 13, 0, 128]);
    db.insert_attachment(&a).unwrap();

    let fetched = db.get_attachment(ID_A).unwrap();
    assert_eq!(fetched.uuid, a.uuid);
    assert_eq!(fetched.snip_uuid, a.snip_uuid);
    assert_eq!(fetched.name, a.name);
    assert_eq!(fetched.size, a.size);
    assert_eq!(fetched.data, a.data);
    assert_eq!(fetched.timestamp, a.timestamp);
}

#[test]
fn fuzzy_resolution_scenario() {
    let db = seeded_db();

    // a prefix unique to one record resolves it
    let a = db.get_attachment("65f6930f").unwrap();
    assert_eq!(a.uuid.to_string(), ID_A);
    assert_eq!(a.data, b"alpha");

    // "f" appears in all three uuids
    let err = db.get_attachment("f").unwrap_err();
    assert!(matches!(err, DbError::Ambiguous(_)));

    // deletion makes a previously valid partial unresolvable
    let id_b = Uuid::try_parse(ID_B).unwrap();
    db.remove_attachment(&id_b).unwrap();
    let err = db.get_attachment("990a917e").unwrap_err();
    assert!(matches!(err, DbError::NotFound(_)));
}

#[test]
fn fuzzy_matches_substring_not_just_prefix() {
    let db = seeded_db();

    // "24f44ae2" occurs mid-uuid in ID_A only
    let a = db.get_attachment("24f44ae2").unwrap();
    assert_eq!(a.uuid.to_string(), ID_A);
}

#[test]
fn fuzzy_zero_matches_is_not_found() {
    let db = seeded_db();

    let err = db.get_attachment("deadbeef").unwrap_err();
    assert!(matches!(err, DbError::NotFound(_)));
}

#[test]
fn search_uuid_has_the_same_cardinality_contract() {
    let db = seeded_db();

    let id = db.search_attachment_uuid("412f7ca8").unwrap();
    assert_eq!(id.to_string(), ID_C);

    let err = db.search_attachment_uuid("f").unwrap_err();
    assert!(matches!(err, DbError::Ambiguous(_)));

    let err = db.search_attachment_uuid("deadbeef").unwrap_err();
    assert!(matches!(err, DbError::NotFound(_)));
}

#[test]
fn metadata_never_carries_the_payload() {
    let db = seeded_db();

    let id = Uuid::try_parse(ID_A).unwrap();
    let meta = db.get_attachment_metadata(&id).unwrap();
    assert_eq!(meta.uuid, id);
    assert_eq!(meta.name, "first.pdf");
    assert_eq!(meta.size, 5);
    assert!(meta.data.is_empty());

    let err = db.get_attachment_metadata(&Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, DbError::NotFound(_)));
}

#[test]
fn delete_of_missing_id_leaves_store_unchanged() {
    let db = seeded_db();

    let err = db.remove_attachment(&Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, DbError::NotFound(_)));
    assert_eq!(db.list_attachment_ids().unwrap().len(), 3);
}

#[test]
fn delete_removes_exactly_one_row() {
    let db = seeded_db();

    let id = Uuid::try_parse(ID_B).unwrap();
    db.remove_attachment(&id).unwrap();

    let remaining = db.list_attachment_ids().unwrap();
    assert_eq!(remaining.len(), 2);
    assert!(!remaining.contains(&id));

    let err = db.get_attachment(ID_B).unwrap_err();
    assert!(matches!(err, DbError::NotFound(_)));
    // repeating the delete now fails cleanly
    let err = db.remove_attachment(&id).unwrap_err();
    assert!(matches!(err, DbError::NotFound(_)));
}

#[test]
fn add_attachment_from_file_round_trips() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("notes.tar.gz");
    let payload = [0x1fu8, 0x8b, 0x08, 0x00, 0x00];
    std::fs::write(&path, payload).unwrap();

    let db = Db::open_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let stored = db.add_attachment_from_file(owner, &path).unwrap();
    assert_eq!(stored.name, "notes.tar.gz");
    assert_eq!(stored.size, payload.len() as u64);

    let fetched = db.get_attachment(&stored.uuid.to_string()).unwrap();
    assert_eq!(fetched, stored);

    // export to a fresh path and compare bytes
    let out = tmp.path().join("exported.gz");
    fetched.write_to(&out).unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), payload);
}

#[test]
fn empty_name_and_empty_payload_are_allowed() {
    let db = Db::open_in_memory().unwrap();

    let a = make_attachment(ID_C, "", b"");
    db.insert_attachment(&a).unwrap();

    let fetched = db.get_attachment(ID_C).unwrap();
    assert!(fetched.name.is_empty());
    assert!(fetched.data.is_empty());
    assert_eq!(fetched.size, 0);
}
