use std::fs;

use relay_engine::SessionStore;
use serde_json::json;
use tempfile::TempDir;

#[test]
fn missing_blob_is_a_normal_first_run() {
    let temp = TempDir::new().unwrap();
    let store = SessionStore::new(temp.path());
    assert_eq!(store.load("weverse"), None);
}

#[test]
fn state_round_trips_through_save_and_load() {
    let temp = TempDir::new().unwrap();
    let store = SessionStore::new(temp.path());

    let state = json!({ "cookies": "sid=abc" });
    store.save("weverse", &state).unwrap();
    assert_eq!(store.load("weverse"), Some(state));

    // The blob is a dotfile, invisible to the staging gate.
    let name = store
        .blob_path("weverse")
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();
    assert!(name.starts_with('.'));
}

#[test]
fn version_mismatch_discards_the_blob() {
    let temp = TempDir::new().unwrap();
    let store = SessionStore::new(temp.path());

    let content = json!({
        "version": 99,
        "source": "weverse",
        "saved_utc": "2024-01-01T00:00:00+00:00",
        "state": { "cookies": "sid=old" }
    });
    fs::write(store.blob_path("weverse"), content.to_string()).unwrap();
    assert_eq!(store.load("weverse"), None);
}

#[test]
fn damaged_blob_is_discarded() {
    let temp = TempDir::new().unwrap();
    let store = SessionStore::new(temp.path());
    fs::write(store.blob_path("weverse"), "not json").unwrap();
    assert_eq!(store.load("weverse"), None);
}

#[test]
fn sources_get_distinct_blob_paths() {
    let temp = TempDir::new().unwrap();
    let store = SessionStore::new(temp.path());
    assert_ne!(store.blob_path("weverse"), store.blob_path("twitter"));
}
