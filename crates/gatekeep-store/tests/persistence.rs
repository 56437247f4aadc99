//! Integration tests for credential persistence and data migration,
//! against real files in a temporary directory.

use std::fs;

use gatekeep_protocol::{IdentityKey, ProfileIds};
use gatekeep_store::{
    CredentialRecord, CredentialStore, FileMigrator, MigrationOutcome, PlayerDataMigrator,
    StoreError,
};
use tempfile::TempDir;
use uuid::Uuid;

fn key(name: &str) -> IdentityKey {
    IdentityKey::new(name).unwrap()
}

// =========================================================================
// Loading
// =========================================================================

#[test]
fn test_open_missing_file_is_empty() {
    let dir = TempDir::new().unwrap();

    let store = CredentialStore::open(dir.path().join("users.json")).unwrap();

    assert!(store.is_empty());
    assert!(!store.is_dirty());
}

#[test]
fn test_open_blank_or_null_file_is_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("users.json");

    fs::write(&path, "  \n").unwrap();
    assert!(CredentialStore::open(&path).unwrap().is_empty());

    fs::write(&path, "null").unwrap();
    assert!(CredentialStore::open(&path).unwrap().is_empty());
}

#[test]
fn test_open_malformed_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("users.json");
    fs::write(&path, r#"{"alice": {"name": "Alice""#).unwrap();

    let result = CredentialStore::open(&path);

    assert!(matches!(result, Err(StoreError::Malformed { .. })));
}

#[test]
fn test_open_keys_differing_only_by_case_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("users.json");
    fs::write(
        &path,
        r#"{"Bob": {"name": "Bob", "password": "first"}, "bob": {"name": "bob", "password": "second"}}"#,
    )
    .unwrap();

    let result = CredentialStore::open(&path);

    match result {
        Err(StoreError::DuplicateIdentity { key: dup, .. }) => assert_eq!(dup, key("bob")),
        other => panic!("expected DuplicateIdentity, got {other:?}"),
    }
}

#[test]
fn test_open_blank_key_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("users.json");
    fs::write(&path, r#"{"  ": {"name": "x", "password": "pw"}}"#).unwrap();

    assert!(matches!(
        CredentialStore::open(&path),
        Err(StoreError::BlankIdentity { .. })
    ));
}

#[test]
fn test_open_legacy_file_normalizes_keys_and_defaults_flag() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("users.json");
    fs::write(
        &path,
        r#"{"Alice": {"name": "Alice", "password": "pw"}, "bob": {"name": "bob", "password": "x", "migrated": true}}"#,
    )
    .unwrap();

    let store = CredentialStore::open(&path).unwrap();

    let alice = store.get(&key("alice")).expect("key should be normalized");
    assert!(alice.verify("pw"));
    assert!(!alice.migrated);
    assert!(store.get(&key("bob")).unwrap().migrated);
}

// =========================================================================
// Saving
// =========================================================================

#[test]
fn test_save_then_reopen_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data").join("users.json");

    let mut store = CredentialStore::open(&path).unwrap();
    store.put(key("Carol"), CredentialRecord::new("Carol", "pw1"));
    store.save().unwrap();

    let reopened = CredentialStore::open(&path).unwrap();
    assert_eq!(reopened.len(), 1);
    assert_eq!(
        reopened.get(&key("carol")),
        Some(&CredentialRecord::new("Carol", "pw1"))
    );
}

#[test]
fn test_saved_file_uses_lowercase_keys_and_original_field_names() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("users.json");

    let mut store = CredentialStore::open(&path).unwrap();
    store.put(key("Carol"), CredentialRecord::new("Carol", "pw1"));
    store.save().unwrap();

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["carol"]["name"], "Carol");
    assert_eq!(raw["carol"]["password"], "pw1");
    assert_eq!(raw["carol"]["migrated"], false);
}

#[test]
fn test_load_replaces_memory_wholesale() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("users.json");
    let mut store = CredentialStore::open(&path).unwrap();
    store.put(key("carol"), CredentialRecord::new("carol", "pw1"));
    store.save().unwrap();

    // An operator edits the file by hand.
    fs::write(&path, r#"{"dave": {"name": "Dave", "password": "pw"}}"#).unwrap();
    store.load().unwrap();

    assert!(store.contains(&key("dave")));
    assert!(!store.contains(&key("carol")));
}

#[test]
fn test_load_with_unsaved_changes_is_refused() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("users.json");
    let mut store = CredentialStore::open(&path).unwrap();
    store.put(key("unsaved"), CredentialRecord::new("unsaved", "x"));

    let result = store.load();

    assert!(matches!(result, Err(StoreError::UnsavedChanges)));
    assert!(store.contains(&key("unsaved")));
    assert!(store.is_dirty());
}

#[test]
fn test_load_after_failed_save_keeps_unsaved_record() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("users.json");
    let mut store = CredentialStore::open(&path).unwrap();

    fs::create_dir(&path).unwrap();
    store.put(key("erin"), CredentialRecord::new("Erin", "pw"));
    assert!(store.save().is_err());
    fs::remove_dir(&path).unwrap();

    assert!(matches!(store.load(), Err(StoreError::UnsavedChanges)));
    assert!(store.contains(&key("erin")));

    store.flush().unwrap();
    store.load().unwrap();
    assert!(store.contains(&key("erin")));
}

#[test]
fn test_failed_save_keeps_memory_and_flush_retries() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("users.json");
    let mut store = CredentialStore::open(&path).unwrap();

    // A directory squatting on the target path makes the rename fail.
    fs::create_dir(&path).unwrap();
    store.put(key("erin"), CredentialRecord::new("Erin", "pw"));
    let result = store.save();

    assert!(matches!(result, Err(StoreError::Write { .. })));
    assert!(store.is_dirty());
    assert!(store.contains(&key("erin")));

    fs::remove_dir(&path).unwrap();
    store.flush().unwrap();

    assert!(!store.is_dirty());
    assert!(CredentialStore::open(&path).unwrap().contains(&key("erin")));
}

// =========================================================================
// Migration
// =========================================================================

fn ids() -> ProfileIds {
    ProfileIds {
        premium: Uuid::new_v4(),
        offline: Uuid::new_v4(),
    }
}

#[test]
fn test_file_migrator_copies_premium_to_offline() {
    let dir = TempDir::new().unwrap();
    let migrator = FileMigrator::new(dir.path().join("playerdata"));
    let ids = ids();
    fs::create_dir_all(dir.path().join("playerdata")).unwrap();
    fs::write(migrator.data_file(&ids.premium), b"inventory").unwrap();

    let outcome = migrator.migrate(&ids).unwrap();

    assert_eq!(outcome, MigrationOutcome::Copied);
    assert_eq!(fs::read(migrator.data_file(&ids.offline)).unwrap(), b"inventory");
    assert!(migrator.data_file(&ids.premium).exists(), "source is kept");
}

#[test]
fn test_file_migrator_replaces_existing_offline_file() {
    let dir = TempDir::new().unwrap();
    let migrator = FileMigrator::new(dir.path());
    let ids = ids();
    fs::write(migrator.data_file(&ids.premium), b"new").unwrap();
    fs::write(migrator.data_file(&ids.offline), b"old").unwrap();

    migrator.migrate(&ids).unwrap();

    assert_eq!(fs::read(migrator.data_file(&ids.offline)).unwrap(), b"new");
}

#[test]
fn test_file_migrator_without_premium_data_is_nothing_to_copy() {
    let dir = TempDir::new().unwrap();
    let migrator = FileMigrator::new(dir.path().join("playerdata"));
    let ids = ids();

    let outcome = migrator.migrate(&ids).unwrap();

    assert_eq!(outcome, MigrationOutcome::NothingToCopy);
    assert!(dir.path().join("playerdata").is_dir());
    assert!(!migrator.data_file(&ids.offline).exists());
}
