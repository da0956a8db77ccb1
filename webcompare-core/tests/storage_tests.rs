// Tests for the storage backends and session handling

use std::fs;
use tempfile::TempDir;
use webcompare_core::data::Database;
use webcompare_core::session::{SESSION_KEY, current_session, end_session, peek_session};
use webcompare_core::storage::{KeyValueStore, MemoryStore, SessionFile};

fn create_session_file() -> (TempDir, SessionFile) {
    let temp_dir = TempDir::new().unwrap();
    let file = SessionFile::new(temp_dir.path().join("nested").join("session.json"));
    (temp_dir, file)
}

// ============================================================================
// Session File Tests
// ============================================================================

#[test]
fn test_session_file_missing_is_empty() {
    let (_temp_dir, file) = create_session_file();

    assert_eq!(file.get("anything").unwrap(), None);
    assert!(file.keys().unwrap().is_empty());
    assert!(!file.path().exists());
}

#[test]
fn test_session_file_persists_between_handles() {
    let (_temp_dir, file) = create_session_file();
    file.set("a", "1").unwrap();

    let reopened = SessionFile::new(file.path());
    assert_eq!(reopened.get("a").unwrap(), Some("1".to_string()));
}

#[test]
fn test_session_file_unreadable_is_treated_as_empty() {
    let (_temp_dir, file) = create_session_file();
    fs::create_dir_all(file.path().parent().unwrap()).unwrap();
    fs::write(file.path(), "not json at all").unwrap();

    assert_eq!(file.get(SESSION_KEY).unwrap(), None);

    file.set("a", "1").unwrap();
    assert_eq!(file.get("a").unwrap(), Some("1".to_string()));
}

#[test]
fn test_session_file_removes_itself_when_empty() {
    let (_temp_dir, file) = create_session_file();
    file.set("a", "1").unwrap();
    assert!(file.path().exists());

    file.remove("a").unwrap();
    assert!(!file.path().exists());
}

#[test]
fn test_session_file_end_is_idempotent() {
    let (_temp_dir, file) = create_session_file();
    file.set("a", "1").unwrap();

    file.end().unwrap();
    file.end().unwrap();
    assert!(file.keys().unwrap().is_empty());
}

// ============================================================================
// Session Identifier Tests
// ============================================================================

#[test]
fn test_session_survives_new_handle() {
    let (_temp_dir, file) = create_session_file();

    let first = current_session(&file).unwrap();
    let second = current_session(&SessionFile::new(file.path())).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_ending_session_mints_new_one() {
    let (_temp_dir, file) = create_session_file();
    let first = current_session(&file).unwrap();

    file.end().unwrap();
    assert!(peek_session(&file).unwrap().is_none());

    let second = current_session(&file).unwrap();
    assert_ne!(first, second);
}

#[test]
fn test_end_session_only_drops_identifier() {
    let (_temp_dir, file) = create_session_file();
    current_session(&file).unwrap();
    file.set("other", "kept").unwrap();

    end_session(&file).unwrap();

    assert!(peek_session(&file).unwrap().is_none());
    assert_eq!(file.get("other").unwrap(), Some("kept".to_string()));
}

#[test]
fn test_blank_identifier_is_replaced() {
    let store = MemoryStore::new();
    store.set(SESSION_KEY, "   ").unwrap();

    let session = current_session(&store).unwrap();
    assert!(!session.as_str().trim().is_empty());
}

// ============================================================================
// Durable Store Tests
// ============================================================================

#[test]
fn test_database_creation() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("webcompare.db");

    assert!(!Database::exists(&db_path));
    let db = Database::new(&db_path).unwrap();
    assert!(Database::exists(&db_path));
    assert_eq!(db.path(), db_path.as_path());
}

#[test]
fn test_database_reopen_keeps_entries() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("webcompare.db");
    {
        let db = Database::new(&db_path).unwrap();
        db.set_many(&[("a", "1"), ("b", "2")]).unwrap();
    }

    let db = Database::new(&db_path).unwrap();
    assert_eq!(
        db.get_many(&["a", "b", "c"]).unwrap(),
        vec![Some("1".to_string()), Some("2".to_string()), None]
    );
    assert_eq!(db.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn test_connections_have_distinct_identities() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("webcompare.db");

    let first = Database::new(&db_path).unwrap();
    let second = Database::new(&db_path).unwrap();
    let pinned = Database::open_as(&db_path, first.context_id()).unwrap();

    assert_ne!(first.context_id(), second.context_id());
    assert_eq!(pinned.context_id(), first.context_id());
}

#[test]
fn test_memory_store_behaves_like_store() {
    let store = MemoryStore::new();
    store.set_many(&[("a", "1"), ("b", "2")]).unwrap();
    store.remove("a").unwrap();

    assert_eq!(store.get("a").unwrap(), None);
    assert_eq!(store.keys().unwrap(), vec!["b".to_string()]);
}
