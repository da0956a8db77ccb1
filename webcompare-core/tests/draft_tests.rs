// Tests for the submission form and its saved drafts

use tempfile::TempDir;
use webcompare_core::WebsiteInput;
use webcompare_core::data::Database;
use webcompare_core::draft::{
    Category, DraftStore, DraftSubmission, FORM_CATEGORY_KEY, FORM_DATA_KEY, FormError,
    SubmissionForm,
};
use webcompare_core::session::SessionId;
use webcompare_core::storage::{KeyValueStore, MemoryStore};

fn create_test_db() -> (TempDir, Database) {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::new(&temp_dir.path().join("webcompare.db")).unwrap();
    (temp_dir, db)
}

// ============================================================================
// Draft Persistence Tests
// ============================================================================

#[test]
fn test_fresh_form_has_defaults() {
    let store = MemoryStore::new();
    let form = SubmissionForm::load(&store, &SessionId::generate()).unwrap();

    assert_eq!(form.draft(), &DraftSubmission::default());
    assert_eq!(form.draft().websites.len(), 3);
    assert_eq!(form.draft().category, Category::Ecommerce);
}

#[test]
fn test_every_edit_is_saved() {
    let (_temp_dir, db) = create_test_db();
    let session = SessionId::generate();
    {
        let mut form = SubmissionForm::load(&db, &session).unwrap();
        form.set_website(0, Some("A"), Some("http://a.test")).unwrap();
        form.set_category(Category::Blog).unwrap();
        form.add_website().unwrap();
        form.set_website(3, Some("D"), Some("http://d.test")).unwrap();
    }

    let reloaded = SubmissionForm::load(&db, &session).unwrap();
    assert_eq!(reloaded.draft().websites.len(), 4);
    assert_eq!(
        reloaded.draft().websites[0],
        WebsiteInput::new("A", "http://a.test")
    );
    assert_eq!(reloaded.draft().websites[3].name, "D");
    assert_eq!(reloaded.draft().category, Category::Blog);
}

#[test]
fn test_drafts_are_per_session() {
    let (_temp_dir, db) = create_test_db();
    let s1 = SessionId::generate();
    let s2 = SessionId::generate();

    let mut form = SubmissionForm::load(&db, &s1).unwrap();
    form.set_website(0, Some("A"), Some("http://a.test")).unwrap();

    let other = SubmissionForm::load(&db, &s2).unwrap();
    assert_eq!(other.draft(), &DraftSubmission::default());
}

#[test]
fn test_draft_keys_carry_session() {
    let store = MemoryStore::new();
    let session = SessionId::from("abc");
    DraftStore::new(&store, &session)
        .save(&DraftSubmission::default())
        .unwrap();

    let keys = store.keys().unwrap();
    assert!(keys.contains(&format!("{}.abc", FORM_DATA_KEY)));
    assert!(keys.contains(&format!("{}.abc", FORM_CATEGORY_KEY)));
}

#[test]
fn test_unreadable_draft_falls_back_to_defaults() {
    let store = MemoryStore::new();
    let session = SessionId::from("abc");
    store
        .set_many(&[
            (&format!("{}.abc", FORM_DATA_KEY), "[{broken"),
            (&format!("{}.abc", FORM_CATEGORY_KEY), "blog"),
        ])
        .unwrap();

    let draft = DraftStore::new(&store, &session).load().unwrap();
    assert_eq!(draft.websites, DraftSubmission::default().websites);
    assert_eq!(draft.category, Category::Blog);
}

#[test]
fn test_unknown_saved_category_falls_back() {
    let store = MemoryStore::new();
    let session = SessionId::from("abc");
    store
        .set(&format!("{}.abc", FORM_CATEGORY_KEY), "news")
        .unwrap();

    let draft = DraftStore::new(&store, &session).load().unwrap();
    assert_eq!(draft.category, Category::Ecommerce);
}

#[test]
fn test_reset_clears_saved_draft() {
    let store = MemoryStore::new();
    let session = SessionId::generate();
    let mut form = SubmissionForm::load(&store, &session).unwrap();
    form.set_website(0, Some("A"), Some("http://a.test")).unwrap();

    form.reset().unwrap();

    assert_eq!(form.draft(), &DraftSubmission::default());
    assert!(store.keys().unwrap().is_empty());
}

// ============================================================================
// Validation Tests
// ============================================================================

#[test]
fn test_submit_requires_two_complete_entries() {
    let store = MemoryStore::new();
    let mut form = SubmissionForm::load(&store, &SessionId::generate()).unwrap();
    form.set_website(0, Some("A"), Some("http://a.test")).unwrap();
    form.set_website(1, Some("B"), Some("")).unwrap();

    let err = form.begin_submit().err().unwrap();
    assert!(matches!(err, FormError::TooFewWebsites));
    assert_eq!(err.to_string(), "Please provide at least 2 websites to compare");
    assert!(!form.is_submitting());
}

#[test]
fn test_second_submit_rejected_while_in_flight() {
    let store = MemoryStore::new();
    let mut form = SubmissionForm::load(&store, &SessionId::generate()).unwrap();
    form.set_website(0, Some("A"), Some("http://a.test")).unwrap();
    form.set_website(1, Some("B"), Some("http://b.test")).unwrap();

    let pending = form.begin_submit().unwrap();
    assert_eq!(pending.request.websites.len(), 2);
    assert!(form.is_submitting());
    assert!(matches!(
        form.begin_submit().err(),
        Some(FormError::SubmissionInFlight)
    ));

    drop(pending);
    assert!(!form.is_submitting());
    assert!(form.begin_submit().is_ok());
}

#[test]
fn test_set_unknown_slot() {
    let store = MemoryStore::new();
    let mut form = SubmissionForm::load(&store, &SessionId::generate()).unwrap();

    let err = form.set_website(7, Some("X"), None).unwrap_err();
    assert!(matches!(err, FormError::NoSuchSlot { index: 7, len: 3 }));
}
