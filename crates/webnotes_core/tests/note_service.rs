use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rusqlite::Connection;
use webnotes_core::repo::note_repo::NOTES_LIMIT_MAX;
use webnotes_core::{
    open_db_in_memory, NoteCategory, NoteForm, NoteService, NoteServiceError, NoteStore,
    NoteValidationError, Page, SqliteNoteStore, SqliteUserStore, StatusTransition, UserId,
    UserStore,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).single().expect("valid timestamp")
}

fn user(conn: &Connection, login: &str) -> UserId {
    SqliteUserStore::try_new(conn)
        .expect("store should accept migrated schema")
        .create(login, "digest")
        .expect("user should be created")
}

fn notes(conn: &Connection) -> NoteService<SqliteNoteStore<'_>> {
    let store = SqliteNoteStore::try_new(conn).expect("note store should accept migrated schema");
    NoteService::new(store)
}

fn form(name: &str, description: &str) -> NoteForm {
    NoteForm {
        name: name.to_string(),
        description: description.to_string(),
        ..NoteForm::default()
    }
}

fn form_with_deadline(name: &str, deadline: &str) -> NoteForm {
    NoteForm {
        has_deadline: true,
        deadline: deadline.to_string(),
        ..form(name, "details")
    }
}

#[test]
fn created_note_is_listed_with_projection() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let owner = user(&conn, "alice");
    let service = notes(&conn);

    let id = service
        .create_note_at(owner, &form_with_deadline(" groceries ", "2024-06-20"), now())
        .expect("note should be created");
    let page = service
        .list_notes(owner, None, Page::default(), now())
        .expect("listing should succeed");

    assert_eq!(page.items.len(), 1);
    let view = &page.items[0];
    assert_eq!(view.id, id);
    assert_eq!(view.name, "groceries");
    assert_eq!(view.description, "details");
    assert_eq!(view.deadline, "2024-06-20");
    assert_eq!(view.created_at, "2024-06-15");
    assert_eq!(view.category, NoteCategory::Active);
    assert_eq!(page.applied_limit, 6);
    assert_eq!(page.search, None);
}

#[test]
fn invalid_forms_are_rejected_before_storage() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let owner = user(&conn, "alice");
    let service = notes(&conn);

    let empty = service.create_note(owner, &form("  ", "x")).unwrap_err();
    assert!(matches!(
        empty,
        NoteServiceError::Validation(NoteValidationError::EmptyField)
    ));

    let missing = service
        .create_note(owner, &form_with_deadline("n", ""))
        .unwrap_err();
    assert!(matches!(
        missing,
        NoteServiceError::Validation(NoteValidationError::MissingDeadline)
    ));

    let invalid = service
        .create_note(owner, &form_with_deadline("n", "15.06.2024"))
        .unwrap_err();
    assert!(invalid.user_message().contains("15.06.2024"));

    let page = service
        .list_notes(owner, None, Page::default(), now())
        .expect("listing should succeed");
    assert!(page.items.is_empty());
}

#[test]
fn listing_is_scoped_to_owner_ordered_and_paged() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let alice = user(&conn, "alice");
    let bob = user(&conn, "bob");
    let service = notes(&conn);

    let mut alice_ids = Vec::new();
    for i in 0..8 {
        let id = service
            .create_note(alice, &form(&format!("a{i}"), "d"))
            .expect("note should be created");
        alice_ids.push(id);
    }
    service.create_note(bob, &form("b0", "d")).expect("note should be created");

    let first = service
        .list_notes(alice, None, Page::default(), now())
        .expect("listing should succeed");
    let second = service
        .list_notes(alice, None, Page::new(None, 6), now())
        .expect("listing should succeed");

    let first_ids: Vec<_> = first.items.iter().map(|view| view.id).collect();
    let second_ids: Vec<_> = second.items.iter().map(|view| view.id).collect();
    assert_eq!(first_ids, &alice_ids[..6]);
    assert_eq!(second_ids, &alice_ids[6..]);
    assert!(first.items.iter().all(|view| view.user_id == alice));

    let clamped = service
        .list_notes(alice, None, Page::new(Some(500), 0), now())
        .expect("listing should succeed");
    assert_eq!(clamped.applied_limit, NOTES_LIMIT_MAX);
    assert_eq!(clamped.items.len(), 8);
}

#[test]
fn search_matches_name_or_description_case_insensitively() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let owner = user(&conn, "alice");
    let service = notes(&conn);

    service.create_note(owner, &form("Buy MILK", "shop")).expect("note should be created");
    service.create_note(owner, &form("Call mom", "about milk")).expect("note should be created");
    service.create_note(owner, &form("Taxes", "50% done")).expect("note should be created");

    let milk = service
        .list_notes(owner, Some(" milk "), Page::default(), now())
        .expect("listing should succeed");
    assert_eq!(milk.items.len(), 2);
    assert_eq!(milk.search.as_deref(), Some("milk"));

    let percent = service
        .list_notes(owner, Some("%"), Page::default(), now())
        .expect("listing should succeed");
    assert_eq!(percent.items.len(), 1);
    assert_eq!(percent.items[0].name, "Taxes");

    let blank = service
        .list_notes(owner, Some("   "), Page::default(), now())
        .expect("listing should succeed");
    assert_eq!(blank.items.len(), 3);
    assert_eq!(blank.search, None);
}

#[test]
fn toggle_follows_classifier_transition() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let owner = user(&conn, "alice");
    let service = notes(&conn);
    let id = service
        .create_note(owner, &form_with_deadline("report", "2024-06-01"))
        .expect("note should be created");

    assert_eq!(
        service.toggle_status(id, now()).expect("toggle should succeed"),
        StatusTransition::Complete
    );
    let page = service
        .list_notes(owner, None, Page::default(), now())
        .expect("listing should succeed");
    assert_eq!(page.items[0].category, NoteCategory::Completed);

    assert_eq!(
        service.toggle_status(id, now()).expect("toggle should succeed"),
        StatusTransition::ReturnToActive
    );
    let page = service
        .list_notes(owner, None, Page::default(), now())
        .expect("listing should succeed");
    assert_eq!(page.items[0].category, NoteCategory::Expired);
}

#[test]
fn update_replaces_all_fields_and_edit_view_reflects_them() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let owner = user(&conn, "alice");
    let service = notes(&conn);
    let id = service
        .create_note(owner, &form_with_deadline("draft", "2024-07-01"))
        .expect("note should be created");

    service
        .update_note(id, &form("final", "rewritten"), true)
        .expect("update should succeed");

    let edit = service.edit_view(id).expect("edit view should load");
    assert_eq!(edit.name, "final");
    assert_eq!(edit.description, "rewritten");
    assert!(!edit.has_deadline);
    assert_eq!(edit.deadline, "");
    assert!(edit.is_completed);

    let stored = SqliteNoteStore::try_new(&conn)
        .expect("store should accept migrated schema")
        .find_by_id(id)
        .expect("lookup should succeed")
        .expect("note should exist");
    assert_eq!(stored.deadline, None::<NaiveDate>);
}

#[test]
fn unknown_note_ids_are_not_found() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let service = notes(&conn);

    assert!(matches!(
        service.update_note(404, &form("n", "d"), false),
        Err(NoteServiceError::NoteNotFound(404))
    ));
    assert!(matches!(
        service.toggle_status(404, now()),
        Err(NoteServiceError::NoteNotFound(404))
    ));
    assert!(matches!(
        service.edit_view(404),
        Err(NoteServiceError::NoteNotFound(404))
    ));
    let err = service.delete_note(404).unwrap_err();
    assert_eq!(err.user_message(), "note not found");
}

#[test]
fn delete_removes_note() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let owner = user(&conn, "alice");
    let service = notes(&conn);
    let id = service.create_note(owner, &form("n", "d")).expect("note should be created");

    service.delete_note(id).expect("delete should succeed");

    assert!(matches!(
        service.delete_note(id),
        Err(NoteServiceError::NoteNotFound(_))
    ));
}

#[test]
fn invalid_persisted_deadline_is_reported_as_storage_failure() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let owner = user(&conn, "alice");
    conn.execute(
        "INSERT INTO notes (user_id, name, deadline_at) VALUES (?1, 'broken', 'soon');",
        [owner],
    )
    .expect("statement should run");
    let service = notes(&conn);

    let err = service
        .list_notes(owner, None, Page::default(), now())
        .unwrap_err();

    assert!(matches!(err, NoteServiceError::Repo(_)));
    assert_eq!(err.user_message(), "something went wrong, please try again");
}

#[test]
fn store_requires_migrated_schema() {
    let conn = Connection::open_in_memory().expect("in-memory db should open");

    assert!(SqliteNoteStore::try_new(&conn).is_err());
    assert!(SqliteUserStore::try_new(&conn).is_err());
}
