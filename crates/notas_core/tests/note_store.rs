use notas_core::db::open_db_in_memory;
use notas_core::{
    MemorySlotStorage, Note, NoteDraft, NoteFilters, NoteStore, NoteValidationError, SlotStorage,
    SqliteSlotStorage, StorageError, StoreError, DEFAULT_STORAGE_KEY,
};
use uuid::Uuid;

fn draft(title: &str, content: &str, tags: &str, due: &str) -> NoteDraft {
    NoteDraft::new(title, content, tags, due)
}

fn ids<'a>(notes: impl Iterator<Item = &'a Note>) -> Vec<Uuid> {
    notes.map(|note| note.id).collect()
}

#[test]
fn scenario_add_filter_and_archive() {
    let mut store = NoteStore::new(MemorySlotStorage::new());
    store.load().unwrap();

    let a = store
        .add_note(draft("Pay rent", "due monthly", "bills, home", "2024-01-01"))
        .unwrap()
        .id;
    let b = store.add_note(draft("Buy milk", "", "", "")).unwrap().id;

    let all = NoteFilters::default();
    assert_eq!(ids(store.active_notes(&all)), vec![b, a]);
    assert_eq!(
        ids(store.active_notes(&NoteFilters::new("", "bills"))),
        vec![a]
    );

    assert!(store.archive_note(a).unwrap());
    assert_eq!(ids(store.active_notes(&all)), vec![b]);
    assert_eq!(ids(store.archived_notes()), vec![a]);

    let rent = store.get_note(a).unwrap();
    assert_eq!(rent.tags, vec!["bills".to_string(), "home".to_string()]);
    assert_eq!(rent.due_date.as_deref(), Some("2024-01-01"));
    assert_eq!(store.get_note(b).unwrap().tags, Vec::<String>::new());
}

#[test]
fn adds_are_counted_and_ordered_newest_first() {
    let mut store = NoteStore::new(MemorySlotStorage::new());
    let mut added = Vec::new();
    for idx in 0..5 {
        added.push(store.add_note(draft(&format!("note {idx}"), "", "", "")).unwrap().id);
    }

    assert_eq!(store.len(), 5);
    added.reverse();
    assert_eq!(ids(store.notes().iter()), added);
}

#[test]
fn reload_reproduces_the_collection_exactly() {
    let mut storage = MemorySlotStorage::new();
    let before = {
        let mut store = NoteStore::new(&mut storage);
        store.load().unwrap();
        store
            .add_note(draft("a", "body", "Zeta, alpha, zeta", "2024-05-01T10:30"))
            .unwrap();
        store.add_note(draft("", "", "", "")).unwrap();
        store.notes().to_vec()
    };

    let mut reloaded = NoteStore::new(&mut storage);
    reloaded.load().unwrap();
    assert_eq!(reloaded.notes(), before.as_slice());
    assert_eq!(
        reloaded.notes()[1].tags,
        vec!["zeta".to_string(), "alpha".to_string(), "zeta".to_string()]
    );
    assert!(reloaded.notes().iter().all(|note| !note.archived));
}

#[test]
fn archive_is_idempotent_for_any_filter() {
    let mut store = NoteStore::new(MemorySlotStorage::new());
    let id = store.add_note(draft("Report", "quarterly", "work", "")).unwrap().id;

    assert!(store.archive_note(id).unwrap());
    let version_after_first = store.storage().read_slot(DEFAULT_STORAGE_KEY).unwrap();
    assert!(!store.archive_note(id).unwrap());
    assert_eq!(
        store.storage().read_slot(DEFAULT_STORAGE_KEY).unwrap(),
        version_after_first
    );

    for filters in [
        NoteFilters::default(),
        NoteFilters::new("report", ""),
        NoteFilters::new("", "work"),
    ] {
        assert_eq!(store.active_notes(&filters).count(), 0);
    }
    assert_eq!(ids(store.archived_notes()), vec![id]);
}

#[test]
fn archive_unknown_id_changes_nothing() {
    let mut store = NoteStore::new(MemorySlotStorage::new());
    store.add_note(draft("keep", "", "", "")).unwrap();
    let before = store.notes().to_vec();

    assert!(!store.archive_note(Uuid::new_v4()).unwrap());
    assert_eq!(store.notes(), before.as_slice());
}

#[test]
fn empty_search_ignores_search_but_keeps_tag_filter() {
    let mut store = NoteStore::new(MemorySlotStorage::new());
    let work = store.add_note(draft("one", "", "work", "")).unwrap().id;
    let home = store.add_note(draft("two", "", "home", "")).unwrap().id;

    assert_eq!(
        ids(store.active_notes(&NoteFilters::new("", ""))),
        vec![home, work]
    );
    assert_eq!(
        ids(store.active_notes(&NoteFilters::new("  ", " Work "))),
        vec![work]
    );
}

#[test]
fn store_filters_drive_filtered_view_and_clear() {
    let mut store = NoteStore::new(MemorySlotStorage::new());
    let milk = store.add_note(draft("Buy milk", "", "", "")).unwrap().id;
    store.add_note(draft("Call bank", "", "", "")).unwrap();

    store.filters_mut().search = "MILK".to_string();
    assert_eq!(ids(store.filtered_notes()), vec![milk]);

    store.clear_filters();
    assert_eq!(store.filters(), &NoteFilters::default());
    assert_eq!(store.filtered_notes().count(), 2);
}

#[test]
fn missing_slot_loads_as_empty() {
    let mut store = NoteStore::new(MemorySlotStorage::new());
    store.load().unwrap();
    assert!(store.is_empty());
}

#[test]
fn corrupt_payload_resets_to_empty_and_keeps_write_path() {
    let mut storage = MemorySlotStorage::new();
    storage.insert_raw(DEFAULT_STORAGE_KEY, "{not json");

    let mut store = NoteStore::new(storage);
    let err = store.load().unwrap_err();
    assert!(matches!(err, StoreError::CorruptState { .. }));
    assert!(store.is_empty());

    let id = store.add_note(draft("fresh", "", "", "")).unwrap().id;
    let raw = store.storage().raw(DEFAULT_STORAGE_KEY).unwrap();
    assert!(raw.contains(&id.to_string()));
}

#[test]
fn failed_save_rolls_back_add_and_archive() {
    let mut storage = MemorySlotStorage::new();
    let id = {
        let mut store = NoteStore::new(&mut storage);
        store.add_note(draft("kept", "", "", "")).unwrap().id
    };
    storage.fail_writes("quota exceeded");

    let mut store = NoteStore::new(&mut storage);
    store.load().unwrap();

    let err = store.add_note(draft("lost", "", "", "")).unwrap_err();
    assert!(matches!(
        err,
        StoreError::PersistenceFailure(StorageError::WriteRejected(_))
    ));
    assert_eq!(store.len(), 1);

    assert!(store.archive_note(id).is_err());
    assert!(!store.get_note(id).unwrap().archived);
}

#[test]
fn custom_key_isolates_collections() {
    let mut storage = MemorySlotStorage::new();
    {
        let mut work = NoteStore::with_key(&mut storage, "notas.trabajo");
        work.add_note(draft("work", "", "", "")).unwrap();
        assert_eq!(work.key(), "notas.trabajo");
    }

    let mut default_store = NoteStore::new(&mut storage);
    default_store.load().unwrap();
    assert!(default_store.is_empty());
}

#[test]
fn sqlite_backed_store_round_trips() {
    let conn = open_db_in_memory().unwrap();
    let mut store = NoteStore::new(SqliteSlotStorage::new(conn));
    store.load().unwrap();
    let id = store
        .add_note(draft("Pay rent", "due monthly", "Bills", "2024-01-01"))
        .unwrap()
        .id;
    store.archive_note(id).unwrap();

    let conn = store.into_storage().into_inner();
    let mut reloaded = NoteStore::new(SqliteSlotStorage::new(conn));
    reloaded.load().unwrap();
    let note = reloaded.get_note(id).unwrap();
    assert!(note.archived);
    assert_eq!(note.tags, vec!["bills".to_string()]);
    assert_eq!(reloaded.known_tags(), Vec::<String>::new());
}

#[test]
fn insert_note_rejects_duplicate_ids() {
    let mut store = NoteStore::new(MemorySlotStorage::new());
    let note = Note::from_draft(draft("x", "", "", ""));
    store.insert_note(note.clone()).unwrap();

    let err = store.insert_note(note).unwrap_err();
    assert!(matches!(err, StoreError::DuplicateNote(_)));
    assert_eq!(store.len(), 1);
}

#[test]
fn insert_note_rejects_records_load_would_refuse() {
    let mut storage = MemorySlotStorage::new();
    let kept = {
        let mut store = NoteStore::new(&mut storage);
        store.load().unwrap();
        let kept = store.add_note(draft("kept", "", "home", "")).unwrap().id;

        let mut mixed_case = Note::from_draft(draft("imported", "", "", ""));
        mixed_case.tags = vec!["Work".to_string()];
        let err = store.insert_note(mixed_case).unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidNote(NoteValidationError::UnnormalizedTag { .. })
        ));

        let mut archived = Note::from_draft(draft("imported", "", "work", ""));
        archived.archived = true;
        let archived_id = archived.id;
        let err = store.insert_note(archived).unwrap_err();
        assert!(matches!(err, StoreError::ArchivedOnInsert(id) if id == archived_id));

        assert_eq!(store.len(), 1);
        kept
    };

    let mut reloaded = NoteStore::new(&mut storage);
    reloaded.load().unwrap();
    assert_eq!(ids(reloaded.notes().iter()), vec![kept]);
}

#[test]
fn insert_note_accepts_valid_imported_record() {
    let mut store = NoteStore::new(MemorySlotStorage::new());
    let imported = Note::from_draft_at(
        draft("imported", "", "work", "2024-01-01"),
        Uuid::nil(),
        chrono::Utc::now(),
    );

    assert_eq!(store.insert_note(imported.clone()).unwrap(), &imported);
    store.load().unwrap();
    assert_eq!(store.notes(), &[imported]);
}
