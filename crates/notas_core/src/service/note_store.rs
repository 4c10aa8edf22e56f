//! Note store: the in-memory collection mirrored to a durable slot.
//!
//! # Responsibility
//! - Load and save the whole note collection as one JSON array.
//! - Provide the add/archive mutations and the filtered read views.
//!
//! # Invariants
//! - Notes are kept newest first; `add_note` prepends.
//! - Every successful mutation is persisted before the call returns.
//! - A mutation whose save fails is rolled back in memory, so memory and the
//!   slot never diverge.
//! - Notes are never removed; archiving only flips `archived` to `true`.

use crate::model::note::{Note, NoteDraft, NoteId, NoteValidationError};
use crate::repo::slot_repo::{SlotStorage, SlotVersion, StorageError};
use crate::search::filter::{active_notes, active_tags, archived_notes, NoteFilters};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Slot key holding the serialized collection.
pub const DEFAULT_STORAGE_KEY: &str = "notas.importantes";

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level error surfaced to presentation layers.
///
/// Every variant is recoverable: the store stays usable afterwards.
#[derive(Debug)]
pub enum StoreError {
    /// Stored payload could not be read as a note collection. The store has
    /// been reset to an empty collection.
    CorruptState { key: String, message: String },
    /// Reading or writing the durable slot failed.
    PersistenceFailure(StorageError),
    /// A caller-built note broke a record invariant; nothing was written.
    InvalidNote(NoteValidationError),
    /// A new note must start active; nothing was written.
    ArchivedOnInsert(NoteId),
    /// A note with this id already exists; nothing was written.
    DuplicateNote(NoteId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CorruptState { key, message } => {
                write!(f, "corrupt note payload in slot `{key}`: {message}")
            }
            Self::PersistenceFailure(err) => write!(f, "failed to persist notes: {err}"),
            Self::InvalidNote(err) => write!(f, "invalid note: {err}"),
            Self::ArchivedOnInsert(id) => write!(f, "note {id} cannot be inserted archived"),
            Self::DuplicateNote(id) => write!(f, "note {id} already exists"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::PersistenceFailure(err) => Some(err),
            Self::InvalidNote(err) => Some(err),
            Self::CorruptState { .. } | Self::ArchivedOnInsert(_) | Self::DuplicateNote(_) => None,
        }
    }
}

impl From<NoteValidationError> for StoreError {
    fn from(value: NoteValidationError) -> Self {
        Self::InvalidNote(value)
    }
}

impl From<StorageError> for StoreError {
    fn from(value: StorageError) -> Self {
        Self::PersistenceFailure(value)
    }
}

/// Owner of the note collection and the current filter state.
pub struct NoteStore<S: SlotStorage> {
    storage: S,
    key: String,
    notes: Vec<Note>,
    filters: NoteFilters,
    version: Option<SlotVersion>,
}

impl<S: SlotStorage> NoteStore<S> {
    /// Creates an empty store over `storage` using `DEFAULT_STORAGE_KEY`.
    ///
    /// Call `load` before reading to pick up persisted notes.
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, DEFAULT_STORAGE_KEY)
    }

    /// Creates an empty store over `storage` using a custom slot key.
    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            notes: Vec::new(),
            filters: NoteFilters::default(),
            version: None,
        }
    }

    /// Replaces the in-memory collection with the persisted one.
    ///
    /// A missing slot yields an empty collection. A corrupt payload also
    /// yields an empty collection and returns `StoreError::CorruptState`;
    /// the next save overwrites the corrupt payload.
    ///
    /// # Errors
    /// - `PersistenceFailure` when the slot cannot be read; in-memory state is
    ///   left untouched.
    pub fn load(&mut self) -> StoreResult<()> {
        let slot = match self.storage.read_slot(&self.key) {
            Ok(slot) => slot,
            Err(err) => {
                error!("event=notes_load module=store status=error error={err}");
                return Err(err.into());
            }
        };

        let Some(slot) = slot else {
            self.notes.clear();
            self.version = None;
            info!("event=notes_load module=store status=ok source=empty count=0");
            return Ok(());
        };

        self.version = Some(slot.version);
        match decode_notes(&slot.value) {
            Ok(notes) => {
                self.notes = notes;
                info!(
                    "event=notes_load module=store status=ok source=slot count={} version={}",
                    self.notes.len(),
                    slot.version
                );
                Ok(())
            }
            Err(message) => {
                self.notes.clear();
                warn!(
                    "event=notes_load module=store status=corrupt version={} payload_bytes={}",
                    slot.version,
                    slot.value.len()
                );
                Err(StoreError::CorruptState {
                    key: self.key.clone(),
                    message,
                })
            }
        }
    }

    /// Writes the full collection to the slot, replacing what was there.
    pub fn save(&mut self) -> StoreResult<()> {
        let payload = serde_json::to_string(&self.notes)
            .map_err(|err| StorageError::WriteRejected(format!("serialize notes: {err}")))?;

        match self.storage.write_slot(&self.key, &payload, self.version) {
            Ok(version) => {
                self.version = Some(version);
                debug!(
                    "event=notes_save module=store status=ok count={} version={version}",
                    self.notes.len()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=notes_save module=store status=error count={} error={err}",
                    self.notes.len()
                );
                Err(err.into())
            }
        }
    }

    /// Creates a note from `draft`, prepends it and persists the collection.
    ///
    /// Returns the stored note. Title and content are not validated.
    pub fn add_note(&mut self, draft: NoteDraft) -> StoreResult<&Note> {
        self.insert_note(Note::from_draft(draft))
    }

    /// Prepends an already-built note and persists the collection.
    ///
    /// Used by import paths that carry their own id and timestamp.
    ///
    /// The note must satisfy the same rules `load` enforces, so a successful
    /// insert can always be read back.
    ///
    /// # Errors
    /// - `InvalidNote` when a tag is not normalized.
    /// - `ArchivedOnInsert` when `note.archived` is set.
    /// - `DuplicateNote` when the id already exists.
    pub fn insert_note(&mut self, note: Note) -> StoreResult<&Note> {
        note.validate()?;
        if note.archived {
            return Err(StoreError::ArchivedOnInsert(note.id));
        }
        if self.get_note(note.id).is_some() {
            return Err(StoreError::DuplicateNote(note.id));
        }

        let note_id = note.id;
        let tag_count = note.tags.len();
        self.notes.insert(0, note);
        if let Err(err) = self.save() {
            self.notes.remove(0);
            return Err(err);
        }

        info!("event=note_add module=store status=ok note_id={note_id} tag_count={tag_count}");
        Ok(&self.notes[0])
    }

    /// Archives the note with `id`.
    ///
    /// Returns `true` when the note changed. Unknown ids and notes that are
    /// already archived are a silent no-op returning `false`.
    pub fn archive_note(&mut self, id: NoteId) -> StoreResult<bool> {
        let Some(index) = self.notes.iter().position(|note| note.id == id) else {
            debug!("event=note_archive module=store status=noop reason=not_found note_id={id}");
            return Ok(false);
        };

        if !self.notes[index].archive() {
            debug!("event=note_archive module=store status=noop reason=already_archived note_id={id}");
            return Ok(false);
        }

        if let Err(err) = self.save() {
            // The write never landed; undo the unpersisted flag.
            self.notes[index].archived = false;
            return Err(err);
        }

        info!("event=note_archive module=store status=ok note_id={id}");
        Ok(true)
    }

    /// Active notes matching `filters`, newest first.
    pub fn active_notes(&self, filters: &NoteFilters) -> impl Iterator<Item = &Note> + Clone + '_ {
        active_notes(&self.notes, filters)
    }

    /// Active notes matching the store's current filters.
    pub fn filtered_notes(&self) -> impl Iterator<Item = &Note> + Clone + '_ {
        active_notes(&self.notes, &self.filters)
    }

    /// Archived notes in collection order.
    pub fn archived_notes(&self) -> impl Iterator<Item = &Note> + Clone + '_ {
        archived_notes(&self.notes)
    }

    /// Distinct tags used by active notes, sorted.
    pub fn known_tags(&self) -> Vec<String> {
        active_tags(&self.notes)
    }

    /// Current filter state. Never persisted.
    pub fn filters(&self) -> &NoteFilters {
        &self.filters
    }

    /// Mutable access to the filter state.
    pub fn filters_mut(&mut self) -> &mut NoteFilters {
        &mut self.filters
    }

    /// Resets search and tag filters to empty.
    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    /// Looks up one note by id, archived or not.
    pub fn get_note(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    /// Full collection, newest first.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Slot key this store reads and writes.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Borrows the underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Consumes the store and returns its storage.
    pub fn into_storage(self) -> S {
        self.storage
    }
}

/// Decodes and validates a stored payload.
fn decode_notes(payload: &str) -> Result<Vec<Note>, String> {
    let notes: Vec<Note> = serde_json::from_str(payload).map_err(|err| err.to_string())?;

    let mut seen = HashSet::with_capacity(notes.len());
    for note in &notes {
        if !seen.insert(note.id) {
            return Err(format!("duplicate note id {}", note.id));
        }
        note.validate().map_err(|err| err.to_string())?;
    }

    Ok(notes)
}
