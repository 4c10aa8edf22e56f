//! Core logic for Notas, a single-user important-notes store.
//! This crate owns every note invariant; presentation layers only call in.

pub mod db;
pub mod format;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use format::{format_date, format_date_in, format_timestamp};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::note::{normalize_tag, parse_tags, Note, NoteDraft, NoteId, NoteValidationError};
pub use repo::slot_repo::{
    MemorySlotStorage, SlotStorage, SlotVersion, SqliteSlotStorage, StorageError, StorageResult,
    StoredSlot,
};
pub use search::filter::{active_notes, active_tags, archived_notes, NoteFilters};
pub use service::note_store::{NoteStore, StoreError, StoreResult, DEFAULT_STORAGE_KEY};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
