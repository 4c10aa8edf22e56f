//! Slot storage contract with SQLite and in-memory backends.
//!
//! # Responsibility
//! - Read and overwrite one string value per key.
//! - Track a monotonically increasing version per key for optimistic
//!   concurrency between processes sharing one database file.
//!
//! # Invariants
//! - `write_slot` is atomic: either the new value and version are stored or
//!   nothing changes.
//! - A write whose `expected_version` differs from the stored version is
//!   rejected with `StorageError::VersionConflict`.
//! - Versions start at 1 and grow by 1 per successful write.

use crate::db::DbError;
use log::warn;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StorageResult<T> = Result<T, StorageError>;

/// Version counter of a stored slot.
pub type SlotVersion = u64;

/// Storage-layer error for slot reads and writes.
#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
    /// Slot was changed by another writer since it was read.
    VersionConflict {
        key: String,
        expected: Option<SlotVersion>,
        actual: Option<SlotVersion>,
    },
    /// Backend refused the write (quota, read-only medium).
    WriteRejected(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::VersionConflict {
                key,
                expected,
                actual,
            } => write!(
                f,
                "slot `{key}` changed concurrently: expected version {}, found {}",
                format_version(*expected),
                format_version(*actual)
            ),
            Self::WriteRejected(message) => write!(f, "slot write rejected: {message}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::VersionConflict { .. } | Self::WriteRejected(_) => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

fn format_version(version: Option<SlotVersion>) -> String {
    version.map_or_else(|| "none".to_string(), |value| value.to_string())
}

/// Slot value together with the version it was stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSlot {
    pub value: String,
    pub version: SlotVersion,
}

/// Key/value slot contract used by the note store.
pub trait SlotStorage {
    /// Reads one slot. Returns `None` when the key was never written.
    fn read_slot(&self, key: &str) -> StorageResult<Option<StoredSlot>>;

    /// Overwrites one slot and returns the new version.
    ///
    /// `expected_version` is the version the caller last observed (`None`
    /// when the slot did not exist).
    fn write_slot(
        &mut self,
        key: &str,
        value: &str,
        expected_version: Option<SlotVersion>,
    ) -> StorageResult<SlotVersion>;
}

impl<S: SlotStorage + ?Sized> SlotStorage for &mut S {
    fn read_slot(&self, key: &str) -> StorageResult<Option<StoredSlot>> {
        (**self).read_slot(key)
    }

    fn write_slot(
        &mut self,
        key: &str,
        value: &str,
        expected_version: Option<SlotVersion>,
    ) -> StorageResult<SlotVersion> {
        (**self).write_slot(key, value, expected_version)
    }
}

/// SQLite-backed slot storage over the `kv_slots` table.
pub struct SqliteSlotStorage {
    conn: Connection,
}

impl SqliteSlotStorage {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Gives back the underlying connection.
    pub fn into_inner(self) -> Connection {
        self.conn
    }
}

impl SlotStorage for SqliteSlotStorage {
    fn read_slot(&self, key: &str) -> StorageResult<Option<StoredSlot>> {
        let slot = self
            .conn
            .query_row(
                "SELECT value, version FROM kv_slots WHERE key = ?1;",
                [key],
                |row| {
                    Ok(StoredSlot {
                        value: row.get("value")?,
                        version: row.get::<_, i64>("version")? as SlotVersion,
                    })
                },
            )
            .optional()?;
        Ok(slot)
    }

    fn write_slot(
        &mut self,
        key: &str,
        value: &str,
        expected_version: Option<SlotVersion>,
    ) -> StorageResult<SlotVersion> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let actual = tx
            .query_row(
                "SELECT version FROM kv_slots WHERE key = ?1;",
                [key],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .map(|version| version as SlotVersion);

        if actual != expected_version {
            warn!(
                "event=slot_write module=repo status=conflict expected={} actual={}",
                format_version(expected_version),
                format_version(actual)
            );
            return Err(StorageError::VersionConflict {
                key: key.to_string(),
                expected: expected_version,
                actual,
            });
        }

        let next = actual.map_or(1, |version| version + 1);
        tx.execute(
            "INSERT INTO kv_slots (key, value, version, updated_at)
             VALUES (?1, ?2, ?3, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                version = excluded.version,
                updated_at = excluded.updated_at;",
            params![key, value, next as i64],
        )?;
        tx.commit()?;

        Ok(next)
    }
}

/// In-process slot storage.
///
/// Useful for embedding and tests; `fail_writes` simulates a backend that
/// refuses writes (for example an exhausted quota).
#[derive(Debug, Default)]
pub struct MemorySlotStorage {
    slots: HashMap<String, StoredSlot>,
    fail_writes: Option<String>,
}

impl MemorySlotStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a raw value, bypassing version checks.
    pub fn insert_raw(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let version = self.slots.get(&key).map_or(1, |slot| slot.version + 1);
        self.slots.insert(
            key,
            StoredSlot {
                value: value.into(),
                version,
            },
        );
    }

    /// Makes every following write fail with `WriteRejected(message)`.
    pub fn fail_writes(&mut self, message: impl Into<String>) {
        self.fail_writes = Some(message.into());
    }

    /// Lets writes succeed again.
    pub fn allow_writes(&mut self) {
        self.fail_writes = None;
    }

    /// Returns the raw stored value for a key.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.slots.get(key).map(|slot| slot.value.as_str())
    }
}

impl SlotStorage for MemorySlotStorage {
    fn read_slot(&self, key: &str) -> StorageResult<Option<StoredSlot>> {
        Ok(self.slots.get(key).cloned())
    }

    fn write_slot(
        &mut self,
        key: &str,
        value: &str,
        expected_version: Option<SlotVersion>,
    ) -> StorageResult<SlotVersion> {
        if let Some(message) = &self.fail_writes {
            return Err(StorageError::WriteRejected(message.clone()));
        }

        let actual = self.slots.get(key).map(|slot| slot.version);
        if actual != expected_version {
            return Err(StorageError::VersionConflict {
                key: key.to_string(),
                expected: expected_version,
                actual,
            });
        }

        let next = actual.map_or(1, |version| version + 1);
        self.slots.insert(
            key.to_string(),
            StoredSlot {
                value: value.to_string(),
                version: next,
            },
        );
        Ok(next)
    }
}
