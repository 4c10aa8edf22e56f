//! Durable storage slot abstractions and implementations.
//!
//! # Responsibility
//! - Define the key/value slot contract the note store persists through.
//! - Isolate SQLite details from the store's orchestration logic.
//!
//! # Invariants
//! - A slot write fully replaces the previous value.
//! - Writes are version-checked so a stale writer cannot clobber newer data.

pub mod slot_repo;
