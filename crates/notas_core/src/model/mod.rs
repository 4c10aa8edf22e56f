//! Domain model for the important-notes store.
//!
//! # Responsibility
//! - Define the canonical note record persisted in the durable slot.
//! - Own tag normalization so every write path shares one rule.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId`.
//! - Archiving is a soft delete; notes are never removed from the collection.

pub mod note;
