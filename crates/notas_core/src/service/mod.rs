//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate the in-memory note collection and its durable slot.
//! - Keep presentation layers decoupled from storage details.

pub mod note_store;
