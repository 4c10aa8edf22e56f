//! Read-side note views.
//!
//! # Responsibility
//! - Provide filtered projections over the note collection.
//!
//! # See also
//! - `service::note_store` for the owning store.

pub mod filter;
