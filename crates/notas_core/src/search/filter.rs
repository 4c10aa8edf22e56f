//! Tag and substring filters over notes.
//!
//! # Responsibility
//! - Select active notes matching an optional tag and search term.
//! - Select archived notes.
//!
//! # Invariants
//! - Views never reorder notes; collection order (newest first) is kept.
//! - Views are lazy and restartable (`Clone`), and have no side effects.

use crate::model::note::{normalize_tag, Note};
use std::collections::BTreeSet;

/// Filter state for the active-notes view.
///
/// Empty (or whitespace-only) fields mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilters {
    /// Free-text term matched against title and content.
    pub search: String,
    /// Single tag matched exactly against note tags.
    pub tag: String,
}

impl NoteFilters {
    pub fn new(search: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            tag: tag.into(),
        }
    }

    /// Resets both fields to empty.
    pub fn clear(&mut self) {
        self.search.clear();
        self.tag.clear();
    }

    /// Returns whether no constraint is set.
    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty() && self.tag.trim().is_empty()
    }
}

/// Compiled form of `NoteFilters` used while scanning.
#[derive(Debug, Clone)]
struct NoteMatcher {
    tag: Option<String>,
    search: Option<String>,
}

impl NoteMatcher {
    fn new(filters: &NoteFilters) -> Self {
        // Only emptiness is judged on the trimmed term; the term itself is
        // matched as typed, lower-cased.
        let search = if filters.search.trim().is_empty() {
            None
        } else {
            Some(filters.search.to_lowercase())
        };

        Self {
            tag: normalize_tag(&filters.tag),
            search,
        }
    }

    fn matches(&self, note: &Note) -> bool {
        if !note.is_active() {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !note.has_tag(tag) {
                return false;
            }
        }
        match &self.search {
            Some(term) => {
                note.title.to_lowercase().contains(term.as_str())
                    || note.content.to_lowercase().contains(term.as_str())
            }
            None => true,
        }
    }
}

/// Lazily yields active notes that satisfy `filters`.
pub fn active_notes<'a>(
    notes: &'a [Note],
    filters: &NoteFilters,
) -> impl Iterator<Item = &'a Note> + Clone + 'a {
    let matcher = NoteMatcher::new(filters);
    notes.iter().filter(move |note| matcher.matches(note))
}

/// Lazily yields archived notes.
pub fn archived_notes(notes: &[Note]) -> impl Iterator<Item = &Note> + Clone + '_ {
    notes.iter().filter(|note| note.archived)
}

/// Returns the distinct tags of active notes, sorted.
pub fn active_tags(notes: &[Note]) -> Vec<String> {
    notes
        .iter()
        .filter(|note| note.is_active())
        .flat_map(|note| note.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
