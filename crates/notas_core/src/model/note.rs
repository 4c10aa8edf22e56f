//! Note domain model.
//!
//! # Responsibility
//! - Define the note record and its serialized field names.
//! - Provide the one-way archive transition.
//!
//! # Invariants
//! - `id` is stable and never reused for another note.
//! - `archived` only moves from `false` to `true`.
//! - `tags` entries are trimmed, lower-case and non-empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a note.
pub type NoteId = Uuid;

/// Canonical note record.
///
/// Field names are serialized in camelCase to keep the stored payload shape
/// (`dueDate`, `createdAt`) readable by any client of the slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    /// Normalized tags in input order. Duplicates are kept.
    pub tags: Vec<String>,
    /// Due date exactly as the user entered it.
    pub due_date: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub archived: bool,
}

/// Note invariant violation detected by `Note::validate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// Tag is blank or not in trimmed lower-case form.
    UnnormalizedTag { id: NoteId, tag: String },
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnnormalizedTag { id, tag } => {
                write!(f, "note {id} has unnormalized tag `{tag}`")
            }
        }
    }
}

impl Error for NoteValidationError {}

/// User-supplied fields for a new note.
///
/// Every field may be empty; no validation is applied to title or content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    /// Raw comma-separated tag input, e.g. `"Work, home"`.
    pub tags: String,
    /// Raw due date input. Empty means no due date.
    pub due_date: String,
}

impl NoteDraft {
    /// Builds a draft from the four form fields.
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        tags: impl Into<String>,
        due_date: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            tags: tags.into(),
            due_date: due_date.into(),
        }
    }
}

impl Note {
    /// Creates an active note from a draft, stamping a fresh id and `created_at`.
    pub fn from_draft(draft: NoteDraft) -> Self {
        Self::from_draft_at(draft, Uuid::new_v4(), Utc::now())
    }

    /// Creates an active note with caller-provided identity and timestamp.
    ///
    /// Used by import paths and tests that need deterministic values.
    pub fn from_draft_at(draft: NoteDraft, id: NoteId, created_at: DateTime<Utc>) -> Self {
        let due_date = if draft.due_date.is_empty() {
            None
        } else {
            Some(draft.due_date)
        };

        Self {
            id,
            title: draft.title,
            content: draft.content,
            tags: parse_tags(&draft.tags),
            due_date,
            created_at,
            archived: false,
        }
    }

    /// Marks this note as archived. Returns `true` when the flag changed.
    pub fn archive(&mut self) -> bool {
        if self.archived {
            return false;
        }
        self.archived = true;
        true
    }

    /// Returns whether this note is still active (not archived).
    pub fn is_active(&self) -> bool {
        !self.archived
    }

    /// Checks record-level invariants.
    ///
    /// # Errors
    /// - `UnnormalizedTag` when a tag is blank or not trimmed lower-case.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        match self
            .tags
            .iter()
            .find(|tag| normalize_tag(tag).as_deref() != Some(tag.as_str()))
        {
            Some(tag) => Err(NoteValidationError::UnnormalizedTag {
                id: self.id,
                tag: tag.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Returns whether `tag` is one of this note's tags (exact match).
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|value| value == tag)
    }
}

/// Normalizes one tag value: trimmed and lower-cased, `None` when empty.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Splits raw comma-separated input into normalized tags.
///
/// Order and duplicates from the input are preserved.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',').filter_map(normalize_tag).collect()
}

#[cfg(test)]
mod tests {
    use super::{normalize_tag, parse_tags, Note, NoteDraft, NoteValidationError};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn parse_tags_trims_lowercases_and_drops_empty_values() {
        assert_eq!(
            parse_tags(" Work ,, HOME,  ,work"),
            vec!["work".to_string(), "home".to_string(), "work".to_string()]
        );
        assert!(parse_tags("").is_empty());
        assert!(parse_tags(" , ").is_empty());
    }

    #[test]
    fn normalize_tag_rejects_blank_values() {
        assert_eq!(normalize_tag("  "), None);
        assert_eq!(normalize_tag(" Bills "), Some("bills".to_string()));
    }

    #[test]
    fn from_draft_maps_empty_due_date_to_none() {
        let note = Note::from_draft(NoteDraft::new("t", "c", "", ""));
        assert_eq!(note.due_date, None);
        assert!(note.is_active());
    }

    #[test]
    fn validate_rejects_blank_and_mixed_case_tags() {
        let mut note = Note::from_draft(NoteDraft::new("t", "", "work, home", ""));
        assert_eq!(note.validate(), Ok(()));

        note.tags.push("Work".to_string());
        assert_eq!(
            note.validate(),
            Err(NoteValidationError::UnnormalizedTag {
                id: note.id,
                tag: "Work".to_string(),
            })
        );

        note.tags = vec![" ".to_string()];
        assert!(note.validate().is_err());
    }

    #[test]
    fn archive_is_one_way_and_reports_changes() {
        let mut note = Note::from_draft(NoteDraft::default());
        assert!(note.archive());
        assert!(!note.archive());
        assert!(note.archived);
    }

    #[test]
    fn serialized_shape_uses_camel_case_fields() {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 8, 30, 0).unwrap();
        let note = Note::from_draft_at(
            NoteDraft::new("Pay rent", "due monthly", "bills", "2024-01-01"),
            Uuid::nil(),
            created_at,
        );

        let value = serde_json::to_value(&note).unwrap();
        assert_eq!(value["dueDate"], "2024-01-01");
        assert_eq!(value["createdAt"], "2024-01-01T08:30:00Z");
        assert_eq!(value["archived"], false);
        assert_eq!(value["tags"][0], "bills");
        assert_eq!(value["id"], Uuid::nil().to_string());
    }
}
