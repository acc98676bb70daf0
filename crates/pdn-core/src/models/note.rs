//! Note model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::{CategorySnapshot, UserId};

/// A unique identifier for a note, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteId(Uuid);

impl NoteId {
    /// Create a new unique note ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A note in the system.
///
/// `category` is an embedded snapshot rather than a reference, so the note
/// keeps its label after the category entity changes or disappears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier
    pub id: NoteId,
    /// Title, may be empty
    pub title: String,
    /// Body text, may be empty
    pub content: String,
    /// Identity of the creating user
    pub owner: UserId,
    /// Category label at creation/last save; absent for uncategorized notes
    pub category: Option<CategorySnapshot>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl Note {
    /// Create a new note from a draft, owned by `owner`
    #[must_use]
    pub fn new(owner: UserId, draft: NoteDraft) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: NoteId::new(),
            title: draft.title,
            content: draft.content,
            owner,
            category: draft.category,
            created_at: now,
            updated_at: now,
        }
    }

    /// List label: the title, or the first content line when the title is
    /// empty, truncated to `max_len` characters
    #[must_use]
    pub fn title_preview(&self, max_len: usize) -> String {
        let source = if self.title.trim().is_empty() {
            self.content.lines().next().unwrap_or("")
        } else {
            &self.title
        };
        source.chars().take(max_len).collect()
    }

    /// Bump `updated_at` to now
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp_millis();
    }

    /// Whether this note carries the given embedded category name
    #[must_use]
    pub fn has_category(&self, name: &str) -> bool {
        self.category
            .as_ref()
            .is_some_and(|snapshot| snapshot.name == name)
    }
}

/// New-note form state, reset to empty after a successful creation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    /// Entered title
    pub title: String,
    /// Entered body
    pub content: String,
    /// Category label to embed, if any
    pub category: Option<CategorySnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Color;
    use pretty_assertions::assert_eq;

    fn draft(title: &str, content: &str) -> NoteDraft {
        NoteDraft {
            title: title.to_string(),
            content: content.to_string(),
            category: None,
        }
    }

    #[test]
    fn test_note_id_unique() {
        let id1 = NoteId::new();
        let id2 = NoteId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_note_id_parse() {
        let id = NoteId::new();
        let parsed: NoteId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_note_new() {
        let note = Note::new(UserId::new("uid-1"), draft("Title", "Body"));
        assert_eq!(note.title, "Title");
        assert_eq!(note.content, "Body");
        assert_eq!(note.owner.as_str(), "uid-1");
        assert!(note.category.is_none());
        assert_eq!(note.created_at, note.updated_at);
    }

    #[test]
    fn test_empty_title_and_content_are_valid() {
        let note = Note::new(UserId::new("uid-1"), draft("", ""));
        assert_eq!(note.title, "");
        assert_eq!(note.content, "");
    }

    #[test]
    fn test_title_preview_prefers_title() {
        let note = Note::new(UserId::new("uid-1"), draft("Groceries", "milk\neggs"));
        assert_eq!(note.title_preview(50), "Groceries");
        assert_eq!(note.title_preview(4), "Groc");
    }

    #[test]
    fn test_title_preview_falls_back_to_content() {
        let note = Note::new(UserId::new("uid-1"), draft("  ", "First line\nSecond"));
        assert_eq!(note.title_preview(50), "First line");
    }

    #[test]
    fn test_touch_bumps_updated_at() {
        let mut note = Note::new(UserId::new("uid-1"), draft("a", "b"));
        let before = note.updated_at;
        note.touch();
        assert!(note.updated_at >= before);
    }

    #[test]
    fn test_has_category_matches_embedded_name() {
        let mut note = Note::new(UserId::new("uid-1"), draft("a", "b"));
        assert!(!note.has_category("Work"));

        note.category = Some(CategorySnapshot {
            name: "Work".to_string(),
            color: Color::Blue,
        });
        assert!(note.has_category("Work"));
        assert!(!note.has_category("Personal"));
    }
}
