//! Editing state machine for the note open in the editor pane.
//!
//! The editor holds a full local copy of the selected note; field edits
//! mutate only that copy. The mirrored store is untouched until a save
//! succeeds, and failed saves or deletes leave the draft in place.

use crate::models::{CategorySnapshot, Note, NoteId};

/// Editing lifecycle: no selection, or one note copy diverging locally
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditorState {
    /// No note selected
    #[default]
    Idle,
    /// A local copy is open for editing
    Editing(Note),
}

/// The note editor: selection plus unsaved field edits
#[derive(Debug, Default)]
pub struct NoteEditor {
    state: EditorState,
}

impl NoteEditor {
    /// An idle editor
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: EditorState::Idle,
        }
    }

    /// Open `note` for editing.
    ///
    /// Last selection wins: any unsaved edits to a previously selected note
    /// are discarded silently.
    pub fn select(&mut self, note: Note) {
        self.state = EditorState::Editing(note);
    }

    /// Discard the draft and return to idle
    pub fn cancel(&mut self) {
        self.state = EditorState::Idle;
    }

    /// Edit the draft's title
    pub fn set_title(&mut self, title: impl Into<String>) {
        if let EditorState::Editing(note) = &mut self.state {
            note.title = title.into();
        }
    }

    /// Edit the draft's content
    pub fn set_content(&mut self, content: impl Into<String>) {
        if let EditorState::Editing(note) = &mut self.state {
            note.content = content.into();
        }
    }

    /// Change the draft's embedded category label
    pub fn set_category(&mut self, category: Option<CategorySnapshot>) {
        if let EditorState::Editing(note) = &mut self.state {
            note.category = category;
        }
    }

    /// The draft under edit, if any
    #[must_use]
    pub const fn draft(&self) -> Option<&Note> {
        match &self.state {
            EditorState::Editing(note) => Some(note),
            EditorState::Idle => None,
        }
    }

    /// Whether a note is open for editing
    #[must_use]
    pub const fn is_editing(&self) -> bool {
        matches!(self.state, EditorState::Editing(_))
    }

    /// Current state, for rendering
    #[must_use]
    pub const fn state(&self) -> &EditorState {
        &self.state
    }

    /// A save of `id` succeeded: release the draft.
    ///
    /// Only clears when the draft still refers to that note; a reselection
    /// that happened while the save was in flight is left alone.
    pub fn note_saved(&mut self, id: &NoteId) {
        if self.draft().is_some_and(|note| note.id == *id) {
            self.state = EditorState::Idle;
        }
    }

    /// A delete of `id` succeeded: release the draft, same guard as
    /// [`NoteEditor::note_saved`]
    pub fn note_deleted(&mut self, id: &NoteId) {
        self.note_saved(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Color, NoteDraft, UserId};
    use pretty_assertions::assert_eq;

    fn note(title: &str) -> Note {
        Note::new(
            UserId::new("uid-1"),
            NoteDraft {
                title: title.to_string(),
                content: "body".to_string(),
                category: None,
            },
        )
    }

    #[test]
    fn test_select_opens_editing() {
        let mut editor = NoteEditor::new();
        assert!(!editor.is_editing());

        editor.select(note("a"));
        assert!(editor.is_editing());
        assert_eq!(editor.draft().unwrap().title, "a");
    }

    #[test]
    fn test_last_selection_wins() {
        let mut editor = NoteEditor::new();
        editor.select(note("first"));
        editor.set_title("first, edited");

        editor.select(note("second"));
        assert_eq!(editor.draft().unwrap().title, "second");
    }

    #[test]
    fn test_edits_mutate_only_the_draft() {
        let original = note("original");
        let mut editor = NoteEditor::new();
        editor.select(original.clone());

        editor.set_title("changed");
        editor.set_content("changed body");
        editor.set_category(Some(CategorySnapshot {
            name: "Work".to_string(),
            color: Color::Blue,
        }));

        assert_eq!(original.title, "original");
        assert_eq!(original.content, "body");
        let draft = editor.draft().unwrap();
        assert_eq!(draft.title, "changed");
        assert_eq!(draft.content, "changed body");
        assert_eq!(draft.id, original.id);
    }

    #[test]
    fn test_edits_without_selection_are_ignored() {
        let mut editor = NoteEditor::new();
        editor.set_title("nobody home");
        assert!(editor.draft().is_none());
    }

    #[test]
    fn test_cancel_discards_draft() {
        let mut editor = NoteEditor::new();
        editor.select(note("a"));
        editor.cancel();
        assert_eq!(*editor.state(), EditorState::Idle);
    }

    #[test]
    fn test_note_saved_releases_matching_draft() {
        let selected = note("a");
        let mut editor = NoteEditor::new();
        editor.select(selected.clone());

        editor.note_saved(&selected.id);
        assert!(!editor.is_editing());
    }

    #[test]
    fn test_note_saved_leaves_newer_selection_alone() {
        let first = note("first");
        let second = note("second");
        let mut editor = NoteEditor::new();
        editor.select(first.clone());
        editor.select(second.clone());

        // The in-flight save of the first note resolves after reselection.
        editor.note_saved(&first.id);
        assert_eq!(editor.draft().unwrap().id, second.id);
    }

    #[test]
    fn test_note_deleted_releases_draft() {
        let selected = note("a");
        let mut editor = NoteEditor::new();
        editor.select(selected.clone());
        editor.note_deleted(&selected.id);
        assert!(!editor.is_editing());
    }
}
