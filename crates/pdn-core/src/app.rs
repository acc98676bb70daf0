//! Top-level application state: one session, two live mirrors, one editor.
//!
//! Everything here runs on a single task. Work happens as reactions to three
//! kinds of external events — identity transitions, live feed emissions, and
//! user actions — with suspension only at the boundary of remote calls.

use std::sync::Arc;

use crate::auth::{Identity, IdentityProvider, Session};
use crate::error::Result;
use crate::models::{
    Category, CategoryDraft, CategoryId, CategoryPatch, Note, NoteDraft, NoteId,
};
use crate::store::{CategoryStore, Collection, NoteEditor, NoteStore};

/// The PDN client state, generic over the identity and store backends
pub struct App<P, CC, NC>
where
    P: IdentityProvider,
    CC: Collection<Category>,
    NC: Collection<Note>,
{
    provider: Arc<P>,
    session: Session,
    /// Mirror of the user's categories
    pub categories: CategoryStore<CC>,
    /// Mirror of the user's notes, narrowed by the selected category
    pub notes: NoteStore<NC>,
    /// The note open for editing, if any
    pub editor: NoteEditor,
    selected_category: Option<Category>,
    note_draft: NoteDraft,
    category_draft: CategoryDraft,
}

impl<P, CC, NC> App<P, CC, NC>
where
    P: IdentityProvider,
    CC: Collection<Category>,
    NC: Collection<Note>,
{
    /// Wire the app to its backends; starts signed out and inert
    pub fn new(provider: Arc<P>, categories: Arc<CC>, notes: Arc<NC>) -> Self {
        let session = Session::new(provider.as_ref());
        Self {
            provider,
            session,
            categories: CategoryStore::new(categories),
            notes: NoteStore::new(notes),
            editor: NoteEditor::new(),
            selected_category: None,
            note_draft: NoteDraft::default(),
            category_draft: CategoryDraft::default(),
        }
    }

    /// The identity right now, if signed in
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.session.current()
    }

    /// The active category filter, if any
    #[must_use]
    pub const fn selected_category(&self) -> Option<&Category> {
        self.selected_category.as_ref()
    }

    /// New-note form state
    pub fn note_draft_mut(&mut self) -> &mut NoteDraft {
        &mut self.note_draft
    }

    /// New-category form state
    pub fn category_draft_mut(&mut self) -> &mut CategoryDraft {
        &mut self.category_draft
    }

    /// Authenticate and bring both mirrors live
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<Identity> {
        let identity = self.provider.sign_in(email, password).await?;
        self.session.mark_seen();
        self.identity_changed(Some(identity.clone())).await?;
        Ok(identity)
    }

    /// End the session; mirrors are cleared and feeds cancelled even before
    /// the provider confirms
    pub async fn sign_out(&mut self) -> Result<()> {
        self.identity_changed(None).await?;
        let result = self.provider.sign_out().await;
        self.session.mark_seen();
        result
    }

    /// React to an identity transition.
    ///
    /// Signing in subscribes both stores for the new owner; signing out (or
    /// an owner change) tears down selection, editor, and both mirrors so no
    /// stale data stays visible.
    pub async fn identity_changed(&mut self, identity: Option<Identity>) -> Result<()> {
        match identity {
            Some(identity) => {
                let filter = self.selected_category.as_ref().map(|c| c.name.clone());
                self.categories.subscribe(&identity.user_id).await?;
                self.notes
                    .subscribe(&identity.user_id, filter.as_deref())
                    .await?;
            }
            None => {
                self.selected_category = None;
                self.editor.cancel();
                self.categories.disconnect();
                self.notes.disconnect();
            }
        }
        Ok(())
    }

    /// Narrow (or clear) the note mirror's category filter.
    ///
    /// Filtering keys on the category name; a rename while a filter is
    /// active does not relabel the view until the filter is reselected.
    pub async fn select_category(&mut self, category: Option<Category>) -> Result<()> {
        self.selected_category = category;
        if let Some(identity) = self.session.current() {
            let filter = self.selected_category.as_ref().map(|c| c.name.clone());
            self.notes
                .subscribe(&identity.user_id, filter.as_deref())
                .await?;
        }
        Ok(())
    }

    /// Create a category from the draft form; the form resets on success
    pub async fn create_category(&mut self) -> Result<Category> {
        let created = self.categories.create(&self.category_draft).await?;
        self.category_draft = CategoryDraft::default();
        Ok(created)
    }

    /// Patch an existing category
    pub async fn update_category(&self, id: &CategoryId, patch: &CategoryPatch) -> Result<()> {
        self.categories.update(id, patch).await
    }

    /// Delete a category. Notes keep their embedded snapshot, and an active
    /// filter on the deleted category's name stays in place.
    pub async fn delete_category(&self, id: &CategoryId) -> Result<()> {
        self.categories.delete(id).await
    }

    /// Create a note from the draft form; the form resets on success.
    ///
    /// A draft without a category inherits the selected category's label so
    /// the new note shows up under the active filter.
    pub async fn create_note(&mut self) -> Result<Note> {
        let mut draft = self.note_draft.clone();
        if draft.category.is_none() {
            draft.category = self.selected_category.as_ref().map(Category::snapshot);
        }
        // The form is kept on failure so the user's input is not lost.
        let note = self.notes.create(draft).await?;
        self.note_draft = NoteDraft::default();
        Ok(note)
    }

    /// Open a note from the visible set in the editor
    pub fn open_note(&mut self, id: &NoteId) -> bool {
        match self.notes.get(id) {
            Some(note) => {
                self.editor.select(note);
                true
            }
            None => false,
        }
    }

    /// Save the editor's draft via full-document replace.
    ///
    /// On success the editor returns to idle; on failure it stays in
    /// `Editing` with the error returned to the caller.
    pub async fn save_note(&mut self) -> Result<()> {
        let Some(draft) = self.editor.draft().cloned() else {
            return Ok(());
        };
        let saved = self.notes.save(&draft).await?;
        self.editor.note_saved(&saved.id);
        Ok(())
    }

    /// Delete the note open in the editor.
    ///
    /// On success the editor returns to idle; on failure it stays in
    /// `Editing` so the user does not lose the draft.
    pub async fn delete_note(&mut self) -> Result<()> {
        let Some(id) = self.editor.draft().map(|note| note.id) else {
            return Ok(());
        };
        self.notes.delete(&id).await?;
        self.editor.note_deleted(&id);
        Ok(())
    }

    /// Block until the next external event and react to it.
    ///
    /// This is the app's event loop body: identity transitions re-scope the
    /// mirrors, feed emissions refresh them, stale emissions are dropped.
    pub async fn tick(&mut self) -> Result<()> {
        enum Event {
            Identity(Option<Identity>),
            Categories(crate::store::Emission<Category>),
            Notes(crate::store::Emission<Note>),
        }

        let event = {
            let session = &mut self.session;
            let categories = &mut self.categories;
            let notes = &mut self.notes;
            tokio::select! {
                identity = session.changed() => Event::Identity(identity),
                emission = categories.next_emission() => Event::Categories(emission),
                emission = notes.next_emission() => Event::Notes(emission),
            }
        };

        match event {
            Event::Identity(identity) => self.identity_changed(identity).await?,
            Event::Categories(emission) => {
                self.categories.apply(emission);
            }
            Event::Notes(emission) => {
                self.notes.apply(emission);
            }
        }
        Ok(())
    }
}
