//! Live mirror of the user's note collection

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::{Note, NoteDraft, NoteId, UserId};
use crate::store::documents::{Collection, Query};
use crate::store::mirror::{Emission, Freshness, Mirror};

/// Client-side mirror of the notes collection, scoped to one owner and an
/// optional category filter.
///
/// Changing the filter replaces the subscription: the old feed is cancelled,
/// the local set is cleared before the new feed's first emission, and the
/// generation tag keeps any late emission from the old filter out of view.
pub struct NoteStore<C: Collection<Note>> {
    backend: Arc<C>,
    mirror: Mirror<Note>,
}

impl<C: Collection<Note>> NoteStore<C> {
    /// A disconnected store backed by `backend`
    pub fn new(backend: Arc<C>) -> Self {
        Self {
            backend,
            mirror: Mirror::new(),
        }
    }

    /// Open (or replace) the live subscription.
    ///
    /// The filter matches on the embedded category *name*: renaming a
    /// category does not relabel an already-filtered view until the filter is
    /// reselected. Returns the new subscription generation.
    pub async fn subscribe(&mut self, owner: &UserId, category: Option<&str>) -> Result<u64> {
        let mut query = Query::owned_by(owner.clone());
        if let Some(name) = category {
            query = query.with_category(name);
        }
        let feed = self.backend.watch(query.clone()).await?;
        Ok(self.mirror.open(query, feed))
    }

    /// Cancel the subscription and clear the mirror (owner became absent)
    pub fn disconnect(&mut self) {
        self.mirror.close();
    }

    /// Write a new note remotely with the subscribed owner attached.
    ///
    /// Title and content may be empty. The note is optimistically visible
    /// when it matches the active filter, and reconciled when the
    /// authoritative emission arrives. Requires an active subscription.
    pub async fn create(&mut self, draft: NoteDraft) -> Result<Note> {
        let owner = self
            .mirror
            .query()
            .map(|query| query.owner.clone())
            .ok_or(Error::SignedOut)?;

        let note = Note::new(owner, draft);
        self.backend.create(&note).await?;
        self.mirror.insert_provisional(note.clone());
        Ok(note)
    }

    /// Full-document replace of `note` by id, bumping `updated_at`.
    ///
    /// A missing id surfaces as the remote's `NotFound` rejection.
    pub async fn save(&self, note: &Note) -> Result<Note> {
        let mut doc = note.clone();
        doc.touch();
        self.backend.replace(&doc.id.as_str(), &doc).await?;
        Ok(doc)
    }

    /// Delete remotely; deleting an already-deleted id is not an error
    pub async fn delete(&self, id: &NoteId) -> Result<()> {
        self.backend.delete(&id.as_str()).await
    }

    /// Find a note in the visible set by id
    #[must_use]
    pub fn get(&self, id: &NoteId) -> Option<Note> {
        self.notes().into_iter().find(|note| note.id == *id)
    }

    /// The visible note set, most recently updated first
    #[must_use]
    pub fn notes(&self) -> Vec<Note> {
        self.mirror.visible()
    }

    /// Freshness of the mirrored set
    #[must_use]
    pub const fn freshness(&self) -> Freshness {
        self.mirror.freshness()
    }

    /// Current subscription generation
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.mirror.generation()
    }

    /// Wait for the next tagged feed event
    pub async fn next_emission(&mut self) -> Emission<Note> {
        self.mirror.next().await
    }

    /// Apply a tagged feed event; stale generations are dropped
    pub fn apply(&mut self, emission: Emission<Note>) -> bool {
        self.mirror.apply(emission)
    }

    /// Apply the next feed event (test/synchronization helper)
    pub async fn sync(&mut self) -> bool {
        let emission = self.next_emission().await;
        self.apply(emission)
    }
}
