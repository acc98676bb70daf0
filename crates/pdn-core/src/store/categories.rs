//! Live mirror of the user's category collection

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::{Category, CategoryDraft, CategoryId, CategoryPatch, UserId};
use crate::store::documents::{Collection, Query};
use crate::store::mirror::{Emission, Freshness, Mirror};

/// Client-side mirror of the categories collection, scoped to one owner.
///
/// The mirrored set is owned exclusively by this store; UI code reads
/// [`CategoryStore::categories`] and goes through the operations below for
/// every change.
pub struct CategoryStore<C: Collection<Category>> {
    backend: Arc<C>,
    mirror: Mirror<Category>,
}

impl<C: Collection<Category>> CategoryStore<C> {
    /// A disconnected store backed by `backend`
    pub fn new(backend: Arc<C>) -> Self {
        Self {
            backend,
            mirror: Mirror::new(),
        }
    }

    /// Open (or replace) the live subscription for `owner`.
    ///
    /// Returns the new subscription generation; emissions tagged with an
    /// older generation are dropped by [`CategoryStore::apply`].
    pub async fn subscribe(&mut self, owner: &UserId) -> Result<u64> {
        let query = Query::owned_by(owner.clone());
        let feed = self.backend.watch(query.clone()).await?;
        Ok(self.mirror.open(query, feed))
    }

    /// Cancel the subscription and clear the mirror (owner became absent)
    pub fn disconnect(&mut self) {
        self.mirror.close();
    }

    /// Validate the draft and write the new category remotely.
    ///
    /// The entity is optimistically visible at once and reconciled when the
    /// authoritative emission arrives. Requires an active subscription.
    pub async fn create(&mut self, draft: &CategoryDraft) -> Result<Category> {
        let (name, color) = draft.validate()?;
        let owner = self
            .mirror
            .query()
            .map(|query| query.owner.clone())
            .ok_or(Error::SignedOut)?;

        let category = Category::new(name, color, owner);
        self.backend.create(&category).await?;
        self.mirror.insert_provisional(category.clone());
        Ok(category)
    }

    /// Patch the given fields; a missing id surfaces as the remote's
    /// `NotFound` rejection
    pub async fn update(&self, id: &CategoryId, patch: &CategoryPatch) -> Result<()> {
        patch.validate()?;
        self.backend
            .patch(&id.as_str(), serde_json::to_value(patch)?)
            .await
    }

    /// Delete remotely; deleting an already-deleted id is not an error
    pub async fn delete(&self, id: &CategoryId) -> Result<()> {
        self.backend.delete(&id.as_str()).await
    }

    /// The visible category set, newest first
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        self.mirror.visible()
    }

    /// Freshness of the mirrored set
    #[must_use]
    pub const fn freshness(&self) -> Freshness {
        self.mirror.freshness()
    }

    /// Wait for the next tagged feed event
    pub async fn next_emission(&mut self) -> Emission<Category> {
        self.mirror.next().await
    }

    /// Apply a tagged feed event; stale generations are dropped
    pub fn apply(&mut self, emission: Emission<Category>) -> bool {
        self.mirror.apply(emission)
    }

    /// Apply the next feed event (test/synchronization helper)
    pub async fn sync(&mut self) -> bool {
        let emission = self.next_emission().await;
        self.apply(emission)
    }
}
