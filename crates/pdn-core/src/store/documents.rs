//! Document store boundary.
//!
//! Persistence, querying, and live sync belong to the hosted document store;
//! this module defines the narrow client contract for one remote collection
//! and the snapshot feed used to mirror it locally.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::models::{Category, Note, UserId};

/// Server-side filter for a live query: always scoped to an owner, optionally
/// narrowed to documents carrying the given embedded category name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Only documents owned by this identity are visible
    pub owner: UserId,
    /// Exact embedded-category-name match, when filtering
    pub category: Option<String>,
}

impl Query {
    /// Query for everything the owner can see
    #[must_use]
    pub const fn owned_by(owner: UserId) -> Self {
        Self {
            owner,
            category: None,
        }
    }

    /// Narrow to documents labeled with the given category name
    #[must_use]
    pub fn with_category(mut self, name: impl Into<String>) -> Self {
        self.category = Some(name.into());
        self
    }
}

/// A document that can live in a remote collection
pub trait Document:
    Clone + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Collection name at the remote store
    const COLLECTION: &'static str;

    /// The document's opaque id
    fn id(&self) -> String;

    /// Whether this document satisfies the query's filter predicate
    fn matches(&self, query: &Query) -> bool;

    /// Sort key for deterministic mirror ordering, newest first
    fn sort_key(&self) -> i64;
}

impl Document for Category {
    const COLLECTION: &'static str = "categories";

    fn id(&self) -> String {
        self.id.as_str()
    }

    fn matches(&self, query: &Query) -> bool {
        self.owner == query.owner
    }

    fn sort_key(&self) -> i64 {
        self.created_at
    }
}

impl Document for Note {
    const COLLECTION: &'static str = "notes";

    fn id(&self) -> String {
        self.id.as_str()
    }

    fn matches(&self, query: &Query) -> bool {
        self.owner == query.owner
            && query
                .category
                .as_ref()
                .map_or(true, |name| self.has_category(name))
    }

    fn sort_key(&self) -> i64 {
        self.updated_at
    }
}

/// One event on a live query feed
#[derive(Debug, Clone)]
pub enum SnapshotEvent<D> {
    /// The full current result set
    Snapshot(Vec<D>),
    /// The feed lost its source; the mirror may be stale until the next
    /// snapshot arrives
    Lost(String),
}

/// Receiving half of a live query; dropping it cancels the subscription
#[derive(Debug)]
pub struct Snapshots<D> {
    rx: mpsc::UnboundedReceiver<SnapshotEvent<D>>,
}

impl<D> Snapshots<D> {
    /// Wrap a feed channel
    #[must_use]
    pub const fn new(rx: mpsc::UnboundedReceiver<SnapshotEvent<D>>) -> Self {
        Self { rx }
    }

    /// Wait for the next event; `None` once the sender side is gone
    pub async fn recv(&mut self) -> Option<SnapshotEvent<D>> {
        self.rx.recv().await
    }

    /// Take an already-delivered event without waiting
    pub fn try_recv(&mut self) -> Option<SnapshotEvent<D>> {
        self.rx.try_recv().ok()
    }
}

/// Client contract for one remote collection.
///
/// Mutations resolve asynchronously; callers observe their effect through the
/// live feed rather than a returned document.
#[async_trait]
pub trait Collection<D: Document>: Send + Sync + 'static {
    /// Store a new document under its embedded id
    async fn create(&self, doc: &D) -> Result<()>;

    /// Replace the full document; `NotFound` if the id is absent remotely
    async fn replace(&self, id: &str, doc: &D) -> Result<()>;

    /// Patch the given fields; `NotFound` if the id is absent remotely
    async fn patch(&self, id: &str, fields: serde_json::Value) -> Result<()>;

    /// Delete by id; deleting an absent id is not an error
    async fn delete(&self, id: &str) -> Result<()>;

    /// Open a live feed of full result sets for `query`
    async fn watch(&self, query: Query) -> Result<Snapshots<D>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategorySnapshot, Color, NoteDraft};
    use pretty_assertions::assert_eq;

    fn note(owner: &str, category: Option<&str>) -> Note {
        let mut note = Note::new(
            UserId::new(owner),
            NoteDraft {
                title: "t".to_string(),
                content: "c".to_string(),
                category: None,
            },
        );
        note.category = category.map(|name| CategorySnapshot {
            name: name.to_string(),
            color: Color::Blue,
        });
        note
    }

    #[test]
    fn test_note_matches_owner_scope() {
        let query = Query::owned_by(UserId::new("uid-1"));
        assert!(note("uid-1", None).matches(&query));
        assert!(!note("uid-2", None).matches(&query));
    }

    #[test]
    fn test_note_matches_category_conjunction() {
        let query = Query::owned_by(UserId::new("uid-1")).with_category("Work");
        assert!(note("uid-1", Some("Work")).matches(&query));
        assert!(!note("uid-1", Some("Personal")).matches(&query));
        assert!(!note("uid-1", None).matches(&query));
        assert!(!note("uid-2", Some("Work")).matches(&query));
    }

    #[test]
    fn test_category_ignores_category_filter() {
        let category = Category::new("Work", Color::Blue, UserId::new("uid-1"));
        let query = Query::owned_by(UserId::new("uid-1")).with_category("Personal");
        assert!(category.matches(&query));
    }

    #[test]
    fn test_collection_names() {
        assert_eq!(Note::COLLECTION, "notes");
        assert_eq!(Category::COLLECTION, "categories");
    }
}
