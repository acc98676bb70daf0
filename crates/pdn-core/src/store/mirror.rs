//! Client-side mirror of one live remote query.
//!
//! The mirror is replaced wholesale on every snapshot. Each open subscription
//! gets a generation tag; snapshots tagged with a superseded generation are
//! dropped, so a slow emission from a previous filter can never overwrite the
//! current view.

use crate::store::documents::{Document, Query, SnapshotEvent, Snapshots};

/// How trustworthy the mirrored set currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// No subscription open
    Idle,
    /// Subscribed, first snapshot not yet applied
    Loading,
    /// Mirroring the latest snapshot
    Live,
    /// The feed dropped; contents may be stale until it recovers
    Stale,
}

/// A feed event tagged with the subscription generation that produced it
#[derive(Debug, Clone)]
pub struct Emission<D> {
    /// Generation of the subscription this event belongs to
    pub generation: u64,
    /// The event itself
    pub event: SnapshotEvent<D>,
}

/// Mirrored result set plus the provisional entries awaiting confirmation
#[derive(Debug)]
pub struct Mirror<D: Document> {
    generation: u64,
    query: Option<Query>,
    feed: Option<Snapshots<D>>,
    docs: Vec<D>,
    provisional: Vec<D>,
    freshness: Freshness,
}

impl<D: Document> Mirror<D> {
    /// An idle mirror with nothing subscribed
    #[must_use]
    pub const fn new() -> Self {
        Self {
            generation: 0,
            query: None,
            feed: None,
            docs: Vec::new(),
            provisional: Vec::new(),
            freshness: Freshness::Idle,
        }
    }

    /// Replace the subscription: supersede the old generation, clear the
    /// local set, and adopt the new feed. Returns the new generation.
    pub fn open(&mut self, query: Query, feed: Snapshots<D>) -> u64 {
        self.generation += 1;
        self.query = Some(query);
        self.feed = Some(feed);
        self.docs.clear();
        self.provisional.clear();
        self.freshness = Freshness::Loading;
        self.generation
    }

    /// Tear down: cancel the feed and clear the local set
    pub fn close(&mut self) {
        self.generation += 1;
        self.query = None;
        self.feed = None;
        self.docs.clear();
        self.provisional.clear();
        self.freshness = Freshness::Idle;
    }

    /// Current subscription generation
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// The query this mirror is subscribed to, if any
    #[must_use]
    pub const fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    /// Current freshness of the mirrored set
    #[must_use]
    pub const fn freshness(&self) -> Freshness {
        self.freshness
    }

    /// Wait for the next feed event, tagged with this mirror's generation.
    ///
    /// Pends forever while nothing is subscribed. A closed feed channel is
    /// reported once as a `Lost` event.
    pub async fn next(&mut self) -> Emission<D> {
        let Some(feed) = self.feed.as_mut() else {
            return std::future::pending().await;
        };
        match feed.recv().await {
            Some(event) => Emission {
                generation: self.generation,
                event,
            },
            None => {
                self.feed = None;
                Emission {
                    generation: self.generation,
                    event: SnapshotEvent::Lost("live query feed closed".to_string()),
                }
            }
        }
    }

    /// Apply a tagged event. Events from superseded generations are dropped;
    /// returns whether the event was applied.
    pub fn apply(&mut self, emission: Emission<D>) -> bool {
        if emission.generation != self.generation {
            tracing::debug!(
                collection = D::COLLECTION,
                stale = emission.generation,
                current = self.generation,
                "dropping emission from superseded subscription"
            );
            return false;
        }

        match emission.event {
            SnapshotEvent::Snapshot(docs) => {
                let confirmed: std::collections::HashSet<String> =
                    docs.iter().map(Document::id).collect();
                self.provisional.retain(|doc| !confirmed.contains(&doc.id()));
                self.docs = docs;
                self.sort();
                self.freshness = Freshness::Live;
            }
            SnapshotEvent::Lost(reason) => {
                tracing::warn!(collection = D::COLLECTION, %reason, "live query feed lost");
                self.freshness = Freshness::Stale;
            }
        }
        true
    }

    /// Optimistically add a locally created document until the authoritative
    /// snapshot bearing its id arrives. Entries outside the current query are
    /// ignored; duplicates are not added twice.
    pub fn insert_provisional(&mut self, doc: D) {
        let Some(query) = &self.query else {
            return;
        };
        if !doc.matches(query) {
            return;
        }
        let id = doc.id();
        if self
            .docs
            .iter()
            .chain(&self.provisional)
            .any(|existing| existing.id() == id)
        {
            return;
        }
        self.provisional.push(doc);
    }

    /// Confirmed set plus provisional entries, newest first
    #[must_use]
    pub fn visible(&self) -> Vec<D> {
        let mut all: Vec<D> = self
            .docs
            .iter()
            .chain(&self.provisional)
            .cloned()
            .collect();
        all.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()).then(a.id().cmp(&b.id())));
        all
    }

    fn sort(&mut self) {
        self.docs
            .sort_by(|a, b| b.sort_key().cmp(&a.sort_key()).then(a.id().cmp(&b.id())));
    }
}

impl<D: Document> Default for Mirror<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Color, UserId};
    use crate::store::documents::Query;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    fn owner() -> UserId {
        UserId::new("uid-1")
    }

    fn category(name: &str) -> Category {
        Category::new(name, Color::Blue, owner())
    }

    fn open_feed(mirror: &mut Mirror<Category>) -> mpsc::UnboundedSender<SnapshotEvent<Category>> {
        let (tx, rx) = mpsc::unbounded_channel();
        mirror.open(Query::owned_by(owner()), Snapshots::new(rx));
        tx
    }

    #[test]
    fn test_open_clears_previous_set() {
        let mut mirror = Mirror::new();
        let generation = {
            let _tx = open_feed(&mut mirror);
            mirror.apply(Emission {
                generation: mirror.generation(),
                event: SnapshotEvent::Snapshot(vec![category("Work")]),
            });
            assert_eq!(mirror.visible().len(), 1);
            mirror.generation()
        };

        let _tx = open_feed(&mut mirror);
        assert!(mirror.visible().is_empty());
        assert_eq!(mirror.freshness(), Freshness::Loading);
        assert!(mirror.generation() > generation);
    }

    #[test]
    fn test_stale_generation_is_dropped() {
        let mut mirror = Mirror::new();
        let _tx1 = open_feed(&mut mirror);
        let stale_generation = mirror.generation();
        let _tx2 = open_feed(&mut mirror);

        let applied = mirror.apply(Emission {
            generation: stale_generation,
            event: SnapshotEvent::Snapshot(vec![category("Work")]),
        });
        assert!(!applied);
        assert!(mirror.visible().is_empty());

        let applied = mirror.apply(Emission {
            generation: mirror.generation(),
            event: SnapshotEvent::Snapshot(vec![category("Personal")]),
        });
        assert!(applied);
        assert_eq!(mirror.visible()[0].name, "Personal");
    }

    #[test]
    fn test_lost_marks_stale_but_keeps_docs() {
        let mut mirror = Mirror::new();
        let _tx = open_feed(&mut mirror);
        mirror.apply(Emission {
            generation: mirror.generation(),
            event: SnapshotEvent::Snapshot(vec![category("Work")]),
        });

        mirror.apply(Emission {
            generation: mirror.generation(),
            event: SnapshotEvent::Lost("network".to_string()),
        });
        assert_eq!(mirror.freshness(), Freshness::Stale);
        assert_eq!(mirror.visible().len(), 1);
    }

    #[test]
    fn test_provisional_reconciled_by_id() {
        let mut mirror = Mirror::new();
        let _tx = open_feed(&mut mirror);

        let created = category("Work");
        mirror.insert_provisional(created.clone());
        assert_eq!(mirror.visible().len(), 1);

        // Authoritative snapshot confirms the same id: no duplicate.
        mirror.apply(Emission {
            generation: mirror.generation(),
            event: SnapshotEvent::Snapshot(vec![created.clone()]),
        });
        assert_eq!(mirror.visible().len(), 1);

        // A snapshot without the id discards the provisional entry.
        mirror.insert_provisional(category("Personal"));
        mirror.apply(Emission {
            generation: mirror.generation(),
            event: SnapshotEvent::Snapshot(vec![created]),
        });
        let visible = mirror.visible();
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn test_provisional_outside_query_is_ignored() {
        let mut mirror = Mirror::new();
        let _tx = open_feed(&mut mirror);

        let foreign = Category::new("Work", Color::Red, UserId::new("uid-2"));
        mirror.insert_provisional(foreign);
        assert!(mirror.visible().is_empty());
    }

    #[test]
    fn test_close_clears_and_supersedes() {
        let mut mirror = Mirror::new();
        let _tx = open_feed(&mut mirror);
        let generation = mirror.generation();
        mirror.apply(Emission {
            generation,
            event: SnapshotEvent::Snapshot(vec![category("Work")]),
        });

        mirror.close();
        assert!(mirror.visible().is_empty());
        assert_eq!(mirror.freshness(), Freshness::Idle);
        assert!(!mirror.apply(Emission {
            generation,
            event: SnapshotEvent::Snapshot(vec![category("Work")]),
        }));
    }

    #[tokio::test]
    async fn test_closed_feed_reports_lost_once() {
        let mut mirror = Mirror::new();
        let tx = open_feed(&mut mirror);
        drop(tx);

        let emission = mirror.next().await;
        assert!(matches!(emission.event, SnapshotEvent::Lost(_)));
        mirror.apply(emission);
        assert_eq!(mirror.freshness(), Freshness::Stale);
    }
}
