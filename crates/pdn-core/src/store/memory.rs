//! In-memory document collection for tests and offline runs.
//!
//! Mirrors the remote store's observable behavior: every mutation notifies
//! each live watcher with the full current result set for its query, and
//! watchers whose receivers were dropped are pruned (unsubscribe).

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::error::{Error, Result};
use crate::store::documents::{Collection, Document, Query, SnapshotEvent, Snapshots};

struct Watcher<D> {
    query: Query,
    tx: mpsc::UnboundedSender<SnapshotEvent<D>>,
}

struct Inner<D> {
    docs: BTreeMap<String, D>,
    watchers: Vec<Watcher<D>>,
}

/// One in-memory collection of documents of type `D`
pub struct MemoryCollection<D: Document> {
    inner: Mutex<Inner<D>>,
}

impl<D: Document> MemoryCollection<D> {
    /// An empty collection
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                docs: BTreeMap::new(),
                watchers: Vec::new(),
            }),
        }
    }

    /// Number of live watchers (dropped receivers are pruned first)
    pub async fn active_watchers(&self) -> usize {
        let mut inner = self.inner.lock().await;
        inner.watchers.retain(|watcher| !watcher.tx.is_closed());
        inner.watchers.len()
    }

    /// Push a `Lost` event to every live watcher, as a dropped feed would
    pub async fn interrupt(&self, reason: &str) {
        let inner = self.inner.lock().await;
        for watcher in &inner.watchers {
            let _ = watcher.tx.send(SnapshotEvent::Lost(reason.to_string()));
        }
    }

    fn notify(inner: &mut Inner<D>) {
        inner.watchers.retain(|watcher| !watcher.tx.is_closed());
        for watcher in &inner.watchers {
            let set = Self::result_set(&inner.docs, &watcher.query);
            let _ = watcher.tx.send(SnapshotEvent::Snapshot(set));
        }
    }

    fn result_set(docs: &BTreeMap<String, D>, query: &Query) -> Vec<D> {
        docs.values()
            .filter(|doc| doc.matches(query))
            .cloned()
            .collect()
    }
}

impl<D: Document> Default for MemoryCollection<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<D: Document> Collection<D> for MemoryCollection<D> {
    async fn create(&self, doc: &D) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let id = doc.id();
        if inner.docs.contains_key(&id) {
            return Err(Error::RemoteWrite(format!("Document already exists: {id}")));
        }
        inner.docs.insert(id, doc.clone());
        Self::notify(&mut inner);
        Ok(())
    }

    async fn replace(&self, id: &str, doc: &D) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if !inner.docs.contains_key(id) {
            return Err(Error::NotFound(id.to_string()));
        }
        inner.docs.insert(id.to_string(), doc.clone());
        Self::notify(&mut inner);
        Ok(())
    }

    async fn patch(&self, id: &str, fields: serde_json::Value) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let Some(existing) = inner.docs.get(id) else {
            return Err(Error::NotFound(id.to_string()));
        };

        let mut value = serde_json::to_value(existing)?;
        let (Some(target), serde_json::Value::Object(updates)) = (value.as_object_mut(), fields)
        else {
            return Err(Error::Validation(
                "Patch payload must be a JSON object".to_string(),
            ));
        };
        for (key, field) in updates {
            target.insert(key, field);
        }

        let patched: D = serde_json::from_value(value)?;
        inner.docs.insert(id.to_string(), patched);
        Self::notify(&mut inner);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.docs.remove(id).is_some() {
            Self::notify(&mut inner);
        }
        Ok(())
    }

    async fn watch(&self, query: Query) -> Result<Snapshots<D>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().await;

        // Initial snapshot so new subscribers start from the current set.
        let _ = tx.send(SnapshotEvent::Snapshot(Self::result_set(
            &inner.docs,
            &query,
        )));
        inner.watchers.push(Watcher { query, tx });
        Ok(Snapshots::new(rx))
    }
}
