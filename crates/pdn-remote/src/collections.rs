//! REST clients for the per-collection document-store boundary.
//!
//! CRUD maps onto PostgREST-style routes; the live query contract is
//! realized as a spawned polling task that emits the full result set on
//! change, reports a lost feed after consecutive failures, retries with
//! capped exponential backoff, and exits once the receiver is dropped.

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use tokio::sync::{mpsc, watch};

use pdn_core::retry::Backoff;
use pdn_core::store::{Collection, Document, Query, SnapshotEvent, Snapshots};
use pdn_core::{Error, Result};

use crate::auth::{parse_api_error, RestIdentityProvider};
use crate::config::RemoteConfig;

/// Consecutive poll failures before the feed is reported lost
const LOST_AFTER_FAILURES: u32 = 3;

/// One hosted collection of documents of type `D`
pub struct RestCollection<D: Document> {
    endpoint: String,
    api_key: String,
    client: Client,
    tokens: watch::Receiver<Option<String>>,
    poll_interval: Duration,
    _marker: PhantomData<fn() -> D>,
}

impl<D: Document> RestCollection<D> {
    /// Client for `D`'s collection, authenticating through `provider`
    pub fn new(config: &RemoteConfig, provider: &RestIdentityProvider) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|error| Error::RemoteWrite(error.to_string()))?;

        Ok(Self {
            endpoint: format!("{}/{}", config.rest_url(), D::COLLECTION),
            api_key: config.api_key.clone(),
            client,
            tokens: provider.access_tokens(),
            poll_interval: config.poll_interval,
            _marker: PhantomData,
        })
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header("apikey", &self.api_key);
        match self.tokens.borrow().as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn fetch(&self, query: &Query) -> Result<Vec<D>> {
        let request = self
            .authorize(self.client.get(&self.endpoint))
            .query(&filter_params(query));
        let response = request
            .send()
            .await
            .map_err(|error| Error::Subscription(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Subscription(parse_api_error(status, &body)));
        }
        response
            .json::<Vec<D>>()
            .await
            .map_err(|error| Error::Subscription(error.to_string()))
    }

    async fn write(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|error| Error::RemoteWrite(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::RemoteWrite(parse_api_error(status, &body)));
        }
        Ok(response)
    }

    /// A write addressed by id, returning the affected rows; an empty result
    /// means the id did not resolve remotely.
    async fn write_by_id(&self, request: RequestBuilder, id: &str) -> Result<()> {
        let response = self
            .write(request.query(&[("id", format!("eq.{id}"))]))
            .await?;
        let affected: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|error| Error::RemoteWrite(error.to_string()))?;
        if affected.is_empty() {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl<D: Document + PartialEq> Collection<D> for RestCollection<D> {
    async fn create(&self, doc: &D) -> Result<()> {
        let request = self
            .authorize(self.client.post(&self.endpoint))
            .header("Prefer", "return=minimal")
            .json(doc);
        self.write(request).await.map(drop)
    }

    async fn replace(&self, id: &str, doc: &D) -> Result<()> {
        let request = self
            .authorize(self.client.patch(&self.endpoint))
            .header("Prefer", "return=representation")
            .json(doc);
        self.write_by_id(request, id).await
    }

    async fn patch(&self, id: &str, fields: serde_json::Value) -> Result<()> {
        let request = self
            .authorize(self.client.patch(&self.endpoint))
            .header("Prefer", "return=representation")
            .json(&fields);
        self.write_by_id(request, id).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        // No representation requested: deleting an absent id is a success.
        let request = self
            .authorize(self.client.delete(&self.endpoint))
            .header("Prefer", "return=minimal")
            .query(&[("id", format!("eq.{id}"))]);
        self.write(request).await.map(drop)
    }

    async fn watch(&self, query: Query) -> Result<Snapshots<D>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let poller = Poller {
            collection: Self {
                endpoint: self.endpoint.clone(),
                api_key: self.api_key.clone(),
                client: self.client.clone(),
                tokens: self.tokens.clone(),
                poll_interval: self.poll_interval,
                _marker: PhantomData,
            },
            query,
            tx,
        };
        tokio::spawn(poller.run());
        Ok(Snapshots::new(rx))
    }
}

struct Poller<D: Document> {
    collection: RestCollection<D>,
    query: Query,
    tx: mpsc::UnboundedSender<SnapshotEvent<D>>,
}

impl<D: Document + PartialEq> Poller<D> {
    async fn run(self) {
        let mut backoff = Backoff::default();
        let mut last: Option<Vec<D>> = None;
        let mut failures: u32 = 0;
        let mut reported_lost = false;

        loop {
            if self.tx.is_closed() {
                return; // receiver dropped: unsubscribe
            }

            match self.collection.fetch(&self.query).await {
                Ok(set) => {
                    let changed = last.as_ref() != Some(&set);
                    if changed || reported_lost {
                        if self.tx.send(SnapshotEvent::Snapshot(set.clone())).is_err() {
                            return;
                        }
                        last = Some(set);
                    }
                    failures = 0;
                    reported_lost = false;
                    backoff.reset();
                    tokio::time::sleep(self.collection.poll_interval).await;
                }
                Err(error) => {
                    failures = failures.saturating_add(1);
                    tracing::warn!(
                        collection = D::COLLECTION,
                        failures,
                        %error,
                        "live query poll failed"
                    );
                    if failures >= LOST_AFTER_FAILURES && !reported_lost {
                        reported_lost = true;
                        if self.tx.send(SnapshotEvent::Lost(error.to_string())).is_err() {
                            return;
                        }
                    }
                    tokio::time::sleep(backoff.next_delay()).await;
                }
            }
        }
    }
}

/// Query-string filters for a live query: owner scope always, embedded
/// category name when filtering
fn filter_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![
        ("select".to_string(), "*".to_string()),
        ("owner".to_string(), format!("eq.{}", query.owner)),
    ];
    if let Some(name) = &query.category {
        params.push(("category->>name".to_string(), format!("eq.{name}")));
    }
    params
}
