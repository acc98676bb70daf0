//! Session identity plumbing.
//!
//! The external identity provider is the sole source of truth for who is
//! signed in; this module exposes it as one process-wide observable value.
//! Downstream components react to transitions instead of polling a global.

mod memory;

pub use memory::MemoryIdentityProvider;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::Result;
use crate::models::UserId;

/// The authenticated user as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable identity value stamped on owned entities
    pub user_id: UserId,
    /// Email, when the provider reports one
    pub email: Option<String>,
    /// Display name, when the provider reports one
    pub display_name: Option<String>,
}

impl Identity {
    /// Identity with only a user id
    #[must_use]
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            display_name: None,
        }
    }
}

/// Boundary to the external identity provider.
///
/// `identities` carries the current value and every later transition;
/// dropping the receiver releases the subscription.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Subscribe to identity changes for the lifetime of the receiver
    fn identities(&self) -> watch::Receiver<Option<Identity>>;

    /// Authenticate and transition to signed-in
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity>;

    /// End the session and transition to signed-out
    async fn sign_out(&self) -> Result<()>;
}

/// Handle on the session's identity feed.
///
/// Subscribed once at startup; dropping it is the teardown. Holds no
/// credential state of its own.
#[derive(Debug)]
pub struct Session {
    feed: watch::Receiver<Option<Identity>>,
}

impl Session {
    /// Subscribe to the provider's identity feed
    pub fn new(provider: &impl IdentityProvider) -> Self {
        Self {
            feed: provider.identities(),
        }
    }

    /// The identity right now, if signed in
    #[must_use]
    pub fn current(&self) -> Option<Identity> {
        self.feed.borrow().clone()
    }

    /// Whether a user is signed in right now
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.feed.borrow().is_some()
    }

    /// Mark the current value as observed.
    ///
    /// Used when a transition was already handled out of band (the caller
    /// itself triggered the sign-in/out), so [`Session::changed`] does not
    /// report it a second time.
    pub fn mark_seen(&mut self) {
        self.feed.borrow_and_update();
    }

    /// Wait for the next identity transition and return the new value.
    ///
    /// Pends forever once the provider is gone; the session never reports
    /// spurious transitions after teardown.
    pub async fn changed(&mut self) -> Option<Identity> {
        match self.feed.changed().await {
            Ok(()) => self.feed.borrow_and_update().clone(),
            Err(_) => std::future::pending().await,
        }
    }
}
