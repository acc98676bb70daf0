//! In-memory identity provider for tests and offline runs

use async_trait::async_trait;
use tokio::sync::watch;

use crate::auth::{Identity, IdentityProvider};
use crate::error::{Error, Result};
use crate::models::UserId;

/// Identity provider that accepts any non-empty credentials.
///
/// The user id is derived from the email so repeated sign-ins by the same
/// address yield the same identity.
#[derive(Debug)]
pub struct MemoryIdentityProvider {
    tx: watch::Sender<Option<Identity>>,
}

impl MemoryIdentityProvider {
    /// Create a signed-out provider
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    fn identities(&self) -> watch::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(Error::Validation(
                "Email and password must not be empty".to_string(),
            ));
        }

        let identity = Identity {
            user_id: UserId::new(format!("user:{email}")),
            email: Some(email.to_string()),
            display_name: None,
        };
        self.tx.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<()> {
        self.tx.send_replace(None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_sign_in_rejects_empty_credentials() {
        let provider = MemoryIdentityProvider::new();
        let err = provider.sign_in("  ", "pw").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_same_email_yields_same_user_id() {
        let provider = MemoryIdentityProvider::new();
        let first = provider.sign_in("ada@example.com", "pw").await.unwrap();
        provider.sign_out().await.unwrap();
        let second = provider.sign_in("ada@example.com", "pw").await.unwrap();
        assert_eq!(first.user_id, second.user_id);
    }

    #[tokio::test]
    async fn test_feed_sees_transitions() {
        let provider = MemoryIdentityProvider::new();
        let rx = provider.identities();
        assert!(rx.borrow().is_none());

        provider.sign_in("ada@example.com", "pw").await.unwrap();
        assert!(rx.borrow().is_some());

        provider.sign_out().await.unwrap();
        assert!(rx.borrow().is_none());
    }
}
