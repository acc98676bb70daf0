//! Token-grant auth client implementing the identity-provider boundary.
//!
//! The provider is the sole source of truth for the session: sign-in and
//! sign-out push transitions onto a watch feed consumed by the session
//! layer, and the access token is shared with the collection clients over a
//! second feed.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::watch;

use pdn_core::auth::{Identity, IdentityProvider};
use pdn_core::models::UserId;
use pdn_core::{Error, Result};

use crate::config::RemoteConfig;

/// Identity provider backed by the hosted auth API (password grant)
pub struct RestIdentityProvider {
    auth_url: String,
    api_key: String,
    client: Client,
    identities: watch::Sender<Option<Identity>>,
    tokens: watch::Sender<Option<String>>,
}

impl RestIdentityProvider {
    /// Build a signed-out provider for the configured backend
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|error| Error::RemoteWrite(error.to_string()))?;
        let (identities, _) = watch::channel(None);
        let (tokens, _) = watch::channel(None);

        Ok(Self {
            auth_url: config.auth_url(),
            api_key: config.api_key.clone(),
            client,
            identities,
            tokens,
        })
    }

    /// Access-token feed for the collection clients
    #[must_use]
    pub fn access_tokens(&self) -> watch::Receiver<Option<String>> {
        self.tokens.subscribe()
    }

    async fn request_session(&self, email: &str, password: &str) -> Result<(Identity, String)> {
        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });
        let response = self
            .client
            .post(format!("{}/token", self.auth_url))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|error| Error::RemoteWrite(error.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| Error::RemoteWrite(error.to_string()))?;
        if !status.is_success() {
            return Err(Error::RemoteWrite(parse_api_error(status, &body)));
        }

        parse_session_payload(&body)
    }
}

#[async_trait]
impl IdentityProvider for RestIdentityProvider {
    fn identities(&self) -> watch::Receiver<Option<Identity>> {
        self.identities.subscribe()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        validate_credentials(email, password)?;

        let (identity, access_token) = self.request_session(email.trim(), password).await?;
        self.tokens.send_replace(Some(access_token));
        self.identities.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<()> {
        // The local session ends regardless of what the server says.
        let token = self.tokens.send_replace(None);
        self.identities.send_replace(None);

        let Some(token) = token else {
            return Ok(());
        };
        let response = self
            .client
            .post(format!("{}/logout", self.auth_url))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|error| Error::RemoteWrite(error.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "server-side sign-out failed");
            return Err(Error::RemoteWrite(parse_api_error(status, &body)));
        }
        Ok(())
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(Error::Validation(
            "Email and password must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct SessionPayload {
    access_token: Option<String>,
    user: Option<UserPayload>,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: Option<String>,
    email: Option<String>,
}

/// Parse a sign-in response body into an identity and access token.
///
/// Public for testability — callers can exercise parsing without network
/// access.
pub fn parse_session_payload(body: &str) -> Result<(Identity, String)> {
    let payload: SessionPayload = serde_json::from_str(body)?;

    let access_token = payload
        .access_token
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            Error::RemoteWrite("Sign-in response did not include an access token".to_string())
        })?;

    let user = payload.user.ok_or_else(|| {
        Error::RemoteWrite("Sign-in response did not include a user".to_string())
    })?;
    let user_id = user
        .id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            Error::RemoteWrite("Sign-in response did not include a user id".to_string())
        })?;

    let identity = Identity {
        user_id: UserId::new(user_id),
        email: user.email,
        display_name: None,
    };
    Ok((identity, access_token))
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
}

/// Format an API error body as a short human-readable message
pub(crate) fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload
            .message
            .or(payload.error_description)
            .or(payload.error)
        {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("HTTP {}: {}", status.as_u16(), trimmed)
    }
}
