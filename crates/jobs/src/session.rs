//! Session credentials for backend calls.
//!
//! A [`CredentialProvider`] hands out the caller's bearer token and can
//! be asked to refresh it once the backend reports it expired.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::ClientConfig;
use crate::messages::parse_error_body;

/// Errors from session handling.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No session exists, or it cannot be refreshed.
    #[error("No active session")]
    NoSession,

    /// The auth endpoint refused the refresh token.
    #[error("Session refresh failed: {0}")]
    Refresh(String),

    /// The HTTP request itself failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Source of the bearer token sent with every backend call.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Current access token, or `None` when no user is signed in.
    async fn access_token(&self) -> Option<String>;

    /// Obtain a fresh access token after the current one was rejected.
    async fn refresh(&self) -> Result<String, SessionError>;
}

// ---------------------------------------------------------------------------
// Static credential
// ---------------------------------------------------------------------------

/// A fixed token that cannot be refreshed.
pub struct StaticCredential {
    token: Option<String>,
}

impl StaticCredential {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredential {
    async fn access_token(&self) -> Option<String> {
        self.token.clone()
    }

    async fn refresh(&self) -> Result<String, SessionError> {
        Err(SessionError::NoSession)
    }
}

// ---------------------------------------------------------------------------
// Hosted auth session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct SessionTokens {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// A signed-in session against the hosted auth service.
///
/// Refreshing exchanges the refresh token at
/// `POST {base}/auth/v1/token?grant_type=refresh_token` and stores both
/// returned tokens.
pub struct SupabaseSession {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    tokens: RwLock<SessionTokens>,
}

impl SupabaseSession {
    /// Create a session whose refresh calls honour the configured request
    /// timeout.
    pub fn new(
        config: &ClientConfig,
        access_token: Option<String>,
        refresh_token: Option<String>,
    ) -> Result<Self, SessionError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(
            client,
            config,
            access_token,
            refresh_token,
        ))
    }

    pub fn with_client(
        client: reqwest::Client,
        config: &ClientConfig,
        access_token: Option<String>,
        refresh_token: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            tokens: RwLock::new(SessionTokens {
                access_token: access_token.filter(|t| !t.trim().is_empty()),
                refresh_token: refresh_token.filter(|t| !t.trim().is_empty()),
            }),
        }
    }

    /// Token endpoint used for refreshing.
    pub fn refresh_url(&self) -> String {
        format!("{}/auth/v1/token?grant_type=refresh_token", self.base_url)
    }
}

#[async_trait]
impl CredentialProvider for SupabaseSession {
    async fn access_token(&self) -> Option<String> {
        self.tokens.read().await.access_token.clone()
    }

    async fn refresh(&self) -> Result<String, SessionError> {
        let mut tokens = self.tokens.write().await;
        let refresh_token = tokens
            .refresh_token
            .clone()
            .ok_or(SessionError::NoSession)?;

        let response = self
            .client
            .post(self.refresh_url())
            .header("apikey", &self.anon_key)
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = parse_error_body(&body).message;
            tracing::warn!(status = status.as_u16(), error = %detail, "Session refresh rejected");
            return Err(SessionError::Refresh(format!("HTTP {}: {detail}", status.as_u16())));
        }

        let refreshed: RefreshResponse = response.json().await?;
        tokens.access_token = Some(refreshed.access_token.clone());
        if let Some(next) = refreshed.refresh_token {
            tokens.refresh_token = Some(next);
        }

        tracing::info!("Session refreshed");
        Ok(refreshed.access_token)
    }
}
