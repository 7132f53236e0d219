//! OAuth access-token cache for the storage backend.
//!
//! Exchanges a long-lived refresh token for short-lived access tokens and
//! keeps the current one until it is within [`TOKEN_EXPIRY_BUFFER_SECS`] of
//! expiring. Exchange failures are returned as-is; there is no retry.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use super::DownloadError;

/// Tokens are refreshed this many seconds before their reported expiry.
pub const TOKEN_EXPIRY_BUFFER_SECS: i64 = 300;

/// Default Google OAuth token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// A cached bearer token.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Whether the token can still be used at `now`, keeping the buffer.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(TOKEN_EXPIRY_BUFFER_SECS) < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

/// Refresh-token exchange with an in-memory cache.
///
/// Safe to share between concurrent pipeline runs; the mutex also keeps two
/// runs from exchanging at the same time.
pub struct OAuthTokenCache {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    cached: Mutex<Option<AccessToken>>,
}

impl OAuthTokenCache {
    pub fn new(
        client: reqwest::Client,
        client_id: String,
        client_secret: String,
        refresh_token: String,
    ) -> Self {
        Self {
            client,
            token_url: DEFAULT_TOKEN_URL.to_string(),
            client_id,
            client_secret,
            refresh_token,
            cached: Mutex::new(None),
        }
    }

    /// Set a custom token endpoint (e.g., for testing).
    pub fn with_token_url(mut self, url: String) -> Self {
        self.token_url = url;
        self
    }

    /// Return a usable access token, exchanging the refresh token if the
    /// cached one is missing or about to expire.
    pub async fn access_token(&self) -> Result<String, DownloadError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.token.clone());
            }
            tracing::debug!("cached access token expired, refreshing");
        }

        let fresh = self.exchange().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    async fn exchange(&self) -> Result<AccessToken, DownloadError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", self.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| DownloadError::Auth(format!("token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable>".to_string());
            return Err(DownloadError::Auth(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| DownloadError::Auth(format!("malformed token response: {e}")))?;

        tracing::info!(expires_in = parsed.expires_in, "obtained storage access token");
        Ok(AccessToken {
            token: parsed.access_token,
            expires_at: Utc::now() + Duration::seconds(parsed.expires_in),
        })
    }
}
