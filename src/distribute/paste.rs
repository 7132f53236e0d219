//! Paste-hosting providers and the ordered fallback chain.
//!
//! Each provider is one POST plus a predicate on the response. The chain
//! tries them strictly in order, at most once each, and stops at the first
//! success.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_PASTE_RS_ENDPOINT: &str = "https://paste.rs/";
pub const DEFAULT_PASTE_RS_URL_PREFIX: &str = "https://paste.rs/";
pub const DEFAULT_DPASTE_ENDPOINT: &str = "https://dpaste.com/api/v2/";
pub const DEFAULT_DPASTE_URL_PREFIX: &str = "https://dpaste.com/";
pub const DEFAULT_HASTEBIN_ENDPOINT: &str = "https://hastebin.skyra.pw/documents";
pub const DEFAULT_HASTEBIN_VIEW_BASE: &str = "https://hastebin.skyra.pw";
pub const DEFAULT_PASTES_DEV_ENDPOINT: &str = "https://api.pastes.dev/post";
pub const DEFAULT_PASTES_DEV_VIEW_BASE: &str = "https://pastes.dev";

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum PasteError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("rejected with HTTP {0}")]
    Rejected(u16),

    #[error("unexpected response body: {0}")]
    UnexpectedBody(String),

    #[error("all paste providers failed: {}", .0.join("; "))]
    AllProvidersFailed(Vec<String>),
}

/// One paste-hosting service.
#[async_trait]
pub trait PasteProvider: Send + Sync {
    /// Short name used in logs and aggregated errors.
    fn name(&self) -> &str;

    /// Upload `content` and return its public URL.
    async fn upload(&self, content: &str) -> Result<String, PasteError>;
}

/// How the content goes into the request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteBody {
    /// The raw text as `text/plain`.
    Raw,
    /// A form with the text under the given field name.
    Form(&'static str),
}

/// Provider whose response body is the paste URL itself. Only URLs under
/// the provider's own `url_prefix` count as a paste.
pub struct UrlResponseProvider {
    name: String,
    client: reqwest::Client,
    endpoint: String,
    body: PasteBody,
    url_prefix: String,
}

impl UrlResponseProvider {
    pub fn new(
        name: &str,
        client: reqwest::Client,
        endpoint: String,
        body: PasteBody,
        url_prefix: String,
    ) -> Self {
        Self {
            name: name.to_string(),
            client,
            endpoint,
            body,
            url_prefix,
        }
    }
}

#[async_trait]
impl PasteProvider for UrlResponseProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn upload(&self, content: &str) -> Result<String, PasteError> {
        let request = self.client.post(&self.endpoint);
        let request = match self.body {
            PasteBody::Raw => request
                .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(content.to_string()),
            PasteBody::Form(field) => request.form(&[(field, content), ("expiry_days", "7")]),
        };

        let text = send(request).await?;
        let candidate = text.trim();
        match Url::parse(candidate) {
            Ok(url)
                if matches!(url.scheme(), "http" | "https")
                    && candidate.starts_with(&self.url_prefix)
                    && candidate.len() > self.url_prefix.len() =>
            {
                Ok(candidate.to_string())
            }
            _ => Err(PasteError::UnexpectedBody(preview(candidate))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct KeyResponse {
    key: String,
}

/// Provider that answers `{"key": "..."}`; the paste lives at
/// `{view_base}/{key}`.
pub struct KeyResponseProvider {
    name: String,
    client: reqwest::Client,
    endpoint: String,
    view_base: String,
}

impl KeyResponseProvider {
    pub fn new(name: &str, client: reqwest::Client, endpoint: String, view_base: String) -> Self {
        Self {
            name: name.to_string(),
            client,
            endpoint,
            view_base,
        }
    }
}

#[async_trait]
impl PasteProvider for KeyResponseProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn upload(&self, content: &str) -> Result<String, PasteError> {
        let request = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(content.to_string());

        let text = send(request).await?;
        let parsed: KeyResponse = serde_json::from_str(&text)
            .map_err(|_| PasteError::UnexpectedBody(preview(&text)))?;
        let key = parsed.key.trim();
        let well_formed = key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if key.is_empty() || !well_formed {
            return Err(PasteError::UnexpectedBody(preview(&text)));
        }
        Ok(format!("{}/{key}", self.view_base.trim_end_matches('/')))
    }
}

async fn send(request: reqwest::RequestBuilder) -> Result<String, PasteError> {
    let response = request
        .send()
        .await
        .map_err(|e| PasteError::Request(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(PasteError::Rejected(status.as_u16()));
    }
    response
        .text()
        .await
        .map_err(|e| PasteError::Request(e.to_string()))
}

fn preview(body: &str) -> String {
    const MAX: usize = 80;
    if body.chars().count() <= MAX {
        body.to_string()
    } else {
        let cut: String = body.chars().take(MAX).collect();
        format!("{cut}…")
    }
}

/// Endpoints of the four built-in providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PasteEndpoints {
    pub paste_rs: String,
    /// Start of every URL paste.rs hands back.
    pub paste_rs_url_prefix: String,
    pub dpaste: String,
    pub dpaste_url_prefix: String,
    pub hastebin: String,
    pub hastebin_view_base: String,
    pub pastes_dev: String,
    pub pastes_dev_view_base: String,
}

impl Default for PasteEndpoints {
    fn default() -> Self {
        Self {
            paste_rs: DEFAULT_PASTE_RS_ENDPOINT.to_string(),
            paste_rs_url_prefix: DEFAULT_PASTE_RS_URL_PREFIX.to_string(),
            dpaste: DEFAULT_DPASTE_ENDPOINT.to_string(),
            dpaste_url_prefix: DEFAULT_DPASTE_URL_PREFIX.to_string(),
            hastebin: DEFAULT_HASTEBIN_ENDPOINT.to_string(),
            hastebin_view_base: DEFAULT_HASTEBIN_VIEW_BASE.to_string(),
            pastes_dev: DEFAULT_PASTES_DEV_ENDPOINT.to_string(),
            pastes_dev_view_base: DEFAULT_PASTES_DEV_VIEW_BASE.to_string(),
        }
    }
}

/// Ordered fallback over [`PasteProvider`]s.
#[derive(Clone)]
pub struct PasteChain {
    providers: Vec<Arc<dyn PasteProvider>>,
}

impl PasteChain {
    pub fn new(providers: Vec<Arc<dyn PasteProvider>>) -> Self {
        Self { providers }
    }

    /// The four built-in providers in their fixed order.
    pub fn from_endpoints(client: reqwest::Client, endpoints: &PasteEndpoints) -> Self {
        Self::new(vec![
            Arc::new(UrlResponseProvider::new(
                "paste.rs",
                client.clone(),
                endpoints.paste_rs.clone(),
                PasteBody::Raw,
                endpoints.paste_rs_url_prefix.clone(),
            )),
            Arc::new(UrlResponseProvider::new(
                "dpaste",
                client.clone(),
                endpoints.dpaste.clone(),
                PasteBody::Form("content"),
                endpoints.dpaste_url_prefix.clone(),
            )),
            Arc::new(KeyResponseProvider::new(
                "hastebin",
                client.clone(),
                endpoints.hastebin.clone(),
                endpoints.hastebin_view_base.clone(),
            )),
            Arc::new(KeyResponseProvider::new(
                "pastes.dev",
                client,
                endpoints.pastes_dev.clone(),
                endpoints.pastes_dev_view_base.clone(),
            )),
        ])
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Upload through the first provider that succeeds.
    pub async fn upload(&self, content: &str) -> Result<String, PasteError> {
        let mut failures = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            match provider.upload(content).await {
                Ok(url) => {
                    tracing::info!(
                        provider = %provider.name(),
                        url = %url,
                        "Transcript published"
                    );
                    return Ok(url);
                }
                Err(e) => {
                    tracing::warn!(
                        provider = %provider.name(),
                        error = %e,
                        "Paste provider failed"
                    );
                    failures.push(format!("{}: {e}", provider.name()));
                }
            }
        }

        Err(PasteError::AllProvidersFailed(failures))
    }
}
