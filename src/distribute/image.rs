//! HTML-to-image rendering service (htmlcsstoimage-compatible).

use serde::Deserialize;

/// Default rendering endpoint.
pub const DEFAULT_IMAGE_ENDPOINT: &str = "https://hcti.io/v1/image";

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ImageError {
    #[error("image service credentials not configured")]
    NotConfigured,

    #[error("image service request failed: {0}")]
    Request(String),

    #[error("image service returned an unexpected response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Deserialize)]
struct RenderResponse {
    url: Option<String>,
}

/// Client for the image-rendering service.
///
/// Both credentials are optional at construction so that a missing one can
/// be reported per call without touching the network.
#[derive(Debug, Clone)]
pub struct ImageRenderer {
    client: reqwest::Client,
    endpoint: String,
    user_id: Option<String>,
    api_key: Option<String>,
}

impl ImageRenderer {
    pub fn new(client: reqwest::Client, user_id: Option<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: DEFAULT_IMAGE_ENDPOINT.to_string(),
            user_id: user_id.filter(|s| !s.is_empty()),
            api_key: api_key.filter(|s| !s.is_empty()),
        }
    }

    /// Set a custom endpoint (e.g., for testing).
    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.user_id.is_some() && self.api_key.is_some()
    }

    /// Render `html` and return the hosted image URL.
    pub async fn render(&self, html: &str) -> Result<String, ImageError> {
        let (Some(user_id), Some(api_key)) = (&self.user_id, &self.api_key) else {
            return Err(ImageError::NotConfigured);
        };

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(user_id, Some(api_key))
            .json(&serde_json::json!({
                "html": html,
                "device_scale": 2,
            }))
            .send()
            .await
            .map_err(|e| ImageError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImageError::Request(format!("HTTP {status}: {body}")));
        }

        let parsed: RenderResponse = response
            .json()
            .await
            .map_err(|e| ImageError::InvalidResponse(e.to_string()))?;

        parsed
            .url
            .filter(|u| u.starts_with("http"))
            .ok_or_else(|| ImageError::InvalidResponse("missing url field".to_string()))
    }
}
