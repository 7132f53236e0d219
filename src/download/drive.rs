//! Google Drive storage backend.
//!
//! Uses the Drive v3 files API with a bearer token from an
//! [`OAuthTokenCache`]. Shared drives are included in every lookup.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, StatusCode};
use serde::Deserialize;

use super::{
    headers, read_capped, DownloadError, FileKind, FileMetadata, OAuthTokenCache, StorageBackend,
    StorageBytes,
};

/// Default Drive API base URL.
pub const DEFAULT_DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// MIME type Drive reports for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    #[serde(default)]
    name: Option<String>,
    /// Drive encodes sizes as decimal strings; absent for native docs.
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
}

impl From<DriveFile> for FileMetadata {
    fn from(file: DriveFile) -> Self {
        let kind = if file.mime_type.as_deref() == Some(FOLDER_MIME_TYPE) {
            FileKind::Folder
        } else {
            FileKind::File
        };
        Self {
            name: file
                .name
                .unwrap_or_else(|| headers::PLACEHOLDER_FILENAME.to_string()),
            size: file.size.and_then(|s| s.parse().ok()).unwrap_or(0),
            kind,
        }
    }
}

/// Drive v3 implementation of [`StorageBackend`].
pub struct GoogleDriveBackend {
    client: reqwest::Client,
    api_base: String,
    tokens: Arc<OAuthTokenCache>,
}

impl GoogleDriveBackend {
    pub fn new(client: reqwest::Client, tokens: Arc<OAuthTokenCache>) -> Self {
        Self {
            client,
            api_base: DEFAULT_DRIVE_API_BASE.to_string(),
            tokens,
        }
    }

    /// Set a custom API base URL (e.g., for proxy or testing).
    pub fn with_api_base(mut self, url: String) -> Self {
        self.api_base = url.trim_end_matches('/').to_string();
        self
    }

    fn file_url(&self, id: &str) -> String {
        format!("{}/files/{}", self.api_base, urlencoding::encode(id))
    }
}

#[async_trait]
impl StorageBackend for GoogleDriveBackend {
    async fn metadata(&self, id: &str) -> Result<Option<FileMetadata>, DownloadError> {
        let token = self.tokens.access_token().await?;

        let response = self
            .client
            .get(self.file_url(id))
            .bearer_auth(&token)
            .query(&[
                ("fields", "name,size,mimeType"),
                ("supportsAllDrives", "true"),
            ])
            .send()
            .await
            .map_err(|e| DownloadError::Transfer(format!("metadata request failed: {e}")))?;

        match response.status() {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => {
                tracing::debug!(id = %id, status = %response.status(), "drive file not visible");
                return Ok(None);
            }
            s => {
                return Err(DownloadError::Transfer(format!(
                    "metadata request returned {s}"
                )))
            }
        }

        let file: DriveFile = response
            .json()
            .await
            .map_err(|e| DownloadError::Transfer(format!("malformed metadata response: {e}")))?;
        Ok(Some(file.into()))
    }

    async fn fetch_bytes(
        &self,
        id: &str,
        known_size: Option<u64>,
        max_bytes: u64,
    ) -> Result<Option<StorageBytes>, DownloadError> {
        let token = self.tokens.access_token().await?;

        let mut request = self
            .client
            .get(self.file_url(id))
            .bearer_auth(&token)
            .query(&[("alt", "media"), ("supportsAllDrives", "true")]);

        let ranged = known_size.is_some_and(|size| size > max_bytes) && max_bytes > 0;
        if ranged {
            request = request.header(header::RANGE, format!("bytes=0-{}", max_bytes - 1));
        }

        let response = request
            .send()
            .await
            .map_err(|e| DownloadError::Transfer(format!("content request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::FORBIDDEN {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(DownloadError::Transfer(format!(
                "content request returned {status}"
            )));
        }

        let content_range = header_str(&response, header::CONTENT_RANGE);
        let content_length =
            header_str(&response, header::CONTENT_LENGTH).and_then(|v| v.parse::<u64>().ok());

        let body = read_capped(response, max_bytes).await?;
        let total_size =
            headers::logical_size(content_range.as_deref(), content_length, body.len())
                .max(known_size.unwrap_or(0));

        tracing::debug!(
            id = %id,
            ranged,
            received = body.len(),
            total_size,
            "fetched drive content"
        );
        Ok(Some(StorageBytes {
            bytes: Bytes::from(body),
            total_size,
        }))
    }
}

pub(crate) fn header_str(response: &reqwest::Response, name: header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_file_folder_kind() {
        let meta: FileMetadata = DriveFile {
            name: Some("Show".to_string()),
            size: None,
            mime_type: Some(FOLDER_MIME_TYPE.to_string()),
        }
        .into();
        assert_eq!(meta.kind, FileKind::Folder);
        assert_eq!(meta.size, 0);
    }

    #[test]
    fn test_drive_file_size_parsed_from_string() {
        let file: DriveFile = serde_json::from_value(serde_json::json!({
            "name": "film.mkv",
            "size": "1073741824",
            "mimeType": "video/x-matroska",
        }))
        .unwrap();
        let meta: FileMetadata = file.into();
        assert_eq!(meta.size, 1_073_741_824);
        assert_eq!(meta.kind, FileKind::File);
        assert_eq!(meta.name, "film.mkv");
    }

    #[test]
    fn test_drive_file_missing_name() {
        let meta: FileMetadata = DriveFile {
            name: None,
            size: Some("12".to_string()),
            mime_type: None,
        }
        .into();
        assert_eq!(meta.name, headers::PLACEHOLDER_FILENAME);
    }

    #[test]
    fn test_file_url_escapes_id() {
        let tokens = Arc::new(OAuthTokenCache::new(
            reqwest::Client::new(),
            String::new(),
            String::new(),
            String::new(),
        ));
        let backend = GoogleDriveBackend::new(reqwest::Client::new(), tokens)
            .with_api_base("http://localhost/drive/".to_string());
        assert_eq!(backend.file_url("a/b"), "http://localhost/drive/files/a%2Fb");
    }

    // ==================== HTTP tests ====================

    use crate::download::PartialDownloader;
    use crate::source::MediaSource;
    use axum::{
        extract::{Path, Query, State},
        http::{HeaderMap, StatusCode as HttpStatus},
        response::IntoResponse,
        routing::{get, post},
        Json, Router,
    };
    use parking_lot::Mutex;
    use std::collections::HashMap;

    const CONTENT_LEN: usize = 1000;

    /// Range headers seen on content requests, `None` for unranged ones.
    type Ranges = Arc<Mutex<Vec<Option<String>>>>;

    async fn drive_file(
        State(ranges): State<Ranges>,
        Path(id): Path<String>,
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> axum::response::Response {
        let bearer = headers.get("authorization").and_then(|v| v.to_str().ok());
        if bearer != Some("Bearer tok-1") {
            return HttpStatus::UNAUTHORIZED.into_response();
        }
        match id.as_str() {
            "secret" => return HttpStatus::FORBIDDEN.into_response(),
            "gone" => return HttpStatus::NOT_FOUND.into_response(),
            _ => {}
        }

        if query.get("alt").map(String::as_str) != Some("media") {
            return Json(serde_json::json!({
                "name": "movie.mkv",
                "size": CONTENT_LEN.to_string(),
                "mimeType": "video/x-matroska",
            }))
            .into_response();
        }

        let data = vec![7u8; CONTENT_LEN];
        let range = headers
            .get("range")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        ranges.lock().push(range.clone());
        match range {
            Some(range) => {
                let end: usize = range.trim_start_matches("bytes=0-").parse().unwrap();
                let mut h = HeaderMap::new();
                h.insert(
                    "content-range",
                    format!("bytes 0-{end}/{CONTENT_LEN}").parse().unwrap(),
                );
                (HttpStatus::PARTIAL_CONTENT, h, data[..=end].to_vec()).into_response()
            }
            None => (HttpStatus::OK, data).into_response(),
        }
    }

    async fn spawn_drive() -> (GoogleDriveBackend, Ranges) {
        let ranges: Ranges = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route(
                "/token",
                post(|| async {
                    Json(serde_json::json!({"access_token": "tok-1", "expires_in": 3600}))
                }),
            )
            .route("/drive/files/{id}", get(drive_file))
            .with_state(ranges.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = reqwest::Client::new();
        let tokens = OAuthTokenCache::new(
            client.clone(),
            "id".to_string(),
            "secret".to_string(),
            "refresh".to_string(),
        )
        .with_token_url(format!("http://{addr}/token"));
        let backend = GoogleDriveBackend::new(client, Arc::new(tokens))
            .with_api_base(format!("http://{addr}/drive"));
        (backend, ranges)
    }

    #[tokio::test]
    async fn test_metadata_with_bearer_token() {
        let (backend, _) = spawn_drive().await;
        let meta = backend.metadata("movie").await.unwrap().unwrap();
        assert_eq!(
            meta,
            FileMetadata {
                name: "movie.mkv".to_string(),
                size: CONTENT_LEN as u64,
                kind: FileKind::File,
            }
        );
    }

    #[tokio::test]
    async fn test_metadata_forbidden_and_missing_are_none() {
        let (backend, _) = spawn_drive().await;
        assert!(backend.metadata("secret").await.unwrap().is_none());
        assert!(backend.metadata("gone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_ranged_when_larger_than_cap() {
        let (backend, ranges) = spawn_drive().await;
        let fetched = backend
            .fetch_bytes("movie", Some(CONTENT_LEN as u64), 100)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.bytes.len(), 100);
        assert_eq!(fetched.total_size, CONTENT_LEN as u64);
        assert_eq!(*ranges.lock(), vec![Some("bytes=0-99".to_string())]);
    }

    #[tokio::test]
    async fn test_fetch_unranged_when_under_cap() {
        let (backend, ranges) = spawn_drive().await;
        let fetched = backend
            .fetch_bytes("movie", Some(CONTENT_LEN as u64), 4096)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.bytes.len(), CONTENT_LEN);
        assert_eq!(*ranges.lock(), vec![None]);
    }

    #[tokio::test]
    async fn test_fetch_forbidden_is_none() {
        let (backend, _) = spawn_drive().await;
        assert!(backend
            .fetch_bytes("secret", Some(10), 100)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_downloader_maps_hidden_file_to_source_unavailable() {
        let (backend, _) = spawn_drive().await;
        let downloader =
            PartialDownloader::new(reqwest::Client::new(), 100).with_storage(Arc::new(backend));

        let hidden = MediaSource::DriveReference {
            id: "secret".to_string(),
        };
        assert!(matches!(
            downloader.download(&hidden).await,
            Err(DownloadError::SourceUnavailable(_))
        ));

        let movie = MediaSource::DriveReference {
            id: "movie".to_string(),
        };
        let window = downloader.download(&movie).await.unwrap();
        assert_eq!(window.len(), 100);
        assert_eq!(window.logical_size, CONTENT_LEN as u64);
        assert_eq!(window.filename, "movie.mkv");
    }
}
