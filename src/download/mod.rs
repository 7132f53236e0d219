//! Partial downloader
//!
//! Fetches the leading bytes of a media file into a [`ByteWindow`], never
//! holding more than the configured cap in memory:
//!
//! - **Direct links**: best-effort `HEAD` for the size, then a ranged or
//!   plain `GET`; see [`direct`].
//! - **Cloud storage**: metadata first (folders and empty files fail fast),
//!   then an authenticated ranged fetch through a [`StorageBackend`]; see
//!   [`drive`].

pub mod direct;
pub mod drive;
pub mod headers;
pub mod token;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use thiserror::Error;

use crate::source::MediaSource;

pub use drive::GoogleDriveBackend;
pub use headers::PLACEHOLDER_FILENAME;
pub use token::{AccessToken, OAuthTokenCache, TOKEN_EXPIRY_BUFFER_SECS};

/// Default download ceiling (10 MiB).
pub const DEFAULT_MAX_DOWNLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Errors that can occur while fetching a byte window.
#[derive(Error, Debug, Clone)]
pub enum DownloadError {
    /// Not found, inaccessible, a folder, or empty.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// Network or range failure.
    #[error("transfer failed: {0}")]
    Transfer(String),

    /// The OAuth exchange for the storage backend failed.
    #[error("authorization failed: {0}")]
    Auth(String),

    #[error("not configured: {0}")]
    NotConfigured(String),
}

/// The leading portion of a file.
#[derive(Debug, Clone)]
pub struct ByteWindow {
    pub bytes: Bytes,
    /// Size of the whole file, which may exceed `bytes.len()`.
    pub logical_size: u64,
    pub filename: String,
}

impl ByteWindow {
    /// Build a window, truncating `bytes` to `cap`.
    pub fn new(bytes: impl Into<Bytes>, logical_size: u64, filename: String, cap: u64) -> Self {
        let mut bytes: Bytes = bytes.into();
        let cap = usize::try_from(cap).unwrap_or(usize::MAX);
        if bytes.len() > cap {
            bytes.truncate(cap);
        }
        let logical_size = logical_size.max(bytes.len() as u64);
        Self {
            bytes,
            logical_size,
            filename,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the window holds less than the whole file.
    pub fn is_partial(&self) -> bool {
        (self.bytes.len() as u64) < self.logical_size
    }
}

/// Kind of a cloud-storage entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Folder,
}

/// Metadata of a cloud-storage entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub name: String,
    pub size: u64,
    pub kind: FileKind,
}

/// Leading bytes of a cloud-storage file together with its total size.
#[derive(Debug, Clone)]
pub struct StorageBytes {
    pub bytes: Bytes,
    pub total_size: u64,
}

/// Cloud-storage collaborator.
///
/// `Ok(None)` means the entry does not exist or is not visible to the
/// configured credentials.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn metadata(&self, id: &str) -> Result<Option<FileMetadata>, DownloadError>;

    /// Fetch at most `max_bytes` from the start of the file. `known_size`
    /// lets the backend skip the range header for files under the cap.
    async fn fetch_bytes(
        &self,
        id: &str,
        known_size: Option<u64>,
        max_bytes: u64,
    ) -> Result<Option<StorageBytes>, DownloadError>;
}

/// Fetches bounded byte windows for resolved sources.
pub struct PartialDownloader {
    client: reqwest::Client,
    max_bytes: u64,
    storage: Option<Arc<dyn StorageBackend>>,
}

impl PartialDownloader {
    pub fn new(client: reqwest::Client, max_bytes: u64) -> Self {
        Self {
            client,
            max_bytes,
            storage: None,
        }
    }

    /// Attach a cloud-storage backend for drive references.
    pub fn with_storage(mut self, storage: Arc<dyn StorageBackend>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Download the leading window of `source`.
    pub async fn download(&self, source: &MediaSource) -> Result<ByteWindow, DownloadError> {
        let window = match source {
            MediaSource::DirectUrl { url } => {
                direct::fetch_direct(&self.client, url, self.max_bytes).await?
            }
            MediaSource::DriveReference { id } => self.fetch_from_storage(id).await?,
        };

        tracing::info!(
            source = source.kind(),
            filename = %window.filename,
            received = window.len(),
            logical_size = window.logical_size,
            partial = window.is_partial(),
            "downloaded byte window"
        );
        Ok(window)
    }

    async fn fetch_from_storage(&self, id: &str) -> Result<ByteWindow, DownloadError> {
        let storage = self.storage.as_ref().ok_or_else(|| {
            DownloadError::NotConfigured("no cloud-storage backend configured".to_string())
        })?;

        let meta = storage.metadata(id).await?.ok_or_else(|| {
            DownloadError::SourceUnavailable(format!("{id} not found or not shared"))
        })?;

        if meta.kind == FileKind::Folder {
            return Err(DownloadError::SourceUnavailable(format!(
                "{} is a folder",
                meta.name
            )));
        }
        if meta.size == 0 {
            return Err(DownloadError::SourceUnavailable(format!(
                "{} is empty",
                meta.name
            )));
        }

        let fetched = storage
            .fetch_bytes(id, Some(meta.size), self.max_bytes)
            .await?
            .ok_or_else(|| {
                DownloadError::SourceUnavailable(format!(
                    "content of {} is not readable",
                    meta.name
                ))
            })?;

        if fetched.bytes.is_empty() {
            return Err(DownloadError::SourceUnavailable(format!(
                "{} returned no content",
                meta.name
            )));
        }

        let logical = fetched.total_size.max(meta.size);
        Ok(ByteWindow::new(fetched.bytes, logical, meta.name, self.max_bytes))
    }
}

/// Read a response body, stopping once `cap` bytes have been collected.
///
/// The connection is dropped as soon as the cap is hit, so servers that
/// ignore the `Range` header do not cost more than the cap.
pub(crate) async fn read_capped(
    response: reqwest::Response,
    cap: u64,
) -> Result<Vec<u8>, DownloadError> {
    let cap = usize::try_from(cap).unwrap_or(usize::MAX);
    let mut buf = Vec::with_capacity(cap.min(1024 * 1024));
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DownloadError::Transfer(format!("body read failed: {e}")))?;
        let room = cap - buf.len();
        if chunk.len() >= room {
            buf.extend_from_slice(&chunk[..room]);
            break;
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_byte_window_truncates_to_cap() {
        let w = ByteWindow::new(vec![0u8; 100], 1000, "a.mkv".to_string(), 40);
        assert_eq!(w.len(), 40);
        assert_eq!(w.logical_size, 1000);
        assert!(w.is_partial());
    }

    #[test]
    fn test_byte_window_logical_size_never_below_len() {
        let w = ByteWindow::new(vec![1u8; 10], 0, "a".to_string(), 100);
        assert_eq!(w.logical_size, 10);
        assert!(!w.is_partial());
    }

    struct MockStorage {
        meta: Option<FileMetadata>,
        bytes: Option<StorageBytes>,
        fetch_calls: Mutex<Vec<(Option<u64>, u64)>>,
    }

    #[async_trait]
    impl StorageBackend for MockStorage {
        async fn metadata(&self, _id: &str) -> Result<Option<FileMetadata>, DownloadError> {
            Ok(self.meta.clone())
        }

        async fn fetch_bytes(
            &self,
            _id: &str,
            known_size: Option<u64>,
            max_bytes: u64,
        ) -> Result<Option<StorageBytes>, DownloadError> {
            self.fetch_calls.lock().push((known_size, max_bytes));
            Ok(self.bytes.clone())
        }
    }

    fn downloader(storage: MockStorage) -> (PartialDownloader, Arc<MockStorage>) {
        let storage = Arc::new(storage);
        let d = PartialDownloader::new(reqwest::Client::new(), 16).with_storage(storage.clone());
        (d, storage)
    }

    fn drive(id: &str) -> MediaSource {
        MediaSource::DriveReference { id: id.to_string() }
    }

    #[tokio::test]
    async fn test_drive_missing_file() {
        let (d, _) = downloader(MockStorage {
            meta: None,
            bytes: None,
            fetch_calls: Mutex::new(Vec::new()),
        });
        let err = d.download(&drive("x")).await.unwrap_err();
        assert!(matches!(err, DownloadError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_drive_folder_fails_before_fetch() {
        let (d, storage) = downloader(MockStorage {
            meta: Some(FileMetadata {
                name: "Season 1".to_string(),
                size: 0,
                kind: FileKind::Folder,
            }),
            bytes: None,
            fetch_calls: Mutex::new(Vec::new()),
        });
        let err = d.download(&drive("x")).await.unwrap_err();
        assert!(err.to_string().contains("folder"));
        assert!(storage.fetch_calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_drive_empty_file() {
        let (d, storage) = downloader(MockStorage {
            meta: Some(FileMetadata {
                name: "zero.mkv".to_string(),
                size: 0,
                kind: FileKind::File,
            }),
            bytes: None,
            fetch_calls: Mutex::new(Vec::new()),
        });
        let err = d.download(&drive("x")).await.unwrap_err();
        assert!(matches!(err, DownloadError::SourceUnavailable(_)));
        assert!(storage.fetch_calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_drive_window_is_capped() {
        let (d, storage) = downloader(MockStorage {
            meta: Some(FileMetadata {
                name: "film.mkv".to_string(),
                size: 4096,
                kind: FileKind::File,
            }),
            bytes: Some(StorageBytes {
                bytes: Bytes::from(vec![7u8; 64]),
                total_size: 4096,
            }),
            fetch_calls: Mutex::new(Vec::new()),
        });
        let w = d.download(&drive("x")).await.unwrap();
        assert_eq!(w.len(), 16);
        assert_eq!(w.logical_size, 4096);
        assert_eq!(w.filename, "film.mkv");
        assert_eq!(storage.fetch_calls.lock().as_slice(), &[(Some(4096), 16)]);
    }

    #[tokio::test]
    async fn test_drive_without_backend() {
        let d = PartialDownloader::new(reqwest::Client::new(), 16);
        let err = d.download(&drive("x")).await.unwrap_err();
        assert!(matches!(err, DownloadError::NotConfigured(_)));
    }
}
