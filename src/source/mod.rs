//! Source resolution
//!
//! Turns raw user input into a [`MediaSource`]: either a direct HTTP(S) link
//! or a cloud-storage file identifier. Links that point at one of the
//! configured cloud-storage hosts are never treated as direct URLs, since
//! those files need authenticated, range-aware fetching.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use url::Url;

/// Minimum length of a bare storage identifier.
pub const MIN_BARE_ID_LEN: usize = 25;

/// Errors produced while resolving a reference.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("reference is empty")]
    Empty,

    #[error("unrecognized reference: {0}")]
    Unrecognized(String),
}

/// Where the bytes for a report come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// A file identifier on the cloud-storage backend.
    DriveReference { id: String },
    /// A generic HTTP(S) link.
    DirectUrl { url: Url },
}

impl MediaSource {
    /// Short label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DriveReference { .. } => "drive",
            Self::DirectUrl { .. } => "url",
        }
    }
}

impl std::fmt::Display for MediaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DriveReference { id } => write!(f, "drive:{id}"),
            Self::DirectUrl { url } => write!(f, "{url}"),
        }
    }
}

static BARE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{25,}$").unwrap());

/// Known storage link shapes, tried in order. First match wins.
static DRIVE_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("file_view", r"/file/d/([A-Za-z0-9_-]+)"),
        ("open_id", r"open\?id=([A-Za-z0-9_-]+)"),
        ("uc_id", r"uc\?id=([A-Za-z0-9_-]+)"),
        ("query_id", r"[?&]id=([A-Za-z0-9_-]+)"),
        ("folder", r"/folders/([A-Za-z0-9_-]+)"),
        ("d_path", r"/d/([A-Za-z0-9_-]+)"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).unwrap()))
    .collect()
});

/// Classifies raw input against a set of cloud-storage hosts.
#[derive(Debug, Clone)]
pub struct SourceResolver {
    storage_domains: Vec<String>,
}

impl SourceResolver {
    pub fn new<I, S>(storage_domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            storage_domains: storage_domains
                .into_iter()
                .map(|d| d.into().trim().to_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    /// Resolve raw input into a [`MediaSource`].
    pub fn resolve(&self, raw: &str) -> Result<MediaSource, ReferenceError> {
        let input = raw.trim();
        if input.is_empty() {
            return Err(ReferenceError::Empty);
        }

        if let Some(url) = self.as_direct_url(input) {
            return Ok(MediaSource::DirectUrl { url });
        }

        extract_drive_id(input)
            .map(|id| MediaSource::DriveReference { id })
            .ok_or_else(|| ReferenceError::Unrecognized(truncate_for_error(input)))
    }

    /// Returns the parsed URL when `input` is an http(s) link to a host that
    /// is not a storage domain.
    fn as_direct_url(&self, input: &str) -> Option<Url> {
        let url = Url::parse(input).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        let host = url.host_str()?.to_lowercase();
        if self.is_storage_host(&host) {
            return None;
        }
        Some(url)
    }

    fn is_storage_host(&self, host: &str) -> bool {
        self.storage_domains
            .iter()
            .any(|d| host == d || host.ends_with(&format!(".{d}")))
    }
}

/// Extract a storage identifier from a bare id or any known link shape.
pub fn extract_drive_id(input: &str) -> Option<String> {
    if BARE_ID_RE.is_match(input) {
        return Some(input.to_string());
    }

    DRIVE_PATTERNS.iter().find_map(|(name, re)| {
        let id = re.captures(input)?.get(1)?.as_str();
        tracing::debug!(pattern = %name, id = %id, "matched storage link shape");
        Some(id.to_string())
    })
}

fn truncate_for_error(input: &str) -> String {
    const MAX: usize = 80;
    if input.chars().count() <= MAX {
        input.to_string()
    } else {
        let head: String = input.chars().take(MAX).collect();
        format!("{head}…")
    }
}
