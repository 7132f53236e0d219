//! Configuration
//!
//! A JSON5 file (every field optional) layered under environment variables.
//! Secrets are normally supplied through the environment; the file holds
//! endpoints and limits.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::channels::TelegramConfig;
use crate::distribute::{PasteEndpoints, DEFAULT_IMAGE_ENDPOINT};
use crate::download::drive::DEFAULT_DRIVE_API_BASE;
use crate::download::token::DEFAULT_TOKEN_URL;
use crate::download::DEFAULT_MAX_DOWNLOAD_BYTES;
use crate::engine::mediainfo::DEFAULT_MEDIAINFO_BINARY;
use crate::engine::DEFAULT_CHUNK_SIZE;
use crate::logging::LoggingConfig;
use crate::render::DEFAULT_MESSAGE_CAP;

/// Upper bound accepted for `maxDownloadBytes`.
pub const MAX_DOWNLOAD_CEILING: u64 = 100 * 1024 * 1024;

const REDACTED: &str = "********";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    Io { path: String, message: String },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid environment variable {name}: {message}")]
    Env { name: String, message: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Ceiling on the downloaded byte window
    pub max_download_bytes: u64,
    /// Bytes handed to the engine per feed
    pub engine_chunk_size: usize,
    /// Longest text message the channel accepts
    pub message_length_cap: usize,
    /// Longest photo caption the channel accepts
    pub caption_length_cap: usize,
    /// Timeout applied to every outbound HTTP request
    pub request_timeout_secs: u64,
    pub drive: DriveConfig,
    pub image_service: ImageServiceConfig,
    pub paste: PasteEndpoints,
    pub telegram: TelegramConfig,
    pub mediainfo: MediaInfoConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_download_bytes: DEFAULT_MAX_DOWNLOAD_BYTES,
            engine_chunk_size: DEFAULT_CHUNK_SIZE,
            message_length_cap: DEFAULT_MESSAGE_CAP,
            caption_length_cap: crate::channels::DEFAULT_CAPTION_CAP,
            request_timeout_secs: 30,
            drive: DriveConfig::default(),
            image_service: ImageServiceConfig::default(),
            paste: PasteEndpoints::default(),
            telegram: TelegramConfig::default(),
            mediainfo: MediaInfoConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Cloud-storage backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DriveConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub api_base: String,
    pub token_url: String,
    /// Hosts whose links are treated as storage references, not direct URLs
    pub domains: Vec<String>,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            refresh_token: None,
            api_base: DEFAULT_DRIVE_API_BASE.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            domains: vec![
                "drive.google.com".to_string(),
                "docs.google.com".to_string(),
                "drive.usercontent.google.com".to_string(),
            ],
        }
    }
}

impl DriveConfig {
    /// All three OAuth values are present and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str, &str)> {
        Some((
            non_empty(&self.client_id)?,
            non_empty(&self.client_secret)?,
            non_empty(&self.refresh_token)?,
        ))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Image-rendering service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageServiceConfig {
    pub user_id: Option<String>,
    pub api_key: Option<String>,
    pub endpoint: String,
}

impl Default for ImageServiceConfig {
    fn default() -> Self {
        Self {
            user_id: None,
            api_key: None,
            endpoint: DEFAULT_IMAGE_ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaInfoConfig {
    pub binary: String,
}

impl Default for MediaInfoConfig {
    fn default() -> Self {
        Self {
            binary: DEFAULT_MEDIAINFO_BINARY.to_string(),
        }
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_download_bytes == 0 {
            return Err("maxDownloadBytes must be greater than zero".to_string());
        }
        if self.max_download_bytes > MAX_DOWNLOAD_CEILING {
            return Err(format!(
                "maxDownloadBytes must not exceed {MAX_DOWNLOAD_CEILING}"
            ));
        }
        if self.engine_chunk_size == 0 {
            return Err("engineChunkSize must be greater than zero".to_string());
        }
        if self.message_length_cap == 0 || self.caption_length_cap == 0 {
            return Err("message and caption caps must be greater than zero".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("requestTimeoutSecs must be greater than zero".to_string());
        }
        if self.drive.domains.iter().any(|d| d.trim().is_empty()) {
            return Err("drive.domains must not contain empty entries".to_string());
        }
        Ok(())
    }

    /// Apply environment overrides using `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("MEDIAREPORT_MAX_DOWNLOAD_BYTES") {
            self.max_download_bytes = raw.trim().parse().map_err(|e| ConfigError::Env {
                name: "MEDIAREPORT_MAX_DOWNLOAD_BYTES".to_string(),
                message: format!("{e}"),
            })?;
        }

        let secret = |name: &str, current: &mut Option<String>| {
            if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
                *current = Some(value);
            }
        };
        secret("GDRIVE_CLIENT_ID", &mut self.drive.client_id);
        secret("GDRIVE_CLIENT_SECRET", &mut self.drive.client_secret);
        secret("GDRIVE_REFRESH_TOKEN", &mut self.drive.refresh_token);
        secret("HCTI_USER_ID", &mut self.image_service.user_id);
        secret("HCTI_API_KEY", &mut self.image_service.api_key);
        secret("TELEGRAM_BOT_TOKEN", &mut self.telegram.bot_token);
        secret("TELEGRAM_CHAT_ID", &mut self.telegram.chat_id);

        if let Some(binary) = lookup("MEDIAINFO_BIN").filter(|v| !v.is_empty()) {
            self.mediainfo.binary = binary;
        }
        Ok(())
    }

    /// Copy with every credential masked, for display.
    pub fn redacted(&self) -> Self {
        let mask = |v: &Option<String>| v.as_ref().map(|_| REDACTED.to_string());
        let mut copy = self.clone();
        copy.drive.client_secret = mask(&self.drive.client_secret);
        copy.drive.refresh_token = mask(&self.drive.refresh_token);
        copy.image_service.api_key = mask(&self.image_service.api_key);
        copy.telegram.bot_token = mask(&self.telegram.bot_token);
        copy
    }
}

/// `$CONFIG_DIR/mediareport/config.json5`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mediareport").join("config.json5"))
}

/// Parse a JSON5 document.
pub fn parse(raw: &str, origin: &str) -> Result<Config, ConfigError> {
    json5::from_str(raw).map_err(|e| ConfigError::Parse {
        path: origin.to_string(),
        message: e.to_string(),
    })
}

/// Load the file (explicit path, else the default location), apply the
/// environment, and validate.
///
/// A missing default file means defaults; a missing explicit file is an
/// error.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => match default_config_path() {
            Some(path) if path.exists() => read_file(&path)?,
            _ => Config::default(),
        },
    };

    config.apply_env(|name| std::env::var(name).ok())?;
    config.validate().map_err(ConfigError::Invalid)?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<Config, ConfigError> {
    let origin = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: origin.clone(),
        message: e.to_string(),
    })?;
    tracing::debug!(path = %origin, "Loaded config file");
    parse(&raw, &origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_download_bytes, 10 * 1024 * 1024);
        assert_eq!(config.engine_chunk_size, 5 * 1024 * 1024);
        assert_eq!(config.message_length_cap, 4096);
        assert_eq!(config.caption_length_cap, 1024);
        assert_eq!(config.drive.domains.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_json5_partial() {
        let config = parse(
            r#"{
                // comments and trailing commas are fine
                maxDownloadBytes: 2097152,
                imageService: { userId: "u" },
                paste: { pasteRs: "http://localhost:1/" },
            }"#,
            "inline",
        )
        .unwrap();
        assert_eq!(config.max_download_bytes, 2 * 1024 * 1024);
        assert_eq!(config.image_service.user_id.as_deref(), Some("u"));
        assert_eq!(config.image_service.endpoint, DEFAULT_IMAGE_ENDPOINT);
        assert_eq!(config.paste.paste_rs, "http://localhost:1/");
        assert_eq!(config.paste.dpaste, PasteEndpoints::default().dpaste);
        assert_eq!(config.engine_chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            parse("{ maxDownloadBytes: 'lots' }", "inline"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("MEDIAREPORT_MAX_DOWNLOAD_BYTES", "1024"),
                ("GDRIVE_CLIENT_ID", "id"),
                ("GDRIVE_CLIENT_SECRET", "secret"),
                ("GDRIVE_REFRESH_TOKEN", "refresh"),
                ("HCTI_API_KEY", "key"),
                ("TELEGRAM_CHAT_ID", "42"),
                ("MEDIAINFO_BIN", "/opt/mediainfo"),
            ]))
            .unwrap();
        assert_eq!(config.max_download_bytes, 1024);
        assert_eq!(config.drive.credentials(), Some(("id", "secret", "refresh")));
        assert_eq!(config.image_service.api_key.as_deref(), Some("key"));
        assert_eq!(config.image_service.user_id, None);
        assert_eq!(config.telegram.chat_id.as_deref(), Some("42"));
        assert_eq!(config.mediainfo.binary, "/opt/mediainfo");
    }

    #[test]
    fn test_env_bad_number() {
        let mut config = Config::default();
        assert!(matches!(
            config.apply_env(env(&[("MEDIAREPORT_MAX_DOWNLOAD_BYTES", "ten")])),
            Err(ConfigError::Env { .. })
        ));
    }

    #[test]
    fn test_empty_env_value_ignored() {
        let mut config = Config::default();
        config.drive.client_id = Some("from-file".to_string());
        config.apply_env(env(&[("GDRIVE_CLIENT_ID", "")])).unwrap();
        assert_eq!(config.drive.client_id.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_validate_limits() {
        let mut config = Config::default();
        config.max_download_bytes = 0;
        assert!(config.validate().is_err());

        config.max_download_bytes = MAX_DOWNLOAD_CEILING + 1;
        assert!(config.validate().is_err());

        config.max_download_bytes = MAX_DOWNLOAD_CEILING;
        assert!(config.validate().is_ok());

        config.engine_chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_drive_credentials() {
        let drive = DriveConfig {
            client_id: Some("id".to_string()),
            client_secret: Some(String::new()),
            refresh_token: Some("r".to_string()),
            ..Default::default()
        };
        assert_eq!(drive.credentials(), None);
    }

    #[test]
    fn test_redacted_masks_secrets() {
        let mut config = Config::default();
        config.drive.client_secret = Some("s3cret".to_string());
        config.telegram.bot_token = Some("123:abc".to_string());
        let shown = serde_json::to_string(&config.redacted()).unwrap();
        assert!(!shown.contains("s3cret"));
        assert!(!shown.contains("123:abc"));
        assert!(shown.contains(REDACTED));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json5");
        std::fs::write(&path, "{ engineChunkSize: 65536 }").unwrap();
        let config = load(Some(&path)).unwrap();
        assert_eq!(config.engine_chunk_size, 65536);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load(Some(&dir.path().join("absent.json5"))),
            Err(ConfigError::Io { .. })
        ));
    }
}
