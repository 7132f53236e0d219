//! Response header helpers for partial downloads.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Used when neither the response nor the URL yields a filename.
pub const PLACEHOLDER_FILENAME: &str = "unknown_file";

static EXT_FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)filename\*\s*=\s*(?:[\w-]+)?'[^']*'([^;]+)"#).unwrap());
static QUOTED_FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)filename\s*=\s*"([^"]*)""#).unwrap());
static BARE_FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)filename\s*=\s*([^;"\s]+)"#).unwrap());

/// Total size from a `Content-Range` value such as `bytes 0-99/12345`.
///
/// Returns `None` for an unknown total (`*`) or a malformed header.
pub fn content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse().ok()
}

/// Filename carried by a `Content-Disposition` header.
///
/// RFC 5987 `filename*=` wins over a quoted `filename="…"`, which wins over a
/// bare `filename=…`.
pub fn content_disposition_filename(value: &str) -> Option<String> {
    if let Some(caps) = EXT_FILENAME_RE.captures(value) {
        let encoded = caps[1].trim().trim_matches('"');
        if let Ok(decoded) = urlencoding::decode(encoded) {
            if let Some(name) = sanitize(&decoded) {
                return Some(name);
            }
        }
    }
    if let Some(caps) = QUOTED_FILENAME_RE.captures(value) {
        if let Some(name) = sanitize(&caps[1]) {
            return Some(name);
        }
    }
    BARE_FILENAME_RE
        .captures(value)
        .and_then(|caps| sanitize(&caps[1]))
}

/// Last non-empty, percent-decoded path segment of a URL.
pub fn url_filename(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.rev().find(|s| !s.is_empty())?;
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    sanitize(&decoded)
}

/// Logical file size, by priority: `Content-Range` total, then
/// `Content-Length`, then the number of bytes actually received.
pub fn logical_size(
    content_range: Option<&str>,
    content_length: Option<u64>,
    received: usize,
) -> u64 {
    content_range
        .and_then(content_range_total)
        .or(content_length)
        .unwrap_or(received as u64)
}

fn sanitize(name: &str) -> Option<String> {
    let name = name.trim();
    // Strip any directory component a server might slip in.
    let name = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_range_total() {
        assert_eq!(content_range_total("bytes 0-1023/987654321"), Some(987654321));
        assert_eq!(content_range_total("bytes 0-1023/*"), None);
        assert_eq!(content_range_total("garbage"), None);
    }

    #[test]
    fn test_disposition_quoted() {
        let v = r#"attachment; filename="My Movie (2020).mkv""#;
        assert_eq!(
            content_disposition_filename(v).as_deref(),
            Some("My Movie (2020).mkv")
        );
    }

    #[test]
    fn test_disposition_bare() {
        let v = "attachment; filename=episode01.mp4; size=100";
        assert_eq!(content_disposition_filename(v).as_deref(), Some("episode01.mp4"));
    }

    #[test]
    fn test_disposition_extended_wins() {
        let v = r#"attachment; filename="fallback.mkv"; filename*=UTF-8''na%C3%AFve%20cut.mkv"#;
        assert_eq!(content_disposition_filename(v).as_deref(), Some("naïve cut.mkv"));
    }

    #[test]
    fn test_disposition_without_filename() {
        assert_eq!(content_disposition_filename("inline"), None);
    }

    #[test]
    fn test_disposition_strips_directories() {
        let v = r#"attachment; filename="../../etc/passwd""#;
        assert_eq!(content_disposition_filename(v).as_deref(), Some("passwd"));
    }

    #[test]
    fn test_url_filename_decodes() {
        let url = Url::parse("https://host/a/b/My%20Film.mkv?token=1").unwrap();
        assert_eq!(url_filename(&url).as_deref(), Some("My Film.mkv"));
    }

    #[test]
    fn test_url_filename_trailing_slash() {
        let url = Url::parse("https://host/dir/video.mp4/").unwrap();
        assert_eq!(url_filename(&url).as_deref(), Some("video.mp4"));
    }

    #[test]
    fn test_url_filename_root() {
        let url = Url::parse("https://host/").unwrap();
        assert_eq!(url_filename(&url), None);
    }

    #[test]
    fn test_logical_size_priority() {
        assert_eq!(logical_size(Some("bytes 0-9/500"), Some(10), 10), 500);
        assert_eq!(logical_size(Some("bytes 0-9/*"), Some(10), 7), 10);
        assert_eq!(logical_size(None, None, 7), 7);
    }
}
