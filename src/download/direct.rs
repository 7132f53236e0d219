//! Direct-link downloads.

use reqwest::header;
use url::Url;

use super::drive::header_str;
use super::{headers, read_capped, ByteWindow, DownloadError};

/// Fetch the leading `cap` bytes of a direct link.
///
/// A `HEAD` request is tried first to learn the size; its failure is not
/// fatal. When the size is known and larger than the cap a `Range` request
/// is sent, otherwise a plain `GET`. The body read is capped either way.
pub async fn fetch_direct(
    client: &reqwest::Client,
    url: &Url,
    cap: u64,
) -> Result<ByteWindow, DownloadError> {
    let head_size = probe_size(client, url).await;

    let mut request = client.get(url.clone());
    let ranged = head_size.is_some_and(|size| size > cap) && cap > 0;
    if ranged {
        request = request.header(header::RANGE, format!("bytes=0-{}", cap - 1));
    }

    let response = request
        .send()
        .await
        .map_err(|e| DownloadError::Transfer(format!("unreachable: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Transfer(format!("server returned {status}")));
    }

    let content_range = header_str(&response, header::CONTENT_RANGE);
    let content_length =
        header_str(&response, header::CONTENT_LENGTH).and_then(|v| v.parse::<u64>().ok());
    let disposition = header_str(&response, header::CONTENT_DISPOSITION);

    let body = read_capped(response, cap).await?;
    if body.is_empty() {
        return Err(DownloadError::SourceUnavailable(
            "server returned an empty body".to_string(),
        ));
    }

    let logical = headers::logical_size(content_range.as_deref(), content_length, body.len());
    let filename = disposition
        .as_deref()
        .and_then(headers::content_disposition_filename)
        .or_else(|| headers::url_filename(url))
        .unwrap_or_else(|| headers::PLACEHOLDER_FILENAME.to_string());

    tracing::debug!(
        url = %url,
        %status,
        ranged,
        head_size = ?head_size,
        "direct download complete"
    );
    Ok(ByteWindow::new(body, logical, filename, cap))
}

/// Best-effort size probe. Any failure yields `None`.
async fn probe_size(client: &reqwest::Client, url: &Url) -> Option<u64> {
    match client.head(url.clone()).send().await {
        Ok(response) if response.status().is_success() => {
            header_str(&response, header::CONTENT_LENGTH).and_then(|v| v.parse().ok())
        }
        Ok(response) => {
            tracing::debug!(url = %url, status = %response.status(), "HEAD not supported");
            None
        }
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "HEAD request failed");
            None
        }
    }
}
