//! HTTP helpers shared by every Google API adapter

use std::time::Duration;

use reqwest::{Client, Response, Url};

use crate::errors::{ApiFailure, SharedError, SharedResult};

/// Build a client with a bounded request timeout
pub fn build_client(timeout: Duration) -> SharedResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SharedError::HttpClientError { message: e.to_string() })
}

/// Pass through successful responses, classify everything else
pub async fn ensure_success(response: Response) -> Result<Response, ApiFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiFailure::from_status(status, &body))
}

/// Append percent-encoded path segments to a base URL
///
/// Each segment is encoded on its own, so object names containing `/`
/// stay a single segment.
pub fn endpoint<'a, I>(base: &str, segments: I) -> SharedResult<Url>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut url = Url::parse(base).map_err(|_| SharedError::InvalidConfig {
        field: "base_url".to_string(),
        value: base.to_string(),
    })?;
    url.path_segments_mut()
        .map_err(|_| SharedError::InvalidConfig {
            field: "base_url".to_string(),
            value: base.to_string(),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Audience string for a Google API base URL, e.g. `https://vision.googleapis.com/`
pub fn audience_for(base: &str) -> String {
    format!("{}/", base.trim_end_matches('/'))
}
