//! HTTP plumbing: a small client trait, a `reqwest` implementation and
//! an API-key wrapper.

mod client;
mod basic;
pub mod auth;

pub use client::HttpClient;
pub use basic::BasicClient;

use reqwest::Url;
use tracing::debug;

use crate::error::{EtlError, excerpt};

/// Issues a GET for `url` and returns the body of a successful response.
///
/// Transport failures and non-2xx statuses become [`EtlError::Upstream`].
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &Url) -> Result<Vec<u8>, EtlError> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.clone());

    let resp = client
        .execute(req)
        .await
        .map_err(|e| EtlError::upstream(url.as_str(), e.without_url().to_string()))?;

    let status = resp.status();
    debug!(url = %url, status = status.as_u16(), "Upstream responded");

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(EtlError::upstream(
            url.as_str(),
            format!("status {}: {}", status, excerpt(&body)),
        ));
    }

    let bytes = resp
        .bytes()
        .await
        .map_err(|e| EtlError::upstream(url.as_str(), e.without_url().to_string()))?;
    Ok(bytes.to_vec())
}
