mod basic;
mod client;

pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Result, anyhow};

/// Issues a GET for `url` through `client` and returns the response body.
///
/// Non-success statuses are turned into errors so callers never parse an
/// HTML error page as data.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?;
    if !resp.status().is_success() {
        return Err(anyhow!("GET {} returned status {}", url, resp.status()));
    }
    Ok(resp.bytes().await?.to_vec())
}
