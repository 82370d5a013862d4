//! HTTP client for the remote game catalog

use super::{RemoteCatalog, RemoteGameInfo};
use crate::config::CatalogConfig;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

const BASE_RETRY_DELAY_MS: u64 = 2000;
const MAX_RETRY_DELAY_MS: u64 = 60000;

/// JSON catalog client
#[derive(Clone)]
pub struct CatalogClient {
    client: Arc<reqwest::Client>,
    base_url: String,
    max_retries: u32,
}

impl CatalogClient {
    /// Create a new catalog client from configuration
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(key) = config.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            headers.insert("apikey", HeaderValue::from_str(key).context("Invalid API key")?);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("gamewatch/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client: Arc::new(client),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries.max(1),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET a JSON document, retrying on rate limits and server errors.
    ///
    /// Returns `Ok(None)` on 404.
    async fn get_json<T>(&self, path: &str, query: &[(&str, &str)]) -> Result<Option<T>>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let url = self.endpoint(path);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let response = self
                .client
                .get(&url)
                .query(query)
                .send()
                .await
                .with_context(|| format!("Failed to send request to {}", url))?;

            let status = response.status();

            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }

            // Handle rate limiting (429)
            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt >= self.max_retries {
                    bail!("Rate limited after {} retries", self.max_retries);
                }

                let retry_after = retry_after_delay(
                    response
                        .headers()
                        .get("retry-after")
                        .and_then(|h| h.to_str().ok()),
                    attempt,
                );

                tracing::warn!(
                    "Rate limited (attempt {}/{}), retrying in {}ms",
                    attempt,
                    self.max_retries,
                    retry_after
                );

                sleep(Duration::from_millis(retry_after)).await;
                continue;
            }

            if status.is_server_error() {
                if attempt >= self.max_retries {
                    bail!("Server error after {} retries: {}", self.max_retries, status);
                }

                let delay = backoff_delay(attempt);
                tracing::warn!(
                    "Server error {} (attempt {}/{}), retrying in {}ms",
                    status,
                    attempt,
                    self.max_retries,
                    delay
                );

                sleep(Duration::from_millis(delay)).await;
                continue;
            }

            if status.is_client_error() {
                let error_text = response.text().await.unwrap_or_default();
                bail!("Client error {}: {}", status, error_text);
            }

            if status.is_success() {
                let body = response
                    .text()
                    .await
                    .context("Failed to read response body")?;
                let parsed = serde_json::from_str(&body)
                    .with_context(|| {
                        format!("Failed to parse catalog response: {}", body_excerpt(&body))
                    })?;
                return Ok(Some(parsed));
            }

            bail!("Unexpected response status: {}", status);
        }
    }
}

const BODY_EXCERPT_CHARS: usize = 200;

/// Wait before retrying a 429: the server's `Retry-After` seconds when
/// given, our own backoff otherwise. Either way capped.
fn retry_after_delay(header: Option<&str>, attempt: u32) -> u64 {
    header
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(|secs| secs.saturating_mul(1000).min(MAX_RETRY_DELAY_MS))
        .unwrap_or_else(|| backoff_delay(attempt))
}

/// First few hundred characters of a response body, for error messages
fn body_excerpt(body: &str) -> String {
    match body.char_indices().nth(BODY_EXCERPT_CHARS) {
        Some((end, _)) => format!("{}... ({} bytes)", &body[..end], body.len()),
        None => body.to_string(),
    }
}

/// Exponential backoff with 85-115% jitter, capped
fn backoff_delay(attempt: u32) -> u64 {
    let base = BASE_RETRY_DELAY_MS.saturating_mul(1 << (attempt.saturating_sub(1)).min(16));
    let jitter = rand::random::<f64>() * 0.3 + 0.85;
    ((base as f64 * jitter) as u64).min(MAX_RETRY_DELAY_MS)
}

#[async_trait]
impl RemoteCatalog for CatalogClient {
    async fn fetch_by_url(&self, url: &str) -> Result<Option<RemoteGameInfo>> {
        tracing::debug!("Catalog lookup by URL: {}", url);
        self.get_json("games/lookup", &[("url", url)]).await
    }

    async fn search_by_name(&self, name: &str, is_mod: bool) -> Result<Vec<RemoteGameInfo>> {
        tracing::debug!("Catalog search: '{}' (mod: {})", name, is_mod);
        let is_mod = if is_mod { "true" } else { "false" };
        let results: Option<Vec<RemoteGameInfo>> = self
            .get_json("games/search", &[("name", name), ("mod", is_mod)])
            .await?;
        Ok(results.unwrap_or_default())
    }
}
