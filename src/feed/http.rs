use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use tracing::debug;

use super::provider::FeedProvider;

/// Feed source backed by a plain HTTP GET against the configured schedule URL.
pub struct HttpFeed {
    http: Client,
    url: String,
}

impl HttpFeed {
    pub fn new(url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpFeed {
            http,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl FeedProvider for HttpFeed {
    fn name(&self) -> &str {
        "http-feed"
    }

    async fn fetch_feed(&self) -> Result<serde_json::Value> {
        // Millisecond timestamp defeats intermediary caches on the feed host
        let url = format!("{}?timestamp={}", self.url, Utc::now().timestamp_millis());
        debug!("Fetching match feed from {}", url);

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("Feed request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("Feed error: {}", resp.status());
        }

        let raw: serde_json::Value = resp.json().await.context("Failed to parse feed response")?;
        Ok(raw)
    }
}
