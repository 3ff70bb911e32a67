use anyhow::Result;
use async_trait::async_trait;

/// Trait that every feed source must implement.
#[async_trait]
pub trait FeedProvider: Send + Sync {
    /// Fetch the current feed document, undecoded beyond JSON.
    async fn fetch_feed(&self) -> Result<serde_json::Value>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
