pub mod types;
pub mod youtube;

use anyhow::Result;
use async_trait::async_trait;
use types::FeedItem;

#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<FeedItem>>;
}
