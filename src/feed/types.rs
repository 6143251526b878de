use chrono::{DateTime, Utc};

/// Normalized feed entry (provider-agnostic). Produced fresh on every
/// fetch; nothing here is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub video_id: String,
    pub title: String,
    pub link: String,
    pub published: DateTime<Utc>,
    pub author: String,
}
