use super::types::FeedItem;
use super::FeedSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::FeedConfig;

pub struct YouTubeFeed {
    client: Client,
    base_url: String,
    channel_id: String,
}

impl YouTubeFeed {
    pub fn new(config: &FeedConfig, channel_id: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .context("failed to build feed HTTP client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            channel_id: channel_id.to_string(),
        })
    }
}

#[async_trait]
impl FeedSource for YouTubeFeed {
    async fn fetch(&self) -> Result<Vec<FeedItem>> {
        let url = format!("{}?channel_id={}", self.base_url, self.channel_id);
        tracing::info!(%url, "checking feed");

        let resp = self.client.get(&url).send().await
            .context("feed request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("feed fetch failed ({}): {}", status, body);
        }

        let xml = resp.text().await.context("failed to read feed body")?;
        parse_feed(&xml)
    }
}

// ── Atom Deserialization ─────────────────────────────────────────────
// YouTube channel feeds are Atom with yt: extension elements; entry
// order is newest-first.

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    // quick-xml matches on the local name, prefix stripped
    #[serde(rename = "videoId", default)]
    video_id: String,
    #[serde(default)]
    title: String,
    link: Option<AtomLink>,
    #[serde(default)]
    published: String,
    author: Option<AtomAuthor>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: String,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    #[serde(default)]
    name: String,
}

/// Parse a channel Atom feed into normalized items. A malformed
/// document is an error (fatal for the run); an entry with an
/// unparsable publish time is skipped with a warning.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedItem>> {
    let feed: AtomFeed = quick_xml::de::from_str(xml)
        .context("failed to parse feed XML")?;

    let mut items = Vec::new();
    for entry in feed.entries {
        let published = match DateTime::parse_from_rfc3339(&entry.published) {
            Ok(dt) => dt.with_timezone(&Utc),
            Err(err) => {
                tracing::warn!(
                    video_id = %entry.video_id,
                    published = %entry.published,
                    error = %err,
                    "skipping entry with unparsable publish time"
                );
                continue;
            }
        };

        let link = entry
            .link
            .map(|l| l.href)
            .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={}", entry.video_id));

        items.push(FeedItem {
            video_id: entry.video_id,
            title: entry.title,
            link,
            published,
            author: entry.author.map(|a| a.name).unwrap_or_else(|| "Unknown".to_string()),
        });
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns="http://www.w3.org/2005/Atom">
  <link rel="self" href="http://www.youtube.com/feeds/videos.xml?channel_id=UCabc"/>
  <id>yt:channel:abc</id>
  <yt:channelId>abc</yt:channelId>
  <title>Example Channel</title>
  <author>
    <name>Example Channel</name>
    <uri>https://www.youtube.com/channel/UCabc</uri>
  </author>
  <published>2020-01-01T00:00:00+00:00</published>
  <entry>
    <id>yt:video:newer123</id>
    <yt:videoId>newer123</yt:videoId>
    <yt:channelId>abc</yt:channelId>
    <title>Second Upload</title>
    <link rel="alternate" href="https://www.youtube.com/watch?v=newer123"/>
    <author>
      <name>Example Channel</name>
      <uri>https://www.youtube.com/channel/UCabc</uri>
    </author>
    <published>2024-06-02T12:30:00+00:00</published>
    <updated>2024-06-02T13:00:00+00:00</updated>
  </entry>
  <entry>
    <id>yt:video:older456</id>
    <yt:videoId>older456</yt:videoId>
    <yt:channelId>abc</yt:channelId>
    <title>First Upload</title>
    <link rel="alternate" href="https://www.youtube.com/watch?v=older456"/>
    <author>
      <name>Example Channel</name>
      <uri>https://www.youtube.com/channel/UCabc</uri>
    </author>
    <published>2024-06-01T08:00:00+00:00</published>
    <updated>2024-06-01T08:00:00+00:00</updated>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_channel_feed() {
        let items = parse_feed(SAMPLE_FEED).unwrap();
        assert_eq!(items.len(), 2);

        // Feed order preserved (newest-first); ordering policy lives in
        // the watermark module, not here.
        let first = &items[0];
        assert_eq!(first.video_id, "newer123");
        assert_eq!(first.title, "Second Upload");
        assert_eq!(first.link, "https://www.youtube.com/watch?v=newer123");
        assert_eq!(first.author, "Example Channel");
        assert_eq!(first.published.to_rfc3339(), "2024-06-02T12:30:00+00:00");

        assert_eq!(items[1].video_id, "older456");
    }

    #[test]
    fn test_entry_without_link_falls_back_to_watch_url() {
        let xml = r#"<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <yt:videoId>vid789</yt:videoId>
    <title>No Link</title>
    <published>2024-06-03T00:00:00+00:00</published>
  </entry>
</feed>"#;
        let items = parse_feed(xml).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].link, "https://www.youtube.com/watch?v=vid789");
        assert_eq!(items[0].author, "Unknown");
    }

    #[test]
    fn test_entry_with_bad_timestamp_is_skipped() {
        let xml = r#"<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <yt:videoId>good</yt:videoId>
    <title>Good</title>
    <published>2024-06-03T00:00:00+00:00</published>
  </entry>
  <entry>
    <yt:videoId>bad</yt:videoId>
    <title>Bad</title>
    <published>yesterday</published>
  </entry>
</feed>"#;
        let items = parse_feed(xml).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].video_id, "good");
    }

    #[test]
    fn test_empty_feed_yields_no_items() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>Empty</title></feed>"#;
        let items = parse_feed(xml).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        assert!(parse_feed("not xml at all").is_err());
    }
}
