use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

use crate::config::TelegramConfig;
use crate::feed::types::FeedItem;

/// Telegram caps audio title/performer metadata at 64 chars.
const METADATA_LIMIT: usize = 64;

#[async_trait]
pub trait AudioUploader: Send + Sync {
    async fn send_audio(&self, path: &Path, item: &FeedItem) -> Result<()>;
}

/// Bot API client. One method is all this tool needs.
pub struct TelegramBot {
    client: Client,
    bot_token: String,
    chat_id: String,
    api_base: String,
}

impl TelegramBot {
    pub fn new(config: &TelegramConfig, bot_token: &str, chat_id: &str) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_s))
            .timeout(Duration::from_secs(config.send_timeout_s))
            .build()
            .context("failed to build Telegram HTTP client")?;
        Ok(Self {
            client,
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AudioUploader for TelegramBot {
    async fn send_audio(&self, path: &Path, item: &FeedItem) -> Result<()> {
        let url = format!("{}/bot{}/sendAudio", self.api_base, self.bot_token);
        let caption = caption(item);

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read audio file: {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.mp3")
            .to_string();
        let audio = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/mpeg")
            .context("invalid mime type for audio part")?;

        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", caption)
            .text("parse_mode", "HTML")
            .text("title", truncate_chars(&item.title, METADATA_LIMIT))
            .text("performer", truncate_chars(&item.author, METADATA_LIMIT))
            .part("audio", audio);

        tracing::info!(path = %path.display(), "uploading to Telegram");
        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .context("Telegram sendAudio request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Telegram sendAudio failed ({}): {}", status, body);
        }

        tracing::info!("upload successful");
        Ok(())
    }
}

/// Everything interpolated here goes out with parse_mode=HTML, so both
/// the title and the link need escaping (watch URLs carry `&`).
fn caption(item: &FeedItem) -> String {
    format!(
        "<strong>{}</strong>\n\n<b>Source:</b> {}",
        escape_html(&item.title),
        escape_html(&item.link),
    )
}

/// Caption text goes out with parse_mode=HTML, so markup characters in
/// titles must be escaped or the API rejects the message.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_caption_escapes_title_and_link() {
        let item = FeedItem {
            video_id: "abc".to_string(),
            title: "A <b>bold</b> claim".to_string(),
            link: "https://www.youtube.com/watch?v=abc&t=42".to_string(),
            published: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            author: "Example Channel".to_string(),
        };
        assert_eq!(
            caption(&item),
            "<strong>A &lt;b&gt;bold&lt;/b&gt; claim</strong>\n\n\
             <b>Source:</b> https://www.youtube.com/watch?v=abc&amp;t=42"
        );
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b & c > d"), "a &lt; b &amp; c &gt; d");
        assert_eq!(escape_html("plain title"), "plain title");
    }

    #[test]
    fn test_escape_html_amp_first() {
        // Escaping & after < would double-escape the entity.
        assert_eq!(escape_html("<"), "&lt;");
        assert_eq!(escape_html("&lt;"), "&amp;lt;");
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
        assert_eq!(truncate_chars("short", 64), "short");
    }
}
