use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;

use crate::config::DownloadConfig;
use crate::feed::types::FeedItem;
use crate::terminal;

#[async_trait]
pub trait MediaDownloader: Send + Sync {
    /// Fetch the audio for one item; resolves to the downloaded file.
    async fn fetch_audio(&self, item: &FeedItem) -> Result<PathBuf>;
}

/// Drives yt-dlp through a spawned terminal so the user can watch and
/// confirm each download.
pub struct Downloader {
    config: DownloadConfig,
    dest_dir: PathBuf,
}

impl Downloader {
    pub fn new(config: DownloadConfig) -> Result<Self> {
        let dest_dir = match &config.dest_dir {
            Some(dir) => PathBuf::from(dir),
            None => home_dir()?,
        };
        Ok(Self { config, dest_dir })
    }

    /// The enforced filename keeps the final path deterministic, so the
    /// uploader knows where the file lands without parsing yt-dlp output.
    pub fn expected_output(&self, title: &str) -> PathBuf {
        let clean = clean_title(title, self.config.max_title_len);
        self.dest_dir.join(format!("{}.{}", clean, self.config.audio_format))
    }

    pub fn command_line(&self, item: &FeedItem) -> Vec<String> {
        let clean = clean_title(&item.title, self.config.max_title_len);
        vec![
            "yt-dlp".to_string(),
            "-x".to_string(),
            "--audio-format".to_string(),
            self.config.audio_format.clone(),
            "--audio-quality".to_string(),
            self.config.audio_quality.clone(),
            "-o".to_string(),
            format!("{clean}.%(ext)s"),
            item.link.clone(),
        ]
    }
}

#[async_trait]
impl MediaDownloader for Downloader {
    async fn fetch_audio(&self, item: &FeedItem) -> Result<PathBuf> {
        let expected = self.expected_output(&item.title);
        let argv = self.command_line(item);

        tracing::info!(title = %item.title, "preparing to download");
        terminal::run_in_terminal(item, &argv, &self.dest_dir).await?;

        if !expected.exists() {
            anyhow::bail!(
                "expected file not found after download: {} \
                 (yt-dlp may have sanitized the name differently)",
                expected.display()
            );
        }
        Ok(expected)
    }
}

/// Safe filename from a title: keep alphanumerics, spaces, hyphens and
/// underscores, trim, cap the length.
pub fn clean_title(title: &str, max_len: usize) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    kept.trim().chars().take(max_len).collect()
}

fn home_dir() -> Result<PathBuf> {
    std::env::var("HOME")
        .map(PathBuf::from)
        .context("HOME not set and no dest_dir configured")
}
