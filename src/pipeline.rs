use anyhow::Result;
use std::path::Path;
use std::time::Duration;

use crate::config::CleanupConfig;
use crate::download::MediaDownloader;
use crate::feed::FeedSource;
use crate::retry::with_retries;
use crate::telegram::AudioUploader;
use crate::watermark::{self, WatermarkStore};

/// Counters for one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: usize,
    pub fresh: usize,
    pub uploaded: usize,
    pub failed: usize,
}

/// One run to completion: fetch feed, filter by watermark, then each
/// new item oldest-first through download -> upload -> advance.
/// Per-item failures are logged and skipped; the watermark only moves
/// for items that made it all the way through.
pub struct Pipeline {
    feed: Box<dyn FeedSource>,
    downloader: Box<dyn MediaDownloader>,
    uploader: Box<dyn AudioUploader>,
    store: WatermarkStore,
    cleanup: CleanupConfig,
}

impl Pipeline {
    pub fn new(
        feed: Box<dyn FeedSource>,
        downloader: Box<dyn MediaDownloader>,
        uploader: Box<dyn AudioUploader>,
        store: WatermarkStore,
        cleanup: CleanupConfig,
    ) -> Self {
        Self {
            feed,
            downloader,
            uploader,
            store,
            cleanup,
        }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let items = self.feed.fetch().await?;
        let mut watermark = self.store.load();
        tracing::info!(fetched = items.len(), watermark = ?watermark, "feed fetched");

        let fresh = watermark::newer_than(&items, watermark);
        let mut summary = RunSummary {
            fetched: items.len(),
            fresh: fresh.len(),
            ..RunSummary::default()
        };

        if fresh.is_empty() {
            tracing::info!("no new videos");
            return Ok(summary);
        }
        tracing::info!(count = fresh.len(), "new videos found");

        for item in &fresh {
            tracing::info!(title = %item.title, link = %item.link, "processing");

            let audio = match self.downloader.fetch_audio(item).await {
                Ok(path) => path,
                Err(err) => {
                    tracing::error!(title = %item.title, error = %err, "download failed; skipping item");
                    summary.failed += 1;
                    continue;
                }
            };

            if let Err(err) = self.uploader.send_audio(&audio, item).await {
                tracing::error!(title = %item.title, error = %err, "upload failed; skipping item");
                summary.failed += 1;
                continue;
            }
            summary.uploaded += 1;

            // Advance and persist per successful item, so a failure
            // later in the run only reprocesses the unfinished tail.
            let advanced = watermark::advance(watermark, item.published);
            if let Err(err) = self.store.persist(advanced) {
                tracing::error!(error = %err, "failed to persist watermark");
            }
            watermark = Some(advanced);

            self.remove_local(&audio).await;
        }

        tracing::info!(?summary, "run complete");
        Ok(summary)
    }

    async fn remove_local(&self, path: &Path) {
        let delay = Duration::from_millis(self.cleanup.delay_ms);
        let result = with_retries(self.cleanup.attempts, delay, || async move {
            tokio::fs::remove_file(path).await
        })
        .await;
        match result {
            Ok(()) => tracing::info!(path = %path.display(), "removed local file"),
            Err(err) => tracing::warn!(
                path = %path.display(),
                error = %err,
                attempts = self.cleanup.attempts,
                "could not remove local file"
            ),
        }
    }
}
