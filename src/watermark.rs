use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::feed::types::FeedItem;

/// The one persisted record: the publish time of the newest item we
/// have fully processed.
#[derive(Debug, Serialize, Deserialize)]
struct Record {
    last_published: DateTime<Utc>,
}

pub struct WatermarkStore {
    path: PathBuf,
}

impl WatermarkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted watermark. Absent, unreadable, or malformed
    /// all mean "no watermark": reprocessing everything is the safe
    /// direction, losing items silently is not.
    pub fn load(&self) -> Option<DateTime<Utc>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "could not read watermark store; treating as absent"
                );
                return None;
            }
        };
        match serde_json::from_str::<Record>(&raw) {
            Ok(record) => Some(record.last_published),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "malformed watermark store; reprocessing everything"
                );
                None
            }
        }
    }

    /// Overwrite the record. Single writer per invocation, so a plain
    /// truncate-and-write is sufficient.
    pub fn persist(&self, timestamp: DateTime<Utc>) -> Result<()> {
        let body = serde_json::to_string(&Record { last_published: timestamp })
            .context("failed to serialize watermark record")?;
        std::fs::write(&self.path, body)
            .with_context(|| format!("failed to write watermark store: {}", self.path.display()))
    }
}

/// Items strictly newer than the watermark (all of them when there is
/// no watermark), sorted ascending by publish time. The feed lists
/// newest-first; processing is deliberately oldest-first so uploads
/// land in chronological order.
pub fn newer_than(items: &[FeedItem], watermark: Option<DateTime<Utc>>) -> Vec<FeedItem> {
    let mut fresh: Vec<FeedItem> = items
        .iter()
        .filter(|item| watermark.is_none_or(|w| item.published > w))
        .cloned()
        .collect();
    fresh.sort_by_key(|item| item.published);
    fresh
}

/// `max(current, candidate)` -- the watermark never moves backward.
pub fn advance(current: Option<DateTime<Utc>>, candidate: DateTime<Utc>) -> DateTime<Utc> {
    match current {
        Some(ts) => ts.max(candidate),
        None => candidate,
    }
}
