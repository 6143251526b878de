use anyhow::{Context, Result};
use std::path::Path;

use tubecast::config::{self, Config, Identity};
use tubecast::download::Downloader;
use tubecast::feed::youtube::YouTubeFeed;
use tubecast::pipeline::Pipeline;
use tubecast::telegram::TelegramBot;
use tubecast::watermark::WatermarkStore;

const CONFIG_FILE: &str = "config.toml";
const STORE_FILE: &str = "last_seen.json";
const LOG_FILE: &str = "tubecast.log";

#[tokio::main]
async fn main() -> Result<()> {
    // Saved values from .env; real env vars take precedence.
    Config::load_env_file();

    let log_file = std::fs::File::options()
        .create(true)
        .append(true)
        .open(LOG_FILE)
        .with_context(|| format!("failed to open log file: {LOG_FILE}"))?;
    let filter = if config::verbose() {
        "tubecast=debug"
    } else {
        "tubecast=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(log_file)
        .with_ansi(false)
        .init();

    let config = Config::load_or_default(Path::new(CONFIG_FILE))?;
    let identity = Identity::from_env()?;

    let feed = YouTubeFeed::new(&config.feed, &identity.youtube_channel_id)?;
    let downloader = Downloader::new(config.download.clone())?;
    let uploader = TelegramBot::new(
        &config.telegram,
        &identity.telegram_bot_token,
        &identity.telegram_chat_id,
    )?;
    let store = WatermarkStore::new(STORE_FILE);

    let pipeline = Pipeline::new(
        Box::new(feed),
        Box::new(downloader),
        Box::new(uploader),
        store,
        config.cleanup.clone(),
    );

    let summary = pipeline.run().await?;
    if summary.fresh == 0 {
        println!("No new videos.");
    } else {
        println!(
            "Processed {} new video(s): {} uploaded, {} failed.",
            summary.fresh, summary.uploaded, summary.failed
        );
    }
    Ok(())
}
