use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

const ENV_FILE: &str = ".env";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    #[serde(default = "default_feed_base")]
    pub base_url: String,
    #[serde(default = "default_feed_timeout")]
    pub request_timeout_ms: u64,
}

fn default_feed_base() -> String {
    "https://www.youtube.com/feeds/videos.xml".to_string()
}

fn default_feed_timeout() -> u64 {
    10_000
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: default_feed_base(),
            request_timeout_ms: default_feed_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DownloadConfig {
    #[serde(default = "default_audio_format")]
    pub audio_format: String,
    /// yt-dlp quality selector: "0" is best VBR.
    #[serde(default = "default_audio_quality")]
    pub audio_quality: String,
    #[serde(default = "default_max_title_len")]
    pub max_title_len: usize,
    /// Where downloads land. Defaults to $HOME so the spawned terminal
    /// and the uploader agree on the path.
    pub dest_dir: Option<String>,
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

fn default_audio_quality() -> String {
    "0".to_string()
}

fn default_max_title_len() -> usize {
    100
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            audio_format: default_audio_format(),
            audio_quality: default_audio_quality(),
            max_title_len: default_max_title_len(),
            dest_dir: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    #[serde(default = "default_telegram_base")]
    pub api_base: String,
    /// Audio uploads can be large; mirror the generous bot-API timeouts.
    #[serde(default = "default_send_timeout")]
    pub send_timeout_s: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_s: u64,
}

fn default_telegram_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_send_timeout() -> u64 {
    300
}

fn default_connect_timeout() -> u64 {
    60
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: default_telegram_base(),
            send_timeout_s: default_send_timeout(),
            connect_timeout_s: default_connect_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CleanupConfig {
    #[serde(default = "default_cleanup_attempts")]
    pub attempts: u32,
    #[serde(default = "default_cleanup_delay")]
    pub delay_ms: u64,
}

fn default_cleanup_attempts() -> u32 {
    3
}

fn default_cleanup_delay() -> u64 {
    1_000
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            attempts: default_cleanup_attempts(),
            delay_ms: default_cleanup_delay(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| "Failed to parse config TOML")?;
        Ok(config)
    }

    /// Every tunable has a default; a missing config file is not an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load .env file into process environment. Real env vars take precedence.
    pub fn load_env_file() {
        let path = Path::new(ENV_FILE);
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return,
        };
        // Strip BOM if present (common on Windows-created files)
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
        for line in content.lines() {
            let line = line.trim().trim_matches('\r');
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim().trim_matches('"').trim_matches('\'');
                if std::env::var(key).is_err() {
                    std::env::set_var(key, value);
                }
            }
        }
    }
}

/// Identities the run cannot start without. All come from the
/// environment (or .env); a missing one is a fatal startup error.
#[derive(Debug, Clone)]
pub struct Identity {
    pub youtube_channel_id: String,
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
}

impl Identity {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            youtube_channel_id: required_env("YOUTUBE_CHANNEL_ID")?,
            telegram_bot_token: required_env("TELEGRAM_BOT_TOKEN")?,
            telegram_chat_id: required_env("TELEGRAM_CHANNEL_ID")?,
        })
    }
}

fn required_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(sanitize_value(&value)),
        _ => anyhow::bail!("{} not set; add it to .env or the environment", name),
    }
}

/// Optional verbosity flag; bumps the log filter to debug.
pub fn verbose() -> bool {
    std::env::var("TUBECAST_VERBOSE")
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Strip carriage returns, BOM, and other invisible chars from a value.
fn sanitize_value(raw: &str) -> String {
    raw.replace(['\r', '\u{feff}', '\u{200b}'], "")
        .trim()
        .to_string()
}
