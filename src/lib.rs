pub mod config;
pub mod download;
pub mod feed;
pub mod pipeline;
pub mod retry;
pub mod telegram;
pub mod terminal;
pub mod watermark;
