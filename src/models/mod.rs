// src/models/mod.rs

//! Domain models for the bot.

mod config;
mod listing;
mod subscriber;

// Re-export all public types
pub use config::{
    Config, CrawlerConfig, ParserConfig, ScheduleConfig, SearchConfig, StorageConfig,
    TelegramConfig,
};
pub use listing::{Listing, ListingId, ListingSnapshot};
pub use subscriber::{ChatId, Subscriber};
