//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use scraper::Selector;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Bot API credentials and long-poll settings
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// The single search query shared by all subscribers
    #[serde(default)]
    pub search: SearchConfig,

    /// Snapshot and subscriber file locations
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP behavior for fetching the search page
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Structural extraction rules for the result page
    #[serde(default)]
    pub parser: ParserConfig,

    /// Polling cadence
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply overrides from the process environment.
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides using the given variable lookup.
    ///
    /// Recognized variables: `TOKEN`, `QUERY`, `FILE_USERS`, `FILE_ADS`.
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = lookup("TOKEN") {
            self.telegram.token = token;
        }
        if let Some(query) = lookup("QUERY") {
            self.search.query = query;
        }
        if let Some(path) = lookup("FILE_USERS") {
            self.storage.subscribers_file = PathBuf::from(path);
        }
        if let Some(path) = lookup("FILE_ADS") {
            self.storage.listings_file = PathBuf::from(path);
        }
        self
    }

    /// Validate everything required to run the bot.
    pub fn validate(&self) -> Result<()> {
        if self.telegram.token.trim().is_empty() {
            return Err(AppError::config("telegram.token (TOKEN) is required"));
        }
        self.validate_search()?;
        if self.storage.listings_file.as_os_str().is_empty() {
            return Err(AppError::config("storage.listings_file is empty"));
        }
        if self.storage.subscribers_file.as_os_str().is_empty() {
            return Err(AppError::config("storage.subscribers_file is empty"));
        }
        self.schedule.validate()?;
        Ok(())
    }

    /// Validate only what fetching and parsing the search page needs.
    pub fn validate_search(&self) -> Result<()> {
        self.search.url()?;
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::config("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::config("crawler.timeout_secs must be > 0"));
        }
        self.parser.validate()
    }
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot authentication token
    #[serde(default)]
    pub token: String,

    /// Bot API base URL
    #[serde(default = "defaults::api_url")]
    pub api_url: String,

    /// Long-poll timeout for `getUpdates` in seconds
    #[serde(default = "defaults::poll_timeout")]
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: defaults::api_url(),
            poll_timeout_secs: defaults::poll_timeout(),
        }
    }
}

/// The search query to watch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search result page URI
    #[serde(default)]
    pub query: String,
}

impl SearchConfig {
    /// Parse the query as an http(s) URL.
    pub fn url(&self) -> Result<Url> {
        if self.query.trim().is_empty() {
            return Err(AppError::config("search.query (QUERY) is required"));
        }
        let url = Url::parse(self.query.trim())
            .map_err(|e| AppError::config(format!("search.query is not a valid URL: {e}")))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(AppError::config(format!(
                "search.query must use http or https, got '{other}'"
            ))),
        }
    }
}

/// Persisted state locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Listing snapshot file
    #[serde(default = "defaults::listings_file")]
    pub listings_file: PathBuf,

    /// Subscriber file
    #[serde(default = "defaults::subscribers_file")]
    pub subscribers_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            listings_file: defaults::listings_file(),
            subscribers_file: defaults::subscribers_file(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// CSS selectors and filters describing the result page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Element whose direct children are walked in document order
    #[serde(default = "defaults::container_selector")]
    pub container_selector: String,

    /// Child block holding one or more listings
    #[serde(default = "defaults::block_selector")]
    pub block_selector: String,

    /// Single listing inside a block
    #[serde(default = "defaults::item_selector")]
    pub item_selector: String,

    /// Title anchor carrying the link
    #[serde(default = "defaults::title_selector")]
    pub title_selector: String,

    /// Combined "date, location" text
    #[serde(default = "defaults::date_selector")]
    pub date_selector: String,

    /// Metadata element carrying the price
    #[serde(default = "defaults::price_selector")]
    pub price_selector: String,

    /// Attribute of the price element holding the value
    #[serde(default = "defaults::price_attr")]
    pub price_attr: String,

    /// Heading that may open a secondary results section
    #[serde(default = "defaults::boundary_selector")]
    pub boundary_selector: String,

    /// Heading text marking the secondary section; `None` disables the stop
    #[serde(default = "defaults::boundary_text")]
    pub boundary_text: Option<String>,

    /// Keep only listings whose location starts with this text
    #[serde(default)]
    pub location_prefix: Option<String>,
}

impl ParserConfig {
    /// Check that every selector parses.
    pub fn validate(&self) -> Result<()> {
        for selector in [
            &self.container_selector,
            &self.block_selector,
            &self.item_selector,
            &self.title_selector,
            &self.date_selector,
            &self.price_selector,
            &self.boundary_selector,
        ] {
            Selector::parse(selector).map_err(|e| AppError::selector(selector, format!("{e:?}")))?;
        }
        Ok(())
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            container_selector: defaults::container_selector(),
            block_selector: defaults::block_selector(),
            item_selector: defaults::item_selector(),
            title_selector: defaults::title_selector(),
            date_selector: defaults::date_selector(),
            price_selector: defaults::price_selector(),
            price_attr: defaults::price_attr(),
            boundary_selector: defaults::boundary_selector(),
            boundary_text: defaults::boundary_text(),
            location_prefix: None,
        }
    }
}

/// Polling cadence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Interval between polls outside quiet hours
    #[serde(default = "defaults::base_interval")]
    pub base_interval_secs: u64,

    /// Upper bound of the random delay added to every poll interval
    #[serde(default = "defaults::jitter")]
    pub jitter_ms: u64,

    /// Interval used during quiet hours
    #[serde(default = "defaults::quiet_interval")]
    pub quiet_interval_secs: u64,

    /// First hour (inclusive) of the quiet window
    #[serde(default = "defaults::quiet_start_hour")]
    pub quiet_start_hour: u32,

    /// Last hour (inclusive) of the quiet window
    #[serde(default = "defaults::quiet_end_hour")]
    pub quiet_end_hour: u32,

    /// Wait used when nobody is subscribed
    #[serde(default = "defaults::idle_interval")]
    pub idle_interval_secs: u64,

    /// Evaluate quiet hours in UTC instead of local time
    #[serde(default = "defaults::utc")]
    pub utc: bool,
}

impl ScheduleConfig {
    pub fn validate(&self) -> Result<()> {
        if self.quiet_start_hour > 23 || self.quiet_end_hour > 23 {
            return Err(AppError::config("schedule quiet hours must be within 0..=23"));
        }
        if self.base_interval_secs == 0 && self.jitter_ms == 0 {
            return Err(AppError::config(
                "schedule.base_interval_secs and schedule.jitter_ms cannot both be 0",
            ));
        }
        Ok(())
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            base_interval_secs: defaults::base_interval(),
            jitter_ms: defaults::jitter(),
            quiet_interval_secs: defaults::quiet_interval(),
            quiet_start_hour: defaults::quiet_start_hour(),
            quiet_end_hour: defaults::quiet_end_hour(),
            idle_interval_secs: defaults::idle_interval(),
            utc: defaults::utc(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Telegram defaults
    pub fn api_url() -> String {
        "https://api.telegram.org".into()
    }
    pub fn poll_timeout() -> u64 {
        30
    }

    // Storage defaults
    pub fn listings_file() -> PathBuf {
        PathBuf::from("ads.json")
    }
    pub fn subscribers_file() -> PathBuf {
        PathBuf::from("users.json")
    }

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; realty-bot/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Parser defaults
    pub fn container_selector() -> String {
        ".list-simple__output".into()
    }
    pub fn block_selector() -> String {
        "li.announcement-container".into()
    }
    pub fn item_selector() -> String {
        ".list-announcement-block".into()
    }
    pub fn title_selector() -> String {
        ".announcement-block__title".into()
    }
    pub fn date_selector() -> String {
        ".announcement-block__date".into()
    }
    pub fn price_selector() -> String {
        r#"meta[itemprop="price"]"#.into()
    }
    pub fn price_attr() -> String {
        "content".into()
    }
    pub fn boundary_selector() -> String {
        "h2.header".into()
    }
    pub fn boundary_text() -> Option<String> {
        Some("Ads from other regions".into())
    }

    // Schedule defaults
    pub fn base_interval() -> u64 {
        10
    }
    pub fn jitter() -> u64 {
        3000
    }
    pub fn quiet_interval() -> u64 {
        30 * 60
    }
    pub fn quiet_start_hour() -> u32 {
        21
    }
    pub fn quiet_end_hour() -> u32 {
        4
    }
    pub fn idle_interval() -> u64 {
        10
    }
    pub fn utc() -> bool {
        true
    }
}
