// src/error.rs

//! Unified error handling for the bot.

use std::fmt;

use thiserror::Error;

use crate::models::ChatId;

/// Result type alias for bot operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Search page answered with a non-success status
    #[error("Fetch error for {url}: HTTP {status}")]
    Fetch { url: String, status: u16 },

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Listing or subscriber store could not be read or written
    #[error("Store error for {path}: {message}")]
    Store { path: String, message: String },

    /// Subscriber is already registered
    #[error("Chat {0} is already subscribed")]
    DuplicateSubscriber(ChatId),

    /// Subscriber is not registered
    #[error("Chat {0} is not subscribed")]
    NotSubscribed(ChatId),

    /// Telegram Bot API rejected a call
    #[error("Telegram error in {method}: {description}")]
    Telegram { method: String, description: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a store error for the given file.
    pub fn store(path: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::Store {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a Telegram API error.
    pub fn telegram(method: impl Into<String>, description: impl Into<String>) -> Self {
        Self::Telegram {
            method: method.into(),
            description: description.into(),
        }
    }

    /// Whether this error came from fetching the search page.
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Http(_))
    }

    /// Whether this error came from one of the stores.
    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store { .. })
    }
}
