//! Storage abstractions for bot state.
//!
//! Two pieces of state survive restarts:
//! - Listing snapshot: every listing seen as of the last fetch that found changes
//! - Subscribers: chats that receive notifications
//!
//! ## Files
//!
//! ```text
//! ads.json     # [ {id, title, price, link, datetime, location}, ... ]
//! users.json   # { "<chat_id>": {chat_id, name, user_name}, ... }
//! ```

pub mod local;
pub mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ChatId, Listing, ListingSnapshot, Subscriber};

// Re-export for convenience
pub use local::{JsonListingStore, JsonSubscriberStore};
pub use memory::{MemoryListingStore, MemorySubscriberStore};

/// Full subscriber set as persisted.
pub type SubscriberMap = BTreeMap<ChatId, Subscriber>;

/// Trait for listing snapshot backends.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Load the snapshot; `None` means nothing was ever persisted.
    async fn load(&self) -> Result<Option<ListingSnapshot>>;

    /// Replace the snapshot with exactly these listings.
    async fn save(&self, listings: &[Listing]) -> Result<()>;
}

/// Trait for subscriber backends.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// Load all subscribers; an absent store is an empty set.
    async fn load(&self) -> Result<SubscriberMap>;

    /// Replace the stored set with `subscribers`.
    async fn save(&self, subscribers: &SubscriberMap) -> Result<()>;
}
