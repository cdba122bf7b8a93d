//! In-process storage used for dry runs and tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::models::{Listing, ListingSnapshot};
use crate::storage::{ListingStore, SubscriberMap, SubscriberStore};

/// Listing snapshot held in memory.
#[derive(Debug, Default)]
pub struct MemoryListingStore {
    listings: Mutex<Option<Vec<Listing>>>,
    saves: AtomicUsize,
}

impl MemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already persisted snapshot.
    pub fn with_listings(listings: Vec<Listing>) -> Self {
        Self {
            listings: Mutex::new(Some(listings)),
            saves: AtomicUsize::new(0),
        }
    }

    /// Listings as last saved.
    pub async fn listings(&self) -> Option<Vec<Listing>> {
        self.listings.lock().await.clone()
    }

    /// Number of `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ListingStore for MemoryListingStore {
    async fn load(&self) -> Result<Option<ListingSnapshot>> {
        let guard = self.listings.lock().await;
        Ok(guard.as_ref().map(|l| l.iter().cloned().collect()))
    }

    async fn save(&self, listings: &[Listing]) -> Result<()> {
        *self.listings.lock().await = Some(listings.to_vec());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Subscriber set held in memory.
#[derive(Debug, Default)]
pub struct MemorySubscriberStore {
    subscribers: Mutex<SubscriberMap>,
}

impl MemorySubscriberStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscribers(subscribers: SubscriberMap) -> Self {
        Self {
            subscribers: Mutex::new(subscribers),
        }
    }

    /// Subscribers as last saved.
    pub async fn subscribers(&self) -> SubscriberMap {
        self.subscribers.lock().await.clone()
    }
}

#[async_trait]
impl SubscriberStore for MemorySubscriberStore {
    async fn load(&self) -> Result<SubscriberMap> {
        Ok(self.subscribers.lock().await.clone())
    }

    async fn save(&self, subscribers: &SubscriberMap) -> Result<()> {
        *self.subscribers.lock().await = subscribers.clone();
        Ok(())
    }
}
