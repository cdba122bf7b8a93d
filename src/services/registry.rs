//! Subscriber registry.
//!
//! In-memory subscriber set backed by a [`SubscriberStore`]. Every mutation
//! holds the write guard across the store flush, and a failed flush rolls the
//! in-memory change back, so memory never runs ahead of the store.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::{AppError, Result};
use crate::models::{ChatId, Subscriber};
use crate::storage::{SubscriberMap, SubscriberStore};

/// Shared, store-synchronized set of subscribers.
pub struct SubscriberRegistry {
    subscribers: RwLock<SubscriberMap>,
    store: Arc<dyn SubscriberStore>,
}

impl SubscriberRegistry {
    /// Load the current set from `store`.
    pub async fn load(store: Arc<dyn SubscriberStore>) -> Result<Self> {
        let subscribers = store.load().await?;
        log::info!("Loaded {} subscribers", subscribers.len());
        Ok(Self {
            subscribers: RwLock::new(subscribers),
            store,
        })
    }

    /// All subscribers ordered by chat id.
    pub async fn list(&self) -> Vec<Subscriber> {
        self.subscribers.read().await.values().cloned().collect()
    }

    pub async fn exists(&self, chat_id: ChatId) -> bool {
        self.subscribers.read().await.contains_key(&chat_id)
    }

    pub async fn len(&self) -> usize {
        self.subscribers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.subscribers.read().await.is_empty()
    }

    /// Add a subscriber and flush the full set.
    pub async fn add(&self, subscriber: Subscriber) -> Result<()> {
        let mut subscribers = self.subscribers.write().await;
        let chat_id = subscriber.chat_id;
        if subscribers.contains_key(&chat_id) {
            return Err(AppError::DuplicateSubscriber(chat_id));
        }

        subscribers.insert(chat_id, subscriber);
        if let Err(e) = self.store.save(&subscribers).await {
            subscribers.remove(&chat_id);
            log::error!("Failed to persist subscriber {}: {}", chat_id, e);
            return Err(e);
        }

        log::info!("Subscribed chat {} ({} total)", chat_id, subscribers.len());
        Ok(())
    }

    /// Remove a subscriber and flush the full set.
    pub async fn remove(&self, chat_id: ChatId) -> Result<Subscriber> {
        let mut subscribers = self.subscribers.write().await;
        let Some(removed) = subscribers.remove(&chat_id) else {
            return Err(AppError::NotSubscribed(chat_id));
        };

        if let Err(e) = self.store.save(&subscribers).await {
            subscribers.insert(chat_id, removed);
            log::error!("Failed to persist removal of {}: {}", chat_id, e);
            return Err(e);
        }

        log::info!("Unsubscribed chat {} ({} total)", chat_id, subscribers.len());
        Ok(removed)
    }
}
