// src/pipeline/bot.rs

//! Process wiring.

use std::sync::Arc;

use crate::context::AppContext;
use crate::error::Result;
use crate::models::{Config, Listing};
use crate::pipeline::diff::{ChangeDetector, new_listings};
use crate::pipeline::notify::NotificationLoop;
use crate::pipeline::schedule::PollSchedule;
use crate::services::{CommandDispatcher, ListingFetcher, SubscriberRegistry};
use crate::storage::{JsonListingStore, JsonSubscriberStore, ListingStore};
use crate::telegram::TelegramClient;

/// Run the bot: command dispatcher and notification loop, until one of them stops.
pub async fn run_bot(config: Arc<Config>) -> Result<()> {
    let subscriber_store = Arc::new(JsonSubscriberStore::new(&config.storage.subscribers_file));
    let registry = Arc::new(SubscriberRegistry::load(subscriber_store).await?);

    let client = TelegramClient::new(&config.telegram)?;
    let context = Arc::new(AppContext::new(
        Arc::clone(&config),
        registry,
        Arc::new(client.clone()),
    ));

    let fetcher = Arc::new(ListingFetcher::new(&config)?);
    let listing_store = Arc::new(JsonListingStore::new(&config.storage.listings_file));
    let notifier = NotificationLoop::new(
        Arc::clone(&context),
        fetcher,
        ChangeDetector::new(listing_store),
        PollSchedule::new(&config.schedule),
    );

    let dispatcher = CommandDispatcher::new(context);
    let commands = tokio::spawn(dispatcher.run(client.updates()));

    log::info!("Watching {}", config.search.query);
    tokio::select! {
        _ = notifier.run() => {}
        joined = commands => {
            if let Err(e) = joined {
                log::error!("Command dispatcher stopped: {}", e);
            }
        }
    }
    Ok(())
}

/// Fetch and parse the search page once, without persisting or notifying.
pub async fn check_once(config: &Config) -> Result<Vec<Listing>> {
    let fetcher = ListingFetcher::new(config)?;
    let parsed = fetcher.fetch().await?;

    let store = JsonListingStore::new(&config.storage.listings_file);
    match store.load().await {
        Ok(Some(snapshot)) => log::info!(
            "{} of {} listings are not in the snapshot",
            new_listings(&snapshot, &parsed).len(),
            parsed.len()
        ),
        Ok(None) => log::info!("No snapshot yet; the first run will only record the page"),
        Err(e) => log::warn!("Snapshot unreadable: {}", e),
    }
    Ok(parsed)
}
