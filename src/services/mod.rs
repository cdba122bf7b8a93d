//! Service layer for the bot.
//!
//! This module contains the business logic for:
//! - Listing fetching and parsing (`ListingFetcher`, `ListingParser`)
//! - Subscriber bookkeeping (`SubscriberRegistry`)
//! - Chat command handling (`CommandDispatcher`)
//! - Outbound message texts (`messages`)

mod commands;
mod listings;
pub mod messages;
mod registry;

pub use commands::{Command, CommandDispatcher};
pub use listings::{ListingFetcher, ListingParser, ListingSource};
pub use registry::SubscriberRegistry;
