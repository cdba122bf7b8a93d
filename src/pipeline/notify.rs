// src/pipeline/notify.rs

//! Notification loop.
//!
//! ```text
//! Idle -> Fetching -> Diffing -> NotifyingAll -> Sleeping -> Idle
//!   \          \          \______________________/^
//!    \          \_____ fetch error ______________/^
//!     \__ no subscribers (idle interval) ________/
//! ```
//!
//! Fetch and store failures end the current cycle only. Sends are attempted
//! for every (subscriber, listing) pair regardless of individual failures.

use std::sync::Arc;
use std::time::Duration;

use crate::context::AppContext;
use crate::models::Listing;
use crate::pipeline::diff::ChangeDetector;
use crate::pipeline::schedule::PollSchedule;
use crate::services::{ListingSource, messages};
use crate::telegram::OutboundMessage;

/// States of the notification loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Fetching,
    Diffing(Vec<Listing>),
    NotifyingAll(Vec<Listing>),
    Sleeping(Duration),
}

/// Outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyReport {
    pub sent: usize,
    pub failed: usize,
}

/// Fetch, diff and fan-out on a timer.
pub struct NotificationLoop {
    context: Arc<AppContext>,
    source: Arc<dyn ListingSource>,
    detector: ChangeDetector,
    schedule: PollSchedule,
}

impl NotificationLoop {
    pub fn new(
        context: Arc<AppContext>,
        source: Arc<dyn ListingSource>,
        detector: ChangeDetector,
        schedule: PollSchedule,
    ) -> Self {
        Self {
            context,
            source,
            detector,
            schedule,
        }
    }

    /// Run forever.
    pub async fn run(&self) {
        log::info!("Notification loop started");
        let mut state = LoopState::Idle;
        loop {
            state = self.step(state).await;
        }
    }

    /// Run from `Idle` until the loop wants to sleep; returns the sleep duration.
    pub async fn run_cycle(&self) -> Duration {
        let mut state = LoopState::Idle;
        loop {
            state = match state {
                LoopState::Sleeping(duration) => return duration,
                other => self.step(other).await,
            };
        }
    }

    /// Perform the work of `state` and return the next state.
    pub async fn step(&self, state: LoopState) -> LoopState {
        match state {
            LoopState::Idle => {
                if self.context.registry.is_empty().await {
                    log::warn!("No subscribers found, skipping fetch");
                    LoopState::Sleeping(self.schedule.idle_interval())
                } else {
                    LoopState::Fetching
                }
            }

            LoopState::Fetching => {
                log::info!("Parsing new listings...");
                match self.source.fetch_listings().await {
                    Ok(listings) => LoopState::Diffing(listings),
                    Err(e) => {
                        log::error!("Fetch failed: {}", e);
                        self.sleep_state()
                    }
                }
            }

            LoopState::Diffing(parsed) => match self.detector.detect(&parsed).await {
                Ok(added) if added.is_empty() => {
                    log::info!("No new listings found");
                    self.sleep_state()
                }
                Ok(added) => {
                    log::info!("New listings found: {}", added.len());
                    LoopState::NotifyingAll(added)
                }
                Err(e) => {
                    log::error!("Change detection failed: {}", e);
                    self.sleep_state()
                }
            },

            LoopState::NotifyingAll(added) => {
                let report = self.notify_all(&added).await;
                log::info!(
                    "Notifications: {} sent, {} failed",
                    report.sent,
                    report.failed
                );
                self.sleep_state()
            }

            LoopState::Sleeping(duration) => {
                log::debug!("Sleeping for {:?}", duration);
                tokio::time::sleep(duration).await;
                LoopState::Idle
            }
        }
    }

    /// Send every listing to every subscriber, subscriber-major.
    pub async fn notify_all(&self, listings: &[Listing]) -> NotifyReport {
        let subscribers = self.context.registry.list().await;
        let mut report = NotifyReport::default();

        for subscriber in &subscribers {
            for listing in listings {
                let message =
                    OutboundMessage::notification(subscriber.chat_id, messages::listing(listing));
                match self.context.transport.send(&message).await {
                    Ok(()) => report.sent += 1,
                    Err(e) => {
                        report.failed += 1;
                        log::error!(
                            "Failed to notify chat {} about {}: {}",
                            subscriber.chat_id,
                            listing.id,
                            e
                        );
                    }
                }
            }
        }
        report
    }

    fn sleep_state(&self) -> LoopState {
        LoopState::Sleeping(self.schedule.next_interval())
    }
}
