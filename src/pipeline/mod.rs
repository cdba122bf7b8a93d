//! Pipeline entry points for the bot.
//!
//! - `run_bot`: Command dispatcher plus notification loop
//! - `check_once`: Single fetch and diff, no notifications

mod bot;
pub mod diff;
pub mod notify;
pub mod schedule;

pub use bot::{check_once, run_bot};
pub use diff::{ChangeDetector, new_listings};
pub use notify::{LoopState, NotificationLoop, NotifyReport};
pub use schedule::PollSchedule;
