//! Polling cadence.
//!
//! Base interval plus bounded random jitter. Inside the quiet-hours window
//! the base interval is replaced by a much longer one. The window wraps
//! around midnight when `start > end` (default 21:00 to 04:59).

use std::time::Duration;

use chrono::{Local, Timelike, Utc};
use rand::Rng;

use crate::models::ScheduleConfig;

/// Computes how long the notification loop sleeps.
#[derive(Debug, Clone)]
pub struct PollSchedule {
    base: Duration,
    jitter_ms: u64,
    quiet: Duration,
    quiet_start_hour: u32,
    quiet_end_hour: u32,
    idle: Duration,
    utc: bool,
}

impl PollSchedule {
    pub fn new(config: &ScheduleConfig) -> Self {
        Self {
            base: Duration::from_secs(config.base_interval_secs),
            jitter_ms: config.jitter_ms,
            quiet: Duration::from_secs(config.quiet_interval_secs),
            quiet_start_hour: config.quiet_start_hour,
            quiet_end_hour: config.quiet_end_hour,
            idle: Duration::from_secs(config.idle_interval_secs),
            utc: config.utc,
        }
    }

    /// Whether `hour` falls within the quiet window (both ends inclusive).
    pub fn is_quiet_hour(&self, hour: u32) -> bool {
        if self.quiet_start_hour <= self.quiet_end_hour {
            (self.quiet_start_hour..=self.quiet_end_hour).contains(&hour)
        } else {
            hour >= self.quiet_start_hour || hour <= self.quiet_end_hour
        }
    }

    /// Interval at `hour` with the given jitter already drawn.
    pub fn interval_at(&self, hour: u32, jitter: Duration) -> Duration {
        let base = if self.is_quiet_hour(hour) {
            self.quiet
        } else {
            self.base
        };
        base + jitter
    }

    /// Interval for the next poll, using the current wall clock.
    pub fn next_interval(&self) -> Duration {
        self.interval_at(self.current_hour(), self.draw_jitter())
    }

    /// Wait used when there is nobody to notify.
    pub fn idle_interval(&self) -> Duration {
        self.idle
    }

    fn current_hour(&self) -> u32 {
        if self.utc {
            Utc::now().hour()
        } else {
            Local::now().hour()
        }
    }

    fn draw_jitter(&self) -> Duration {
        if self.jitter_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..self.jitter_ms))
    }
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self::new(&ScheduleConfig::default())
    }
}
