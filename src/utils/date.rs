//! Posted-at date parsing for result page blocks.
//!
//! Recognized forms:
//! - `Today HH:MM`
//! - `Yesterday HH:MM`
//! - `DD.MM.YYYY HH:MM`
//!
//! Anything else resolves to `None` instead of failing the record.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

const ABSOLUTE_FORMAT: &str = "%d.%m.%Y %H:%M";
const TIME_FORMAT: &str = "%H:%M";

/// Parse a posted-at text relative to the current local date.
pub fn parse_posted_at(text: &str) -> Option<NaiveDateTime> {
    parse_posted_at_on(text, Local::now().date_naive())
}

/// Parse a posted-at text relative to `today`.
pub fn parse_posted_at_on(text: &str, today: NaiveDate) -> Option<NaiveDateTime> {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let (head, rest) = text.split_once(' ').unwrap_or((text.as_str(), ""));

    let day = match head.to_lowercase().as_str() {
        "today" => Some(today),
        "yesterday" => today.pred_opt(),
        _ => None,
    };

    let parsed = match day {
        Some(day) => NaiveTime::parse_from_str(rest, TIME_FORMAT)
            .ok()
            .map(|time| day.and_time(time)),
        None => NaiveDateTime::parse_from_str(&text, ABSOLUTE_FORMAT).ok(),
    };

    if parsed.is_none() {
        log::warn!("Unable to parse listing date '{}'", text);
    }
    parsed
}
