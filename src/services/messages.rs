//! Outbound message texts (Bot API HTML markup).

use crate::models::{Listing, Subscriber};
use crate::utils::escape_html;

const POSTED_AT_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

pub const HELP: &str = "<strong>Available commands:</strong>\n\
    /query - current query to parse\n\
    /subscribe - subscribe\n\
    /unsubscribe - unsubscribe\n\
    /subscribers - list of subscribers\n\
    \n/help - this help information\n";

pub const SUBSCRIBED: &str =
    "<strong>You successfully subscribed! =)</strong>\nWait for new notifications";
pub const ALREADY_SUBSCRIBED: &str =
    "<strong>You already subscribed! =)</strong>\nWait for notifications";
pub const UNSUBSCRIBED: &str = "<strong>You successfully unsubscribed! =(</strong>";
pub const NOT_SUBSCRIBED: &str = "<strong>You are not subscribed! =)</strong>\n\
    Use /subscribe command to subscribe notifications";

pub fn query(query: &str) -> String {
    format!(
        "<strong>Current search query is:</strong>\n{}",
        escape_html(query)
    )
}

pub fn subscribers(list: &[Subscriber]) -> String {
    if list.is_empty() {
        return "<strong>No subscribers found</strong>\nUse /subscribe command to add yourself =)"
            .to_string();
    }

    let mut message = String::from("<strong>Current subscribers:</strong>\n");
    for (i, subscriber) in list.iter().enumerate() {
        message.push_str(&format!("{}. {}\n", i + 1, escape_html(&subscriber.label())));
    }
    message
}

pub fn error(err: &impl std::fmt::Display) -> String {
    format!(
        "<strong>Error! =)</strong>\nSomething went wrong: {}",
        escape_html(&err.to_string())
    )
}

/// Notification for one new listing.
pub fn listing(listing: &Listing) -> String {
    let posted_at = listing
        .posted_at
        .map(|t| t.format(POSTED_AT_FORMAT).to_string())
        .unwrap_or_else(|| "unknown date".to_string());

    format!(
        "<strong>{}</strong>\n<code>€{}</code>\n<i>{}</i>\n{}\n\n{}",
        escape_html(&listing.title),
        listing.price,
        escape_html(&listing.location),
        posted_at,
        escape_html(&listing.link)
    )
}
