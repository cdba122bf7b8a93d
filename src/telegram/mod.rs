//! Chat transport.
//!
//! The bot only needs two things from a messaging service: sending a text
//! message to a chat, and a sequential stream of inbound commands.

mod client;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::ChatId;

pub use client::{TelegramClient, TelegramUpdates};

/// A message to deliver to one chat, in HTML markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: ChatId,
    pub text: String,
    pub allow_link_preview: bool,
}

impl OutboundMessage {
    /// Command reply without link previews.
    pub fn reply(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            allow_link_preview: false,
        }
    }

    /// Listing notification with link preview enabled.
    pub fn notification(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            allow_link_preview: true,
        }
    }
}

/// A `/command` received from a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundCommand {
    pub chat_id: ChatId,
    /// Command name without the leading `/` or `@bot` suffix
    pub command: String,
    pub sender_handle: Option<String>,
    pub sender_first_name: String,
    pub sender_last_name: String,
}

/// Outbound side of the messaging service.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<()>;
}

/// Inbound side of the messaging service.
#[async_trait]
pub trait CommandSource: Send {
    /// Wait for the next batch of commands, in arrival order.
    async fn next_batch(&mut self) -> Result<Vec<InboundCommand>>;
}

/// Extract the command name from message text like `/subscribe@my_bot now`.
pub fn command_name(text: &str) -> Option<String> {
    let first = text.split_whitespace().next()?;
    let name = first.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name);
    (!name.is_empty()).then(|| name.to_string())
}
