//! Command dispatcher.
//!
//! Maps inbound chat commands onto registry operations. Each command
//! performs at most one registry call and sends exactly one reply.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::stream;

use crate::context::AppContext;
use crate::error::{AppError, Result};
use crate::models::Subscriber;
use crate::services::messages;
use crate::telegram::{CommandSource, InboundCommand, OutboundMessage};

/// Pause after a failed poll of the command source.
const SOURCE_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Commands understood by the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Query,
    Subscribers,
    Subscribe,
    Unsubscribe,
}

impl Command {
    /// Parse a command name such as `subscribe`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            "query" => Some(Self::Query),
            "subscribers" => Some(Self::Subscribers),
            "subscribe" => Some(Self::Subscribe),
            "unsubscribe" => Some(Self::Unsubscribe),
            _ => None,
        }
    }
}

/// Handles commands one at a time, in arrival order.
pub struct CommandDispatcher {
    context: Arc<AppContext>,
}

impl CommandDispatcher {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }

    /// Consume `source` forever.
    pub async fn run<S: CommandSource + 'static>(self, source: S) {
        log::info!("Command dispatcher started");

        let commands = stream::unfold(source, |mut source| async move {
            let batch = match source.next_batch().await {
                Ok(batch) => batch,
                Err(e) => {
                    log::warn!("Failed to receive commands: {}", e);
                    tokio::time::sleep(SOURCE_RETRY_DELAY).await;
                    Vec::new()
                }
            };
            Some((stream::iter(batch), source))
        })
        .flatten();
        futures::pin_mut!(commands);

        while let Some(inbound) = commands.next().await {
            if let Err(e) = self.handle(&inbound).await {
                log::error!(
                    "Failed to reply to /{} in chat {}: {}",
                    inbound.command,
                    inbound.chat_id,
                    e
                );
            }
        }
    }

    /// Handle one inbound command; the error is the reply delivery failure.
    pub async fn handle(&self, inbound: &InboundCommand) -> Result<()> {
        let Some(command) = Command::parse(&inbound.command) else {
            log::debug!("Ignoring unknown command /{}", inbound.command);
            return Ok(());
        };
        log::info!("Chat {} sent /{}", inbound.chat_id, inbound.command);

        let text = match command {
            Command::Start | Command::Help => messages::HELP.to_string(),
            Command::Query => messages::query(&self.context.config.search.query),
            Command::Subscribers => messages::subscribers(&self.context.registry.list().await),
            Command::Subscribe => self.subscribe(inbound).await,
            Command::Unsubscribe => self.unsubscribe(inbound).await,
        };

        self.context
            .transport
            .send(&OutboundMessage::reply(inbound.chat_id, text))
            .await
    }

    async fn subscribe(&self, inbound: &InboundCommand) -> String {
        let display_name = format!(
            "{} {}",
            inbound.sender_last_name, inbound.sender_first_name
        );
        let subscriber = Subscriber::new(
            inbound.chat_id,
            display_name,
            inbound.sender_handle.clone(),
        );

        match self.context.registry.add(subscriber).await {
            Ok(()) => messages::SUBSCRIBED.to_string(),
            Err(AppError::DuplicateSubscriber(_)) => messages::ALREADY_SUBSCRIBED.to_string(),
            Err(e) => {
                log::error!("Subscribe failed for chat {}: {}", inbound.chat_id, e);
                messages::error(&e)
            }
        }
    }

    async fn unsubscribe(&self, inbound: &InboundCommand) -> String {
        match self.context.registry.remove(inbound.chat_id).await {
            Ok(_) => messages::UNSUBSCRIBED.to_string(),
            Err(AppError::NotSubscribed(_)) => messages::NOT_SUBSCRIBED.to_string(),
            Err(e) => {
                log::error!("Unsubscribe failed for chat {}: {}", inbound.chat_id, e);
                messages::error(&e)
            }
        }
    }
}
