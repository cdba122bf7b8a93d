//! Telegram Bot API client over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::{AppError, Result};
use crate::models::{ChatId, TelegramConfig};
use crate::telegram::{ChatTransport, CommandSource, InboundCommand, OutboundMessage, command_name};

/// Extra time allowed on top of the long-poll timeout.
const REQUEST_SLACK_SECS: u64 = 15;

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Serialize)]
struct GetUpdates {
    offset: i64,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
}

/// Bot API client.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    api_url: String,
    token: String,
    poll_timeout_secs: u64,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(
                config.poll_timeout_secs + REQUEST_SLACK_SECS,
            ))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &TelegramConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            poll_timeout_secs: config.poll_timeout_secs,
        }
    }

    /// Inbound command stream starting after already acknowledged updates.
    pub fn updates(&self) -> TelegramUpdates {
        TelegramUpdates {
            client: self.clone(),
            offset: 0,
        }
    }

    async fn call<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}/bot{}/{}", self.api_url, self.token, method);
        // Request URLs carry the token; keep them out of error messages.
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Http(e.without_url()))?;

        let status = response.status();
        let payload: ApiResponse<T> = match response.json().await {
            Ok(payload) => payload,
            Err(_) if !status.is_success() => {
                return Err(AppError::telegram(method, format!("HTTP {}", status.as_u16())));
            }
            Err(e) => return Err(AppError::Http(e.without_url())),
        };

        if !payload.ok {
            let description = payload
                .description
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(AppError::telegram(method, description));
        }
        payload
            .result
            .ok_or_else(|| AppError::telegram(method, "response has no result"))
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send(&self, message: &OutboundMessage) -> Result<()> {
        let body = SendMessage {
            chat_id: message.chat_id.0,
            text: &message.text,
            parse_mode: "HTML",
            disable_web_page_preview: !message.allow_link_preview,
        };
        let _: serde_json::Value = self.call("sendMessage", &body).await?;
        Ok(())
    }
}

/// Long-polling `getUpdates` cursor.
pub struct TelegramUpdates {
    client: TelegramClient,
    offset: i64,
}

impl TelegramUpdates {
    fn to_command(update: Update) -> Option<InboundCommand> {
        let message = update.message?;
        let command = command_name(message.text.as_deref()?)?;
        let chat = message.chat;
        Some(InboundCommand {
            chat_id: ChatId(chat.id),
            command,
            sender_handle: chat.username.filter(|u| !u.is_empty()),
            sender_first_name: chat.first_name.unwrap_or_default(),
            sender_last_name: chat.last_name.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl CommandSource for TelegramUpdates {
    async fn next_batch(&mut self) -> Result<Vec<InboundCommand>> {
        let request = GetUpdates {
            offset: self.offset,
            timeout: self.client.poll_timeout_secs,
            allowed_updates: ["message"],
        };
        let updates: Vec<Update> = self.client.call("getUpdates", &request).await?;

        if let Some(last) = updates.iter().map(|u| u.update_id).max() {
            self.offset = last + 1;
        }
        Ok(updates.into_iter().filter_map(Self::to_command).collect())
    }
}
