//! Minimal Telegram Bot API client: long-polling for updates and sending
//! messages.

use std::time::Duration;

use async_trait::async_trait;
use news_core::{ChatClient, ChatId, DeliveryError, ParseMode, SendOptions};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Telegram API error: {0}")]
    Api(String),
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

impl Update {
    /// Chat and text of a plain text message, if this update carries one.
    pub fn text_message(&self) -> Option<(ChatId, &str)> {
        let message = self.message.as_ref()?;
        Some((message.chat.id, message.text.as_deref()?))
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: ChatId,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    disable_web_page_preview: bool,
}

#[derive(Debug, Serialize)]
struct GetUpdates {
    offset: i64,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

#[derive(Debug, Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(client: Client, token: &str) -> Self {
        Self::with_api_base(client, API_BASE, token)
    }

    pub fn with_api_base(client: Client, api_base: &str, token: &str) -> Self {
        Self {
            client,
            base_url: format!("{}/bot{}", api_base.trim_end_matches('/'), token),
        }
    }

    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<T, TelegramError> {
        let response: ApiResponse<T> = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .timeout(timeout)
            .json(body)
            .send()
            .await?
            .json()
            .await?;
        match response {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse { description, .. } => Err(TelegramError::Api(
                description.unwrap_or_else(|| format!("{method} failed")),
            )),
        }
    }

    /// Long-polls for updates after `offset`, waiting up to `wait` seconds.
    pub async fn get_updates(&self, offset: i64, wait: u64) -> Result<Vec<Update>, TelegramError> {
        let body = GetUpdates {
            offset,
            timeout: wait,
            allowed_updates: ["message"],
        };
        self.call("getUpdates", &body, Duration::from_secs(wait + 10))
            .await
    }
}

#[async_trait]
impl ChatClient for TelegramClient {
    async fn send(
        &self,
        chat_id: ChatId,
        text: &str,
        options: &SendOptions,
    ) -> Result<(), DeliveryError> {
        let body = SendMessage {
            chat_id,
            text,
            parse_mode: options.parse_mode.map(|mode| match mode {
                ParseMode::Html => "HTML",
                ParseMode::Markdown => "Markdown",
            }),
            disable_web_page_preview: options.disable_link_preview,
        };
        self.call::<_, serde_json::Value>("sendMessage", &body, Duration::from_secs(30))
            .await
            .map(|_| ())
            .map_err(|err| match err {
                TelegramError::Network(source) => DeliveryError::Network { chat_id, source },
                TelegramError::Api(description) => DeliveryError::Rejected {
                    chat_id,
                    description,
                },
            })
    }
}
