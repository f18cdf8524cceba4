use crate::config::ConfigError;
use crate::sink::options::{SinkOptions, SEND_TIMEOUT};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A failed send. Handed to the failure callback, never propagated to the host.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("transport failed: {0}")]
    Transport(String),

    #[error("rendering failed: {0}")]
    Render(String),
}

/// JSON body of `sendMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub chat_id: String,
    pub text: String,
    pub parse_mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
}

impl SendMessageRequest {
    pub fn new(options: &SinkOptions, text: String) -> Self {
        Self {
            chat_id: options.chat_id().to_string(),
            text,
            parse_mode: options.parse_mode().as_wire().to_string(),
            message_thread_id: options.topic_id(),
        }
    }
}

/// Delivers one message. Returns the HTTP status code; a non-success status
/// is not an error at this level.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, request: &SendMessageRequest) -> Result<u16, SendError>;
}

/// HTTP client for the Telegram bot API
#[derive(Debug)]
pub struct TelegramClient {
    url: String,
    client: reqwest::Client,
}

impl TelegramClient {
    pub fn new(options: &SinkOptions) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            url: options.send_message_url(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for TelegramClient {
    async fn post(&self, request: &SendMessageRequest) -> Result<u16, SendError> {
        let response = self.client.post(&self.url).json(request).send().await?;
        Ok(response.status().as_u16())
    }
}
