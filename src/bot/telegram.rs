use super::transport::{ChatTransport, ChatUpdate, UpdateKind};
use crate::core::error::TransportError;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
/// Seconds the Bot API may hold a getUpdates call open
const LONG_POLL_SECS: u64 = 30;
const HTTP_MARGIN_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawUpdate {
    update_id: i64,
    message: Option<RawMessage>,
    callback_query: Option<RawCallback>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    chat: RawChat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct RawCallback {
    id: String,
    data: Option<String>,
    message: Option<RawMessage>,
}

impl From<RawUpdate> for ChatUpdate {
    fn from(raw: RawUpdate) -> Self {
        let (chat_id, kind) = match (raw.message, raw.callback_query) {
            (Some(message), _) => {
                let kind = message.text.map_or(UpdateKind::Unsupported, UpdateKind::Text);
                (Some(message.chat.id), kind)
            }
            (None, Some(callback)) => {
                let chat_id = callback.message.as_ref().map(|m| m.chat.id);
                let kind = UpdateKind::Callback {
                    callback_id: callback.id,
                    data: callback.data.unwrap_or_default(),
                };
                (chat_id, kind)
            }
            (None, None) => (None, UpdateKind::Unsupported),
        };

        ChatUpdate {
            update_id: raw.update_id,
            chat_id,
            kind,
        }
    }
}

/// Telegram Bot API over long polling
pub struct TelegramClient {
    client: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Result<Self, TransportError> {
        Self::with_api_base(token, DEFAULT_API_BASE)
    }

    pub fn with_api_base(token: &str, api_base: &str) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(LONG_POLL_SECS + HTTP_MARGIN_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_base.trim_end_matches('/'), token),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, payload: Value) -> Result<T, TransportError> {
        let response: ApiResponse<T> = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .json(&payload)
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
            ApiResponse { description, .. } => Err(TransportError::Api(
                description.unwrap_or_else(|| format!("{method} failed")),
            )),
        }
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn next_updates(&self, offset: Option<i64>) -> Result<Vec<ChatUpdate>, TransportError> {
        let mut payload = json!({
            "timeout": LONG_POLL_SECS,
            "allowed_updates": ["message", "callback_query"],
        });
        if let Some(offset) = offset {
            payload["offset"] = json!(offset);
        }

        let updates: Vec<RawUpdate> = self.call("getUpdates", payload).await?;
        debug!(count = updates.len(), "Received Telegram updates");
        Ok(updates.into_iter().map(ChatUpdate::from).collect())
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        let _: Value = self
            .call("sendMessage", json!({ "chat_id": chat_id, "text": text }))
            .await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), TransportError> {
        let _: Value = self
            .call("answerCallbackQuery", json!({ "callback_query_id": callback_id }))
            .await?;
        Ok(())
    }
}
