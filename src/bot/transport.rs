use crate::core::error::TransportError;
use async_trait::async_trait;

/// What a chat update carries
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpdateKind {
    Text(String),
    /// Button press with its opaque payload
    Callback { callback_id: String, data: String },
    /// Anything the bot does not handle (stickers, edits, joins, ...)
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatUpdate {
    pub update_id: i64,
    pub chat_id: Option<i64>,
    pub kind: UpdateKind,
}

/// Bidirectional chat channel used by the bot
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Long-poll for updates with an id of at least `offset`
    async fn next_updates(&self, offset: Option<i64>) -> Result<Vec<ChatUpdate>, TransportError>;

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TransportError>;

    /// Acknowledge a button press so the client stops its spinner
    async fn answer_callback(&self, callback_id: &str) -> Result<(), TransportError>;
}
