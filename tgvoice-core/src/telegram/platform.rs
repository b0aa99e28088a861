use async_trait::async_trait;
use thiserror::Error;

use super::types::{InlineKeyboardMarkup, Update, User};
use crate::session::ChatId;

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Telegram request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error {code:?}: {description}")]
    Api {
        code: Option<i64>,
        description: String,
    },

    #[error("Telegram returned no result for {0}")]
    MissingResult(&'static str),
}

impl TelegramError {
    /// Telegram refuses edits that would leave a message unchanged
    pub fn is_not_modified(&self) -> bool {
        matches!(self, Self::Api { description, .. } if description.contains("message is not modified"))
    }
}

/// How an audio file is presented in the chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioKind {
    Voice,
    Audio,
    Document,
}

impl AudioKind {
    pub fn method(&self) -> &'static str {
        match self {
            Self::Voice => "sendVoice",
            Self::Audio => "sendAudio",
            Self::Document => "sendDocument",
        }
    }

    /// Multipart field carrying the file
    pub fn field(&self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Audio => "audio",
            Self::Document => "document",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime: String,
}

/// Everything the bot needs from the chat platform. `TelegramClient` talks to
/// the real Bot API; `MockPlatform` records calls for tests.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    async fn get_me(&self) -> Result<User, TelegramError>;

    async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<(), TelegramError>;

    /// Long-poll for updates with id >= `offset`
    async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError>;

    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), TelegramError>;

    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: i64,
        text: &str,
    ) -> Result<(), TelegramError>;

    async fn edit_message_keyboard(
        &self,
        chat_id: ChatId,
        message_id: i64,
        keyboard: &InlineKeyboardMarkup,
    ) -> Result<(), TelegramError>;

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), TelegramError>;

    async fn send_audio(
        &self,
        chat_id: ChatId,
        kind: AudioKind,
        file: &InputFile,
        caption: Option<&str>,
    ) -> Result<(), TelegramError>;
}
