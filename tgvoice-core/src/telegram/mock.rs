use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::platform::{AudioKind, ChatPlatform, InputFile, TelegramError};
use super::types::{InlineKeyboardMarkup, Update, User};
use crate::session::ChatId;

/// How long an empty long poll blocks before returning no updates
const EMPTY_POLL_DELAY: Duration = Duration::from_millis(10);

/// A call the bot made against the platform
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    WebhookDeleted {
        drop_pending_updates: bool,
    },
    Message {
        chat_id: ChatId,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    },
    EditText {
        chat_id: ChatId,
        message_id: i64,
        text: String,
    },
    EditKeyboard {
        chat_id: ChatId,
        message_id: i64,
        keyboard: InlineKeyboardMarkup,
    },
    CallbackAnswered {
        id: String,
    },
    Audio {
        chat_id: ChatId,
        kind: AudioKind,
        file_name: String,
        bytes: Vec<u8>,
        caption: Option<String>,
    },
}

#[derive(Default)]
struct MockState {
    batches: VecDeque<Vec<Update>>,
    poll_failures: usize,
    offsets: Vec<Option<i64>>,
    outgoing: Vec<Outgoing>,
    failing_kinds: HashSet<AudioKind>,
    edits_not_modified: bool,
}

/// In-memory chat platform for tests. Updates are served from queued
/// batches and every outgoing call is recorded. Clones share state.
#[derive(Clone, Default)]
pub struct MockPlatform {
    state: Arc<Mutex<MockState>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a batch returned by one `get_updates` call
    pub fn push_updates(&self, updates: Vec<Update>) {
        self.state().batches.push_back(updates);
    }

    /// Make the next `count` polls fail
    pub fn fail_next_polls(&self, count: usize) {
        self.state().poll_failures = count;
    }

    /// Make uploads of `kind` fail with an API error
    pub fn fail_audio_kind(&self, kind: AudioKind) {
        self.state().failing_kinds.insert(kind);
    }

    /// Make every edit fail the way Telegram does for unchanged content
    pub fn set_edits_not_modified(&self, enabled: bool) {
        self.state().edits_not_modified = enabled;
    }

    pub fn outgoing(&self) -> Vec<Outgoing> {
        self.state().outgoing.clone()
    }

    pub fn clear_outgoing(&self) {
        self.state().outgoing.clear();
    }

    /// Texts of plain messages sent to `chat_id`, in order
    pub fn messages_to(&self, chat_id: ChatId) -> Vec<String> {
        self.state()
            .outgoing
            .iter()
            .filter_map(|o| match o {
                Outgoing::Message { chat_id: to, text, .. } if *to == chat_id => {
                    Some(text.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Kinds of successfully uploaded audio for `chat_id`, in order
    pub fn audio_kinds_to(&self, chat_id: ChatId) -> Vec<AudioKind> {
        self.state()
            .outgoing
            .iter()
            .filter_map(|o| match o {
                Outgoing::Audio { chat_id: to, kind, .. } if *to == chat_id => Some(*kind),
                _ => None,
            })
            .collect()
    }

    /// Offsets passed to each `get_updates` call
    pub fn polled_offsets(&self) -> Vec<Option<i64>> {
        self.state().offsets.clone()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock platform lock poisoned")
    }

    fn record(&self, outgoing: Outgoing) {
        self.state().outgoing.push(outgoing);
    }

    fn not_modified_error() -> TelegramError {
        TelegramError::Api {
            code: Some(400),
            description: "Bad Request: message is not modified".to_string(),
        }
    }
}

#[async_trait]
impl ChatPlatform for MockPlatform {
    async fn get_me(&self) -> Result<User, TelegramError> {
        Ok(User {
            id: 42,
            is_bot: true,
            first_name: "Mock".to_string(),
            username: Some("mock_tts_bot".to_string()),
        })
    }

    async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<(), TelegramError> {
        self.record(Outgoing::WebhookDeleted {
            drop_pending_updates,
        });
        Ok(())
    }

    async fn get_updates(
        &self,
        offset: Option<i64>,
        _timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        let batch = {
            let mut state = self.state();
            state.offsets.push(offset);
            if state.poll_failures > 0 {
                state.poll_failures -= 1;
                return Err(TelegramError::Api {
                    code: Some(502),
                    description: "Bad Gateway".to_string(),
                });
            }
            state.batches.pop_front()
        };

        match batch {
            Some(updates) => Ok(updates),
            None => {
                tokio::time::sleep(EMPTY_POLL_DELAY).await;
                Ok(Vec::new())
            }
        }
    }

    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), TelegramError> {
        self.record(Outgoing::Message {
            chat_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: i64,
        text: &str,
    ) -> Result<(), TelegramError> {
        if self.state().edits_not_modified {
            return Err(Self::not_modified_error());
        }
        self.record(Outgoing::EditText {
            chat_id,
            message_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn edit_message_keyboard(
        &self,
        chat_id: ChatId,
        message_id: i64,
        keyboard: &InlineKeyboardMarkup,
    ) -> Result<(), TelegramError> {
        if self.state().edits_not_modified {
            return Err(Self::not_modified_error());
        }
        self.record(Outgoing::EditKeyboard {
            chat_id,
            message_id,
            keyboard: keyboard.clone(),
        });
        Ok(())
    }

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), TelegramError> {
        self.record(Outgoing::CallbackAnswered {
            id: callback_query_id.to_string(),
        });
        Ok(())
    }

    async fn send_audio(
        &self,
        chat_id: ChatId,
        kind: AudioKind,
        file: &InputFile,
        caption: Option<&str>,
    ) -> Result<(), TelegramError> {
        if self.state().failing_kinds.contains(&kind) {
            return Err(TelegramError::Api {
                code: Some(400),
                description: format!("Bad Request: {} rejected", kind.method()),
            });
        }
        self.record(Outgoing::Audio {
            chat_id,
            kind,
            file_name: file.file_name.clone(),
            bytes: file.bytes.clone(),
            caption: caption.map(str::to_string),
        });
        Ok(())
    }
}
