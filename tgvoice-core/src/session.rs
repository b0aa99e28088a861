use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Telegram chat identifier. Sessions are keyed by chat, which in private
/// chats is the same number as the user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    VoiceChosen(String),
}

#[derive(Debug, Clone)]
pub struct Session {
    pub chat_id: ChatId,
    pub selected_voice: Option<String>,
}

impl Session {
    fn new(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            selected_voice: None,
        }
    }

    pub fn state(&self) -> SessionState {
        match &self.selected_voice {
            Some(voice_id) => SessionState::VoiceChosen(voice_id.clone()),
            None => SessionState::Idle,
        }
    }

    pub fn select_voice(&mut self, voice_id: impl Into<String>) {
        self.selected_voice = Some(voice_id.into());
    }

    /// The voice to synthesize with: the user's choice, else `default`
    pub fn voice_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.selected_voice.as_deref().unwrap_or(default)
    }
}

/// In-memory per-chat sessions.
///
/// Each chat gets its own async mutex. Holding the guard from `lock` for the
/// duration of a request serializes all work for that chat while other
/// chats proceed in parallel. Nothing is persisted.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<ChatId, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the session for `chat_id`, creating it on first interaction
    pub async fn lock(&self, chat_id: ChatId) -> OwnedMutexGuard<Session> {
        // Clone the Arc out so the DashMap shard is released before awaiting.
        let entry = self
            .sessions
            .entry(chat_id)
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(chat_id))))
            .clone();
        entry.lock_owned().await
    }

    pub async fn select_voice(&self, chat_id: ChatId, voice_id: impl Into<String>) {
        self.lock(chat_id).await.select_voice(voice_id);
    }

    pub async fn selected_voice(&self, chat_id: ChatId) -> Option<String> {
        let entry = self.sessions.get(&chat_id).map(|e| e.value().clone())?;
        let session = entry.lock().await;
        session.selected_voice.clone()
    }

    pub async fn state(&self, chat_id: ChatId) -> SessionState {
        match self.selected_voice(chat_id).await {
            Some(voice_id) => SessionState::VoiceChosen(voice_id),
            None => SessionState::Idle,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
