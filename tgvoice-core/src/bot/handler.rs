use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::commands::{help_text, Command};
use super::keyboard::{voice_keyboard, CallbackAction};
use crate::session::{ChatId, SessionStore};
use crate::settings::{SendAs, Settings};
use crate::telegram::platform::{AudioKind, ChatPlatform, InputFile, TelegramError};
use crate::telegram::types::{CallbackQuery, InlineKeyboardMarkup, Update};
use crate::tts::{AudioData, SpeechService, TtsError, VoiceCatalog};

const PICKER_PROMPT: &str = "Choose a voice:";
const BUSY_REPLY: &str = "The speech service is busy, please try again later.";
const DELIVERY_FAILED_REPLY: &str = "Could not send audio. Please try again later.";
const REFRESH_FAILED_REPLY: &str = "Could not refresh the voice list, please try again later.";
const VOICE_GONE_REPLY: &str = "That voice is no longer available. Use /voice to pick another one.";

/// Title and file name for the playable copy of the audio
const PLAYABLE_STEM: &str = "tts";

/// Maps incoming updates to voice selection or synthesis and replies through
/// the chat platform. Errors from the speech service become chat replies;
/// only platform failures are returned to the caller.
pub struct BotHandler {
    platform: Arc<dyn ChatPlatform>,
    speech: SpeechService,
    sessions: SessionStore,
    send_as: SendAs,
    default_voice_id: String,
    voices_ttl: Duration,
}

impl BotHandler {
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        speech: SpeechService,
        default_voice_id: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            speech,
            sessions: SessionStore::new(),
            send_as: SendAs::Voice,
            default_voice_id: default_voice_id.into(),
            voices_ttl: Duration::from_secs(600),
        }
    }

    pub fn from_settings(
        platform: Arc<dyn ChatPlatform>,
        speech: SpeechService,
        settings: &Settings,
    ) -> Self {
        Self::new(platform, speech, settings.default_voice_id.clone())
            .with_send_as(settings.send_as)
            .with_voices_ttl(settings.voices_ttl())
    }

    pub fn with_send_as(mut self, send_as: SendAs) -> Self {
        self.send_as = send_as;
        self
    }

    pub fn with_voices_ttl(mut self, voices_ttl: Duration) -> Self {
        self.voices_ttl = voices_ttl;
        self
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    fn catalog(&self) -> &VoiceCatalog {
        self.speech.catalog()
    }

    pub async fn handle_update(&self, update: Update) -> Result<(), TelegramError> {
        if let Some(query) = update.callback_query {
            return self.handle_callback(query).await;
        }

        let Some(message) = update.message else {
            debug!(update_id = update.update_id, "Ignoring update without message");
            return Ok(());
        };
        let chat_id = message.chat.id;
        let Some(text) = message.text else {
            debug!(%chat_id, "Ignoring non-text message");
            return Ok(());
        };

        match Command::parse(&text) {
            Some(command) => self.handle_command(chat_id, command).await,
            None => self.handle_text(chat_id, &text).await,
        }
    }

    async fn handle_command(&self, chat_id: ChatId, command: Command) -> Result<(), TelegramError> {
        debug!(%chat_id, ?command, "Handling command");
        match command {
            Command::Start | Command::Voice => self.show_picker(chat_id).await,
            Command::Current => self.show_current(chat_id).await,
            Command::Help => self.platform.send_message(chat_id, &help_text(), None).await,
            Command::Unknown(name) => {
                let reply = format!("Unknown command: /{name}\n\n{}", help_text());
                self.platform.send_message(chat_id, &reply, None).await
            }
        }
    }

    async fn show_picker(&self, chat_id: ChatId) -> Result<(), TelegramError> {
        self.catalog().refresh_if_stale(self.voices_ttl).await;
        let keyboard = voice_keyboard(&self.catalog().voices(), 0);
        self.platform
            .send_message(chat_id, PICKER_PROMPT, Some(&keyboard))
            .await
    }

    async fn show_current(&self, chat_id: ChatId) -> Result<(), TelegramError> {
        let reply = match self.sessions.selected_voice(chat_id).await {
            Some(voice_id) => format!("Current voice: {}", self.describe_voice(&voice_id)),
            None => format!(
                "No voice chosen yet, using the default voice: {}",
                self.describe_voice(&self.default_voice_id)
            ),
        };
        self.platform.send_message(chat_id, &reply, None).await
    }

    fn describe_voice(&self, voice_id: &str) -> String {
        match self.catalog().get(voice_id) {
            Some(voice) if voice.label() != voice.id => format!("{} ({})", voice.label(), voice.id),
            _ => voice_id.to_string(),
        }
    }

    async fn handle_callback(&self, query: CallbackQuery) -> Result<(), TelegramError> {
        if let Err(e) = self.platform.answer_callback_query(&query.id).await {
            warn!(error = %e, callback_id = %query.id, "Failed to answer callback query");
        }

        let chat_id = query.chat_id();
        let message_id = query.message.as_ref().map(|m| m.message_id);
        let Some(action) = query.data.as_deref().and_then(CallbackAction::parse) else {
            debug!(%chat_id, data = ?query.data, "Ignoring unrecognized callback data");
            return Ok(());
        };

        match action {
            CallbackAction::Pick(voice_id) => self.pick_voice(chat_id, message_id, &voice_id).await,
            CallbackAction::Page(page) => {
                self.catalog().refresh_if_stale(self.voices_ttl).await;
                let keyboard = voice_keyboard(&self.catalog().voices(), page);
                self.update_keyboard(chat_id, message_id, &keyboard).await
            }
            CallbackAction::Refresh => match self.catalog().refresh().await {
                Ok(_) => {
                    let keyboard = voice_keyboard(&self.catalog().voices(), 0);
                    self.update_keyboard(chat_id, message_id, &keyboard).await
                }
                Err(e) => {
                    warn!(error = %e, %chat_id, "Voice list refresh failed");
                    self.platform
                        .send_message(chat_id, REFRESH_FAILED_REPLY, None)
                        .await
                }
            },
        }
    }

    async fn pick_voice(
        &self,
        chat_id: ChatId,
        message_id: Option<i64>,
        voice_id: &str,
    ) -> Result<(), TelegramError> {
        let Some(voice) = self.catalog().get(voice_id) else {
            info!(%chat_id, voice_id, "Picked voice is no longer in the catalog");
            return self.update_text(chat_id, message_id, VOICE_GONE_REPLY).await;
        };

        self.sessions.select_voice(chat_id, voice.id.clone()).await;
        info!(%chat_id, voice_id, "Voice selected");

        let reply = format!(
            "Voice selected: {}. Now send me some text to read aloud.",
            voice.label()
        );
        self.update_text(chat_id, message_id, &reply).await
    }

    /// Replace the picker message text, or send a new message when the
    /// callback carried no message.
    async fn update_text(
        &self,
        chat_id: ChatId,
        message_id: Option<i64>,
        text: &str,
    ) -> Result<(), TelegramError> {
        match message_id {
            Some(message_id) => {
                let result = self
                    .platform
                    .edit_message_text(chat_id, message_id, text)
                    .await;
                ignore_not_modified(result)
            }
            None => self.platform.send_message(chat_id, text, None).await,
        }
    }

    async fn update_keyboard(
        &self,
        chat_id: ChatId,
        message_id: Option<i64>,
        keyboard: &InlineKeyboardMarkup,
    ) -> Result<(), TelegramError> {
        match message_id {
            Some(message_id) => {
                let result = self
                    .platform
                    .edit_message_keyboard(chat_id, message_id, keyboard)
                    .await;
                ignore_not_modified(result)
            }
            None => {
                self.platform
                    .send_message(chat_id, PICKER_PROMPT, Some(keyboard))
                    .await
            }
        }
    }

    async fn handle_text(&self, chat_id: ChatId, text: &str) -> Result<(), TelegramError> {
        // Held until the reply is out so requests from one chat run in order
        let session = self.sessions.lock(chat_id).await;
        let voice_id = session.voice_or(&self.default_voice_id).to_string();
        let chars = text.chars().count();
        debug!(%chat_id, voice_id = %voice_id, chars, "Synthesizing text");

        let result = match self.speech.synthesize(&voice_id, text).await {
            Ok(audio) => self.deliver(chat_id, &voice_id, chars, audio).await,
            Err(e) => self.report_error(chat_id, &e).await,
        };

        drop(session);
        result
    }

    async fn report_error(&self, chat_id: ChatId, error: &TtsError) -> Result<(), TelegramError> {
        if error.is_user_error() {
            debug!(%chat_id, error = %error, "Synthesis request rejected");
        } else {
            warn!(
                %chat_id,
                error = %error,
                rate_limited = error.is_rate_limited(),
                "Speech synthesis failed"
            );
        }

        let reply = match error {
            TtsError::InvalidInput(reason) => reason.clone(),
            TtsError::InvalidVoice(voice_id) => {
                format!("Voice {voice_id} is not available. Choose one with /voice.")
            }
            TtsError::ProviderUnavailable(_) | TtsError::ProviderError { .. } => {
                BUSY_REPLY.to_string()
            }
        };
        self.platform.send_message(chat_id, &reply, None).await
    }

    /// Send the audio as the configured kind followed by a downloadable
    /// document. Falls back to Audio + Document, then to a text apology.
    async fn deliver(
        &self,
        chat_id: ChatId,
        voice_id: &str,
        chars: usize,
        audio: AudioData,
    ) -> Result<(), TelegramError> {
        let format = audio.format;
        let bytes = audio.len();
        let playable = InputFile {
            bytes: audio.bytes,
            file_name: format!("{PLAYABLE_STEM}.{}", format.extension()),
            mime: format.mime_type().to_string(),
        };
        let document = InputFile {
            file_name: format!("tts_{voice_id}_{chars}.{}", format.extension()),
            ..playable.clone()
        };
        let caption = format!("File: {voice_id}");

        let primary = match self.send_as {
            SendAs::Voice => AudioKind::Voice,
            SendAs::Audio => AudioKind::Audio,
        };

        let Err(e) = self
            .send_pair(chat_id, primary, &playable, &document, &caption)
            .await
        else {
            info!(%chat_id, voice_id, bytes, "Audio delivered");
            return Ok(());
        };
        warn!(%chat_id, error = %e, kind = ?primary, "Audio delivery failed, falling back to audio");

        if let Err(e) = self
            .send_pair(chat_id, AudioKind::Audio, &playable, &document, &caption)
            .await
        {
            warn!(%chat_id, error = %e, "Fallback audio delivery failed");
            return self
                .platform
                .send_message(chat_id, DELIVERY_FAILED_REPLY, None)
                .await;
        }

        info!(%chat_id, voice_id, "Audio delivered via fallback");
        Ok(())
    }

    async fn send_pair(
        &self,
        chat_id: ChatId,
        kind: AudioKind,
        playable: &InputFile,
        document: &InputFile,
        caption: &str,
    ) -> Result<(), TelegramError> {
        self.platform
            .send_audio(chat_id, kind, playable, None)
            .await?;
        self.platform
            .send_audio(chat_id, AudioKind::Document, document, Some(caption))
            .await
    }
}

fn ignore_not_modified(result: Result<(), TelegramError>) -> Result<(), TelegramError> {
    match result {
        Err(e) if e.is_not_modified() => {
            debug!("Message already up to date");
            Ok(())
        }
        other => other,
    }
}
