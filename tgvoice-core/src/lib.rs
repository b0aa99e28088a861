pub mod bot;
pub mod session;
pub mod settings;
pub mod telegram;
pub mod tts;

// Common entry points; mocks and wire types stay under their modules.
pub use bot::{BotHandler, BotRunner};
pub use session::{ChatId, SessionStore};
pub use settings::{ConfigError, Settings, SettingsLoader};
pub use telegram::{ChatPlatform, TelegramClient};
pub use tts::{ElevenLabs, SpeechService, TextToSpeech, TtsError, Voice, VoiceCatalog};
