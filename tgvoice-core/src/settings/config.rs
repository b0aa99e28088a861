use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use strum::{Display, EnumString};
use tracing::level_filters::LevelFilter;

pub const DEFAULT_VOICE_ID: &str = "EXAVITQu4vr4xnSDxMaL";
pub const DEFAULT_ELEVENLABS_URL: &str = "https://api.elevenlabs.io/v1";
pub const DEFAULT_MODEL_ID: &str = "eleven_multilingual_v2";
pub const DEFAULT_TELEGRAM_URL: &str = "https://api.telegram.org";

/// How synthesized speech is delivered back to the chat before the
/// downloadable document copy.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SendAs {
    #[default]
    Voice,
    Audio,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AudioFormat {
    #[default]
    Mp3,
}

impl AudioFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
        }
    }

    /// Output format code understood by the ElevenLabs synthesis endpoint
    pub fn provider_code(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3_44100_128",
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    #[strum(to_string = "warning", serialize = "warn")]
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn as_filter(&self) -> LevelFilter {
        match self {
            Self::Debug => LevelFilter::DEBUG,
            Self::Info => LevelFilter::INFO,
            Self::Warning => LevelFilter::WARN,
            Self::Error | Self::Critical => LevelFilter::ERROR,
        }
    }
}

/// Process-wide bot configuration.
///
/// Values are layered by `SettingsLoader`: built-in defaults, then an
/// optional TOML file, then the env file, then the process environment.
/// The two secrets have no default and must be present after layering.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub elevenlabs_api_key: String,
    pub telegram_bot_token: String,
    pub default_voice_id: String,
    pub audio_format: AudioFormat,
    pub send_as: SendAs,
    pub log_level: LogLevel,
    pub elevenlabs_base_url: String,
    pub elevenlabs_model_id: String,
    pub telegram_api_url: String,
    /// Age after which `/voice` refreshes the catalog before showing it
    pub voices_ttl_secs: u64,
    pub request_timeout_secs: u64,
    pub poll_timeout_secs: u64,
    pub max_text_chars: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            elevenlabs_api_key: String::new(),
            telegram_bot_token: String::new(),
            default_voice_id: DEFAULT_VOICE_ID.to_string(),
            audio_format: AudioFormat::default(),
            send_as: SendAs::default(),
            log_level: LogLevel::default(),
            elevenlabs_base_url: DEFAULT_ELEVENLABS_URL.to_string(),
            elevenlabs_model_id: DEFAULT_MODEL_ID.to_string(),
            telegram_api_url: DEFAULT_TELEGRAM_URL.to_string(),
            voices_ttl_secs: 600,
            request_timeout_secs: 15,
            poll_timeout_secs: 30,
            max_text_chars: 5000,
        }
    }
}

impl Settings {
    pub fn voices_ttl(&self) -> Duration {
        Duration::from_secs(self.voices_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// Secrets never reach logs, even at debug level.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("elevenlabs_api_key", &redact(&self.elevenlabs_api_key))
            .field("telegram_bot_token", &redact(&self.telegram_bot_token))
            .field("default_voice_id", &self.default_voice_id)
            .field("audio_format", &self.audio_format)
            .field("send_as", &self.send_as)
            .field("log_level", &self.log_level)
            .field("elevenlabs_base_url", &self.elevenlabs_base_url)
            .field("elevenlabs_model_id", &self.elevenlabs_model_id)
            .field("telegram_api_url", &self.telegram_api_url)
            .field("voices_ttl_secs", &self.voices_ttl_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("max_text_chars", &self.max_text_chars)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}
