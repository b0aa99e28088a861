use crate::settings::config::Settings;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const ELEVENLABS_API_KEY: &str = "ELEVENLABS_API_KEY";
pub const TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const DEFAULT_VOICE_ID: &str = "DEFAULT_VOICE_ID";
pub const AUDIO_FORMAT: &str = "AUDIO_FORMAT";
pub const SEND_AS: &str = "SEND_AS";
pub const LOG_LEVEL: &str = "LOG_LEVEL";
pub const ELEVENLABS_BASE_URL: &str = "ELEVENLABS_BASE_URL";
pub const ELEVENLABS_MODEL_ID: &str = "ELEVENLABS_MODEL_ID";
pub const TELEGRAM_API_URL: &str = "TELEGRAM_API_URL";
pub const VOICES_TTL_SECS: &str = "VOICES_TTL_SECS";
pub const REQUEST_TIMEOUT_SECS: &str = "REQUEST_TIMEOUT_SECS";
pub const POLL_TIMEOUT_SECS: &str = "POLL_TIMEOUT_SECS";
pub const MAX_TEXT_CHARS: &str = "MAX_TEXT_CHARS";

/// Longest long-poll wait the Bot API accepts
pub const MAX_POLL_TIMEOUT_SECS: u64 = 50;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required keys that were absent or empty. Only names are reported,
    /// never values.
    #[error("missing or empty environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to read env file {path:?}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("failed to read settings file {path:?}: {source}")]
    SettingsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path:?}: {source}")]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Outcome of looking for the env file, reported by the caller once logging
/// is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvFileStatus {
    Loaded(PathBuf),
    NotFound(PathBuf),
    Disabled,
}

#[derive(Debug)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub env_file: EnvFileStatus,
}

/// Builds `Settings` from layered sources: defaults, optional TOML file, env
/// file, process environment. Later layers win.
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    env_file: Option<PathBuf>,
    settings_file: Option<PathBuf>,
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsLoader {
    pub fn new() -> Self {
        Self {
            env_file: Some(PathBuf::from(".env")),
            settings_file: None,
        }
    }

    pub fn env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = Some(path.into());
        self
    }

    pub fn without_env_file(mut self) -> Self {
        self.env_file = None;
        self
    }

    pub fn settings_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_file = Some(path.into());
        self
    }

    /// Load using the real process environment
    pub fn load(&self) -> Result<LoadedSettings, ConfigError> {
        self.load_with(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the process environment. Values from
    /// the env file only apply to keys `lookup` does not know.
    pub fn load_with<F>(&self, lookup: F) -> Result<LoadedSettings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = match &self.settings_file {
            Some(path) => read_settings_file(path)?,
            None => Settings::default(),
        };

        let (env_file_vars, env_file) = match &self.env_file {
            Some(path) if path.exists() => (
                read_env_file(path)?,
                EnvFileStatus::Loaded(path.clone()),
            ),
            Some(path) => (HashMap::new(), EnvFileStatus::NotFound(path.clone())),
            None => (HashMap::new(), EnvFileStatus::Disabled),
        };

        settings.apply_env(|key| lookup(key).or_else(|| env_file_vars.get(key).cloned()))?;
        settings.validate()?;

        Ok(LoadedSettings { settings, env_file })
    }
}

fn read_settings_file(path: &Path) -> Result<Settings, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::SettingsRead {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::SettingsParse {
        path: path.to_path_buf(),
        source,
    })
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let to_error = |source| ConfigError::EnvFile {
        path: path.to_path_buf(),
        source,
    };

    let mut vars = HashMap::new();
    for item in dotenvy::from_path_iter(path).map_err(to_error)? {
        let (key, value) = item.map_err(to_error)?;
        vars.insert(key, value);
    }
    Ok(vars)
}

impl Settings {
    /// Defaults overlaid with environment values, then validated
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();
        settings.apply_env(lookup)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Overlay environment values. Empty values are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ELEVENLABS_API_KEY) {
            self.elevenlabs_api_key = v.trim().to_string();
        }
        if let Some(v) = get(TELEGRAM_BOT_TOKEN) {
            self.telegram_bot_token = v.trim().to_string();
        }
        if let Some(v) = get(DEFAULT_VOICE_ID) {
            self.default_voice_id = v.trim().to_string();
        }
        if let Some(v) = get(ELEVENLABS_BASE_URL) {
            self.elevenlabs_base_url = v.trim().trim_end_matches('/').to_string();
        }
        if let Some(v) = get(ELEVENLABS_MODEL_ID) {
            self.elevenlabs_model_id = v.trim().to_string();
        }
        if let Some(v) = get(TELEGRAM_API_URL) {
            self.telegram_api_url = v.trim().trim_end_matches('/').to_string();
        }
        if let Some(v) = get(AUDIO_FORMAT) {
            self.audio_format = parse_value(AUDIO_FORMAT, &v)?;
        }
        if let Some(v) = get(SEND_AS) {
            self.send_as = parse_value(SEND_AS, &v)?;
        }
        if let Some(v) = get(LOG_LEVEL) {
            self.log_level = parse_value(LOG_LEVEL, &v)?;
        }
        if let Some(v) = get(VOICES_TTL_SECS) {
            self.voices_ttl_secs = parse_value(VOICES_TTL_SECS, &v)?;
        }
        if let Some(v) = get(REQUEST_TIMEOUT_SECS) {
            self.request_timeout_secs = parse_value(REQUEST_TIMEOUT_SECS, &v)?;
        }
        if let Some(v) = get(POLL_TIMEOUT_SECS) {
            self.poll_timeout_secs = parse_value(POLL_TIMEOUT_SECS, &v)?;
        }
        if let Some(v) = get(MAX_TEXT_CHARS) {
            self.max_text_chars = parse_value(MAX_TEXT_CHARS, &v)?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        if self.elevenlabs_api_key.trim().is_empty() {
            missing.push(ELEVENLABS_API_KEY);
        }
        if self.telegram_bot_token.trim().is_empty() {
            missing.push(TELEGRAM_BOT_TOKEN);
        }
        if self.default_voice_id.trim().is_empty() {
            missing.push(DEFAULT_VOICE_ID);
        }
        if !missing.is_empty() {
            missing.sort_unstable();
            return Err(ConfigError::Missing(missing));
        }

        if self.max_text_chars == 0 {
            return Err(ConfigError::Invalid {
                key: MAX_TEXT_CHARS,
                value: self.max_text_chars.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: REQUEST_TIMEOUT_SECS,
                value: self.request_timeout_secs.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.poll_timeout_secs > MAX_POLL_TIMEOUT_SECS {
            return Err(ConfigError::Invalid {
                key: POLL_TIMEOUT_SECS,
                value: self.poll_timeout_secs.to_string(),
                reason: format!("must be at most {MAX_POLL_TIMEOUT_SECS}"),
            });
        }

        Ok(())
    }
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
