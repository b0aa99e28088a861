pub mod config;
pub mod loader;


pub use config::{AudioFormat, LogLevel, SendAs, Settings};
pub use loader::{ConfigError, EnvFileStatus, LoadedSettings, SettingsLoader};
