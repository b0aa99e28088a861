use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use tgvoice_core::settings::{EnvFileStatus, LogLevel};
use tgvoice_core::telegram::ChatPlatform;
use tgvoice_core::tts::ElevenLabsConfig;
use tgvoice_core::{
    BotHandler, BotRunner, ElevenLabs, Settings, SettingsLoader, SpeechService, TelegramClient,
    TextToSpeech, VoiceCatalog,
};

#[derive(Parser, Debug)]
#[command(name = "tgvoice")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Telegram bot that reads text aloud with ElevenLabs voices")]
struct Args {
    /// Env file with credentials and settings
    #[arg(long, value_name = "PATH", default_value = ".env")]
    env_file: PathBuf,

    /// Read settings only from the process environment
    #[arg(long, conflicts_with = "env_file")]
    no_env_file: bool,

    /// Optional TOML settings file, overridden by the environment
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Print the available voices as JSON and exit
    #[arg(long)]
    list_voices: bool,
}

impl Args {
    fn settings_loader(&self) -> SettingsLoader {
        let mut loader = if self.no_env_file {
            SettingsLoader::new().without_env_file()
        } else {
            SettingsLoader::new().env_file(&self.env_file)
        };
        if let Some(path) = &self.settings {
            loader = loader.settings_file(path);
        }
        loader
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let loaded = args
        .settings_loader()
        .load()
        .context("Invalid configuration")?;

    setup_tracing(loaded.settings.log_level)?;
    match &loaded.env_file {
        EnvFileStatus::Loaded(path) => info!(path = %path.display(), "Loaded env file"),
        EnvFileStatus::NotFound(path) => {
            warn!(path = %path.display(), "No env file found, using process environment")
        }
        EnvFileStatus::Disabled => {}
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main(args, loaded.settings))
}

async fn async_main(args: Args, settings: Settings) -> Result<()> {
    info!(?settings, "Starting");

    let provider: Arc<dyn TextToSpeech> =
        Arc::new(ElevenLabs::new(ElevenLabsConfig::from_settings(&settings))?);
    let catalog = Arc::new(VoiceCatalog::new(
        provider.clone(),
        settings.default_voice_id.clone(),
    ));

    catalog
        .refresh()
        .await
        .context("Failed to load voices from ElevenLabs")?;

    if args.list_voices {
        println!("{}", serde_json::to_string_pretty(&catalog.voices())?);
        return Ok(());
    }

    if !catalog.contains(&settings.default_voice_id) {
        warn!(
            voice_id = %settings.default_voice_id,
            "Default voice is not in the catalog, users must pick a voice first"
        );
    }

    let platform: Arc<dyn ChatPlatform> = Arc::new(TelegramClient::from_settings(&settings)?);
    let me = platform
        .get_me()
        .await
        .context("Telegram rejected the bot token")?;
    info!(
        bot_id = me.id,
        username = me.username.as_deref().unwrap_or(""),
        "Connected to Telegram"
    );
    platform.delete_webhook(true).await?;

    let speech = SpeechService::from_settings(provider, catalog, &settings);
    let handler = Arc::new(BotHandler::from_settings(
        platform.clone(),
        speech,
        &settings,
    ));
    let runner = BotRunner::new(platform, handler, settings.poll_timeout_secs);

    runner.run_until(shutdown_signal()).await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
}

fn setup_tracing(level: LogLevel) -> Result<()> {
    use tracing_subscriber::fmt;

    // RUST_LOG wins over LOG_LEVEL when set
    let filter = EnvFilter::builder()
        .with_default_directive(level.as_filter().into())
        .from_env_lossy();

    // stdout is reserved for --list-voices output
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .with(filter)
        .try_init()?;

    info!(%level, "Tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn process_env() -> HashMap<&'static str, String> {
        HashMap::from([
            ("ELEVENLABS_API_KEY", "key".to_string()),
            ("TELEGRAM_BOT_TOKEN", "123:token".to_string()),
        ])
    }

    fn load(argv: &[&str]) -> tgvoice_core::settings::LoadedSettings {
        let env = process_env();
        Args::try_parse_from(argv)
            .unwrap()
            .settings_loader()
            .load_with(|k| env.get(k).cloned())
            .unwrap()
    }

    #[test]
    fn test_no_env_file_flag_skips_env_file() {
        let loaded = load(&["tgvoice", "--no-env-file"]);

        assert_eq!(loaded.env_file, EnvFileStatus::Disabled);
    }

    #[test]
    fn test_env_file_path_is_used() {
        let loaded = load(&["tgvoice", "--env-file", "/nonexistent/tgvoice.env"]);

        assert_eq!(
            loaded.env_file,
            EnvFileStatus::NotFound(PathBuf::from("/nonexistent/tgvoice.env"))
        );
    }

    #[test]
    fn test_no_env_file_conflicts_with_env_file() {
        let result = Args::try_parse_from(["tgvoice", "--no-env-file", "--env-file", "x.env"]);

        assert!(result.is_err());
    }
}
