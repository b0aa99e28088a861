use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::error::TtsError;
use super::provider::TextToSpeech;
use super::types::Voice;

#[derive(Default)]
struct Snapshot {
    voices: Vec<Voice>,
    fetched_at: Option<Instant>,
}

/// The most recently fetched set of voices.
///
/// Reads never hit the network. The snapshot only changes through
/// `refresh` (or `refresh_if_stale`), which the entry point calls once at
/// startup and the bot calls when a user asks for it.
pub struct VoiceCatalog {
    provider: Arc<dyn TextToSpeech>,
    fallback_voice_id: String,
    snapshot: RwLock<Snapshot>,
}

impl VoiceCatalog {
    /// `fallback_voice_id` stands in as the only voice when the provider
    /// returns an empty list.
    pub fn new(provider: Arc<dyn TextToSpeech>, fallback_voice_id: impl Into<String>) -> Self {
        Self {
            provider,
            fallback_voice_id: fallback_voice_id.into(),
            snapshot: RwLock::new(Snapshot::default()),
        }
    }

    /// Fetch voices from the provider and replace the snapshot. On error the
    /// previous snapshot is kept.
    pub async fn refresh(&self) -> Result<usize, TtsError> {
        let mut voices = self.provider.list_voices().await?;
        if voices.is_empty() {
            warn!(
                provider = self.provider.name(),
                fallback = %self.fallback_voice_id,
                "Provider returned no voices, using fallback voice"
            );
            voices.push(Voice::new(self.fallback_voice_id.clone(), "Default"));
        }

        let count = voices.len();
        {
            let mut snapshot = self.snapshot.write().expect("voice catalog lock poisoned");
            snapshot.voices = voices;
            snapshot.fetched_at = Some(Instant::now());
        }

        info!(count, provider = self.provider.name(), "Voices loaded");
        Ok(count)
    }

    /// Refresh only if the snapshot is missing or older than `max_age`.
    /// Returns true when a refresh happened. A failed refresh is logged and
    /// the old snapshot stays in place.
    pub async fn refresh_if_stale(&self, max_age: Duration) -> bool {
        let stale = self.age().map_or(true, |age| age >= max_age);
        if !stale {
            return false;
        }

        match self.refresh().await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Voice catalog refresh failed, keeping previous voices");
                false
            }
        }
    }

    pub fn voices(&self) -> Vec<Voice> {
        self.read().voices.clone()
    }

    pub fn get(&self, voice_id: &str) -> Option<Voice> {
        self.read().voices.iter().find(|v| v.id == voice_id).cloned()
    }

    pub fn contains(&self, voice_id: &str) -> bool {
        self.read().voices.iter().any(|v| v.id == voice_id)
    }

    pub fn len(&self) -> usize {
        self.read().voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().voices.is_empty()
    }

    /// Time since the last successful refresh
    pub fn age(&self) -> Option<Duration> {
        self.read().fetched_at.map(|at| at.elapsed())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Snapshot> {
        self.snapshot.read().expect("voice catalog lock poisoned")
    }
}
