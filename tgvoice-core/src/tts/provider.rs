use async_trait::async_trait;

use super::error::TtsError;
use super::types::{AudioData, SynthesisRequest, Voice};

/// Trait for text-to-speech providers
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    fn name(&self) -> &'static str;

    /// List available voices in provider order
    async fn list_voices(&self) -> Result<Vec<Voice>, TtsError>;

    /// Synthesize text with the requested voice. Callers validate the voice
    /// and text first; implementations only talk to the provider.
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioData, TtsError>;
}
