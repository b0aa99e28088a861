use anyhow::anyhow;
use std::sync::Arc;
use tracing::debug;

use super::catalog::VoiceCatalog;
use super::error::TtsError;
use super::provider::TextToSpeech;
use super::types::{AudioData, SynthesisRequest};
use crate::settings::{AudioFormat, Settings};

/// Front door for synthesis. Validates text and voice against the catalog
/// before anything goes over the network, and refuses to return empty audio.
#[derive(Clone)]
pub struct SpeechService {
    provider: Arc<dyn TextToSpeech>,
    catalog: Arc<VoiceCatalog>,
    format: AudioFormat,
    max_text_chars: usize,
}

impl SpeechService {
    pub fn new(
        provider: Arc<dyn TextToSpeech>,
        catalog: Arc<VoiceCatalog>,
        format: AudioFormat,
        max_text_chars: usize,
    ) -> Self {
        Self {
            provider,
            catalog,
            format,
            max_text_chars,
        }
    }

    pub fn from_settings(
        provider: Arc<dyn TextToSpeech>,
        catalog: Arc<VoiceCatalog>,
        settings: &Settings,
    ) -> Self {
        Self::new(
            provider,
            catalog,
            settings.audio_format,
            settings.max_text_chars,
        )
    }

    pub fn catalog(&self) -> &Arc<VoiceCatalog> {
        &self.catalog
    }

    pub async fn synthesize(&self, voice_id: &str, text: &str) -> Result<AudioData, TtsError> {
        if text.trim().is_empty() {
            return Err(TtsError::InvalidInput("Text is empty".to_string()));
        }

        let chars = text.chars().count();
        if chars > self.max_text_chars {
            return Err(TtsError::InvalidInput(format!(
                "Text is too long ({chars} characters, limit is {})",
                self.max_text_chars
            )));
        }

        if !self.catalog.contains(voice_id) {
            debug!(voice_id, "Rejecting synthesis for voice outside catalog");
            return Err(TtsError::InvalidVoice(voice_id.to_string()));
        }

        let request = SynthesisRequest {
            voice_id: voice_id.to_string(),
            text: text.to_string(),
            format: self.format,
        };

        let audio = self.provider.synthesize(&request).await?;
        if audio.is_empty() {
            return Err(TtsError::provider(
                None,
                anyhow!("{} returned empty audio", self.provider.name()),
            ));
        }

        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tts::mock::{MockBehavior, MockTts, MOCK_AUDIO};
    use crate::tts::types::Voice;

    async fn service_with(behavior: MockBehavior) -> (SpeechService, MockTts) {
        let mock = MockTts::with_behavior(vec![Voice::new("v1", "Alice")], behavior);
        let provider: Arc<dyn TextToSpeech> = Arc::new(mock.clone());
        let catalog = Arc::new(VoiceCatalog::new(provider.clone(), "v1"));
        catalog.refresh().await.unwrap();
        (
            SpeechService::new(provider, catalog, AudioFormat::Mp3, 10),
            mock,
        )
    }

    #[tokio::test]
    async fn test_valid_request_returns_audio() {
        let (service, mock) = service_with(MockBehavior::Success).await;

        let audio = service.synthesize("v1", "hello").await.unwrap();
        assert_eq!(audio.bytes, MOCK_AUDIO);
        assert_eq!(audio.format, AudioFormat::Mp3);

        let requests = mock.captured_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].voice_id, "v1");
        assert_eq!(requests[0].text, "hello");
    }

    #[tokio::test]
    async fn test_unknown_voice_never_reaches_provider() {
        let (service, mock) = service_with(MockBehavior::Success).await;

        let err = service.synthesize("nope", "hello").await.unwrap_err();
        assert!(matches!(err, TtsError::InvalidVoice(ref id) if id == "nope"));
        assert_eq!(mock.synthesize_call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_text_is_invalid_input() {
        let (service, mock) = service_with(MockBehavior::Success).await;

        for text in ["", "   ", "\n\t"] {
            let err = service.synthesize("v1", text).await.unwrap_err();
            assert!(matches!(err, TtsError::InvalidInput(_)));
        }
        assert_eq!(mock.synthesize_call_count(), 0);
    }

    #[tokio::test]
    async fn test_length_limit_counts_characters() {
        let (service, mock) = service_with(MockBehavior::Success).await;

        // Ten Cyrillic letters are twenty bytes but within a ten character limit
        assert!(service.synthesize("v1", "приветмиры").await.is_ok());

        let err = service.synthesize("v1", "hello world").await.unwrap_err();
        assert!(matches!(err, TtsError::InvalidInput(ref m) if m.contains("too long")));
        assert_eq!(mock.synthesize_call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_audio_becomes_provider_error() {
        let (service, _mock) = service_with(MockBehavior::EmptyAudio).await;

        let err = service.synthesize("v1", "hello").await.unwrap_err();
        assert!(matches!(err, TtsError::ProviderError { .. }));
    }

    #[tokio::test]
    async fn test_provider_failures_pass_through() {
        let (service, _mock) = service_with(MockBehavior::RateLimited).await;

        let err = service.synthesize("v1", "hello").await.unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_unavailable() {
        let (service, mock) = service_with(MockBehavior::Unavailable).await;

        let err = service.synthesize("v1", "hello").await.unwrap_err();
        assert!(matches!(err, TtsError::ProviderUnavailable(_)));
        assert_eq!(mock.synthesize_call_count(), 1);
    }
}
