use crate::tts::{
    error::TtsError,
    provider::TextToSpeech,
    types::{AudioData, SynthesisRequest, Voice},
};
use anyhow::anyhow;
use std::sync::{Arc, Mutex};

/// Audio returned by `MockBehavior::Success`
pub const MOCK_AUDIO: &[u8] = b"ID3-mock-audio";

/// Mock behavior for the mock TTS provider
#[derive(Debug, Clone, Default)]
pub enum MockBehavior {
    /// Return `MOCK_AUDIO` for every synthesis
    #[default]
    Success,
    /// Report success but hand back no bytes
    EmptyAudio,
    /// Always fail as if the provider was unreachable
    Unavailable,
    /// Always fail with HTTP 429
    RateLimited,
    /// Always fail with the given HTTP status
    ProviderError { status: u16 },
    /// Pop one behavior per synthesis call, `Success` once drained
    BehaviorQueue { behaviors: Vec<MockBehavior> },
}

/// Mock TTS provider for testing. Clones share state.
#[derive(Clone)]
pub struct MockTts {
    voices: Arc<Mutex<Vec<Voice>>>,
    fail_listing: Arc<Mutex<bool>>,
    behavior: Arc<Mutex<MockBehavior>>,
    list_calls: Arc<Mutex<usize>>,
    captured_requests: Arc<Mutex<Vec<SynthesisRequest>>>,
}

impl MockTts {
    pub fn new(voices: Vec<Voice>) -> Self {
        Self {
            voices: Arc::new(Mutex::new(voices)),
            fail_listing: Arc::new(Mutex::new(false)),
            behavior: Arc::new(Mutex::new(MockBehavior::Success)),
            list_calls: Arc::new(Mutex::new(0)),
            captured_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_behavior(voices: Vec<Voice>, behavior: MockBehavior) -> Self {
        let mock = Self::new(voices);
        mock.set_behavior(behavior);
        mock
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn set_voices(&self, voices: Vec<Voice>) {
        *self.voices.lock().unwrap() = voices;
    }

    pub fn set_listing_fails(&self, fails: bool) {
        *self.fail_listing.lock().unwrap() = fails;
    }

    pub fn list_call_count(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }

    pub fn synthesize_call_count(&self) -> usize {
        self.captured_requests.lock().unwrap().len()
    }

    pub fn captured_requests(&self) -> Vec<SynthesisRequest> {
        self.captured_requests.lock().unwrap().clone()
    }

    fn next_behavior(&self) -> MockBehavior {
        let mut behavior = self.behavior.lock().unwrap();
        if let MockBehavior::BehaviorQueue { behaviors } = &mut *behavior {
            if behaviors.is_empty() {
                return MockBehavior::Success;
            }
            return behaviors.remove(0);
        }
        behavior.clone()
    }
}

#[async_trait::async_trait]
impl TextToSpeech for MockTts {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn list_voices(&self) -> Result<Vec<Voice>, TtsError> {
        *self.list_calls.lock().unwrap() += 1;

        if *self.fail_listing.lock().unwrap() {
            return Err(TtsError::ProviderUnavailable(anyhow!(
                "Mock provider refused to list voices"
            )));
        }
        Ok(self.voices.lock().unwrap().clone())
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioData, TtsError> {
        self.captured_requests.lock().unwrap().push(request.clone());

        match self.next_behavior() {
            MockBehavior::Success | MockBehavior::BehaviorQueue { .. } => Ok(AudioData {
                bytes: MOCK_AUDIO.to_vec(),
                format: request.format,
            }),
            MockBehavior::EmptyAudio => Ok(AudioData {
                bytes: Vec::new(),
                format: request.format,
            }),
            MockBehavior::Unavailable => Err(TtsError::ProviderUnavailable(anyhow!(
                "Mock provider unreachable"
            ))),
            MockBehavior::RateLimited => Err(TtsError::provider(
                Some(429),
                anyhow!("Mock provider rate limited"),
            )),
            MockBehavior::ProviderError { status } => Err(TtsError::provider(
                Some(status),
                anyhow!("Mock provider error {status}"),
            )),
        }
    }
}
