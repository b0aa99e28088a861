pub mod catalog;
pub mod elevenlabs;
pub mod error;
pub mod mock;
pub mod provider;
pub mod service;
pub mod types;

pub use catalog::VoiceCatalog;
pub use elevenlabs::{ElevenLabs, ElevenLabsConfig};
pub use error::TtsError;
pub use provider::TextToSpeech;
pub use service::SpeechService;
pub use types::{AudioData, SynthesisRequest, Voice};
