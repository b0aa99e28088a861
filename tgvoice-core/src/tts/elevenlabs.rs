//! ElevenLabs text-to-speech implementation

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::error::TtsError;
use super::provider::TextToSpeech;
use super::types::{AudioData, SynthesisRequest, Voice};
use crate::settings::config::{Settings, DEFAULT_ELEVENLABS_URL, DEFAULT_MODEL_ID};

#[derive(Debug, Clone)]
pub struct ElevenLabsConfig {
    pub api_key: String,
    pub base_url: String,
    pub model_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
    pub timeout: Duration,
}

impl ElevenLabsConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_ELEVENLABS_URL.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            stability: 0.5,
            similarity_boost: 0.75,
            timeout: Duration::from_secs(15),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            base_url: settings.elevenlabs_base_url.clone(),
            model_id: settings.elevenlabs_model_id.clone(),
            timeout: settings.request_timeout(),
            ..Self::new(settings.elevenlabs_api_key.clone())
        }
    }
}

pub struct ElevenLabs {
    config: ElevenLabsConfig,
    client: Client,
}

impl ElevenLabs {
    pub fn new(config: ElevenLabsConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TtsError::ProviderUnavailable(anyhow!("Failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

// Older API revisions answered with `data` and `id`.
#[derive(Deserialize)]
struct VoicesResponse {
    #[serde(default, alias = "data")]
    voices: Vec<VoiceData>,
}

#[derive(Deserialize)]
struct VoiceData {
    #[serde(alias = "id")]
    voice_id: Option<String>,
    name: Option<String>,
    #[serde(default)]
    labels: Option<BTreeMap<String, String>>,
}

async fn error_body(response: Response) -> String {
    response.text().await.unwrap_or_default()
}

#[async_trait]
impl TextToSpeech for ElevenLabs {
    fn name(&self) -> &'static str {
        "elevenlabs"
    }

    async fn list_voices(&self) -> Result<Vec<Voice>, TtsError> {
        let response = self
            .client
            .get(self.url("voices"))
            .header("xi-api-key", &self.config.api_key)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "ElevenLabs voices request failed");
                TtsError::ProviderUnavailable(anyhow!("Failed to list voices from ElevenLabs: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            warn!(%status, "ElevenLabs voices request returned error");
            return Err(TtsError::ProviderUnavailable(anyhow!(
                "ElevenLabs API error {status}: {body}"
            )));
        }

        let voices_response: VoicesResponse = response.json().await.map_err(|e| {
            TtsError::ProviderUnavailable(anyhow!("Failed to parse voices response: {e}"))
        })?;

        let voices: Vec<Voice> = voices_response
            .voices
            .into_iter()
            .filter_map(|v| {
                let id = v.voice_id.filter(|id| !id.is_empty())?;
                Some(Voice {
                    id,
                    name: v.name.unwrap_or_else(|| "Unnamed".to_string()),
                    labels: v.labels.unwrap_or_default(),
                })
            })
            .collect();

        debug!(count = voices.len(), "Fetched voices from ElevenLabs");
        Ok(voices)
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioData, TtsError> {
        let url = self.url(&format!("text-to-speech/{}", request.voice_id));

        let request_body = SynthesizeRequest {
            text: &request.text,
            model_id: &self.config.model_id,
            voice_settings: VoiceSettings {
                stability: self.config.stability,
                similarity_boost: self.config.similarity_boost,
            },
        };

        let response = self
            .client
            .post(&url)
            .query(&[("output_format", request.format.provider_code())])
            .header("xi-api-key", &self.config.api_key)
            .header(header::ACCEPT, request.format.mime_type())
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, voice_id = %request.voice_id, "ElevenLabs synthesis request failed");
                TtsError::provider(None, anyhow!("Failed to send request to ElevenLabs: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            if status == StatusCode::TOO_MANY_REQUESTS {
                warn!(voice_id = %request.voice_id, "ElevenLabs rate limited synthesis");
            } else if status.is_server_error() {
                warn!(%status, voice_id = %request.voice_id, "ElevenLabs server error on synthesis");
            }
            return Err(TtsError::provider(
                Some(status.as_u16()),
                anyhow!("ElevenLabs API error {status}: {body}"),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TtsError::provider(None, anyhow!("Failed to read audio bytes: {e}")))?
            .to_vec();

        info!(bytes = bytes.len(), voice_id = %request.voice_id, "Synthesis succeeded");

        Ok(AudioData {
            bytes,
            format: request.format,
        })
    }
}
