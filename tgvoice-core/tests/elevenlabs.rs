use mockito::{Matcher, Server};
use serde_json::json;
use tgvoice_core::{
    settings::AudioFormat,
    tts::{ElevenLabs, ElevenLabsConfig, SynthesisRequest, TextToSpeech, TtsError},
};

fn client(base_url: String) -> ElevenLabs {
    ElevenLabs::new(ElevenLabsConfig {
        base_url,
        ..ElevenLabsConfig::new("test-key".to_string())
    })
    .unwrap()
}

fn request(voice_id: &str, text: &str) -> SynthesisRequest {
    SynthesisRequest {
        voice_id: voice_id.to_string(),
        text: text.to_string(),
        format: AudioFormat::Mp3,
    }
}

#[tokio::test]
async fn test_list_voices_parses_and_skips_entries_without_id() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/voices")
        .match_header("xi-api-key", "test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "voices": [
                    {"voice_id": "v1", "name": "Alice", "labels": {"accent": "american"}},
                    {"voice_id": "v2"},
                    {"name": "No id"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let voices = client(server.url()).list_voices().await.unwrap();

    mock.assert_async().await;
    assert_eq!(voices.len(), 2);
    assert_eq!(voices[0].id, "v1");
    assert_eq!(voices[0].name, "Alice");
    assert_eq!(
        voices[0].labels.get("accent").map(String::as_str),
        Some("american")
    );
    assert_eq!(voices[1].name, "Unnamed");
}

#[tokio::test]
async fn test_list_voices_accepts_legacy_shape() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/voices")
        .with_status(200)
        .with_body(r#"{"data": [{"id": "old", "name": "Legacy"}]}"#)
        .create_async()
        .await;

    let voices = client(server.url()).list_voices().await.unwrap();

    assert_eq!(voices.len(), 1);
    assert_eq!(voices[0].id, "old");
}

#[tokio::test]
async fn test_list_voices_error_status_is_unavailable() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/voices")
        .with_status(401)
        .with_body(r#"{"detail": "invalid api key"}"#)
        .create_async()
        .await;

    let err = client(server.url()).list_voices().await.unwrap_err();

    assert!(matches!(err, TtsError::ProviderUnavailable(_)));
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_list_voices_unreachable_is_unavailable() {
    let err = client("http://127.0.0.1:1".to_string())
        .list_voices()
        .await
        .unwrap_err();

    assert!(matches!(err, TtsError::ProviderUnavailable(_)));
}

#[tokio::test]
async fn test_synthesize_sends_expected_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/text-to-speech/v1")
        .match_query(Matcher::UrlEncoded(
            "output_format".to_string(),
            "mp3_44100_128".to_string(),
        ))
        .match_header("xi-api-key", "test-key")
        .match_header("accept", "audio/mpeg")
        .match_body(Matcher::PartialJson(json!({
            "text": "hello",
            "model_id": "eleven_multilingual_v2",
        })))
        .with_status(200)
        .with_header("content-type", "audio/mpeg")
        .with_body(b"ID3fake")
        .create_async()
        .await;

    let audio = client(server.url())
        .synthesize(&request("v1", "hello"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(audio.bytes, b"ID3fake");
    assert_eq!(audio.format, AudioFormat::Mp3);
}

#[tokio::test]
async fn test_synthesize_rate_limit_keeps_status() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/text-to-speech/v1")
        .match_query(Matcher::Any)
        .with_status(429)
        .with_body("too many requests")
        .create_async()
        .await;

    let err = client(server.url())
        .synthesize(&request("v1", "hello"))
        .await
        .unwrap_err();

    assert!(err.is_rate_limited());
}

#[tokio::test]
async fn test_synthesize_server_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/text-to-speech/v1")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let err = client(server.url())
        .synthesize(&request("v1", "hello"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TtsError::ProviderError {
            status: Some(500),
            ..
        }
    ));
    assert!(!err.is_user_error());
}
