use mockito::{Matcher, Server};
use serde_json::json;
use std::time::Duration;
use tgvoice_core::{
    session::ChatId,
    telegram::{
        types::{InlineKeyboardButton, InlineKeyboardMarkup},
        AudioKind, ChatPlatform, InputFile, TelegramClient, TelegramError,
    },
};

const TOKEN: &str = "123:secret";

fn client(api_url: &str) -> TelegramClient {
    TelegramClient::with_api_url(TOKEN.to_string(), api_url, Duration::from_secs(5)).unwrap()
}

fn path(method: &str) -> String {
    format!("/bot{TOKEN}/{method}")
}

#[tokio::test]
async fn test_get_me() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", path("getMe").as_str())
        .with_status(200)
        .with_body(
            json!({
                "ok": true,
                "result": {"id": 42, "is_bot": true, "first_name": "TTS", "username": "tts_bot"}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let me = client(&server.url()).get_me().await.unwrap();

    assert_eq!(me.id, 42);
    assert_eq!(me.username.as_deref(), Some("tts_bot"));
}

#[tokio::test]
async fn test_get_updates_sends_offset_and_parses_updates() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", path("getUpdates").as_str())
        .match_body(Matcher::PartialJson(json!({
            "offset": 5,
            "timeout": 0,
            "allowed_updates": ["message", "callback_query"],
        })))
        .with_status(200)
        .with_body(
            json!({
                "ok": true,
                "result": [
                    {
                        "update_id": 5,
                        "message": {
                            "message_id": 1,
                            "date": 0,
                            "chat": {"id": 100, "type": "private"},
                            "from": {"id": 100, "is_bot": false, "first_name": "A"},
                            "text": "hello"
                        }
                    },
                    {
                        "update_id": 6,
                        "callback_query": {
                            "id": "cb",
                            "chat_instance": "x",
                            "from": {"id": 100, "is_bot": false, "first_name": "A"},
                            "message": {"message_id": 2, "date": 0, "chat": {"id": 100, "type": "private"}},
                            "data": "pick:v1"
                        }
                    },
                    {
                        "update_id": 7,
                        "message": {
                            "message_id": 3,
                            "date": 0,
                            "chat": {"id": 100, "type": "private"},
                            "voice": {"file_id": "f", "duration": 1}
                        }
                    }
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let updates = client(&server.url())
        .get_updates(Some(5), 0)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(updates.len(), 3);
    assert_eq!(
        updates[0].message.as_ref().unwrap().text.as_deref(),
        Some("hello")
    );
    assert_eq!(updates[1].chat_id(), Some(ChatId(100)));
    assert_eq!(
        updates[1].callback_query.as_ref().unwrap().data.as_deref(),
        Some("pick:v1")
    );
    assert!(updates[2].message.as_ref().unwrap().text.is_none());
}

#[tokio::test]
async fn test_send_message_with_keyboard() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", path("sendMessage").as_str())
        .match_body(Matcher::PartialJson(json!({
            "chat_id": 100,
            "text": "Choose a voice:",
            "reply_markup": {"inline_keyboard": [[{"text": "Alice", "callback_data": "pick:v1"}]]},
        })))
        .with_status(200)
        .with_body(r#"{"ok": true, "result": {"message_id": 1, "chat": {"id": 100}}}"#)
        .create_async()
        .await;

    let keyboard = InlineKeyboardMarkup {
        inline_keyboard: vec![vec![InlineKeyboardButton::callback("Alice", "pick:v1")]],
    };
    client(&server.url())
        .send_message(ChatId(100), "Choose a voice:", Some(&keyboard))
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_api_error_is_reported() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", path("sendMessage").as_str())
        .with_status(400)
        .with_body(r#"{"ok": false, "error_code": 400, "description": "Bad Request: chat not found"}"#)
        .create_async()
        .await;

    let err = client(&server.url())
        .send_message(ChatId(1), "hi", None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TelegramError::Api { code: Some(400), ref description } if description.contains("chat not found")
    ));
    assert!(!err.is_not_modified());
}

#[tokio::test]
async fn test_not_modified_edit_is_recognized() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", path("editMessageReplyMarkup").as_str())
        .with_status(400)
        .with_body(
            r#"{"ok": false, "error_code": 400, "description": "Bad Request: message is not modified: specified new message content and reply markup are exactly the same"}"#,
        )
        .create_async()
        .await;

    let keyboard = InlineKeyboardMarkup {
        inline_keyboard: vec![],
    };
    let err = client(&server.url())
        .edit_message_keyboard(ChatId(1), 2, &keyboard)
        .await
        .unwrap_err();

    assert!(err.is_not_modified());
}

#[tokio::test]
async fn test_send_document_uploads_multipart() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", path("sendDocument").as_str())
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data".to_string()),
        )
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="document"; filename="tts_v1_5.mp3""#.to_string()),
            Matcher::Regex("File: v1".to_string()),
            Matcher::Regex("ID3-audio".to_string()),
        ]))
        .with_status(200)
        .with_body(r#"{"ok": true, "result": {"message_id": 9}}"#)
        .create_async()
        .await;

    let file = InputFile {
        bytes: b"ID3-audio".to_vec(),
        file_name: "tts_v1_5.mp3".to_string(),
        mime: "audio/mpeg".to_string(),
    };
    client(&server.url())
        .send_audio(ChatId(100), AudioKind::Document, &file, Some("File: v1"))
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_transport_errors_do_not_leak_token() {
    let err = client("http://127.0.0.1:1")
        .get_me()
        .await
        .unwrap_err();

    assert!(matches!(err, TelegramError::Http(_)));
    assert!(!err.to_string().contains("secret"));
    assert!(!format!("{err:?}").contains("secret"));
}

#[tokio::test]
async fn test_oversized_poll_timeout_does_not_overflow() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", path("getUpdates").as_str())
        .with_status(200)
        .with_body(r#"{"ok": true, "result": []}"#)
        .create_async()
        .await;

    let updates = client(&server.url())
        .get_updates(None, u64::MAX)
        .await
        .unwrap();

    assert!(updates.is_empty());
}
