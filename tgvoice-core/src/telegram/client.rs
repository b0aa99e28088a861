//! Telegram Bot API over HTTPS

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::platform::{AudioKind, ChatPlatform, InputFile, TelegramError};
use super::types::{ApiResponse, InlineKeyboardMarkup, Update, User};
use crate::session::ChatId;
use crate::settings::config::Settings;

const AUDIO_TITLE: &str = "TTS";

pub struct TelegramClient {
    api_url: String,
    token: String,
    request_timeout: Duration,
    client: Client,
}

impl TelegramClient {
    pub fn from_settings(settings: &Settings) -> Result<Self, TelegramError> {
        Self::with_api_url(
            settings.telegram_bot_token.clone(),
            &settings.telegram_api_url,
            settings.request_timeout(),
        )
    }

    pub fn with_api_url(
        token: String,
        api_url: &str,
        request_timeout: Duration,
    ) -> Result<Self, TelegramError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(strip_url)?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
            request_timeout,
            client,
        })
    }

    fn request(&self, method: &str) -> RequestBuilder {
        self.client
            .post(format!("{}/bot{}/{}", self.api_url, self.token, method))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        body: Value,
    ) -> Result<T, TelegramError> {
        debug!(method, "Telegram API call");
        let response = self
            .request(method)
            .json(&body)
            .send()
            .await
            .map_err(strip_url)?;
        parse_response(method, response).await
    }
}

// Request URLs embed the bot token, so it is removed from errors before they
// can be logged.
fn strip_url(e: reqwest::Error) -> TelegramError {
    TelegramError::Http(e.without_url())
}

async fn parse_response<T: DeserializeOwned>(
    method: &'static str,
    response: reqwest::Response,
) -> Result<T, TelegramError> {
    let api: ApiResponse<T> = response.json().await.map_err(strip_url)?;
    if !api.ok {
        return Err(TelegramError::Api {
            code: api.error_code,
            description: api.description.unwrap_or_default(),
        });
    }
    api.result.ok_or(TelegramError::MissingResult(method))
}

#[async_trait]
impl ChatPlatform for TelegramClient {
    async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", json!({})).await
    }

    async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<(), TelegramError> {
        let _: Value = self
            .call(
                "deleteWebhook",
                json!({ "drop_pending_updates": drop_pending_updates }),
            )
            .await?;
        Ok(())
    }

    async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        let mut body = json!({
            "timeout": timeout_secs,
            "allowed_updates": ["message", "callback_query"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }

        // The server holds the request open for up to `timeout_secs`.
        let response = self
            .request("getUpdates")
            .timeout(Duration::from_secs(timeout_secs).saturating_add(self.request_timeout))
            .json(&body)
            .send()
            .await
            .map_err(strip_url)?;
        parse_response("getUpdates", response).await
    }

    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), TelegramError> {
        let mut body = json!({ "chat_id": chat_id, "text": text });
        if let Some(keyboard) = keyboard {
            body["reply_markup"] = json!(keyboard);
        }
        let _: Value = self.call("sendMessage", body).await?;
        Ok(())
    }

    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: i64,
        text: &str,
    ) -> Result<(), TelegramError> {
        let _: Value = self
            .call(
                "editMessageText",
                json!({ "chat_id": chat_id, "message_id": message_id, "text": text }),
            )
            .await?;
        Ok(())
    }

    async fn edit_message_keyboard(
        &self,
        chat_id: ChatId,
        message_id: i64,
        keyboard: &InlineKeyboardMarkup,
    ) -> Result<(), TelegramError> {
        let _: Value = self
            .call(
                "editMessageReplyMarkup",
                json!({
                    "chat_id": chat_id,
                    "message_id": message_id,
                    "reply_markup": keyboard,
                }),
            )
            .await?;
        Ok(())
    }

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), TelegramError> {
        let _: Value = self
            .call(
                "answerCallbackQuery",
                json!({ "callback_query_id": callback_query_id }),
            )
            .await?;
        Ok(())
    }

    async fn send_audio(
        &self,
        chat_id: ChatId,
        kind: AudioKind,
        file: &InputFile,
        caption: Option<&str>,
    ) -> Result<(), TelegramError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime)
            .map_err(strip_url)?;

        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part(kind.field(), part);
        if let Some(caption) = caption {
            form = form.text("caption", caption.to_string());
        }
        if kind == AudioKind::Audio {
            form = form.text("title", AUDIO_TITLE);
        }

        let response = self
            .request(kind.method())
            .multipart(form)
            .send()
            .await
            .map_err(strip_url)?;
        let _: Value = parse_response(kind.method(), response).await?;
        Ok(())
    }
}
