//! Outbound chat calls behind a trait, plus bot construction.

use async_trait::async_trait;
use reqwest::ClientBuilder;
use std::path::Path;
use teloxide::prelude::*;
use teloxide::types::InputFile;

use crate::core::config::{self, Config};
use crate::core::error::AppError;

/// Everything the dispatcher and delivery need to say to a chat.
#[async_trait]
pub trait ChatOutbox: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), AppError>;

    async fn send_video(&self, chat_id: ChatId, path: &Path) -> Result<(), AppError>;

    async fn send_document(&self, chat_id: ChatId, path: &Path) -> Result<(), AppError>;
}

/// Creates a Bot instance with custom or default API URL
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - The HTTP client could not be built
pub fn create_bot(config: &Config) -> anyhow::Result<Bot> {
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    let bot = Bot::with_client(config.bot_token.clone(), client);

    let bot = match &config.bot_api_url {
        Some(url) => {
            log::info!("Using custom Bot API URL: {}", url);
            bot.set_api_url(url.clone())
        }
        None => bot,
    };

    Ok(bot)
}

/// `ChatOutbox` backed by the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramOutbox {
    bot: Bot,
}

impl TelegramOutbox {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatOutbox for TelegramOutbox {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), AppError> {
        self.bot.send_message(chat_id, text).await?;
        Ok(())
    }

    async fn send_video(&self, chat_id: ChatId, path: &Path) -> Result<(), AppError> {
        self.bot
            .send_video(chat_id, InputFile::file(path.to_path_buf()))
            .supports_streaming(true)
            .await?;
        Ok(())
    }

    async fn send_document(&self, chat_id: ChatId, path: &Path) -> Result<(), AppError> {
        self.bot
            .send_document(chat_id, InputFile::file(path.to_path_buf()))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sent_message_body(chat_id: i64, text: &str) -> serde_json::Value {
        serde_json::json!({
            "ok": true,
            "result": {
                "message_id": 100,
                "date": 1_700_000_000,
                "chat": {"id": chat_id, "type": "private", "first_name": "Test"},
                "text": text
            }
        })
    }

    #[tokio::test]
    async fn test_send_text_hits_send_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex("/bot[^/]+/[Ss]endMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sent_message_body(42, "Downloading…")))
            .expect(1)
            .mount(&server)
            .await;

        let bot = Bot::new("test_token_12345:ABCDEF").set_api_url(server.uri().parse().unwrap());
        let outbox = TelegramOutbox::new(bot);
        outbox.send_text(ChatId(42), "Downloading…").await.unwrap();
    }

    #[tokio::test]
    async fn test_api_error_surfaces_as_telegram_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex("/bot[^/]+/[Ss]endMessage"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            })))
            .mount(&server)
            .await;

        let bot = Bot::new("test_token_12345:ABCDEF").set_api_url(server.uri().parse().unwrap());
        let err = TelegramOutbox::new(bot).send_text(ChatId(1), "hi").await.unwrap_err();
        assert!(matches!(err, AppError::Telegram(_)));
        assert_eq!(err.user_message(), "Failed to send the file.");
    }

    #[test]
    fn test_create_bot_honors_api_url() {
        let config = Config::from_lookup(
            |key: &str| match key {
                "BOT_TOKEN" => Some("1:abc".to_string()),
                "BOT_API_URL" => Some("http://localhost:8081".to_string()),
                _ => None,
            },
            None,
        )
        .unwrap();
        let bot = create_bot(&config).unwrap();
        assert_eq!(bot.api_url().as_str(), "http://localhost:8081/");
        assert_eq!(bot.token(), "1:abc");
    }
}
