//! Test fixtures: configuration and Telegram payloads

#![allow(dead_code)]

use chrono::Utc;
use mediaferry::core::Config;
use mediaferry::telegram::InboundMessage;
use std::time::Duration;
use teloxide::types::ChatId;

pub const TEST_CHAT_ID: i64 = 123456789;

/// Config with a scratch dir inside `tmp` plus the given overrides.
pub fn test_config(tmp: &tempfile::TempDir, extra: &[(&str, &str)]) -> Config {
    let mut pairs: Vec<(String, String)> = vec![
        ("BOT_TOKEN".to_string(), "test_token_12345:ABCDEF".to_string()),
        ("SCRATCH_DIR".to_string(), tmp.path().join("scratch").display().to_string()),
        ("PORT".to_string(), "0".to_string()),
        ("POLL_TIMEOUT_SECS".to_string(), "1".to_string()),
    ];
    for (key, value) in extra {
        pairs.retain(|(k, _)| k != key);
        pairs.push((key.to_string(), value.to_string()));
    }
    Config::from_lookup(
        move |key: &str| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()),
        None,
    )
    .expect("test config must be valid")
}

/// A private-chat text message update.
pub fn text_update(update_id: u32, text: &str) -> serde_json::Value {
    serde_json::json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "date": 1_700_000_000,
            "chat": {"id": TEST_CHAT_ID, "type": "private", "first_name": "Test"},
            "from": {"id": TEST_CHAT_ID, "is_bot": false, "first_name": "Test"},
            "text": text
        }
    })
}

pub fn message(text: &str) -> InboundMessage {
    InboundMessage {
        chat_id: ChatId(TEST_CHAT_ID),
        text: text.to_string(),
        timestamp: Utc::now(),
    }
}

/// Poll `cond` every 20ms until it holds or `timeout` passes.
pub async fn wait_until<F: Fn() -> bool>(cond: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    cond()
}
