//! Intake: turn a raw platform notification into an `InboundMessage`.
//!
//! Both transports end up here. Webhook bodies arrive as bytes and go through
//! [`decode_payload`]; polled updates are already decoded by teloxide.

use chrono::{DateTime, Utc};
use teloxide::types::{ChatId, Update, UpdateKind};

use crate::core::error::AppError;

/// A text message addressed to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Decode a webhook body into an `Update`.
pub fn decode_payload(body: &[u8]) -> Result<Update, AppError> {
    serde_json::from_slice::<Update>(body).map_err(|e| AppError::MalformedRequest(e.to_string()))
}

/// Extract the text message carried by an update, if any.
///
/// Edited messages, callbacks, media without captions and every other update
/// kind produce `None`.
pub fn inbound_from_update(update: &Update) -> Option<InboundMessage> {
    let UpdateKind::Message(msg) = &update.kind else {
        return None;
    };
    let text = msg.text()?;
    Some(InboundMessage {
        chat_id: msg.chat.id,
        text: text.to_string(),
        timestamp: msg.date,
    })
}


#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_text_message() {
        let body = fixtures::text_update(7, 42, "https://youtu.be/abc123");
        let update = decode_payload(body.as_bytes()).unwrap();
        let inbound = inbound_from_update(&update).unwrap();

        assert_eq!(inbound.chat_id, ChatId(42));
        assert_eq!(inbound.text, "https://youtu.be/abc123");
        assert_eq!(inbound.timestamp.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let result = decode_payload(b"{not json");
        assert!(matches!(result, Err(AppError::MalformedRequest(_))));
    }

    #[test]
    fn test_message_without_text_is_ignored() {
        let body = serde_json::json!({
            "update_id": 8,
            "message": {
                "message_id": 2,
                "date": 1_700_000_000,
                "chat": {"id": 42, "type": "private", "first_name": "Test"},
                "from": {"id": 42, "is_bot": false, "first_name": "Test"},
                "dice": {"emoji": "🎲", "value": 3}
            }
        })
        .to_string();
        let update = decode_payload(body.as_bytes()).unwrap();
        assert_eq!(inbound_from_update(&update), None);
    }
}
