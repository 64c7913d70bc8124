//! wiremock-backed stand-in for the Bot API

#![allow(dead_code)]

use std::time::Duration;
use teloxide::Bot;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct TelegramMock {
    pub server: MockServer,
}

fn ok(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true, "result": result}))
}

/// Matches `/bot<token>/<method>` for either capitalization of the method.
fn api_path(name: &str) -> String {
    let (first, rest) = name.split_at(1);
    format!(
        "^/bot[^/]+/[{}{}]{}$",
        first.to_lowercase(),
        first.to_uppercase(),
        rest
    )
}

impl TelegramMock {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn bot(&self) -> Bot {
        Bot::new("test_token_12345:ABCDEF").set_api_url(self.server.uri().parse().expect("mock uri"))
    }

    pub async fn mount_get_me(&self) {
        Mock::given(method("POST"))
            .and(path_regex(api_path("getMe")))
            .respond_with(ok(serde_json::json!({
                "id": 42,
                "is_bot": true,
                "first_name": "Ferry",
                "username": "mediaferry_bot",
                "can_join_groups": true,
                "can_read_all_group_messages": false,
                "supports_inline_queries": false,
                "can_connect_to_business": false,
                "has_main_web_app": false,
                "has_topics_enabled": false,
                "allows_users_to_create_topics": false
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_delete_webhook(&self, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path_regex(api_path("deleteWebhook")))
            .respond_with(ok(serde_json::json!(true)))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_set_webhook(&self, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path_regex(api_path("setWebhook")))
            .respond_with(ok(serde_json::json!(true)))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    /// First `getUpdates` returns `updates`; later ones return nothing after a short delay.
    pub async fn mount_get_updates(&self, updates: Vec<serde_json::Value>) {
        Mock::given(method("POST"))
            .and(path_regex(api_path("getUpdates")))
            .respond_with(ok(serde_json::Value::Array(updates)))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&self.server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(api_path("getUpdates")))
            .respond_with(ok(serde_json::json!([])).set_delay(Duration::from_millis(100)))
            .with_priority(2)
            .mount(&self.server)
            .await;
    }

    /// `getUpdates` fails with a server error `times` times, then behaves like `mount_get_updates`.
    pub async fn mount_flaky_get_updates(&self, times: u64, updates: Vec<serde_json::Value>) {
        Mock::given(method("POST"))
            .and(path_regex(api_path("getUpdates")))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .up_to_n_times(times)
            .with_priority(1)
            .mount(&self.server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(api_path("getUpdates")))
            .respond_with(ok(serde_json::Value::Array(updates)))
            .up_to_n_times(1)
            .with_priority(2)
            .mount(&self.server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(api_path("getUpdates")))
            .respond_with(ok(serde_json::json!([])).set_delay(Duration::from_millis(100)))
            .with_priority(3)
            .mount(&self.server)
            .await;
    }

    /// Number of received calls to a Bot API method.
    pub async fn calls(&self, name: &str) -> usize {
        let pattern = regex::Regex::new(&api_path(name)).expect("valid pattern");
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|req| pattern.is_match(req.url.path()))
            .count()
    }

    /// Raw bodies (JSON or multipart) of received calls to a Bot API method.
    pub async fn bodies(&self, name: &str) -> Vec<String> {
        let pattern = regex::Regex::new(&api_path(name)).expect("valid pattern");
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|req| pattern.is_match(req.url.path()))
            .map(|req| String::from_utf8_lossy(&req.body).to_string())
            .collect()
    }
}
