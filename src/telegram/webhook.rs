//! Push-mode HTTP server.
//!
//! - `POST {WEBHOOK_PATH}`: Telegram update; acknowledged before processing
//! - `GET /health`: liveness check, also served in pull mode

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::core::error::AppError;
use crate::telegram::dispatcher::Dispatcher;
use crate::telegram::intake::{decode_payload, inbound_from_update};

pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Clone)]
struct WebhookState {
    dispatcher: Arc<Dispatcher>,
    secret: Option<Arc<str>>,
}

/// Router for push mode: the update endpoint plus `/health`.
pub fn webhook_router(dispatcher: Arc<Dispatcher>, path: &str, secret: Option<String>) -> Router {
    let state = WebhookState {
        dispatcher,
        secret: secret.map(Arc::from),
    };

    Router::new()
        .route(path, post(receive_update))
        .with_state(state)
        .merge(health_router())
}

/// Router exposing only `/health`.
pub fn health_router() -> Router {
    Router::new().route("/health", get(health_handler))
}

/// Serve `app` on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        log::info!("HTTP server listening on http://{}", addr);
    }
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    Ok(())
}

/// GET /health
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "running")
}

/// POST {WEBHOOK_PATH}
async fn receive_update(State(state): State<WebhookState>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    if let Some(expected) = state.secret.as_deref() {
        let provided = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok()).unwrap_or("");
        if !constant_time_eq(provided, expected) {
            log::warn!("Rejected webhook call with a missing or wrong secret token");
            return (StatusCode::UNAUTHORIZED, "unauthorized");
        }
    }

    let update = match decode_payload(&body) {
        Ok(update) => update,
        Err(e) => {
            log::warn!("Dropping webhook payload ({} bytes): {}", body.len(), e);
            return (StatusCode::BAD_REQUEST, "malformed update");
        }
    };

    match inbound_from_update(&update) {
        Some(msg) => {
            let dispatcher = Arc::clone(&state.dispatcher);
            tokio::spawn(async move {
                dispatcher.handle(msg).await;
            });
        }
        None => log::debug!("Ignoring update {} without a text message", update.id.0),
    }

    (StatusCode::OK, "ok")
}

/// Compare without short-circuiting on the first differing byte.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut diff = a.len() ^ b.len();
    for i in 0..a.len().max(b.len()) {
        diff |= usize::from(a.get(i).copied().unwrap_or(0) ^ b.get(i).copied().unwrap_or(0));
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("s3cret", "s3cret"));
        assert!(!constant_time_eq("s3cret", "s3cre"));
        assert!(!constant_time_eq("", "x"));
        assert!(constant_time_eq("", ""));
    }
}
