//! Push-mode HTTP surface, exercised over a real socket.
//!
//! Run with: cargo test --test webhook_server

mod common;

use common::{test_config, text_update, wait_until};
use mediaferry::download::source::SourceRegistry;
use mediaferry::telegram::dispatcher::HELP_TEXT;
use mediaferry::telegram::webhook::{health_router, serve, webhook_router, SECRET_HEADER};
use mediaferry::telegram::Dispatcher;
use mediaferry::testing::RecordingOutbox;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

struct Server {
    addr: SocketAddr,
    outbox: Arc<RecordingOutbox>,
    _stop: oneshot::Sender<()>,
    _tmp: tempfile::TempDir,
}

async fn start(secret: Option<&str>) -> Server {
    let tmp = tempfile::tempdir().unwrap();
    let config = test_config(&tmp, &[]);
    let outbox = Arc::new(RecordingOutbox::new());
    let dispatcher = Arc::new(Dispatcher::new(&config, SourceRegistry::new(), outbox.clone()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let app = webhook_router(dispatcher, "/webhook", secret.map(str::to_string));
    tokio::spawn(serve(listener, app, async move {
        let _ = stop_rx.await;
    }));

    Server {
        addr,
        outbox,
        _stop: stop_tx,
        _tmp: tmp,
    }
}

#[tokio::test]
async fn test_health_returns_running() {
    let server = start(None).await;
    let resp = reqwest::get(format!("http://{}/health", server.addr)).await.unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "running");
}

#[tokio::test]
async fn test_valid_update_is_acknowledged_and_processed() {
    let server = start(None).await;
    let resp = reqwest::Client::new()
        .post(format!("http://{}/webhook", server.addr))
        .header("content-type", "application/json")
        .body(text_update(1, "/help").to_string())
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let outbox = server.outbox.clone();
    assert!(wait_until(|| outbox.texts() == vec![HELP_TEXT], Duration::from_secs(5)).await);
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let server = start(None).await;
    let resp = reqwest::Client::new()
        .post(format!("http://{}/webhook", server.addr))
        .body("{this is not json")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    assert!(server.outbox.calls().is_empty());
}

#[tokio::test]
async fn test_secret_token_is_enforced() {
    let server = start(Some("s3cret")).await;
    let client = reqwest::Client::new();
    let url = format!("http://{}/webhook", server.addr);
    let body = text_update(2, "/start").to_string();

    let missing = client.post(&url).body(body.clone()).send().await.unwrap();
    assert_eq!(missing.status(), 401);

    let wrong = client
        .post(&url)
        .header(SECRET_HEADER, "nope")
        .body(body.clone())
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), 401);

    let right = client
        .post(&url)
        .header(SECRET_HEADER, "s3cret")
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(right.status(), 200);
}

#[tokio::test]
async fn test_health_only_router_has_no_webhook() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    tokio::spawn(serve(listener, health_router(), async move {
        let _ = stop_rx.await;
    }));

    let client = reqwest::Client::new();
    assert_eq!(client.get(format!("http://{}/health", addr)).send().await.unwrap().status(), 200);
    let resp = client
        .post(format!("http://{}/webhook", addr))
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let _ = stop_tx.send(());
}
