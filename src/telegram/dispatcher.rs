//! Dispatcher: classify one inbound message and drive it to a single reply.
//!
//! ```text
//! text ─┬─ /start, /help ───────────────► help reply
//!       ├─ not http(s) / bad URL ───────► "Please send a valid link."
//!       ├─ no adapter for host ─────────► "Unsupported link."
//!       └─ "Downloading…" ─► fetch (worker pool, timeout) ─► delivery
//!                                 └─ failure ─► "Failed to download the video: …"
//! ```
//!
//! Errors never escape [`Dispatcher::handle`]; each one becomes exactly one
//! chat reply via `AppError::user_message`.

use std::sync::Arc;
use std::time::Duration;
use teloxide::types::ChatId;
use tokio::sync::Semaphore;
use url::Url;

use crate::core::config::{validation, Config};
use crate::core::error::AppError;
use crate::core::scratch::ScratchArea;
use crate::download::error::DownloadError;
use crate::download::source::{FetchRequest, SourceRegistry};
use crate::telegram::delivery::deliver;
use crate::telegram::intake::InboundMessage;
use crate::telegram::outbox::ChatOutbox;

pub const HELP_TEXT: &str = "Send me a YouTube or Instagram video link!";
pub const USAGE_TEXT: &str = "Please send a valid link.";
pub const STATUS_TEXT: &str = "Downloading…";

/// How a message was resolved. Handy for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Help,
    InvalidLink,
    Unsupported,
    FetchFailed,
    Oversize,
    DeliveryFailed,
    Delivered,
}

impl Outcome {
    fn from_error(err: &AppError) -> Self {
        match err {
            AppError::UnsupportedSource(_) => Outcome::Unsupported,
            AppError::Fetch(_) => Outcome::FetchFailed,
            AppError::Oversize { .. } => Outcome::Oversize,
            _ => Outcome::DeliveryFailed,
        }
    }
}

pub struct Dispatcher {
    registry: SourceRegistry,
    outbox: Arc<dyn ChatOutbox>,
    scratch: ScratchArea,
    workers: Semaphore,
    download_timeout: Duration,
    max_file_size_bytes: u64,
}

impl Dispatcher {
    pub fn new(config: &Config, registry: SourceRegistry, outbox: Arc<dyn ChatOutbox>) -> Self {
        log::info!(
            "Dispatcher ready: adapters {:?}, {} workers, {}s download timeout",
            registry.names(),
            config.worker_pool_size,
            config.download_timeout.as_secs()
        );
        Self {
            registry,
            outbox,
            scratch: ScratchArea::new(config.scratch_dir.clone()),
            workers: Semaphore::new(config.worker_pool_size),
            download_timeout: config.download_timeout,
            max_file_size_bytes: config.max_file_size_bytes,
        }
    }

    /// Production wiring: adapters from configuration.
    pub fn from_config(config: &Config, outbox: Arc<dyn ChatOutbox>) -> Self {
        Self::new(config, SourceRegistry::from_config(config), outbox)
    }

    pub fn scratch(&self) -> &ScratchArea {
        &self.scratch
    }

    /// Process one message to completion.
    pub async fn handle(&self, msg: InboundMessage) -> Outcome {
        let chat_id = msg.chat_id;
        let text = msg.text.trim();
        log::info!("Message from chat {} (sent {}): {:?}", chat_id, msg.timestamp, text);

        if matches!(command(text), Some("/start" | "/help")) {
            self.reply(chat_id, HELP_TEXT).await;
            return Outcome::Help;
        }

        let Some(url) = parse_link(text) else {
            self.reply(chat_id, USAGE_TEXT).await;
            return Outcome::InvalidLink;
        };

        match self.process(chat_id, url).await {
            Ok(()) => Outcome::Delivered,
            Err(err) => {
                let outcome = Outcome::from_error(&err);
                match &err {
                    AppError::Fetch(cause) => log::warn!(
                        "Request from chat {} ended with {:?} [{}]: {}",
                        chat_id,
                        outcome,
                        cause.subcategory(),
                        err
                    ),
                    _ => log::warn!("Request from chat {} ended with {:?}: {}", chat_id, outcome, err),
                }
                self.reply(chat_id, &err.user_message()).await;
                outcome
            }
        }
    }

    async fn process(&self, chat_id: ChatId, url: Url) -> Result<(), AppError> {
        let adapter = self
            .registry
            .resolve(&url)
            .ok_or_else(|| AppError::UnsupportedSource(url.host_str().unwrap_or_default().to_string()))?;

        self.reply(chat_id, STATUS_TEXT).await;

        let permit = self
            .workers
            .acquire()
            .await
            .map_err(|_| AppError::Fetch(DownloadError::Other("worker pool closed".to_string())))?;

        let scratch = self
            .scratch
            .allocate()
            .await
            .map_err(|e| AppError::Fetch(DownloadError::Other(format!("cannot prepare download directory: {}", e))))?;

        let request = FetchRequest {
            url,
            dest_dir: scratch.path().to_path_buf(),
        };
        log::info!("Fetching {} with {} into {}", request.url, adapter.name(), request.dest_dir.display());

        let fetched = match tokio::time::timeout(self.download_timeout, adapter.fetch(&request)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Fetch(DownloadError::Timeout("Download timed out".to_string()))),
        };
        drop(permit);

        match fetched {
            Ok(media) => deliver(self.outbox.as_ref(), chat_id, media, scratch, self.max_file_size_bytes).await,
            Err(err) => {
                scratch.cleanup().await;
                Err(err)
            }
        }
    }

    async fn reply(&self, chat_id: ChatId, text: &str) {
        if let Err(e) = self.outbox.send_text(chat_id, text).await {
            log::error!("Failed to send reply to chat {}: {}", chat_id, e);
        }
    }
}

/// Leading `/command` token with any `@botname` suffix removed.
fn command(text: &str) -> Option<&str> {
    let token = text.split_whitespace().next()?;
    if !token.starts_with('/') {
        return None;
    }
    Some(token.split('@').next().unwrap_or(token))
}

/// Accept only absolute http(s) URLs of sane length.
fn parse_link(text: &str) -> Option<Url> {
    if text.len() > validation::MAX_URL_LENGTH {
        return None;
    }
    let url = Url::parse(text).ok()?;
    let web = matches!(url.scheme(), "http" | "https");
    (web && url.host_str().is_some()).then_some(url)
}
