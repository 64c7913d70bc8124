//! Pull-mode loop over `getUpdates`.
//!
//! Each update is spawned into the dispatcher and the offset advances to
//! `last update id + 1`. With `POLL_OFFSET_FILE` set, the offset is persisted
//! after every non-empty batch and restored on start; without it delivery is
//! at-least-once and relies on Telegram's own retention.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{AllowedUpdate, Update};

use crate::core::config::{self, Config};
use crate::core::error::AppError;
use crate::telegram::dispatcher::Dispatcher;
use crate::telegram::intake::inbound_from_update;

/// On-disk form of the poll cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollCursor {
    pub next_offset: i32,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Optional persistence for the poll cursor.
#[derive(Debug, Clone, Default)]
pub struct CursorStore {
    path: Option<PathBuf>,
}

impl CursorStore {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Stored offset, or 0 when there is no file or it cannot be read.
    pub async fn load(&self) -> i32 {
        let Some(path) = &self.path else {
            return 0;
        };
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
            Err(e) => {
                log::warn!("Cannot read poll cursor {}: {}, starting from 0", path.display(), e);
                return 0;
            }
        };
        match serde_json::from_slice::<PollCursor>(&raw) {
            Ok(cursor) => {
                log::info!("Resuming polling from offset {}", cursor.next_offset);
                cursor.next_offset
            }
            Err(e) => {
                log::warn!("Corrupt poll cursor {}: {}, starting from 0", path.display(), e);
                0
            }
        }
    }

    /// Persist `next_offset`. Written to a sibling file first, then renamed.
    pub async fn save(&self, next_offset: i32) -> Result<(), AppError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let cursor = PollCursor {
            next_offset,
            updated_at: Some(Utc::now()),
        };
        let body = serde_json::to_vec_pretty(&cursor)?;
        let tmp = path.with_extension("tmp");
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

/// Offset acknowledging `update`.
pub fn next_offset(update: &Update) -> i32 {
    i32::try_from(update.id.0).map(|id| id.saturating_add(1)).unwrap_or(i32::MAX)
}

pub struct Poller {
    bot: Bot,
    dispatcher: Arc<Dispatcher>,
    timeout_secs: u32,
    cursor: CursorStore,
}

impl Poller {
    pub fn new(bot: Bot, dispatcher: Arc<Dispatcher>, config: &Config) -> Self {
        Self {
            bot,
            dispatcher,
            timeout_secs: config.poll_timeout_secs,
            cursor: CursorStore::new(config.poll_offset_file.clone()),
        }
    }

    /// Fetch one batch starting at `offset`, dispatch it and return the new offset.
    pub async fn poll_once(&self, offset: i32) -> Result<i32, AppError> {
        let updates = self
            .bot
            .get_updates()
            .offset(offset)
            .timeout(self.timeout_secs)
            .allowed_updates(vec![AllowedUpdate::Message])
            .await?;

        let mut next = offset;
        for update in updates {
            next = next.max(next_offset(&update));
            match inbound_from_update(&update) {
                Some(msg) => {
                    let dispatcher = Arc::clone(&self.dispatcher);
                    tokio::spawn(async move {
                        dispatcher.handle(msg).await;
                    });
                }
                None => log::debug!("Ignoring update {} without a text message", update.id.0),
            }
        }

        if next != offset {
            if let Err(e) = self.cursor.save(next).await {
                log::warn!("Failed to persist poll cursor {}: {}", next, e);
            }
        }
        Ok(next)
    }

    /// Poll until `shutdown` resolves. `getUpdates` failures back off and retry.
    pub async fn run<F>(self, shutdown: F) -> Result<(), AppError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut offset = self.cursor.load().await;
        let mut failures: u32 = 0;
        log::info!("Polling for updates (timeout {}s)", self.timeout_secs);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    log::info!("Polling stopped at offset {}", offset);
                    return Ok(());
                }
                result = self.poll_once(offset) => match result {
                    Ok(next) => {
                        offset = next;
                        failures = 0;
                    }
                    Err(e) => {
                        failures = failures.saturating_add(1);
                        let delay = config::polling::backoff(failures);
                        log::warn!("getUpdates failed ({}), retrying in {:?}", e, delay);
                        tokio::select! {
                            _ = &mut shutdown => return Ok(()),
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                },
            }
        }
    }
}
