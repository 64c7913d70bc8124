//! In-memory `ChatOutbox` that records every call.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use teloxide::types::ChatId;

use crate::core::error::AppError;
use crate::telegram::outbox::ChatOutbox;

/// One outbound call, in the order it was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundCall {
    Text { chat_id: ChatId, text: String },
    Video { chat_id: ChatId, path: PathBuf, file_existed: bool },
    Document { chat_id: ChatId, path: PathBuf, file_existed: bool },
}

impl OutboundCall {
    pub fn is_upload(&self) -> bool {
        matches!(self, OutboundCall::Video { .. } | OutboundCall::Document { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            OutboundCall::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

#[derive(Default)]
pub struct RecordingOutbox {
    calls: Mutex<Vec<OutboundCall>>,
    video_error: Mutex<Option<String>>,
    document_error: Mutex<Option<String>>,
}

impl RecordingOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `send_video` fail with this platform description.
    pub fn fail_videos_with(self, description: &str) -> Self {
        *self.video_error.lock().unwrap_or_else(|e| e.into_inner()) = Some(description.to_string());
        self
    }

    /// Make every `send_document` fail with this platform description.
    pub fn fail_documents_with(self, description: &str) -> Self {
        *self.document_error.lock().unwrap_or_else(|e| e.into_inner()) = Some(description.to_string());
        self
    }

    pub fn calls(&self) -> Vec<OutboundCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls().iter().filter_map(|c| c.text().map(str::to_string)).collect()
    }

    pub fn uploads(&self) -> usize {
        self.calls().iter().filter(|c| c.is_upload()).count()
    }

    fn record(&self, call: OutboundCall) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(call);
    }

    fn configured_error(slot: &Mutex<Option<String>>) -> Result<(), AppError> {
        match slot.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            Some(description) => Err(AppError::Delivery(description.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ChatOutbox for RecordingOutbox {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), AppError> {
        self.record(OutboundCall::Text {
            chat_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_video(&self, chat_id: ChatId, path: &Path) -> Result<(), AppError> {
        self.record(OutboundCall::Video {
            chat_id,
            path: path.to_path_buf(),
            file_existed: path.is_file(),
        });
        Self::configured_error(&self.video_error)
    }

    async fn send_document(&self, chat_id: ChatId, path: &Path) -> Result<(), AppError> {
        self.record(OutboundCall::Document {
            chat_id,
            path: path.to_path_buf(),
            file_existed: path.is_file(),
        });
        Self::configured_error(&self.document_error)
    }
}
