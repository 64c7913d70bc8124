//! Delivery: upload a fetched file to the chat, then remove it.
//!
//! The scratch directory is consumed here and removed on every exit path:
//! oversize rejection, successful upload and failed upload alike.

use teloxide::types::ChatId;

use crate::core::error::AppError;
use crate::core::scratch::ScratchDir;
use crate::download::source::{FetchedMedia, MediaKind};
use crate::telegram::outbox::ChatOutbox;

/// Platform descriptions meaning "this cannot be a video, try as a document"
const VIDEO_REJECTION_MARKERS: &[&str] = &[
    "wrong file",
    "too big",
    "failed to get http url content",
    "wrong type",
    "video_content_type_invalid",
];

/// Whether an upload error is a content/size rejection worth retrying as a document.
pub fn is_video_rejection(err: &AppError) -> bool {
    let text = err.to_string().to_lowercase();
    VIDEO_REJECTION_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Upload `media` to `chat_id` and clean up `scratch` afterwards.
///
/// Returns `AppError::Oversize` without any upload call when the file is at or
/// above `max_bytes`, and `AppError::Delivery` when the upload itself fails.
pub async fn deliver(
    outbox: &dyn ChatOutbox,
    chat_id: ChatId,
    media: FetchedMedia,
    scratch: ScratchDir,
    max_bytes: u64,
) -> Result<(), AppError> {
    let result = upload(outbox, chat_id, &media, max_bytes).await;

    if !scratch.owns(&media.path) {
        if let Err(e) = tokio::fs::remove_file(&media.path).await {
            log::warn!("Failed to remove {}: {}", media.path.display(), e);
        }
    }
    scratch.cleanup().await;

    result
}

async fn upload(outbox: &dyn ChatOutbox, chat_id: ChatId, media: &FetchedMedia, max_bytes: u64) -> Result<(), AppError> {
    if media.size >= max_bytes {
        log::info!(
            "Refusing to upload {} to chat {}: {} bytes >= limit {}",
            media.path.display(),
            chat_id,
            media.size,
            max_bytes
        );
        return Err(AppError::Oversize {
            size: media.size,
            limit: max_bytes,
        });
    }

    let sent = match media.kind {
        MediaKind::Video => match outbox.send_video(chat_id, &media.path).await {
            Err(e) if is_video_rejection(&e) => {
                log::info!("send_video rejected for chat {} ({}), retrying as document", chat_id, e);
                outbox.send_document(chat_id, &media.path).await
            }
            other => other,
        },
        MediaKind::Image => outbox.send_document(chat_id, &media.path).await,
    };

    sent.map_err(|e| {
        log::error!("Upload to chat {} failed: {}", chat_id, e);
        AppError::Delivery(e.to_string())
    })?;

    log::info!("Delivered {} ({} bytes) to chat {}", media.path.display(), media.size, chat_id);
    Ok(())
}
