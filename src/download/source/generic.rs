//! Fallback adapter for any http(s) URL yt-dlp may understand.
//!
//! Only registered when `GENERIC_FALLBACK` is enabled, and always last.

use async_trait::async_trait;
use url::Url;

use super::ytdlp::{run_ytdlp, Invocation, YtDlpSettings};
use super::{pick_media_file, FetchAdapter, FetchRequest, FetchedMedia};
use crate::core::error::AppError;

const FORMAT: &str = "best[ext=mp4]/best";
const OUTPUT_TEMPLATE: &str = "%(id)s.%(ext)s";

pub struct GenericSource {
    settings: YtDlpSettings,
}

impl GenericSource {
    pub fn new(settings: YtDlpSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl FetchAdapter for GenericSource {
    fn name(&self) -> &str {
        "generic"
    }

    fn supports_url(&self, url: &Url) -> bool {
        matches!(url.scheme(), "http" | "https") && url.host_str().is_some()
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedMedia, AppError> {
        let invocation = Invocation {
            format: Some(FORMAT),
            output_template: OUTPUT_TEMPLATE,
            single_item: true,
            merge_to_mp4: false,
        };

        run_ytdlp(&self.settings, &invocation, &request.url, &request.dest_dir)
            .await
            .map_err(|failure| AppError::from(failure.into_download_error()))?;

        Ok(pick_media_file(&request.dest_dir).await?)
    }
}
