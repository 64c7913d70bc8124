//! YouTube family adapter (youtube.com, youtu.be, music/mobile subdomains).

use async_trait::async_trait;
use url::Url;

use super::ytdlp::{run_ytdlp, Invocation, YtDlpFailure, YtDlpSettings};
use super::{host_matches, pick_media_file, FetchAdapter, FetchRequest, FetchedMedia};
use crate::core::error::AppError;
use crate::download::error::DownloadError;

const DOMAINS: &[&str] = &["youtube.com", "youtu.be", "youtube-nocookie.com"];

const OUTPUT_TEMPLATE: &str = "%(id)s.%(ext)s";

/// Format selectors tried in order. Only "format not available" moves to the next one.
pub const FORMAT_CHAIN: &[(&str, bool)] = &[
    ("best[ext=mp4][vcodec!=none][acodec!=none]", false),
    ("bestvideo[ext=mp4]+bestaudio[ext=m4a]/bestvideo+bestaudio", true),
    ("best", false),
];

pub struct YoutubeSource {
    settings: YtDlpSettings,
}

impl YoutubeSource {
    pub fn new(settings: YtDlpSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl FetchAdapter for YoutubeSource {
    fn name(&self) -> &str {
        "youtube"
    }

    fn supports_url(&self, url: &Url) -> bool {
        host_matches(url, DOMAINS)
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedMedia, AppError> {
        let mut last_failure: Option<YtDlpFailure> = None;

        for (attempt, &(format, merge)) in FORMAT_CHAIN.iter().enumerate() {
            let invocation = Invocation {
                format: Some(format),
                output_template: OUTPUT_TEMPLATE,
                single_item: true,
                merge_to_mp4: merge,
            };

            match run_ytdlp(&self.settings, &invocation, &request.url, &request.dest_dir).await {
                Ok(()) => {
                    log::info!("youtube: {} fetched with format #{} ({})", request.url, attempt + 1, format);
                    return Ok(pick_media_file(&request.dest_dir).await?);
                }
                Err(failure) if failure.is_format_unavailable() => {
                    log::info!("youtube: format '{}' unavailable for {}, trying next", format, request.url);
                    last_failure = Some(failure);
                }
                Err(failure) => return Err(failure.into_download_error().into()),
            }
        }

        let err = last_failure
            .map(YtDlpFailure::into_download_error)
            .unwrap_or_else(|| DownloadError::Other("no format could be downloaded".to_string()));
        Err(err.into())
    }
}
