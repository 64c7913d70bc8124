//! Instagram adapter
//!
//! Handles posts, reels and IGTV links. Profile, tag and story pages carry no
//! shortcode and are refused before yt-dlp runs. A carousel post downloads
//! every item; the first video (or, failing that, the first image) in carousel
//! order is the one delivered.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use super::ytdlp::{run_ytdlp, Invocation, YtDlpSettings};
use super::{host_matches, pick_media_file, FetchAdapter, FetchRequest, FetchedMedia};
use crate::core::error::AppError;

const DOMAINS: &[&str] = &["instagram.com", "instagr.am"];

/// Numbered so that lexicographic order is carousel order
const OUTPUT_TEMPLATE: &str = "%(autonumber)03d-%(id)s.%(ext)s";

static MEDIA_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/(?:[A-Za-z0-9_.]+/)?(?:p|reel|reels|tv)/([A-Za-z0-9_-]+)/?$")
        .expect("Failed to compile Instagram path regex")
});

/// Shortcode of a post/reel link, if the path looks like one.
pub fn shortcode(url: &Url) -> Option<String> {
    MEDIA_PATH
        .captures(url.path())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub struct InstagramSource {
    settings: YtDlpSettings,
}

impl InstagramSource {
    pub fn new(settings: YtDlpSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl FetchAdapter for InstagramSource {
    fn name(&self) -> &str {
        "instagram"
    }

    fn supports_url(&self, url: &Url) -> bool {
        host_matches(url, DOMAINS)
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedMedia, AppError> {
        let Some(code) = shortcode(&request.url) else {
            log::info!("instagram: {} is not a post link", request.url);
            return Err(AppError::UnsupportedSource(request.url.to_string()));
        };
        log::debug!("instagram: fetching shortcode {}", code);

        let invocation = Invocation {
            format: None,
            output_template: OUTPUT_TEMPLATE,
            single_item: false,
            merge_to_mp4: false,
        };

        run_ytdlp(&self.settings, &invocation, &request.url, &request.dest_dir)
            .await
            .map_err(|failure| AppError::from(failure.into_download_error()))?;

        let media = pick_media_file(&request.dest_dir).await?;
        log::info!(
            "instagram: selected {} ({:?}, {} bytes)",
            media.path.display(),
            media.kind,
            media.size
        );
        Ok(media)
    }
}
