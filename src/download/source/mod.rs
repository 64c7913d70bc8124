//! Fetch adapter abstraction layer.
//!
//! Provides the `FetchAdapter` trait for pluggable download backends and a
//! `SourceRegistry` for host-based routing. Adapters know nothing about chats:
//! they turn a URL into exactly one local media file.
//!
//! Built-in adapters:
//! - `YoutubeSource`: YouTube family, ordered format fallback chain
//! - `InstagramSource`: posts, reels and carousels
//! - `GenericSource`: any other site yt-dlp understands (opt-in)

pub mod generic;
pub mod instagram;
pub mod ytdlp;
pub mod youtube;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

use crate::core::config::Config;
use crate::core::error::AppError;
use crate::download::error::DownloadError;

pub use generic::GenericSource;
pub use instagram::InstagramSource;
pub use youtube::YoutubeSource;
pub use ytdlp::YtDlpSettings;

/// What to download and where to put it.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: Url,
    /// Per-request scratch directory; the adapter writes only here
    pub dest_dir: PathBuf,
}

/// Kind of media selected from the download output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Image,
}

/// A single local media file produced by an adapter.
#[derive(Debug, Clone)]
pub struct FetchedMedia {
    pub path: PathBuf,
    pub size: u64,
    pub kind: MediaKind,
}

/// Trait for fetch adapter implementations.
#[async_trait]
pub trait FetchAdapter: Send + Sync {
    /// Human-readable name of this adapter (e.g., "youtube", "instagram")
    fn name(&self) -> &str;

    /// Whether this adapter can handle the given URL.
    fn supports_url(&self, url: &Url) -> bool;

    /// Download the URL into `request.dest_dir` and return the selected file.
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedMedia, AppError>;
}

/// Registry that routes URLs to the appropriate adapter.
///
/// Adapters are tried in registration order; the first that claims the URL
/// wins. The order is policy: specific families before the generic fallback.
#[derive(Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn FetchAdapter>>,
}

impl SourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { sources: Vec::new() }
    }

    /// Register an adapter. Adapters are tried in insertion order.
    pub fn register(&mut self, source: Arc<dyn FetchAdapter>) {
        self.sources.push(source);
    }

    /// Find the first adapter that supports the given URL.
    pub fn resolve(&self, url: &Url) -> Option<Arc<dyn FetchAdapter>> {
        self.sources.iter().find(|s| s.supports_url(url)).cloned()
    }

    /// Registered adapter names, in resolution order.
    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Build the production registry from configuration.
    pub fn from_config(config: &Config) -> Self {
        let settings = YtDlpSettings::from_config(config);
        let mut registry = Self::new();
        registry.register(Arc::new(YoutubeSource::new(settings.clone())));
        registry.register(Arc::new(InstagramSource::new(settings.clone())));
        if config.generic_fallback {
            registry.register(Arc::new(GenericSource::new(settings)));
        }
        registry
    }
}

/// Whether `url`'s host equals `domain` or is a subdomain of it.
pub fn host_matches(url: &Url, domains: &[&str]) -> bool {
    match url.host_str() {
        Some(host) => {
            let host = host.to_lowercase();
            domains
                .iter()
                .any(|d| host == *d || host.ends_with(&format!(".{}", d)))
        }
        None => false,
    }
}

/// Accepted extensions in selection priority: videos first, then images.
pub const MEDIA_EXTENSIONS: &[(&str, MediaKind)] = &[
    ("mp4", MediaKind::Video),
    ("mov", MediaKind::Video),
    ("m4v", MediaKind::Video),
    ("webm", MediaKind::Video),
    ("mkv", MediaKind::Video),
    ("jpg", MediaKind::Image),
    ("jpeg", MediaKind::Image),
    ("png", MediaKind::Image),
    ("webp", MediaKind::Image),
];

fn extension_rank(path: &Path) -> Option<(usize, MediaKind)> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    MEDIA_EXTENSIONS
        .iter()
        .position(|(candidate, _)| *candidate == ext)
        .map(|rank| (rank, MEDIA_EXTENSIONS[rank].1))
}

/// Pick exactly one media file from a download directory.
///
/// The best-ranked extension wins; within a rank the lexicographically first
/// file name wins, which keeps carousel order (`001-…`, `002-…`). Partial and
/// metadata files never match because their extensions are not accepted.
pub async fn pick_media_file(dir: &Path) -> Result<FetchedMedia, DownloadError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| DownloadError::FileNotFound(format!("cannot read download directory: {}", e)))?;

    let mut best: Option<(usize, PathBuf, MediaKind)> = None;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| DownloadError::FileNotFound(format!("cannot read download directory: {}", e)))?
    {
        let path = entry.path();
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        let Some((rank, kind)) = extension_rank(&path) else {
            continue;
        };
        let better = match &best {
            None => true,
            Some((best_rank, best_path, _)) => rank < *best_rank || (rank == *best_rank && path < *best_path),
        };
        if better {
            best = Some((rank, path, kind));
        }
    }

    let (_, path, kind) =
        best.ok_or_else(|| DownloadError::FileNotFound("the download produced no media file".to_string()))?;
    let size = tokio::fs::metadata(&path)
        .await
        .map_err(|e| DownloadError::FileNotFound(format!("cannot stat downloaded file: {}", e)))?
        .len();

    Ok(FetchedMedia { path, size, kind })
}
