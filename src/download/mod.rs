//! Download management: fetch adapters and yt-dlp error handling

pub mod error;
pub mod source;
pub mod ytdlp_errors;

// Re-exports for convenience
pub use error::DownloadError;
pub use source::{FetchAdapter, FetchRequest, FetchedMedia, MediaKind, SourceRegistry};
