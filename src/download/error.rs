use std::fmt;

/// Structured error type for download operations.
///
/// The inner message is shown to the user as the failure cause, so it should
/// already be sanitized (see `ytdlp_errors::user_cause`).
#[derive(Debug)]
pub enum DownloadError {
    /// yt-dlp specific failures (bad exit code, extractor errors)
    YtDlp(String),
    /// Expected file not found after the download finished
    FileNotFound(String),
    /// Download timed out
    Timeout(String),
    /// Process execution failure (spawn, wait)
    Process(String),
    /// Catch-all for uncategorized errors
    Other(String),
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for DownloadError {}

impl DownloadError {
    /// Returns subcategory for logging
    pub fn subcategory(&self) -> &'static str {
        match self {
            DownloadError::YtDlp(_) => "ytdlp",
            DownloadError::FileNotFound(_) => "file_not_found",
            DownloadError::Timeout(_) => "timeout",
            DownloadError::Process(_) => "process",
            DownloadError::Other(_) => "other",
        }
    }

    /// Returns the inner message
    pub fn message(&self) -> &str {
        match self {
            DownloadError::YtDlp(msg)
            | DownloadError::FileNotFound(msg)
            | DownloadError::Timeout(msg)
            | DownloadError::Process(msg)
            | DownloadError::Other(msg) => msg,
        }
    }
}
