use thiserror::Error;

use crate::download::error::DownloadError;

/// Centralized error types for the application
///
/// Every failure after intake is converted to exactly one chat reply through
/// [`AppError::user_message`]. Only [`AppError::Configuration`] is fatal.
///
/// # Example
///
/// ```no_run
/// use mediaferry::core::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or invalid configuration; prevents startup
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Inbound payload could not be decoded; dropped without a reply
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// URL is not handled by any registered fetch adapter
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    /// Download / extraction failure
    #[error("Download error: {0}")]
    Fetch(DownloadError),

    /// Downloaded file exceeds the delivery limit
    #[error("File too large: {size} bytes (limit {limit} bytes)")]
    Oversize { size: u64, limit: u64 },

    /// Upload to the chat failed
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport lifecycle violations (wrong state, second transport)
    #[error("Transport error: {0}")]
    Transport(String),
}

impl AppError {
    /// Text sent back to the originating chat for this failure.
    pub fn user_message(&self) -> String {
        match self {
            AppError::UnsupportedSource(_) => "Unsupported link.".to_string(),
            AppError::Fetch(err) => format!("Failed to download the video: {}", err.message()),
            AppError::Oversize { size, limit } => format!(
                "File too large: {:.1} MB (limit {:.1} MB).",
                bytes_to_mb(*size),
                bytes_to_mb(*limit)
            ),
            AppError::MalformedRequest(_) => "Please send a valid link.".to_string(),
            _ => "Failed to send the file.".to_string(),
        }
    }

    /// Whether this error must stop the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Configuration(_))
    }
}

fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

impl From<DownloadError> for AppError {
    fn from(err: DownloadError) -> Self {
        AppError::Fetch(err)
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
