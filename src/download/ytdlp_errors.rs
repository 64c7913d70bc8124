//! yt-dlp stderr analysis
//!
//! Classifies yt-dlp failures and turns them into a short cause that is safe
//! to show in a chat reply.

/// yt-dlp error categories
#[derive(Debug, Clone, PartialEq)]
pub enum YtDlpErrorType {
    /// The site wants a signed-in session or detected automation
    AuthRequired,
    /// Video is private, removed or region-locked
    VideoUnavailable,
    /// The requested format selector matched nothing
    FormatUnavailable,
    /// The URL is not something yt-dlp can extract
    UnsupportedUrl,
    /// Timeouts, DNS, connection resets
    NetworkError,
    /// Anything else
    Unknown,
}

/// Analyze yt-dlp stderr and determine the error type
pub fn analyze_ytdlp_error(stderr: &str) -> YtDlpErrorType {
    let stderr_lower = stderr.to_lowercase();

    if stderr_lower.contains("requested format is not available") || stderr_lower.contains("no video formats found")
    {
        return YtDlpErrorType::FormatUnavailable;
    }

    if stderr_lower.contains("unsupported url") {
        return YtDlpErrorType::UnsupportedUrl;
    }

    if stderr_lower.contains("sign in to confirm")
        || stderr_lower.contains("please sign in")
        || stderr_lower.contains("login required")
        || stderr_lower.contains("use --cookies")
        || stderr_lower.contains("rate-limit reached")
        || stderr_lower.contains("http error 403")
    {
        return YtDlpErrorType::AuthRequired;
    }

    if stderr_lower.contains("private video")
        || stderr_lower.contains("video unavailable")
        || stderr_lower.contains("this video is not available")
        || stderr_lower.contains("video is private")
        || stderr_lower.contains("has been removed")
        || stderr_lower.contains("does not exist")
        || stderr_lower.contains("http error 404")
    {
        return YtDlpErrorType::VideoUnavailable;
    }

    if stderr_lower.contains("timed out")
        || stderr_lower.contains("timeout")
        || stderr_lower.contains("connection")
        || stderr_lower.contains("network")
        || stderr_lower.contains("name resolution")
        || stderr_lower.contains("failed to resolve")
    {
        return YtDlpErrorType::NetworkError;
    }

    YtDlpErrorType::Unknown
}

/// Returns a user-facing cause for the error type
pub fn get_error_message(error_type: &YtDlpErrorType) -> &'static str {
    match error_type {
        YtDlpErrorType::AuthRequired => "the site refused the request (sign-in or bot check required)",
        YtDlpErrorType::VideoUnavailable => "the video is unavailable, private or removed",
        YtDlpErrorType::FormatUnavailable => "no downloadable video format was found",
        YtDlpErrorType::UnsupportedUrl => "this link is not supported",
        YtDlpErrorType::NetworkError => "network error, please try again later",
        YtDlpErrorType::Unknown => "extraction failed",
    }
}

/// Maximum length of a raw yt-dlp error line echoed to the user
const MAX_CAUSE_LEN: usize = 200;

/// Build the chat-safe cause for a failed run.
///
/// Known categories map to fixed text; unknown ones echo the last `ERROR:`
/// line (truncated) so the user still sees what went wrong.
pub fn user_cause(stderr: &str) -> String {
    let error_type = analyze_ytdlp_error(stderr);
    if error_type != YtDlpErrorType::Unknown {
        return get_error_message(&error_type).to_string();
    }

    let last_error = stderr
        .lines()
        .rev()
        .find_map(|line| line.trim().strip_prefix("ERROR:"))
        .map(str::trim)
        .filter(|line| !line.is_empty());

    match last_error {
        Some(line) => truncate(line, MAX_CAUSE_LEN),
        None => get_error_message(&YtDlpErrorType::Unknown).to_string(),
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}…", cut)
}
