//! Shared yt-dlp invocation used by every adapter.
//!
//! Each call writes into the request's scratch directory (`-P`) with a fixed
//! output template, under a hard process timeout plus yt-dlp's own socket
//! timeout.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use url::Url;

use crate::core::config::Config;
use crate::core::process::run_with_timeout;
use crate::download::error::DownloadError;
use crate::download::ytdlp_errors::{analyze_ytdlp_error, user_cause, YtDlpErrorType};

/// Socket timeout handed to yt-dlp (seconds)
const SOCKET_TIMEOUT_SECS: u64 = 30;

/// How to run yt-dlp. Cloned into each adapter.
#[derive(Debug, Clone)]
pub struct YtDlpSettings {
    pub bin: String,
    pub cookies_file: Option<PathBuf>,
    pub timeout: Duration,
}

impl YtDlpSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            bin: config.ytdl_bin.clone(),
            cookies_file: config.ytdl_cookies_file.clone(),
            timeout: config.download_timeout,
        }
    }
}

/// One yt-dlp run.
#[derive(Debug, Clone, Default)]
pub struct Invocation<'a> {
    /// `-f` format selector
    pub format: Option<&'a str>,
    /// `-o` template, relative to the destination directory
    pub output_template: &'a str,
    /// Treat the URL as a single item even if it is part of a playlist
    pub single_item: bool,
    /// Remux merged streams into mp4
    pub merge_to_mp4: bool,
}

/// A failed yt-dlp run.
#[derive(Debug)]
pub enum YtDlpFailure {
    /// yt-dlp ran and exited non-zero
    Exited { error_type: YtDlpErrorType, stderr: String },
    /// yt-dlp could not be run or was killed
    Process(DownloadError),
}

impl YtDlpFailure {
    pub fn is_format_unavailable(&self) -> bool {
        matches!(
            self,
            YtDlpFailure::Exited {
                error_type: YtDlpErrorType::FormatUnavailable,
                ..
            }
        )
    }

    pub fn into_download_error(self) -> DownloadError {
        match self {
            YtDlpFailure::Exited { stderr, .. } => DownloadError::YtDlp(user_cause(&stderr)),
            YtDlpFailure::Process(err) => err,
        }
    }
}

/// Build the argument list for an invocation.
pub fn build_args(settings: &YtDlpSettings, invocation: &Invocation<'_>, url: &Url, dest_dir: &Path) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--no-progress".to_string(),
        "--no-mtime".to_string(),
        "--restrict-filenames".to_string(),
        "--socket-timeout".to_string(),
        SOCKET_TIMEOUT_SECS.to_string(),
        "-P".to_string(),
        dest_dir.display().to_string(),
        "-o".to_string(),
        invocation.output_template.to_string(),
    ];

    if invocation.single_item {
        args.push("--no-playlist".to_string());
    }

    if let Some(format) = invocation.format {
        args.push("-f".to_string());
        args.push(format.to_string());
    }

    if invocation.merge_to_mp4 {
        args.push("--merge-output-format".to_string());
        args.push("mp4".to_string());
    }

    if let Some(ref cookies) = settings.cookies_file {
        if cookies.exists() {
            args.push("--cookies".to_string());
            args.push(cookies.display().to_string());
        } else {
            log::warn!("Cookies file {} not found, continuing without it", cookies.display());
        }
    }

    args.push(url.to_string());
    args
}

/// Run yt-dlp once.
pub async fn run_ytdlp(
    settings: &YtDlpSettings,
    invocation: &Invocation<'_>,
    url: &Url,
    dest_dir: &Path,
) -> Result<(), YtDlpFailure> {
    let args = build_args(settings, invocation, url, dest_dir);
    log::debug!("Running {} {}", settings.bin, args.join(" "));

    let mut cmd = Command::new(&settings.bin);
    cmd.args(&args);

    let output = run_with_timeout(&mut cmd, settings.timeout)
        .await
        .map_err(YtDlpFailure::Process)?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let error_type = analyze_ytdlp_error(&stderr);
    log::warn!(
        "yt-dlp failed for {} ({:?}, status {}): {}",
        url,
        error_type,
        output.status,
        stderr.lines().last().unwrap_or_default()
    );
    Err(YtDlpFailure::Exited { error_type, stderr })
}
