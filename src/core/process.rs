//! Process execution utilities with timeout support
//!
//! Provides helpers for running external processes (yt-dlp) with configurable
//! timeouts so a hung extractor never blocks a worker slot forever.

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

use crate::download::error::DownloadError;

/// Run an async Command with a timeout.
///
/// The child is killed when the timeout elapses (`kill_on_drop`).
/// Returns the process Output on completion, whatever its exit status.
pub async fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<Output, DownloadError> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(DownloadError::Process(format!("failed to run downloader: {}", e))),
        Err(_) => Err(DownloadError::Timeout(format!(
            "download timed out after {}s",
            timeout.as_secs()
        ))),
    }
}
