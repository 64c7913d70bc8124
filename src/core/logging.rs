//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console, plus file when LOG_FILE_PATH is set)
//! - A panic hook that routes panics through the logger
//! - Startup configuration logging

use anyhow::Result;
use simplelog::{
    ColorChoice, CombinedLogger, Config as LogConfig, LevelFilter, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::fs::File;

use crate::core::config::{self, Config};

/// Parse a textual level; unknown values fall back to `Info`.
pub fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Initialize logger for console and optional file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file, `None` for console only
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to create the log file or install the logger
pub fn init_logger(log_file_path: Option<&str>) -> Result<()> {
    let level = parse_level(&config::LOG_LEVEL);

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        LogConfig::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    if let Some(path) = log_file_path {
        let log_file = File::create(path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;
        loggers.push(WriteLogger::new(level, LogConfig::default(), log_file));
    }

    CombinedLogger::init(loggers).map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Install a panic hook so panics inside spawned tasks end up in the log.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));
}

/// Logs the effective configuration at startup (token masked).
pub fn log_configuration(config: &Config) {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("Configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for (key, value) in config.summary() {
        log::info!("  {:<22} {}", key, value);
    }

    if let Some(ref cookies) = config.ytdl_cookies_file {
        if !cookies.exists() {
            log::warn!("YTDL_COOKIES_FILE {} does not exist; downloads run without cookies", cookies.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), LevelFilter::Debug);
        assert_eq!(parse_level(" WARN "), LevelFilter::Warn);
        assert_eq!(parse_level("nonsense"), LevelFilter::Info);
        assert_eq!(parse_level("off"), LevelFilter::Off);
    }
}
