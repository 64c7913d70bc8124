use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::core::error::AppError;

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: unset (console only)
pub static LOG_FILE_PATH: Lazy<Option<String>> =
    Lazy::new(|| env::var("LOG_FILE_PATH").ok().filter(|s| !s.trim().is_empty()));

/// Log level (error, warn, info, debug, trace)
/// Read from LOG_LEVEL environment variable
/// Default: info
pub static LOG_LEVEL: Lazy<String> = Lazy::new(|| env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()));

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Bot API calls (in seconds)
    /// Large enough for 50 MB uploads on slow links
    pub const REQUEST_TIMEOUT_SECS: u64 = 300;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Pull-mode retry configuration
pub mod polling {
    use super::Duration;

    /// First delay after a failed getUpdates call (in milliseconds)
    pub const BACKOFF_BASE_MS: u64 = 500;

    /// Upper bound for the backoff delay (in seconds)
    pub const BACKOFF_MAX_SECS: u64 = 30;

    /// Base for exponential backoff calculation
    pub const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

    /// Backoff delay for the given consecutive failure count (1-based).
    pub fn backoff(attempt: u32) -> Duration {
        let factor = EXPONENTIAL_BACKOFF_BASE.saturating_pow(attempt.saturating_sub(1));
        let delay = Duration::from_millis(BACKOFF_BASE_MS.saturating_mul(factor));
        delay.min(Duration::from_secs(BACKOFF_MAX_SECS))
    }
}

/// Validation configuration
pub mod validation {
    /// Maximum URL length accepted from a chat message
    pub const MAX_URL_LENGTH: usize = 2048;

    /// Default maximum outbound file size: Telegram Bot API allows up to 50 MB
    pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 50;
}

/// How updates reach the bot. Exactly one per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Telegram pushes updates to a registered webhook URL
    Push,
    /// The bot long-polls getUpdates
    Pull,
}

impl FromStr for TransportMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "push" | "webhook" => Ok(TransportMode::Push),
            "pull" | "poll" | "polling" => Ok(TransportMode::Pull),
            other => Err(AppError::Configuration(format!(
                "TRANSPORT_MODE must be 'push' or 'pull', got '{}'",
                other
            ))),
        }
    }
}

/// Runtime configuration, sourced from the environment at startup.
#[derive(Clone)]
pub struct Config {
    pub bot_token: String,
    pub transport: TransportMode,
    /// Externally reachable webhook URL (push mode only)
    pub webhook_url: Option<Url>,
    pub webhook_path: String,
    pub webhook_secret: Option<String>,
    pub port: u16,
    pub worker_pool_size: usize,
    pub max_file_size_bytes: u64,
    pub download_timeout: Duration,
    pub poll_timeout_secs: u32,
    pub poll_offset_file: Option<PathBuf>,
    pub scratch_dir: PathBuf,
    /// Try unknown hosts with the generic yt-dlp adapter instead of rejecting them
    pub generic_fallback: bool,
    pub ytdl_bin: String,
    pub ytdl_cookies_file: Option<PathBuf>,
    /// Custom Bot API server (local telegram-bot-api)
    pub bot_api_url: Option<Url>,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// `mode_override` (from the `--webhook` CLI flag) wins over `TRANSPORT_MODE`.
    pub fn from_env(mode_override: Option<TransportMode>) -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok(), mode_override)
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F, mode_override: Option<TransportMode>) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_token = get("BOT_TOKEN")
            .or_else(|| get("TELOXIDE_TOKEN"))
            .ok_or_else(|| AppError::Configuration("missing required variable BOT_TOKEN".to_string()))?;

        let transport = match mode_override {
            Some(mode) => mode,
            None => get("TRANSPORT_MODE")
                .map(|v| v.parse())
                .transpose()?
                .unwrap_or(TransportMode::Pull),
        };

        let webhook_path = normalize_path(get("WEBHOOK_PATH").as_deref().unwrap_or("/webhook"));

        let webhook_url = match get("WEBHOOK_URL") {
            Some(raw) => Some(parse_url("WEBHOOK_URL", &raw)?),
            None => match get("RENDER_EXTERNAL_URL") {
                Some(base) => {
                    let joined = format!("{}{}", base.trim_end_matches('/'), webhook_path);
                    Some(parse_url("RENDER_EXTERNAL_URL", &joined)?)
                }
                None => None,
            },
        };

        if transport == TransportMode::Push && webhook_url.is_none() {
            return Err(AppError::Configuration(
                "missing required variable WEBHOOK_URL (or RENDER_EXTERNAL_URL) for push mode".to_string(),
            ));
        }

        let max_file_size_mb: u64 = parse_or(&get, "MAX_FILE_SIZE_MB", validation::DEFAULT_MAX_FILE_SIZE_MB)?;
        let worker_pool_size: usize = parse_or(&get, "WORKER_POOL_SIZE", 4)?;
        if worker_pool_size == 0 {
            return Err(AppError::Configuration(
                "WORKER_POOL_SIZE must be at least 1".to_string(),
            ));
        }

        let scratch_dir = match get("SCRATCH_DIR") {
            Some(dir) => PathBuf::from(shellexpand::tilde(&dir).to_string()),
            None => env::temp_dir().join("mediaferry"),
        };

        let bot_api_url = get("BOT_API_URL")
            .map(|raw| parse_url("BOT_API_URL", &raw))
            .transpose()?;

        Ok(Self {
            bot_token,
            transport,
            webhook_url,
            webhook_path,
            webhook_secret: get("WEBHOOK_SECRET"),
            port: parse_or(&get, "PORT", 8443)?,
            worker_pool_size,
            max_file_size_bytes: max_file_size_mb.saturating_mul(1024 * 1024),
            download_timeout: Duration::from_secs(parse_or(&get, "DOWNLOAD_TIMEOUT_SECS", 300)?),
            poll_timeout_secs: parse_or(&get, "POLL_TIMEOUT_SECS", 30)?,
            poll_offset_file: get("POLL_OFFSET_FILE").map(|p| PathBuf::from(shellexpand::tilde(&p).to_string())),
            scratch_dir,
            generic_fallback: get("GENERIC_FALLBACK").map(|v| parse_bool(&v)).unwrap_or(false),
            ytdl_bin: get("YTDL_BIN").unwrap_or_else(|| "yt-dlp".to_string()),
            ytdl_cookies_file: get("YTDL_COOKIES_FILE").map(|p| PathBuf::from(shellexpand::tilde(&p).to_string())),
            bot_api_url,
        })
    }

    /// Human-readable view of the effective configuration with the token masked.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        let opt = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
        vec![
            ("BOT_TOKEN", mask_token(&self.bot_token)),
            ("TRANSPORT_MODE", format!("{:?}", self.transport).to_lowercase()),
            ("WEBHOOK_URL", opt(self.webhook_url.as_ref().map(|u| u.to_string()))),
            ("WEBHOOK_PATH", self.webhook_path.clone()),
            ("WEBHOOK_SECRET", opt(self.webhook_secret.as_ref().map(|_| "***".to_string()))),
            ("PORT", self.port.to_string()),
            ("WORKER_POOL_SIZE", self.worker_pool_size.to_string()),
            ("MAX_FILE_SIZE_MB", (self.max_file_size_bytes / (1024 * 1024)).to_string()),
            ("DOWNLOAD_TIMEOUT_SECS", self.download_timeout.as_secs().to_string()),
            ("POLL_TIMEOUT_SECS", self.poll_timeout_secs.to_string()),
            ("POLL_OFFSET_FILE", opt(self.poll_offset_file.as_ref().map(|p| p.display().to_string()))),
            ("SCRATCH_DIR", self.scratch_dir.display().to_string()),
            ("GENERIC_FALLBACK", self.generic_fallback.to_string()),
            ("YTDL_BIN", self.ytdl_bin.clone()),
            ("YTDL_COOKIES_FILE", opt(self.ytdl_cookies_file.as_ref().map(|p| p.display().to_string()))),
            ("BOT_API_URL", opt(self.bot_api_url.as_ref().map(|u| u.to_string()))),
        ]
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::Configuration(format!("{} has an invalid value: '{}'", key, raw))),
        None => Ok(default),
    }
}

fn parse_url(key: &str, raw: &str) -> Result<Url, AppError> {
    Url::parse(raw).map_err(|e| AppError::Configuration(format!("{} is not a valid URL ({}): {}", key, raw, e)))
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

fn mask_token(token: &str) -> String {
    match token.split_once(':') {
        Some((id, _)) => format!("{}:***", id),
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_missing_token_names_variable() {
        let err = Config::from_lookup(lookup(&[]), None).err().map(|e| e.to_string());
        assert!(err.unwrap_or_default().contains("BOT_TOKEN"));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("BOT_TOKEN", "123:abc")]), None).unwrap();
        assert_eq!(config.transport, TransportMode::Pull);
        assert_eq!(config.port, 8443);
        assert_eq!(config.worker_pool_size, 4);
        assert_eq!(config.max_file_size_bytes, 50 * 1024 * 1024);
        assert_eq!(config.webhook_path, "/webhook");
        assert_eq!(config.ytdl_bin, "yt-dlp");
        assert!(!config.generic_fallback);
        assert!(config.webhook_url.is_none());
    }

    #[test]
    fn test_teloxide_token_fallback() {
        let config = Config::from_lookup(lookup(&[("TELOXIDE_TOKEN", "9:zz")]), None).unwrap();
        assert_eq!(config.bot_token, "9:zz");
    }

    #[test]
    fn test_push_mode_requires_webhook_url() {
        let err = Config::from_lookup(lookup(&[("BOT_TOKEN", "1:a")]), Some(TransportMode::Push))
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default();
        assert!(err.contains("WEBHOOK_URL"));
    }

    #[test]
    fn test_render_external_url_is_joined_with_path() {
        let config = Config::from_lookup(
            lookup(&[
                ("BOT_TOKEN", "1:a"),
                ("TRANSPORT_MODE", "webhook"),
                ("RENDER_EXTERNAL_URL", "https://bot.example.com/"),
            ]),
            None,
        )
        .unwrap();
        assert_eq!(config.transport, TransportMode::Push);
        assert_eq!(
            config.webhook_url.map(|u| u.to_string()),
            Some("https://bot.example.com/webhook".to_string())
        );
    }

    #[test]
    fn test_invalid_number_is_configuration_error() {
        let err = Config::from_lookup(lookup(&[("BOT_TOKEN", "1:a"), ("PORT", "eighty")]), None)
            .err()
            .unwrap();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = Config::from_lookup(lookup(&[("BOT_TOKEN", "1:a"), ("WORKER_POOL_SIZE", "0")]), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_summary_masks_token() {
        let config = Config::from_lookup(lookup(&[("BOT_TOKEN", "12345:secret")]), None).unwrap();
        let token = config
            .summary()
            .into_iter()
            .find(|(k, _)| *k == "BOT_TOKEN")
            .map(|(_, v)| v)
            .unwrap();
        assert_eq!(token, "12345:***");
    }

    #[test]
    fn test_backoff_is_capped() {
        assert_eq!(polling::backoff(1), Duration::from_millis(500));
        assert_eq!(polling::backoff(2), Duration::from_millis(1000));
        assert_eq!(polling::backoff(30), Duration::from_secs(polling::BACKOFF_MAX_SECS));
    }
}
