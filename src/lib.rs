//! mediaferry - Telegram bot that turns YouTube and Instagram links into videos
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, subprocesses and scratch space
//! - `download`: fetch adapters driving yt-dlp
//! - `telegram`: intake, dispatcher, delivery and the webhook/polling transports
//! - `testing`: fakes for yt-dlp and the chat API used by the test suites

pub mod cli;
pub mod core;
pub mod download;
pub mod telegram;
pub mod testing;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError, AppResult, Config, TransportMode};
pub use download::{FetchAdapter, SourceRegistry};
pub use telegram::{Dispatcher, TransportRunner};
