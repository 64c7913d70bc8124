//! Core utilities, configuration, and common functionality

pub mod config;
pub mod error;
pub mod logging;
pub mod process;
pub mod scratch;

// Re-exports for convenience
pub use config::{Config, TransportMode};
pub use error::{AppError, AppResult};
pub use logging::{init_logger, install_panic_hook, log_configuration};
pub use scratch::{ScratchArea, ScratchDir};
