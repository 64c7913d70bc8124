//! Telegram integration: intake, dispatch, delivery and transports

pub mod delivery;
pub mod dispatcher;
pub mod intake;
pub mod outbox;
pub mod polling;
pub mod runner;
pub mod webhook;

// Re-exports for convenience
pub use dispatcher::{Dispatcher, Outcome};
pub use intake::{decode_payload, inbound_from_update, InboundMessage};
pub use outbox::{create_bot, ChatOutbox, TelegramOutbox};
pub use runner::{shutdown_signal, RunnerState, TransportRunner};
