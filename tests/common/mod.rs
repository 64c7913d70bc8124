//! Common test utilities
//!
//! This module is shared across all integration tests

pub mod fixtures;
pub mod telegram_mock;

#[allow(unused_imports)]
pub use fixtures::{message, test_config, text_update, wait_until, TEST_CHAT_ID};
#[allow(unused_imports)]
pub use telegram_mock::TelegramMock;
