//! Telegram front-end module.
//!
//! Receives messages over the Bot API, passes command text to the
//! [`CommandHandler`](crate::commands::CommandHandler) and sends its reply
//! back to the chat.

mod client;

pub use client::{TelegramBot, TelegramError};
