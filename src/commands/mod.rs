//! Command handling module.
//!
//! Parses `/start`, `/gen`, `/ban` and `/unban`, enforces the single
//! administrator identity and renders replies. Independent of the chat
//! transport.

mod handler;
mod types;

pub use handler::CommandHandler;
pub use types::{BotCommand, CommandError, CommandKind, CommandResult, GenArgs};
