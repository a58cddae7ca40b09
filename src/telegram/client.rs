//! Telegram front-end for the command handler.

use std::sync::Arc;

use teloxide::dispatching::UpdateHandler;
use teloxide::dptree;
use teloxide::prelude::*;
use teloxide::types::{BotCommand as MenuCommand, ParseMode};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::commands::{CommandHandler, CommandKind};
use crate::config::BotConfig;

/// Errors that can occur during Telegram operations.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Telegram API request failed: {0}")]
    Request(#[from] teloxide::RequestError),
}

/// Bot API client wired to a [`CommandHandler`].
pub struct TelegramBot {
    /// The underlying teloxide bot.
    bot: Bot,

    /// Handler shared with every update.
    handler: Arc<CommandHandler>,

    /// Bot username, once known.
    username: Option<String>,
}

impl TelegramBot {
    /// Connects to the Bot API and verifies the token.
    pub async fn connect(config: &BotConfig, handler: CommandHandler) -> Result<Self, TelegramError> {
        info!("Connecting to Telegram...");

        let bot = Bot::new(&config.bot_token);
        let me = bot.get_me().await?;
        let username = me.user.username.clone();

        info!(
            "Connected to Telegram as @{}",
            username.as_deref().unwrap_or("<unnamed>")
        );

        Ok(Self {
            bot,
            handler: Arc::new(handler.with_bot_username(username.clone())),
            username,
        })
    }

    /// Returns the bot username, if it has one.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Publishes the command list shown in Telegram's command menu.
    pub async fn register_commands(&self) -> Result<(), TelegramError> {
        debug!("Registering command menu");
        self.bot.set_my_commands(menu_commands()).await?;
        Ok(())
    }

    /// Receives updates until Ctrl+C.
    pub async fn run(self) {
        info!("Polling for updates. Use Ctrl+C to stop.");

        Dispatcher::builder(self.bot, schema())
            .dependencies(dptree::deps![self.handler])
            .default_handler(|_update| async {
                debug!("Ignoring non-message update");
            })
            .error_handler(LoggingErrorHandler::with_custom_text("Error while handling update"))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("Stopped polling");
    }
}

impl std::fmt::Debug for TelegramBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramBot")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

fn schema() -> UpdateHandler<teloxide::RequestError> {
    Update::filter_message().endpoint(on_message)
}

async fn on_message(bot: Bot, handler: Arc<CommandHandler>, msg: Message) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let Some(caller_id) = msg.from.as_ref().map(|user| user.id.0) else {
        warn!("Ignoring message without sender in chat {}", msg.chat.id.0);
        return Ok(());
    };

    if let Some(result) = handler.try_handle(caller_id, text).await {
        bot.send_message(msg.chat.id, result.message)
            .parse_mode(ParseMode::Html)
            .await?;
    }

    Ok(())
}

/// Commands advertised in the Telegram menu.
fn menu_commands() -> Vec<MenuCommand> {
    CommandKind::ALL
        .iter()
        .map(|kind| MenuCommand::new(kind.name(), kind.description()))
        .collect()
}
