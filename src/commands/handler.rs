//! Command handler implementation.

use teloxide::utils::html;
use tracing::{debug, info, warn};

use super::types::{BotCommand, CommandError, CommandKind, CommandResult, GenArgs};
use crate::license::{LicenseError, LicenseStore};

/// Executes bot commands against the license store.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    /// Telegram user ID allowed to run mutating commands.
    admin_id: u64,

    /// License store client.
    store: LicenseStore,

    /// This bot's username, used to ignore commands meant for other bots.
    bot_username: Option<String>,
}

impl CommandHandler {
    /// Creates a new command handler.
    #[must_use]
    pub fn new(admin_id: u64, store: LicenseStore) -> Self {
        Self {
            admin_id,
            store,
            bot_username: None,
        }
    }

    /// Only accepts `/cmd@name` mentions that name this bot.
    #[must_use]
    pub fn with_bot_username(mut self, username: Option<String>) -> Self {
        self.bot_username = username;
        self
    }

    /// Tries to parse and execute a command from a message.
    ///
    /// Returns `None` if the message is not a command for this bot.
    pub async fn try_handle(&self, caller_id: u64, message_text: &str) -> Option<CommandResult> {
        let (kind, args) = BotCommand::split(message_text, self.bot_username.as_deref())?;

        debug!("Handling /{} from {}", kind.name(), caller_id);
        let result = match self.execute(caller_id, kind, &args).await {
            Ok(reply) => CommandResult::success(reply),
            Err(e) => {
                match &e {
                    CommandError::Unauthorized => {
                        warn!("Rejected /{} from non-admin user {}", kind.name(), caller_id);
                    }
                    CommandError::BadArguments { .. } => debug!("/{}: {}", kind.name(), e),
                    CommandError::License(_) => warn!("/{} failed: {}", kind.name(), e),
                }
                CommandResult::error(render_error(&e))
            }
        };
        info!("Command /{} result: success={}", kind.name(), result.success);

        Some(result)
    }

    /// Checks authorization, validates arguments, then runs the command.
    async fn execute(
        &self,
        caller_id: u64,
        kind: CommandKind,
        args: &[&str],
    ) -> Result<String, CommandError> {
        if kind.requires_admin() && caller_id != self.admin_id {
            return Err(CommandError::Unauthorized);
        }

        let command = BotCommand::from_args(kind, args)?;
        debug!("Executing {}", command);

        match command {
            BotCommand::Start => Ok(self.handle_start()),
            BotCommand::Gen(args) => self.handle_gen(args).await,
            BotCommand::Ban(key) => self.handle_ban(&key, true).await,
            BotCommand::Unban(key) => self.handle_ban(&key, false).await,
        }
    }

    fn handle_start(&self) -> String {
        let mut lines = vec![
            format!("{} License Bot is ready!", html::escape(self.store.key_prefix())),
            String::new(),
            "Commands:".to_owned(),
        ];
        lines.extend(
            CommandKind::ALL
                .iter()
                .filter(|kind| kind.requires_admin())
                .map(|kind| format!("{} - {}", html::escape(kind.usage()), kind.description())),
        );
        lines.join("\n")
    }

    async fn handle_gen(&self, args: GenArgs) -> Result<String, CommandError> {
        let issued = self
            .store
            .issue(&args.hwid, args.allowed_devices, args.days)
            .await?;

        let expires = issued
            .record
            .expire_at
            .map_or_else(|| "never".to_owned(), |date| date.format("%Y-%m-%d").to_string());

        Ok(format!(
            "✅ License created!\n\n\
             Key: {}\n\
             First HWID: {}\n\
             Max devices: {}\n\
             Expires: {expires}",
            html::code_inline(&issued.key),
            html::code_inline(issued.hwid()),
            issued.record.allowed_devices,
        ))
    }

    async fn handle_ban(&self, key: &str, banned: bool) -> Result<String, CommandError> {
        self.store.set_banned(key, banned).await?;

        Ok(if banned {
            format!("🚫 Key {} banned.", html::code_inline(key))
        } else {
            format!("✅ Key {} unbanned.", html::code_inline(key))
        })
    }
}

/// Renders an error as a reply.
fn render_error(err: &CommandError) -> String {
    match err {
        CommandError::Unauthorized => "⚠️ You are not an administrator.".to_owned(),
        CommandError::BadArguments { usage, reason } => {
            format!("{}.\nFormat: {}", html::escape(reason), html::escape(usage))
        }
        CommandError::License(license) => match license {
            LicenseError::KeyNotFound(key) => {
                format!("❌ Key {} not found!", html::code_inline(key))
            }
            LicenseError::Conflict => "⚠️ The license file was changed by another update. \
                 Nothing was saved, please send the command again."
                .to_owned(),
            LicenseError::RemoteUnavailable(detail) => {
                format!("❌ Could not reach the license store: {}", html::escape(detail))
            }
            LicenseError::Decode(detail) => {
                format!("❌ The license file could not be read: {}", html::escape(detail))
            }
            LicenseError::ExpiryOutOfRange { days } => {
                format!("❌ Expiry of {days} days is out of range.")
            }
        },
    }
}
