//! Command types and definitions.

use std::fmt;

use thiserror::Error;

use crate::license::LicenseError;

/// Commands understood by the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// List the available commands.
    Start,

    /// Issue a new key.
    Gen,

    /// Revoke a key.
    Ban,

    /// Lift a revocation.
    Unban,
}

impl CommandKind {
    /// All commands in help order.
    pub const ALL: [Self; 4] = [Self::Start, Self::Gen, Self::Ban, Self::Unban];

    /// Looks up a command by name, ignoring case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "start" | "help" => Some(Self::Start),
            "gen" => Some(Self::Gen),
            "ban" => Some(Self::Ban),
            "unban" => Some(Self::Unban),
            _ => None,
        }
    }

    /// Returns the command name as typed after `/`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Gen => "gen",
            Self::Ban => "ban",
            Self::Unban => "unban",
        }
    }

    /// Returns the command syntax.
    #[must_use]
    pub const fn usage(self) -> &'static str {
        match self {
            Self::Start => "/start",
            Self::Gen => "/gen <HWID> <allowed_devices> [days]",
            Self::Ban => "/ban <KEY>",
            Self::Unban => "/unban <KEY>",
        }
    }

    /// Returns the command description for help.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Start => "Show available commands",
            Self::Gen => "Issue a new license key",
            Self::Ban => "Ban a license key",
            Self::Unban => "Unban a license key",
        }
    }

    /// Returns true if only the administrator may run the command.
    #[must_use]
    pub const fn requires_admin(self) -> bool {
        !matches!(self, Self::Start)
    }
}

/// Arguments for issuing a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenArgs {
    /// Hardware ID, upper-cased.
    pub hwid: String,

    /// Maximum number of devices, at least 1.
    pub allowed_devices: u32,

    /// Validity in days, or `None` for a key that never expires.
    pub days: Option<u32>,
}

/// A command with validated arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Gen(GenArgs),
    Ban(String),
    Unban(String),
}

impl BotCommand {
    /// Splits a message into a known command and its arguments.
    ///
    /// Accepts the `/cmd@botname` form Telegram uses in groups. When
    /// `bot_username` is known, a command addressed to another bot is
    /// ignored. Returns `None` if the message is not a known command for
    /// this bot.
    #[must_use]
    pub fn split<'a>(
        text: &'a str,
        bot_username: Option<&str>,
    ) -> Option<(CommandKind, Vec<&'a str>)> {
        let mut tokens = text.split_whitespace();
        let head = tokens.next()?.strip_prefix('/')?;

        let name = match head.split_once('@') {
            Some((name, mention)) => {
                if let Some(own) = bot_username
                    && !mention.eq_ignore_ascii_case(own.trim_start_matches('@'))
                {
                    return None;
                }
                name
            }
            None => head,
        };

        let kind = CommandKind::from_name(name)?;
        Some((kind, tokens.collect()))
    }

    /// Validates the arguments of `kind`.
    ///
    /// Extra trailing arguments are ignored.
    pub fn from_args(kind: CommandKind, args: &[&str]) -> Result<Self, CommandError> {
        match kind {
            CommandKind::Start => Ok(Self::Start),
            CommandKind::Gen => Self::parse_gen(args).map(Self::Gen),
            CommandKind::Ban => Self::parse_key(kind, args).map(Self::Ban),
            CommandKind::Unban => Self::parse_key(kind, args).map(Self::Unban),
        }
    }

    /// Parses a message into a validated command.
    ///
    /// Returns `None` if the message is not a known command for this bot.
    #[must_use]
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Result<Self, CommandError>> {
        let (kind, args) = Self::split(text, bot_username)?;
        Some(Self::from_args(kind, &args))
    }

    /// Parses gen arguments: `<hwid> <allowed_devices> [days]`
    fn parse_gen(args: &[&str]) -> Result<GenArgs, CommandError> {
        let usage = CommandKind::Gen.usage();

        let (Some(hwid), Some(allowed)) = (args.first(), args.get(1)) else {
            return Err(CommandError::bad_arguments(usage, "HWID and device limit are required"));
        };

        let allowed_devices = allowed
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                CommandError::bad_arguments(usage, "allowed_devices must be a positive integer")
            })?;

        let days = args
            .get(2)
            .map(|raw| {
                raw.parse::<u32>().map_err(|_| {
                    CommandError::bad_arguments(usage, "days must be a non-negative integer")
                })
            })
            .transpose()?;

        Ok(GenArgs {
            hwid: hwid.to_uppercase(),
            allowed_devices,
            days,
        })
    }

    /// Parses a single key argument.
    fn parse_key(kind: CommandKind, args: &[&str]) -> Result<String, CommandError> {
        args.first()
            .map(|key| (*key).to_owned())
            .ok_or_else(|| CommandError::bad_arguments(kind.usage(), "a license key is required"))
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Gen(args) => {
                write!(f, "gen {} {}", args.hwid, args.allowed_devices)?;
                if let Some(days) = args.days {
                    write!(f, " {days}")?;
                }
                Ok(())
            }
            Self::Ban(key) => write!(f, "ban {key}"),
            Self::Unban(key) => write!(f, "unban {key}"),
        }
    }
}

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Caller is not the administrator")]
    Unauthorized,

    #[error("{reason}. Usage: {usage}")]
    BadArguments { usage: &'static str, reason: String },

    #[error(transparent)]
    License(#[from] LicenseError),
}

impl CommandError {
    fn bad_arguments(usage: &'static str, reason: impl Into<String>) -> Self {
        Self::BadArguments {
            usage,
            reason: reason.into(),
        }
    }
}

/// Result of command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command was successful.
    pub success: bool,

    /// Reply text, formatted as Telegram HTML.
    pub message: String,
}

impl CommandResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Creates an error result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
