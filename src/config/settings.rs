//! Bot credentials and remote store configuration.

use std::fmt;
use std::time::Duration;

use super::{DEFAULT_API_URL, DEFAULT_KEY_PREFIX, DEFAULT_LICENSE_FILE_PATH, DEFAULT_TIMEOUT_SECS};

/// Telegram bot configuration.
#[derive(Clone)]
pub struct BotConfig {
    /// Bot API token (obtain from `@BotFather`).
    pub bot_token: String,

    /// Telegram user ID of the only account allowed to issue and revoke keys.
    pub admin_id: u64,
}

impl BotConfig {
    /// Creates a new bot configuration.
    #[must_use]
    pub fn new(bot_token: String, admin_id: u64) -> Self {
        Self {
            bot_token,
            admin_id,
        }
    }

    /// Creates configuration from environment variables.
    ///
    /// Expects `BOT_TOKEN` and `ADMIN_CHAT_ID` to be set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Creates configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = required(&lookup, "BOT_TOKEN")?;

        let admin_id = required(&lookup, "ADMIN_CHAT_ID")?
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                name: "ADMIN_CHAT_ID",
                reason: "must be a numeric Telegram user ID",
            })?;

        Ok(Self {
            bot_token,
            admin_id,
        })
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("bot_token", &"<redacted>")
            .field("admin_id", &self.admin_id)
            .finish()
    }
}

/// Location of and credentials for the license document.
#[derive(Clone)]
pub struct StoreConfig {
    /// GitHub token with write access to the repository contents.
    pub token: String,

    /// Repository in `owner/name` form.
    pub repo: String,

    /// Path of the license document inside the repository.
    pub file_path: String,

    /// Branch to read and commit to. `None` uses the repository default.
    pub branch: Option<String>,

    /// Base URL of the GitHub REST API.
    pub api_url: String,

    /// Timeout applied to every request.
    pub timeout: Duration,

    /// Prefix of generated license keys.
    pub key_prefix: String,
}

impl StoreConfig {
    /// Creates a store configuration with defaults for everything but the
    /// credential and repository.
    #[must_use]
    pub fn new(token: String, repo: String) -> Self {
        Self {
            token,
            repo,
            file_path: DEFAULT_LICENSE_FILE_PATH.to_owned(),
            branch: None,
            api_url: DEFAULT_API_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            key_prefix: DEFAULT_KEY_PREFIX.to_owned(),
        }
    }

    /// Points the store at a different API endpoint.
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Creates configuration from environment variables.
    ///
    /// Expects `GITHUB_TOKEN` and `GITHUB_REPO` to be set. `LICENSE_FILE_PATH`,
    /// `GITHUB_BRANCH`, `GITHUB_API_URL`, `GITHUB_TIMEOUT_SECS` and
    /// `LICENSE_KEY_PREFIX` are optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Creates configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = required(&lookup, "GITHUB_TOKEN")?;

        let repo = required(&lookup, "GITHUB_REPO")?.trim().to_owned();
        if !is_valid_repo(&repo) {
            return Err(ConfigError::InvalidValue {
                name: "GITHUB_REPO",
                reason: "must be in owner/name form",
            });
        }

        let timeout_secs = match optional(&lookup, "GITHUB_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidValue {
                    name: "GITHUB_TIMEOUT_SECS",
                    reason: "must be a positive number of seconds",
                })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let key_prefix = optional(&lookup, "LICENSE_KEY_PREFIX")
            .unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_owned());
        if !key_prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::InvalidValue {
                name: "LICENSE_KEY_PREFIX",
                reason: "must contain only ASCII letters and digits",
            });
        }

        Ok(Self {
            token,
            repo,
            file_path: optional(&lookup, "LICENSE_FILE_PATH")
                .unwrap_or_else(|| DEFAULT_LICENSE_FILE_PATH.to_owned()),
            branch: optional(&lookup, "GITHUB_BRANCH"),
            api_url: optional(&lookup, "GITHUB_API_URL")
                .map_or_else(|| DEFAULT_API_URL.to_owned(), |url| url.trim_end_matches('/').to_owned()),
            timeout: Duration::from_secs(timeout_secs),
            key_prefix,
        })
    }

    /// Contents API URL of the license document.
    #[must_use]
    pub fn contents_url(&self) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.api_url,
            self.repo,
            self.file_path.trim_start_matches('/')
        )
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("token", &"<redacted>")
            .field("repo", &self.repo)
            .field("file_path", &self.file_path)
            .field("branch", &self.branch)
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}

/// Reads a variable that must be present and non-empty.
fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, name).ok_or(ConfigError::MissingEnvVar(name))
}

/// Reads a variable, treating blank values as unset.
fn optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|value| !value.trim().is_empty())
}

fn is_valid_repo(repo: &str) -> bool {
    matches!(
        repo.split_once('/'),
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/')
    )
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue {
        name: &'static str,
        reason: &'static str,
    },
}
