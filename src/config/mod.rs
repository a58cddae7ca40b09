//! Configuration module for the license bot.
//!
//! Handles loading of the Telegram credentials, the administrator identity
//! and the location of the license document in the remote repository.

mod settings;

pub use settings::{BotConfig, ConfigError, StoreConfig};

/// Default GitHub REST API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default path of the license document inside the repository.
pub const DEFAULT_LICENSE_FILE_PATH: &str = "licenses.json";

/// Default prefix of generated license keys.
pub const DEFAULT_KEY_PREFIX: &str = "WG";

/// Default timeout for a single request to the remote store, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
