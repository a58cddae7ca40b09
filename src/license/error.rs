//! License store errors.

use thiserror::Error;

use crate::github::GithubError;

/// Errors returned by license store operations.
///
/// None of these are retried internally; each one ends the current command.
#[derive(Debug, Error)]
pub enum LicenseError {
    #[error("License store unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("License document is not valid: {0}")]
    Decode(String),

    #[error("License document was changed by someone else; the update was not applied")]
    Conflict,

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Expiry of {days} days is out of range")]
    ExpiryOutOfRange { days: u32 },
}

impl From<GithubError> for LicenseError {
    fn from(err: GithubError) -> Self {
        match err {
            GithubError::Conflict(_) => Self::Conflict,
            GithubError::InvalidContent(reason) => Self::Decode(reason),
            GithubError::Timeout | GithubError::Http(_) | GithubError::Status { .. } => {
                Self::RemoteUnavailable(err.to_string())
            }
        }
    }
}
