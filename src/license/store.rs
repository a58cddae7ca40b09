//! License store client.

use std::fmt;

use chrono::{Days, NaiveDate, Utc};
use tracing::{debug, info, warn};

use super::keygen::generate_unique_key;
use super::{LicenseDocument, LicenseError, LicenseRecord};
use crate::config::StoreConfig;
use crate::github::GithubClient;

/// Opaque revision of the stored document.
///
/// A write is only accepted while the token still matches the stored content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionToken(String);

impl RevisionToken {
    /// Wraps a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RevisionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(crate::github::short_sha(&self.0))
    }
}

/// Result of issuing a new key.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedLicense {
    /// The generated key.
    pub key: String,

    /// The record stored under the key.
    pub record: LicenseRecord,
}

impl IssuedLicense {
    /// The hardware ID the key was issued for.
    #[must_use]
    pub fn hwid(&self) -> &str {
        self.record.devices.first().map_or("", String::as_str)
    }
}

/// Computes the expiry date `days` after `today`.
pub fn expiry_date(today: NaiveDate, days: u32) -> Result<NaiveDate, LicenseError> {
    today
        .checked_add_days(Days::new(u64::from(days)))
        .ok_or(LicenseError::ExpiryOutOfRange { days })
}

/// Issues and revokes license keys in the remote license document.
///
/// Holds no document state between calls.
#[derive(Debug, Clone)]
pub struct LicenseStore {
    github: GithubClient,
    key_prefix: String,
}

impl LicenseStore {
    /// Creates a store client from configuration.
    pub fn new(config: &StoreConfig) -> Result<Self, LicenseError> {
        Ok(Self {
            github: GithubClient::new(config)?,
            key_prefix: config.key_prefix.clone(),
        })
    }

    /// Prefix of keys generated by this store.
    #[must_use]
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Fetches the current document and its revision token.
    pub async fn fetch(&self) -> Result<(LicenseDocument, RevisionToken), LicenseError> {
        let file = self.github.get_file().await?;

        let document = LicenseDocument::from_json_slice(&file.content)
            .map_err(|e| LicenseError::Decode(e.to_string()))?;

        debug!(
            "Loaded license document with {} keys (revision {})",
            document.len(),
            short(&file.sha)
        );

        Ok((document, RevisionToken::new(file.sha)))
    }

    /// Writes `document` back, conditioned on `revision` still being current.
    ///
    /// A stale revision fails with [`LicenseError::Conflict`]; the write is
    /// not retried.
    pub async fn write(
        &self,
        document: &LicenseDocument,
        revision: &RevisionToken,
        message: &str,
    ) -> Result<(), LicenseError> {
        let content = document
            .to_pretty_json()
            .map_err(|e| LicenseError::Decode(format!("failed to encode document: {e}")))?;

        match self.github.put_file(&content, revision.as_str(), message).await {
            Ok(new_sha) => {
                info!(
                    "{} (revision {} -> {})",
                    message,
                    revision,
                    new_sha.as_deref().map_or("?", short)
                );
                Ok(())
            }
            Err(e) => {
                let err = LicenseError::from(e);
                if matches!(err, LicenseError::Conflict) {
                    warn!("Write '{}' rejected: revision {} is stale", message, revision);
                }
                Err(err)
            }
        }
    }

    /// Issues a new key for `hwid`.
    ///
    /// `days` sets an expiry relative to today (UTC); `None` never expires.
    pub async fn issue(
        &self,
        hwid: &str,
        allowed_devices: u32,
        days: Option<u32>,
    ) -> Result<IssuedLicense, LicenseError> {
        let today = Utc::now().date_naive();
        let expire_at = days.map(|d| expiry_date(today, d)).transpose()?;

        let (mut document, revision) = self.fetch().await?;

        let key = generate_unique_key(&mut rand::thread_rng(), &self.key_prefix, &document);
        let record = LicenseRecord::new(hwid, allowed_devices, expire_at);
        document
            .insert(key.clone(), &record)
            .map_err(|e| LicenseError::Decode(format!("failed to encode record: {e}")))?;

        self.write(&document, &revision, &format!("Add key {key}"))
            .await?;

        Ok(IssuedLicense { key, record })
    }

    /// Sets the `banned` flag of `key`.
    ///
    /// Only the flag is changed; the rest of the record is written back as
    /// fetched.
    pub async fn set_banned(&self, key: &str, banned: bool) -> Result<(), LicenseError> {
        let (mut document, revision) = self.fetch().await?;

        let previous = document.set_banned(key, banned)?;
        if previous.and_then(|flag| flag.as_bool()) == Some(banned) {
            debug!("Key {} already has banned={}, writing anyway", key, banned);
        }

        let message = if banned {
            format!("Ban {key}")
        } else {
            format!("Unban {key}")
        };

        self.write(&document, &revision, &message).await
    }
}

fn short(sha: &str) -> &str {
    crate::github::short_sha(sha)
}
