//! License document types.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::LicenseError;

/// The complete license document stored in the repository.
///
/// Records are kept as raw JSON and only decoded into [`LicenseRecord`] on
/// demand, so a record this bot cannot read never blocks the others and is
/// written back exactly as it was fetched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LicenseDocument {
    /// Issued licenses by key.
    #[serde(default)]
    pub keys: BTreeMap<String, Value>,

    /// Top-level fields this bot does not manage, kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LicenseDocument {
    /// Parses a document from raw JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Serializes the document as pretty JSON with two-space indentation.
    pub fn to_pretty_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Returns true if `key` has been issued.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    /// Number of issued keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if no keys have been issued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Decodes the record stored under `key`.
    ///
    /// Returns `None` if the key has not been issued.
    #[must_use]
    pub fn record(&self, key: &str) -> Option<Result<LicenseRecord, serde_json::Error>> {
        self.keys.get(key).map(LicenseRecord::from_value)
    }

    /// Decodes every record, in key order.
    pub fn records(
        &self,
    ) -> impl Iterator<Item = (&String, Result<LicenseRecord, serde_json::Error>)> {
        self.keys
            .iter()
            .map(|(key, value)| (key, LicenseRecord::from_value(value)))
    }

    /// Stores `record` under `key`, replacing any previous entry.
    pub fn insert(&mut self, key: impl Into<String>, record: &LicenseRecord) -> Result<(), serde_json::Error> {
        self.keys.insert(key.into(), serde_json::to_value(record)?);
        Ok(())
    }

    /// Sets the `banned` flag of `key`, leaving every other field untouched.
    ///
    /// Returns the previous value of the flag, if the record had one.
    pub fn set_banned(&mut self, key: &str, banned: bool) -> Result<Option<Value>, LicenseError> {
        let entry = self
            .keys
            .get_mut(key)
            .ok_or_else(|| LicenseError::KeyNotFound(key.to_owned()))?;

        let fields = entry
            .as_object_mut()
            .ok_or_else(|| LicenseError::Decode(format!("record {key} is not a JSON object")))?;

        Ok(fields.insert("banned".to_owned(), Value::Bool(banned)))
    }
}

/// A single issued license.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LicenseRecord {
    /// Maximum number of distinct hardware IDs.
    pub allowed_devices: u32,

    /// Hardware IDs bound to the key, in binding order.
    #[serde(default)]
    pub devices: Vec<String>,

    /// Whether the key has been revoked.
    #[serde(default)]
    pub banned: bool,

    /// Last day the key is valid. `None` never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<NaiveDate>,

    /// Fields written by other tools, kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LicenseRecord {
    /// Decodes a record from its stored JSON form.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    /// Creates a fresh record bound to a single hardware ID.
    #[must_use]
    pub fn new(hwid: &str, allowed_devices: u32, expire_at: Option<NaiveDate>) -> Self {
        Self {
            allowed_devices,
            devices: vec![hwid.to_uppercase()],
            banned: false,
            expire_at,
            extra: Map::new(),
        }
    }

    /// Returns true if the key expired before `today`.
    #[must_use]
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expire_at.is_some_and(|date| date < today)
    }

    /// Returns true if more devices are bound than the key allows.
    #[must_use]
    pub fn is_over_limit(&self) -> bool {
        self.devices.len() > self.allowed_devices as usize
    }
}
