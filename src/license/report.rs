//! Consistency report for a license document.

use chrono::NaiveDate;

use super::LicenseDocument;
use super::keygen::is_well_formed;

/// Summary of a license document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentReport {
    /// Number of issued keys.
    pub total: usize,

    /// Keys with `banned` set.
    pub banned: usize,

    /// Keys whose expiry date has passed.
    pub expired: usize,

    /// Keys that are neither banned nor expired.
    pub active: usize,

    /// Keys that do not match the generated key format.
    pub malformed_keys: Vec<String>,

    /// Keys with more bound devices than allowed.
    pub over_limit: Vec<String>,

    /// Keys with a device limit of zero.
    pub zero_limit: Vec<String>,

    /// Keys whose record could not be decoded, with the reason.
    pub unreadable: Vec<(String, String)>,
}

impl DocumentReport {
    /// Builds a report for `document` as of `today`.
    #[must_use]
    pub fn build(document: &LicenseDocument, prefix: &str, today: NaiveDate) -> Self {
        let mut report = Self {
            total: document.len(),
            ..Self::default()
        };

        for (key, record) in document.records() {
            if !is_well_formed(key, prefix) {
                report.malformed_keys.push(key.clone());
            }
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    report.unreadable.push((key.clone(), e.to_string()));
                    continue;
                }
            };

            if record.banned {
                report.banned += 1;
            }
            let expired = record.is_expired(today);
            if expired {
                report.expired += 1;
            }
            if !record.banned && !expired {
                report.active += 1;
            }
            if record.allowed_devices == 0 {
                report.zero_limit.push(key.clone());
            } else if record.is_over_limit() {
                report.over_limit.push(key.clone());
            }
        }

        report
    }

    /// Returns true if no problems were found.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.malformed_keys.is_empty()
            && self.over_limit.is_empty()
            && self.zero_limit.is_empty()
            && self.unreadable.is_empty()
    }
}
