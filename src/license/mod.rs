//! License store module.
//!
//! Every operation is one read-modify-write cycle against the license
//! document in the repository: fetch the document with its revision token,
//! change a local copy, write it back conditioned on the same token.

mod error;
pub mod keygen;
mod model;
mod report;
mod store;

pub use error::LicenseError;
pub use model::{LicenseDocument, LicenseRecord};
pub use report::DocumentReport;
pub use store::{IssuedLicense, LicenseStore, RevisionToken, expiry_date};
