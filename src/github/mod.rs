//! GitHub contents API client.
//!
//! Reads and conditionally updates a single file in a repository. The file's
//! blob `sha` acts as the revision token: GitHub rejects an update whose `sha`
//! no longer matches the stored file.

mod client;

pub use client::{GithubClient, GithubError, RepoFile};
pub(crate) use client::short_sha;
