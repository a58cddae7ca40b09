//! Contents API wrapper for the license document.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::{Client, RequestBuilder, StatusCode, header};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::StoreConfig;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("wg-license-bot/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur while talking to the contents API.
#[derive(Debug, Error)]
pub enum GithubError {
    #[error("Request to GitHub timed out")]
    Timeout,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub responded with {status}: {message}")]
    Status { status: u16, message: String },

    #[error("File was modified concurrently: {0}")]
    Conflict(String),

    #[error("Invalid file content: {0}")]
    InvalidContent(String),
}

impl GithubError {
    fn from_request(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

/// A file as stored in the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoFile {
    /// Decoded file bytes.
    pub content: Vec<u8>,

    /// Blob sha of the stored content.
    pub sha: String,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    #[serde(default)]
    content: String,
    sha: String,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    message: &'a str,
    content: String,
    sha: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct UpdateResponse {
    content: Option<UpdatedContent>,
}

#[derive(Debug, Deserialize)]
struct UpdatedContent {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: String,
}

/// Client bound to one file in one repository.
#[derive(Clone)]
pub struct GithubClient {
    http: Client,
    url: String,
    token: String,
    branch: Option<String>,
}

impl GithubClient {
    /// Creates a client for the file described by `config`.
    ///
    /// Every request is bounded by `config.timeout`.
    pub fn new(config: &StoreConfig) -> Result<Self, GithubError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            url: config.contents_url(),
            token: config.token.clone(),
            branch: config.branch.clone(),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header(header::ACCEPT, GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
    }

    /// Fetches the file and its current sha.
    pub async fn get_file(&self) -> Result<RepoFile, GithubError> {
        debug!("Fetching {}", self.url);

        let mut request = self.authorized(self.http.get(&self.url));
        if let Some(branch) = &self.branch {
            request = request.query(&[("ref", branch)]);
        }

        let response = request.send().await.map_err(GithubError::from_request)?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response).await);
        }

        let body: ContentsResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GithubError::Timeout
            } else {
                GithubError::InvalidContent(format!("unexpected response body: {e}"))
            }
        })?;

        if let Some(encoding) = body.encoding.as_deref()
            && encoding != "base64"
        {
            return Err(GithubError::InvalidContent(format!(
                "unsupported content encoding '{encoding}'"
            )));
        }

        let content = decode_content(&body.content)?;
        debug!("Fetched {} bytes at sha {}", content.len(), short_sha(&body.sha));

        Ok(RepoFile {
            content,
            sha: body.sha,
        })
    }

    /// Replaces the file content, conditioned on `sha` still being current.
    ///
    /// Returns the sha of the new content when GitHub reports it.
    pub async fn put_file(
        &self,
        content: &[u8],
        sha: &str,
        message: &str,
    ) -> Result<Option<String>, GithubError> {
        debug!(
            "Updating {} ({} bytes, base sha {})",
            self.url,
            content.len(),
            short_sha(sha)
        );

        let body = UpdateRequest {
            message,
            content: BASE64.encode(content),
            sha,
            branch: self.branch.as_deref(),
        };

        let response = self
            .authorized(self.http.put(&self.url))
            .json(&body)
            .send()
            .await
            .map_err(GithubError::from_request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response).await);
        }

        // Write already accepted; the new sha is only logged.
        let new_sha = match response.json::<UpdateResponse>().await {
            Ok(body) => body.content.map(|c| c.sha),
            Err(e) => {
                warn!("Could not read update response: {}", e);
                None
            }
        };

        Ok(new_sha)
    }
}

impl std::fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubClient")
            .field("url", &self.url)
            .field("branch", &self.branch)
            .finish_non_exhaustive()
    }
}

/// Maps a non-success response to an error, reading GitHub's message if any.
async fn status_error(status: StatusCode, response: reqwest::Response) -> GithubError {
    let message = response
        .json::<ErrorResponse>()
        .await
        .map(|body| body.message)
        .unwrap_or_default();

    if is_conflict(status, &message) {
        return GithubError::Conflict(message);
    }

    GithubError::Status {
        status: status.as_u16(),
        message: if message.is_empty() {
            status.canonical_reason().unwrap_or("unknown status").to_owned()
        } else {
            message
        },
    }
}

/// GitHub answers a stale sha with 409, and with 422 on some code paths.
fn is_conflict(status: StatusCode, message: &str) -> bool {
    match status {
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => true,
        StatusCode::UNPROCESSABLE_ENTITY => message.to_lowercase().contains("sha"),
        _ => false,
    }
}

/// Decodes the base64 payload, which GitHub wraps at 60 columns.
fn decode_content(encoded: &str) -> Result<Vec<u8>, GithubError> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    BASE64
        .decode(compact)
        .map_err(|e| GithubError::InvalidContent(format!("invalid base64: {e}")))
}

/// Shortens a sha for log output.
pub(crate) fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}
