//! Remote repository types and error definitions.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Opaque identifier of a file's stored version; the compare-and-swap key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RevisionToken(pub String);

impl RevisionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RevisionToken {
    fn from(sha: &str) -> Self {
        Self(sha.to_string())
    }
}

/// Most recent commit touching a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub sha: String,
    pub committed_at: DateTime<Utc>,
}

/// A create-or-update of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileWrite<'a> {
    pub path: &'a str,
    pub message: &'a str,
    /// Base64-encoded file body.
    pub content: &'a str,
    /// Current revision; `None` creates the file.
    pub revision: Option<&'a RevisionToken>,
}

/// Commit produced by a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRef {
    pub sha: String,
}

/// Errors that can occur while talking to the remote repository.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The submitted revision no longer matches the stored one.
    #[error("revision conflict: {0}")]
    Conflict(String),

    /// The remote answered with an unexpected status.
    #[error("remote returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Connection or protocol failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The call did not complete within its deadline.
    #[error("remote call timed out after {0:?}")]
    Timeout(Duration),

    /// The remote answered with a body we could not understand.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, RemoteError::Conflict(_))
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RemoteError::Decode(err.to_string())
        } else {
            RemoteError::Transport(err.to_string())
        }
    }
}

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// The three operations the save path needs from a version-controlled store.
#[async_trait]
pub trait RemoteRepository: Send + Sync {
    /// Current revision of `path`, or `None` if the file does not exist.
    async fn read_revision(&self, path: &str) -> RemoteResult<Option<RevisionToken>>;

    /// Latest commit that touched `path`, if any.
    async fn latest_commit(&self, path: &str) -> RemoteResult<Option<CommitInfo>>;

    /// Create or update a file. Fails with [`RemoteError::Conflict`] when
    /// `write.revision` is stale.
    async fn write_file(&self, write: &FileWrite<'_>) -> RemoteResult<CommitRef>;
}
