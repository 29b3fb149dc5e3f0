//! Versioned write against the remote repository.
//!
//! # States
//! ```text
//! ReadRevision ──▶ [StaleCheck] ──▶ Commit ──▶ Success
//!      ▲                                  │
//!      │                                  ├─ conflict, attempts left ──▶ Backoff ──┐
//!      └──────────────────────────────────┼────────────────────────────────────────┘
//!                                         └─ conflict on last attempt / any other error ──▶ Failure
//! ```
//!
//! # Design Decisions
//! - The revision is re-read before every attempt; it is the CAS key
//! - Only a revision conflict is retried, at most `max_attempts` writes total
//! - The stale check is advisory: its own failures never block the write
//! - Attempts run strictly one after another within a request

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use crate::config::{RemoteConfig, RetryConfig};
use crate::observability::metrics;
use crate::remote::{FileWrite, RemoteError, RemoteRepository, RevisionToken};
use crate::resilience::{conflict_backoff, with_timeout, Delay};
use crate::save::encoding::encode_content;

/// Retry and timing parameters for one orchestrator.
#[derive(Debug, Clone, Copy)]
pub struct CommitPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub stale_tolerance: chrono::Duration,
    pub call_timeout: Duration,
}

impl CommitPolicy {
    pub fn from_config(retries: &RetryConfig, remote: &RemoteConfig) -> Self {
        Self {
            max_attempts: retries.max_attempts.max(1),
            base_delay_ms: retries.base_delay_ms,
            stale_tolerance: chrono::Duration::milliseconds(retries.stale_tolerance_ms),
            call_timeout: Duration::from_secs(remote.call_timeout_secs),
        }
    }
}

impl Default for CommitPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default(), &RemoteConfig::default())
    }
}

/// What to commit.
#[derive(Debug, Clone, Copy)]
pub struct CommitRequest<'a> {
    pub content: &'a str,
    pub path: &'a str,
    /// Client-side save time, used in the commit message.
    pub timestamp: Option<DateTime<Utc>>,
    /// When the client last loaded or saved the file.
    pub last_saved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSuccess {
    pub commit_sha: String,
    pub completed_at: DateTime<Utc>,
    /// 1-based number of the attempt that succeeded.
    pub attempt: u32,
}

/// The remote moved on after the client last saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleSignal {
    pub server_commit_time: DateTime<Utc>,
    pub server_commit_sha: String,
}

#[derive(Debug, Clone, Error)]
pub enum CommitError {
    #[error("remote file changed since the client last saved")]
    Stale(StaleSignal),

    #[error("revision conflict persisted after {attempts} attempts: {last}")]
    ConflictExhausted { attempts: u32, last: String },

    #[error("failed to read current revision: {0}")]
    ReadRevision(RemoteError),

    #[error("failed to write content: {0}")]
    Write(RemoteError),
}

enum CommitState {
    ReadRevision,
    StaleCheck {
        revision: Option<RevisionToken>,
        last_saved_at: DateTime<Utc>,
    },
    Commit {
        revision: Option<RevisionToken>,
    },
    Backoff,
}

/// Runs the read → check → write → retry cycle for one save.
#[derive(Clone)]
pub struct CommitOrchestrator {
    remote: Arc<dyn RemoteRepository>,
    delay: Arc<dyn Delay>,
    policy: CommitPolicy,
}

impl CommitOrchestrator {
    pub fn new(remote: Arc<dyn RemoteRepository>, delay: Arc<dyn Delay>, policy: CommitPolicy) -> Self {
        Self {
            remote,
            delay,
            policy,
        }
    }

    pub async fn commit(&self, request: CommitRequest<'_>) -> Result<CommitSuccess, CommitError> {
        let encoded = encode_content(request.content);
        let message = commit_message(request.timestamp.unwrap_or_else(Utc::now));
        let deadline = self.policy.call_timeout;

        // Conflicts seen so far; also the 0-based index of the current attempt.
        let mut conflicts: u32 = 0;
        let mut state = CommitState::ReadRevision;

        loop {
            state = match state {
                CommitState::ReadRevision => {
                    let revision = with_timeout(deadline, self.remote.read_revision(request.path))
                        .await
                        .map_err(|e| {
                            tracing::error!(path = %request.path, error = %e, "Revision read failed");
                            metrics::record_commit_attempt("read_failed");
                            CommitError::ReadRevision(e)
                        })?;

                    tracing::debug!(
                        path = %request.path,
                        attempt = conflicts + 1,
                        exists = revision.is_some(),
                        "Read current revision"
                    );

                    match request.last_saved_at {
                        Some(last_saved_at) => CommitState::StaleCheck {
                            revision,
                            last_saved_at,
                        },
                        None => CommitState::Commit { revision },
                    }
                }

                CommitState::StaleCheck {
                    revision,
                    last_saved_at,
                } => {
                    if let Some(signal) = self.stale_signal(request.path, last_saved_at).await {
                        tracing::warn!(
                            path = %request.path,
                            server_commit = %signal.server_commit_sha,
                            server_time = %signal.server_commit_time,
                            client_time = %last_saved_at,
                            "Rejecting stale save"
                        );
                        metrics::record_commit_attempt("stale");
                        return Err(CommitError::Stale(signal));
                    }
                    CommitState::Commit { revision }
                }

                CommitState::Commit { revision } => {
                    let write = FileWrite {
                        path: request.path,
                        message: &message,
                        content: &encoded,
                        revision: revision.as_ref(),
                    };

                    match with_timeout(deadline, self.remote.write_file(&write)).await {
                        Ok(commit) => {
                            let attempt = conflicts + 1;
                            tracing::info!(
                                path = %request.path,
                                commit = %commit.sha,
                                attempt,
                                created = revision.is_none(),
                                "Content committed"
                            );
                            metrics::record_commit_attempt("success");
                            return Ok(CommitSuccess {
                                commit_sha: commit.sha,
                                completed_at: Utc::now(),
                                attempt,
                            });
                        }
                        Err(RemoteError::Conflict(reason)) => {
                            conflicts += 1;
                            metrics::record_commit_attempt("conflict");
                            if conflicts >= self.policy.max_attempts {
                                tracing::error!(
                                    path = %request.path,
                                    attempts = conflicts,
                                    "Revision conflict persisted, giving up"
                                );
                                return Err(CommitError::ConflictExhausted {
                                    attempts: conflicts,
                                    last: reason,
                                });
                            }
                            tracing::info!(
                                path = %request.path,
                                attempt = conflicts,
                                max_attempts = self.policy.max_attempts,
                                "Revision conflict, retrying"
                            );
                            CommitState::Backoff
                        }
                        Err(e) => {
                            tracing::error!(path = %request.path, error = %e, "Write failed");
                            metrics::record_commit_attempt("write_failed");
                            return Err(CommitError::Write(e));
                        }
                    }
                }

                CommitState::Backoff => {
                    let delay = conflict_backoff(conflicts, self.policy.base_delay_ms);
                    self.delay.wait(delay).await;
                    CommitState::ReadRevision
                }
            };
        }
    }

    /// `Some` only when the remote's latest commit is newer than
    /// `last_saved_at` by more than the tolerance. Lookup failures are
    /// treated as "no signal".
    async fn stale_signal(&self, path: &str, last_saved_at: DateTime<Utc>) -> Option<StaleSignal> {
        let latest = match with_timeout(self.policy.call_timeout, self.remote.latest_commit(path)).await {
            Ok(Some(latest)) => latest,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Stale check unavailable, continuing");
                return None;
            }
        };

        if latest.committed_at - last_saved_at > self.policy.stale_tolerance {
            Some(StaleSignal {
                server_commit_time: latest.committed_at,
                server_commit_sha: latest.sha,
            })
        } else {
            None
        }
    }
}

/// Commit message carrying the save time in ISO-8601.
pub fn commit_message(at: DateTime<Utc>) -> String {
    format!(
        "Update content via save handler - {}",
        at.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}
