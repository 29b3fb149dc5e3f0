//! Remote content repository access.
//!
//! # Data Flow
//! ```text
//! commit orchestrator
//!     → RemoteRepository (types.rs, the seam tests replace)
//!     → GitHubClient (github.rs, contents + commits REST endpoints)
//! ```
//!
//! # Design Decisions
//! - The orchestrator only sees three operations: read revision, latest
//!   commit, write file
//! - "Not found" on read is data (`None`), not an error
//! - Revision mismatch on write is its own error variant so it can be retried

pub mod github;
pub mod types;

pub use github::GitHubClient;
pub use types::{
    CommitInfo, CommitRef, FileWrite, RemoteError, RemoteRepository, RemoteResult, RevisionToken,
};
