//! Save pipeline.
//!
//! # Data Flow
//! ```text
//! POST body
//!     → validator.rs (fields, size, blank content, timestamps)
//!     → [password check in the handler]
//!     → orchestrator.rs (read revision → stale check → write → retry)
//!         → encoding.rs (chunked base64 of the UTF-8 bytes)
//! ```

pub mod encoding;
pub mod orchestrator;
pub mod validator;

pub use orchestrator::{
    CommitError, CommitOrchestrator, CommitPolicy, CommitRequest, CommitSuccess, StaleSignal,
};
pub use validator::{ContentValidator, SaveRequest, ValidatedSave, ValidationError};
