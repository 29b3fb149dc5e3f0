//! Conflict backoff and the delay seam.

use std::time::Duration;

use async_trait::async_trait;

/// Delay before retrying after the `attempt`-th conflict (1-based):
/// `base_ms * attempt`.
pub fn conflict_backoff(attempt: u32, base_ms: u64) -> Duration {
    Duration::from_millis(base_ms.saturating_mul(u64::from(attempt)))
}

/// Something that can wait. Production uses the tokio timer; tests record
/// the requested durations instead of sleeping.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn wait(&self, duration: Duration);
}

/// [`Delay`] backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
