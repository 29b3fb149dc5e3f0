//! Timeout enforcement for remote calls.
//!
//! Every outbound call is bounded. A call that misses its deadline surfaces
//! as [`RemoteError::Timeout`], which the orchestrator treats as fatal; it is
//! never mistaken for a revision conflict.

use std::future::Future;
use std::time::Duration;

use crate::remote::{RemoteError, RemoteResult};

/// Run `call` with a deadline.
pub async fn with_timeout<T, F>(deadline: Duration, call: F) -> RemoteResult<T>
where
    F: Future<Output = RemoteResult<T>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(RemoteError::Timeout(deadline)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out() {
        let result: RemoteResult<()> = with_timeout(Duration::from_secs(1), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(RemoteError::Timeout(d)) if d == Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let result = with_timeout(Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
