//! Soft deadlines for source calls.
//!
//! [`with_deadline`] stops *waiting* for an operation once its deadline
//! passes, but never cancels it: the operation runs on its own task and is
//! left to finish in the background, its result dropped.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Why a deadline-bounded operation produced no result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeadlineError {
    /// The deadline passed first. The operation is still running.
    #[error("Operation timed out after {deadline_ms}ms")]
    Elapsed { deadline_ms: u64 },

    /// The operation's task panicked or was cancelled by the runtime.
    #[error("Operation failed: {0}")]
    TaskFailed(String),
}

impl DeadlineError {
    pub fn is_elapsed(&self) -> bool {
        matches!(self, DeadlineError::Elapsed { .. })
    }
}

/// Race `operation` against `deadline`.
///
/// The operation is spawned onto the runtime, so it keeps running after the
/// deadline. Callers bound that leftover work with their own hard limits
/// (the HTTP client timeout, for sources).
pub async fn with_deadline<F>(operation: F, deadline: Duration) -> Result<F::Output, DeadlineError>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let handle = tokio::spawn(operation);

    tokio::select! {
        biased;

        joined = handle => joined.map_err(|e| DeadlineError::TaskFailed(e.to_string())),
        _ = tokio::time::sleep(deadline) => Err(DeadlineError::Elapsed {
            deadline_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::time::{sleep, Instant};
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_completes_before_deadline() {
        let value = assert_ok!(with_deadline(async { 42 }, Duration::from_millis(200)).await);
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_elapsed_returns_promptly() {
        let start = Instant::now();
        let result = with_deadline(
            async {
                sleep(Duration::from_secs(5)).await;
                "late"
            },
            Duration::from_millis(50),
        )
        .await;

        assert_eq!(result, Err(DeadlineError::Elapsed { deadline_ms: 50 }));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_operation_keeps_running_after_deadline() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        let result = with_deadline(
            async move {
                sleep(Duration::from_millis(100)).await;
                flag.store(true, Ordering::SeqCst);
            },
            Duration::from_millis(10),
        )
        .await;
        assert!(assert_err!(result).is_elapsed());
        assert!(!finished.load(Ordering::SeqCst));

        // Not cancelled: the task completes on its own
        sleep(Duration::from_millis(300)).await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_panicking_operation_is_task_failure() {
        let result = with_deadline(
            async {
                panic!("boom");
            },
            Duration::from_millis(500),
        )
        .await;

        let err: DeadlineError = assert_err!(result);
        assert!(matches!(err, DeadlineError::TaskFailed(_)));
    }
}
