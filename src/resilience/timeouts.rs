//! Timeout enforcement.
//!
//! # Responsibilities
//! - Hold the per-phase deadline policy (evaluate, endorse, submit, commit)
//! - Wrap ledger calls with a hard local deadline
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the in-flight future is dropped on expiry
//! - Expiry is reported as a distinct error so callers can map it per phase
//! - Remote cancellation is best-effort only (grpc-timeout header)

use std::future::Future;
use std::time::Duration;

use crate::config::DeadlineConfig;

/// Independent deadlines for each transaction phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlinePolicy {
    pub evaluate: Duration,
    pub endorse: Duration,
    pub submit: Duration,
    pub commit_status: Duration,
}

impl Default for DeadlinePolicy {
    fn default() -> Self {
        Self::from(&DeadlineConfig::default())
    }
}

impl From<&DeadlineConfig> for DeadlinePolicy {
    fn from(config: &DeadlineConfig) -> Self {
        Self {
            evaluate: Duration::from_millis(config.evaluate_ms),
            endorse: Duration::from_millis(config.endorse_ms),
            submit: Duration::from_millis(config.submit_ms),
            commit_status: Duration::from_millis(config.commit_ms),
        }
    }
}

/// A deadline expired before the wrapped operation completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineExceeded(pub Duration);

impl std::fmt::Display for DeadlineExceeded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "deadline of {}ms exceeded", self.0.as_millis())
    }
}

impl std::error::Error for DeadlineExceeded {}

/// Run `fut` to completion or until `limit` elapses.
pub async fn with_deadline<F>(limit: Duration, fut: F) -> Result<F::Output, DeadlineExceeded>
where
    F: Future,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| DeadlineExceeded(limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_default_policy() {
        let policy = DeadlinePolicy::default();
        assert_eq!(policy.evaluate, Duration::from_secs(10));
        assert_eq!(policy.endorse, Duration::from_secs(20));
        assert_eq!(policy.submit, Duration::from_secs(10));
        assert_eq!(policy.commit_status, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_completes_within_deadline() {
        let result = with_deadline(Duration::from_secs(1), async { 42 }).await;
        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn test_expires_promptly() {
        let start = Instant::now();
        let result = with_deadline(
            Duration::from_millis(1),
            tokio::time::sleep(Duration::from_secs(10)),
        )
        .await;
        assert_eq!(result, Err(DeadlineExceeded(Duration::from_millis(1))));
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
