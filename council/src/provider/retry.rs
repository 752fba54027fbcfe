//! Retry decorator for the invocation boundary.
//!
//! The debate engine itself never retries; wrapping an invoker here is the
//! only place a failed call gets another attempt.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::ModelInvoker;
use crate::debate::context::ContextEntry;
use crate::error::InvocationFailure;

/// How many extra attempts to make, and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first; 0 disables retries.
    pub max_retries: u32,
    /// Delay between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::from_millis(500),
        }
    }
}

/// Retries transient failures of the wrapped invoker.
pub struct RetryingInvoker<I> {
    inner: I,
    policy: RetryPolicy,
}

impl<I: ModelInvoker> RetryingInvoker<I> {
    pub fn new(inner: I, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<I: ModelInvoker> ModelInvoker for RetryingInvoker<I> {
    async fn invoke(
        &self,
        model_id: &str,
        context: &[ContextEntry],
    ) -> Result<String, InvocationFailure> {
        let mut attempt = 0;
        loop {
            match self.inner.invoke(model_id, context).await {
                Ok(text) => {
                    if attempt > 0 {
                        debug!(
                            model = model_id,
                            attempt = attempt + 1,
                            "Invocation succeeded after retry"
                        );
                    }
                    return Ok(text);
                }
                Err(failure) if failure.is_transient() && attempt < self.policy.max_retries => {
                    attempt += 1;
                    warn!(
                        model = model_id,
                        attempt,
                        max_retries = self.policy.max_retries,
                        "Transient invocation failure, retrying: {}",
                        failure
                    );
                    tokio::time::sleep(self.policy.backoff).await;
                }
                Err(failure) => return Err(failure),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockModelInvoker;

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let mut mock = MockModelInvoker::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_invoke()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(InvocationFailure::Transport("reset".into())));
        mock.expect_invoke()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok("fine".into()));

        let invoker = RetryingInvoker::new(mock, policy(2));
        let text = invoker.invoke("m", &[]).await.unwrap();
        assert_eq!(text, "fine");
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried() {
        let mut mock = MockModelInvoker::new();
        mock.expect_invoke().times(1).returning(|_, _| {
            Err(InvocationFailure::Status {
                status: 404,
                body: "model not found".into(),
            })
        });

        let invoker = RetryingInvoker::new(mock, policy(3));
        let err = invoker.invoke("m", &[]).await.unwrap_err();
        assert!(matches!(err, InvocationFailure::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let mut mock = MockModelInvoker::new();
        mock.expect_invoke()
            .times(3)
            .returning(|_, _| Err(InvocationFailure::Timeout(Duration::from_secs(1))));

        let invoker = RetryingInvoker::new(mock, policy(2));
        let err = invoker.invoke("m", &[]).await.unwrap_err();
        assert!(matches!(err, InvocationFailure::Timeout(_)));
    }

    #[tokio::test]
    async fn test_default_policy_is_single_attempt() {
        let mut mock = MockModelInvoker::new();
        mock.expect_invoke()
            .times(1)
            .returning(|_, _| Err(InvocationFailure::Transport("down".into())));

        let invoker = RetryingInvoker::new(mock, RetryPolicy::default());
        assert!(invoker.invoke("m", &[]).await.is_err());
    }
}
