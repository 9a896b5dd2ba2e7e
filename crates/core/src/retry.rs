//! Bounded retry with exponential backoff for upstream calls.
//!
//! The policy is applied by decorators around the service clients, never
//! inside pipeline control flow. The default policy makes a single attempt.

use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Retry settings for calls to external services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one (values below 1 act as 1)
    #[serde(rename = "maxAttempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry; doubled for every following retry
    #[serde(rename = "initialBackoffMs", default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    1
}

fn default_initial_backoff_ms() -> u64 {
    200
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff_ms: u64) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms,
        }
    }

    /// Whether this policy ever retries.
    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 1
    }

    /// Backoff schedule for the retries after the first attempt.
    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(self.initial_backoff_ms))
            .with_factor(2.0)
            .with_max_times(self.max_attempts.max(1) as usize - 1)
    }

    /// Run `operation`, retrying upstream failures until the attempts run out.
    ///
    /// Non-upstream errors (configuration, prompt, input) are returned
    /// immediately since repeating the call cannot fix them.
    pub async fn run<T, F, Fut>(&self, name: &str, operation: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let max_attempts = self.max_attempts.max(1);

        operation
            .retry(self.backoff())
            .when(AppError::is_upstream)
            .notify(|e: &AppError, delay: Duration| {
                tracing::warn!(
                    operation = name,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Upstream call failed, retrying"
                );
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_default_is_single_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 1);
        assert!(!policy.is_enabled());
    }

    #[tokio::test]
    async fn test_zero_attempts_acts_as_one() {
        let policy = RetryPolicy::new(0, 1);
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: AppResult<()> = policy
            .run("test", || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(AppError::Llm("down".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let policy = RetryPolicy::new(3, 1);
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result = policy
            .run("test", || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(AppError::Llm("transient".to_string()))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let policy = RetryPolicy::new(2, 1);
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: AppResult<()> = policy
            .run("test", || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(AppError::Embedding("down".to_string()))
            })
            .await;

        assert!(matches!(result, Err(AppError::Embedding(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_config_errors_are_not_retried() {
        let policy = RetryPolicy::new(5, 1);
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: AppResult<()> = policy
            .run("test", || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(AppError::Config("missing key".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_deserialize_camel_case() {
        let policy: RetryPolicy =
            serde_yaml::from_str("maxAttempts: 3\ninitialBackoffMs: 50").unwrap();
        assert_eq!(policy, RetryPolicy::new(3, 50));
    }
}
