//! Retry decorator for completion clients.

use crate::client::{LlmClient, LlmRequest, LlmResponse};
use docchat_core::{AppResult, RetryPolicy};
use std::sync::Arc;

/// Wraps a client and retries failed completions according to a policy.
pub struct RetryingLlmClient {
    inner: Arc<dyn LlmClient>,
    policy: RetryPolicy,
}

impl RetryingLlmClient {
    pub fn new(inner: Arc<dyn LlmClient>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait::async_trait]
impl LlmClient for RetryingLlmClient {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.policy
            .run("llm.complete", || self.inner.complete(request))
            .await
    }
}

/// Decorate `client` with retries, or return it untouched for a single-attempt policy.
pub fn with_retry(client: Arc<dyn LlmClient>, policy: RetryPolicy) -> Arc<dyn LlmClient> {
    if policy.is_enabled() {
        Arc::new(RetryingLlmClient::new(client, policy))
    } else {
        client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::LlmUsage;
    use docchat_core::AppError;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyClient {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait::async_trait]
    impl LlmClient for FlakyClient {
        fn provider_name(&self) -> &str {
            "flaky"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                return Err(AppError::Llm("503 Service Unavailable".to_string()));
            }
            Ok(LlmResponse {
                content: format!("echo: {}", request.prompt),
                model: request.model.clone(),
                usage: LlmUsage::default(),
            })
        }
    }

    fn flaky(failures: u32) -> Arc<FlakyClient> {
        Arc::new(FlakyClient {
            failures,
            calls: AtomicU32::new(0),
        })
    }

    #[tokio::test]
    async fn test_retrying_client_recovers() {
        let inner = flaky(2);
        let client = RetryingLlmClient::new(inner.clone(), RetryPolicy::new(3, 1));

        let response = client
            .complete(&LlmRequest::new("ping", "m"))
            .await
            .unwrap();

        assert_eq!(response.content, "echo: ping");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
        assert_eq!(client.provider_name(), "flaky");
    }

    #[tokio::test]
    async fn test_single_attempt_policy_is_not_wrapped() {
        let inner = flaky(1);
        let client = with_retry(inner.clone(), RetryPolicy::default());

        assert!(client.complete(&LlmRequest::new("ping", "m")).await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }
}
