//! Retry wrapper for `LlmPort`, grounded on the teacher's
//! `infrastructure/resilient_llm.rs`. Wraps any implementation with bounded
//! exponential-backoff retry; itself implements `LlmPort`, so callers
//! cannot tell retry is active.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::port::{CompletionOptions, LlmCallError, LlmPort};
use crate::config::RetryConfig;

pub struct ResilientLlmClient {
    inner: Arc<dyn LlmPort>,
    config: RetryConfig,
}

impl ResilientLlmClient {
    pub fn new(inner: Arc<dyn LlmPort>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    fn calculate_delay(&self, attempt: u32) -> std::time::Duration {
        let base = self.config.base_delay_ms as f64 * 2f64.powi(attempt as i32);
        let capped = base.min(self.config.max_delay_ms as f64);
        let jitter = capped * self.config.jitter_factor * rand::random::<f64>();
        std::time::Duration::from_millis((capped + jitter) as u64)
    }

    fn is_retryable(error: &LlmCallError) -> bool {
        match error {
            LlmCallError::RequestFailed(msg) => {
                let lower = msg.to_lowercase();
                !(lower.contains("401")
                    || lower.contains("403")
                    || lower.contains("400")
                    || lower.contains("invalid"))
            }
            LlmCallError::InvalidResponse(_) => true,
        }
    }

    async fn execute_with_retry<F, Fut>(&self, mut op: F) -> Result<String, LlmCallError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<String, LlmCallError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(text) => return Ok(text),
                Err(err) if attempt < self.config.max_retries && Self::is_retryable(&err) => {
                    warn!(attempt, error = %err, "retrying llm call after transient failure");
                    tokio::time::sleep(self.calculate_delay(attempt)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl LlmPort for ResilientLlmClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: CompletionOptions,
    ) -> Result<String, LlmCallError> {
        self.execute_with_retry(|| self.inner.complete(system_prompt, user_prompt, options.clone()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    struct FailingMockLlm {
        failures_before_success: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl LlmPort for FailingMockLlm {
        async fn complete(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
            _options: CompletionOptions,
        ) -> Result<String, LlmCallError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                Err(LlmCallError::RequestFailed("timeout".to_string()))
            } else {
                Ok("ok".to_string())
            }
        }
    }

    fn fast_retry_config() -> RetryConfig {
        RetryConfig {
            max_retries: 3,
            base_delay_ms: 1,
            max_delay_ms: 2,
            jitter_factor: 0.0,
        }
    }

    #[tokio::test]
    async fn retries_transient_failures_until_success() {
        let inner = Arc::new(FailingMockLlm {
            failures_before_success: 2,
            calls: AtomicU32::new(0),
        });
        let client = ResilientLlmClient::new(inner, fast_retry_config());
        let result = client
            .complete("sys", "user", CompletionOptions::default())
            .await;
        assert_eq!(result.unwrap(), "ok");
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let inner = Arc::new(FailingMockLlm {
            failures_before_success: 100,
            calls: AtomicU32::new(0),
        });
        let client = ResilientLlmClient::new(inner, fast_retry_config());
        let result = client
            .complete("sys", "user", CompletionOptions::default())
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn auth_failures_are_not_retryable() {
        let err = LlmCallError::RequestFailed("401 Unauthorized".to_string());
        assert!(!ResilientLlmClient::is_retryable(&err));
    }

    #[test]
    fn invalid_response_is_always_retryable() {
        let err = LlmCallError::InvalidResponse("empty body".to_string());
        assert!(ResilientLlmClient::is_retryable(&err));
    }
}
