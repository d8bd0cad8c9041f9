//! Model-Switching Retrier: used for short avatar-description prompts.
//!
//! Walks an ordered list of models. An overloaded model is abandoned for the
//! next one in the list (wrapping); rate limits and generic 500s retry the
//! same model. Every retry waits `min(base * 2^i + jitter, 30s)`.

use std::future::Future;
use std::time::Duration;

use anyhow::{ensure, Result};
use tracing::{debug, info, warn};

use crate::llm_client::LlmError;
use crate::resilience::backoff;
use crate::resilience::{classify, Attempted, FailureClass, RetryError};

#[derive(Debug, Clone)]
pub struct ModelSwitchingRetrier {
    models: Vec<String>,
    max_attempts: u32,
    base_delay: Duration,
}

impl ModelSwitchingRetrier {
    pub fn new(models: Vec<String>, max_attempts: u32, base_delay: Duration) -> Result<Self> {
        ensure!(!models.is_empty(), "model-switching retrier needs at least one model");
        ensure!(max_attempts > 0, "max_attempts must be at least 1");

        Ok(Self {
            models,
            max_attempts,
            base_delay,
        })
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Runs `call` until it succeeds, fails non-retryably, or attempts run out.
    ///
    /// `call` receives the model to use for that attempt.
    pub async fn run<T, F, Fut>(&self, call: F) -> Result<Attempted<T>, RetryError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        self.run_with_jitter(call, backoff::random_jitter).await
    }

    pub(crate) async fn run_with_jitter<T, F, Fut, J>(
        &self,
        mut call: F,
        mut jitter: J,
    ) -> Result<Attempted<T>, RetryError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
        J: FnMut() -> Duration,
    {
        let mut cursor = 0usize;
        let mut attempt = 0u32;

        loop {
            let model = self.models[cursor % self.models.len()].clone();
            debug!(
                model = %model,
                attempt = attempt + 1,
                max_attempts = self.max_attempts,
                "Calling model"
            );

            let err = match call(model.clone()).await {
                Ok(value) => {
                    return Ok(Attempted {
                        value,
                        model,
                        attempts: attempt + 1,
                    })
                }
                Err(err) => err,
            };

            let class = classify(&err);
            if !class.is_transient() {
                warn!(model = %model, attempt = attempt + 1, ?class, "Non-retryable failure: {err}");
                return Err(RetryError::Fatal {
                    attempt: attempt + 1,
                    class,
                    source: err,
                });
            }

            if attempt + 1 >= self.max_attempts {
                warn!(model = %model, attempts = self.max_attempts, ?class, "Retries exhausted: {err}");
                return Err(RetryError::Exhausted {
                    attempts: self.max_attempts,
                    class,
                    source: err,
                });
            }

            if class == FailureClass::Overloaded {
                cursor = (cursor + 1) % self.models.len();
                info!(
                    from = %model,
                    to = %self.models[cursor],
                    "Model overloaded, switching"
                );
            }

            let delay = backoff::jittered(self.base_delay, attempt, jitter());
            warn!(
                model = %model,
                attempt = attempt + 1,
                ?class,
                "Upstream error, retrying in {}ms",
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;

            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::time::Instant;

    use super::*;
    use crate::resilience::testing::{api_error, network_error};

    fn retrier(models: &[&str], max_attempts: u32) -> ModelSwitchingRetrier {
        ModelSwitchingRetrier::new(
            models.iter().map(|m| m.to_string()).collect(),
            max_attempts,
            Duration::from_millis(1500),
        )
        .unwrap()
    }

    /// Builds a call closure that replays `script` and records each model used.
    fn scripted(
        script: Vec<Result<&'static str, LlmError>>,
    ) -> (
        Arc<Mutex<Vec<String>>>,
        impl FnMut(String) -> std::future::Ready<Result<&'static str, LlmError>>,
    ) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut script = script.into_iter();
        let record = Arc::clone(&seen);
        let call = move |model: String| {
            record.lock().unwrap().push(model);
            std::future::ready(
                script
                    .next()
                    .unwrap_or_else(|| Err(api_error(500, "script exhausted"))),
            )
        };
        (seen, call)
    }

    #[tokio::test(start_paused = true)]
    async fn test_overload_switches_model_and_wraps() {
        let (seen, call) = scripted(vec![
            Err(api_error(503, "The model is overloaded.")),
            Err(api_error(503, "The model is overloaded.")),
            Ok("a silver-haired swordsman"),
        ]);

        let result = retrier(&["m1", "m2"], 4).run(call).await.unwrap();

        assert_eq!(result.value, "a silver-haired swordsman");
        assert_eq!(result.model, "m1");
        assert_eq!(result.attempts, 3);
        assert_eq!(*seen.lock().unwrap(), vec!["m1", "m2", "m1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_and_server_error_keep_model() {
        let (seen, call) = scripted(vec![
            Err(api_error(429, "Resource has been exhausted")),
            Err(api_error(500, "Internal error")),
            Ok("ok"),
        ]);

        retrier(&["m1", "m2"], 4).run(call).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["m1", "m1", "m1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_stops_on_that_attempt() {
        let (seen, call) = scripted(vec![
            Err(api_error(503, "overloaded")),
            Err(api_error(400, "API key not valid")),
            Ok("never reached"),
        ]);

        let err = retrier(&["m1", "m2"], 4).run(call).await.unwrap_err();

        assert_eq!(seen.lock().unwrap().len(), 2);
        assert_eq!(err.attempts(), 2);
        assert_eq!(err.class(), FailureClass::Unauthorized);
        assert!(!err.is_exhausted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_failure_is_not_retried() {
        let (seen, call) = scripted(vec![Err(network_error()), Ok("never reached")]);

        let err = retrier(&["m1"], 4).run(call).await.unwrap_err();

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(err.class(), FailureClass::Network);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_after_exactly_max_attempts() {
        let (seen, call) = scripted(vec![
            Err(api_error(503, "overloaded")),
            Err(api_error(429, "slow down")),
            Err(api_error(500, "internal")),
            Err(api_error(503, "overloaded, last")),
            Ok("never reached"),
        ]);

        let err = retrier(&["m1", "m2"], 4).run(call).await.unwrap_err();

        assert_eq!(seen.lock().unwrap().len(), 4);
        assert!(err.is_exhausted());
        assert_eq!(err.attempts(), 4);
        assert_eq!(err.class(), FailureClass::Overloaded);
        assert_eq!(err.last_error().message(), "overloaded, last");
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_delay_matches_backoff_formula() {
        let (_, call) = scripted(vec![
            Err(api_error(503, "overloaded")),
            Err(api_error(429, "rate limited")),
            Err(api_error(500, "internal")),
            Ok("done"),
        ]);

        let start = Instant::now();
        retrier(&["m1", "m2"], 5).run(call).await.unwrap();
        let elapsed = start.elapsed();

        // 1.5s + 3s + 6s, plus up to 1s of jitter per wait.
        let deterministic = Duration::from_millis(1500 + 3000 + 6000);
        assert!(elapsed >= deterministic, "elapsed {elapsed:?}");
        assert!(
            elapsed < deterministic + Duration::from_millis(3 * backoff::JITTER_MS),
            "elapsed {elapsed:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_wait_uses_its_own_attempt_index() {
        let (_, call) = scripted(vec![
            Err(api_error(503, "overloaded")),
            Err(api_error(503, "overloaded")),
            Ok("done"),
        ]);

        let start = Instant::now();
        retrier(&["m1", "m2"], 4)
            .run_with_jitter(call, || Duration::from_millis(400))
            .await
            .unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(1900 + 3400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_final_attempt() {
        let (_, call) = scripted(vec![
            Err(api_error(503, "overloaded")),
            Err(api_error(503, "overloaded")),
        ]);

        let start = Instant::now();
        let err = retrier(&["m1"], 2)
            .run_with_jitter(call, || Duration::ZERO)
            .await
            .unwrap_err();

        assert!(err.is_exhausted());
        assert_eq!(start.elapsed(), Duration::from_millis(1500));
    }

    #[test]
    fn test_rejects_empty_models_and_zero_attempts() {
        assert!(ModelSwitchingRetrier::new(vec![], 3, Duration::from_secs(1)).is_err());
        assert!(
            ModelSwitchingRetrier::new(vec!["m1".to_string()], 0, Duration::from_secs(1)).is_err()
        );
    }
}
