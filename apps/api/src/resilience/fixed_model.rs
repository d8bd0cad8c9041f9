//! Fixed-Model Retrier: used for long-form portfolio generation.
//!
//! One model, up to `max_retries` calls (attempts numbered from 1):
//! - HTTP 503 with attempts left: wait `2^attempt` seconds and retry.
//! - Network failure with attempts left: wait `attempt` seconds and retry.
//! - Any other HTTP error: fail immediately.

use anyhow::{ensure, Result};
use tracing::{debug, warn};

use crate::llm_client::{GenerateContentRequest, GenerateContentResponse, LlmError, TextGenerator};
use crate::resilience::backoff;
use crate::resilience::{classify, Attempted, RetryError};

pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct FixedModelRetrier {
    model: String,
    max_retries: u32,
}

impl FixedModelRetrier {
    pub fn new(model: impl Into<String>, max_retries: u32) -> Result<Self> {
        ensure!(max_retries > 0, "max_retries must be at least 1");
        Ok(Self {
            model: model.into(),
            max_retries,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the parsed response body. Extracting the text (and treating a
    /// missing text as blocked content) is the caller's job.
    pub async fn run(
        &self,
        generator: &dyn TextGenerator,
        request: &GenerateContentRequest,
    ) -> Result<Attempted<GenerateContentResponse>, RetryError> {
        let mut attempt = 1u32;
        loop {
            debug!(model = %self.model, attempt, max_retries = self.max_retries, "Calling model");

            let err = match generator.generate_content(&self.model, request).await {
                Ok(value) => {
                    return Ok(Attempted {
                        value,
                        model: self.model.clone(),
                        attempts: attempt,
                    })
                }
                Err(err) => err,
            };

            let class = classify(&err);
            let attempts_left = attempt < self.max_retries;
            warn!(model = %self.model, attempt, ?class, "Gemini API error: {err}");

            let overloaded = err.status() == Some(503);
            let network = matches!(err, LlmError::Network(_));

            if !overloaded && !network {
                return Err(RetryError::Fatal {
                    attempt,
                    class,
                    source: err,
                });
            }
            if !attempts_left {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    class,
                    source: err,
                });
            }

            let delay = if overloaded {
                backoff::overload(attempt)
            } else {
                backoff::linear(attempt)
            };

            warn!("Retrying in {}ms...", delay.as_millis());
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;
    use crate::llm_client::GenerationConfig;
    use crate::resilience::testing::{api_error, network_error, ScriptedGenerator};
    use crate::resilience::FailureClass;

    fn request() -> GenerateContentRequest {
        GenerateContentRequest::from_prompt("portfolio please", GenerationConfig::portfolio())
    }

    fn retrier() -> FixedModelRetrier {
        FixedModelRetrier::new("gemini-1.5-flash-latest", DEFAULT_MAX_RETRIES).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_overloaded_three_times_waits_two_then_four_seconds() {
        let generator = ScriptedGenerator::new(vec![
            Err(api_error(503, "The model is overloaded. Please try again later.")),
            Err(api_error(503, "The model is overloaded. Please try again later.")),
            Err(api_error(503, "The model is overloaded. Please try again later.")),
        ]);

        let start = Instant::now();
        let err = retrier().run(&generator, &request()).await.unwrap_err();

        assert_eq!(start.elapsed(), Duration::from_secs(2 + 4));
        assert_eq!(generator.calls().len(), 3);
        assert!(err.is_exhausted());
        assert_eq!(err.attempts(), 3);
        assert_eq!(err.class(), FailureClass::Overloaded);
        assert_eq!(
            err.last_error().message(),
            "The model is overloaded. Please try again later."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_overload() {
        let generator = ScriptedGenerator::new(vec![
            Err(api_error(503, "overloaded")),
            Ok(GenerateContentResponse::from_text("Behold, the portfolio")),
        ]);

        let start = Instant::now();
        let result = retrier().run(&generator, &request()).await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_secs(2));
        assert_eq!(result.value.text(), Some("Behold, the portfolio"));
        assert_eq!(result.attempts, 2);
        assert_eq!(
            generator.calls(),
            vec!["gemini-1.5-flash-latest", "gemini-1.5-flash-latest"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_http_errors_fail_immediately() {
        let generator = ScriptedGenerator::new(vec![
            Err(api_error(429, "Resource has been exhausted")),
            Ok(GenerateContentResponse::from_text("never reached")),
        ]);

        let start = Instant::now();
        let err = retrier().run(&generator, &request()).await.unwrap_err();

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(generator.calls().len(), 1);
        assert!(!err.is_exhausted());
        assert_eq!(err.class(), FailureClass::RateLimited);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_errors_back_off_linearly() {
        let generator = ScriptedGenerator::new(vec![
            Err(network_error()),
            Err(network_error()),
            Ok(GenerateContentResponse::from_text("finally")),
        ]);

        let start = Instant::now();
        let result = retrier().run(&generator, &request()).await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_secs(1 + 2));
        assert_eq!(result.attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_error_on_last_attempt_is_reraised() {
        let generator = ScriptedGenerator::new(vec![
            Err(network_error()),
            Err(network_error()),
            Err(network_error()),
        ]);

        let err = retrier().run(&generator, &request()).await.unwrap_err();

        assert!(err.is_exhausted());
        assert_eq!(err.class(), FailureClass::Network);
        assert!(matches!(err.last_error(), LlmError::Network(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_retry_budget_never_sleeps() {
        let generator = ScriptedGenerator::new(vec![Err(api_error(503, "overloaded"))]);
        let retrier = FixedModelRetrier::new("m", 1).unwrap();

        let start = Instant::now();
        let err = retrier.run(&generator, &request()).await.unwrap_err();

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(err.attempts(), 1);
    }

    #[test]
    fn test_rejects_zero_retries() {
        assert!(FixedModelRetrier::new("m", 0).is_err());
    }
}
