//! Retry orchestration around the Gemini client.
//!
//! `classify` turns an `LlmError` into a `FailureClass`; the two retriers
//! decide what to do with it. Neither retrier holds state between calls:
//! the model cursor and attempt index live on the stack of a single `run`.

pub mod backoff;
pub mod fixed_model;
pub mod model_switching;

use serde::Serialize;
use thiserror::Error;

use crate::llm_client::LlmError;

pub use fixed_model::FixedModelRetrier;
pub use model_switching::ModelSwitchingRetrier;

/// What kind of failure an upstream call produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// 503 or an "overloaded" message. The only class that switches models.
    Overloaded,
    /// 429.
    RateLimited,
    /// 500.
    ServerError,
    /// No HTTP response at all (connect/reset/timeout).
    Network,
    /// 401/403 or a rejected API key.
    Unauthorized,
    /// A response arrived but carried no generated text.
    Blocked,
    /// Malformed request or anything else the upstream refused.
    Rejected,
}

impl FailureClass {
    /// Overload, rate limiting and generic server errors clear on their own.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            FailureClass::Overloaded | FailureClass::RateLimited | FailureClass::ServerError
        )
    }

    pub fn is_overload(self) -> bool {
        matches!(self, FailureClass::Overloaded | FailureClass::RateLimited)
    }
}

/// Classifies an upstream failure.
///
/// Structured signals win: the HTTP status first, then Gemini's symbolic
/// `error.status`. The message is only inspected when neither decides;
/// Gemini reports a bad key as a plain 400 `INVALID_ARGUMENT`, for example.
pub fn classify(err: &LlmError) -> FailureClass {
    match err {
        LlmError::EmptyContent => FailureClass::Blocked,
        LlmError::Parse(_) => FailureClass::Rejected,
        LlmError::Network(_) => classify_message(&err.message()).unwrap_or(FailureClass::Network),
        LlmError::Api { status, message, .. } => match status {
            503 => FailureClass::Overloaded,
            429 => FailureClass::RateLimited,
            500 => FailureClass::ServerError,
            401 | 403 => FailureClass::Unauthorized,
            _ => err
                .reason()
                .and_then(classify_reason)
                .or_else(|| classify_message(message))
                .unwrap_or(FailureClass::Rejected),
        },
    }
}

/// Gemini's symbolic `error.status`, used when the HTTP code is not decisive.
fn classify_reason(reason: &str) -> Option<FailureClass> {
    match reason {
        "UNAVAILABLE" => Some(FailureClass::Overloaded),
        "RESOURCE_EXHAUSTED" => Some(FailureClass::RateLimited),
        "INTERNAL" => Some(FailureClass::ServerError),
        "UNAUTHENTICATED" | "PERMISSION_DENIED" => Some(FailureClass::Unauthorized),
        _ => None,
    }
}

fn classify_message(message: &str) -> Option<FailureClass> {
    let lower = message.to_ascii_lowercase();
    if lower.contains("overloaded") || message.contains("503") {
        Some(FailureClass::Overloaded)
    } else if message.contains("429") {
        Some(FailureClass::RateLimited)
    } else if message.contains("500") {
        Some(FailureClass::ServerError)
    } else if lower.contains("api key") {
        Some(FailureClass::Unauthorized)
    } else {
        None
    }
}

/// A successful run: the payload plus which model produced it and how many
/// calls it took.
#[derive(Debug)]
pub struct Attempted<T> {
    pub value: T,
    pub model: String,
    pub attempts: u32,
}

/// Terminal failure of a retrier.
#[derive(Debug, Error)]
pub enum RetryError {
    /// A non-retryable failure; raised on the attempt it happened.
    #[error("non-retryable {class:?} failure on attempt {attempt}: {source}")]
    Fatal {
        attempt: u32,
        class: FailureClass,
        #[source]
        source: LlmError,
    },

    /// Every allowed attempt failed with a retryable error.
    #[error("retries exhausted after {attempts} attempts ({class:?}): {source}")]
    Exhausted {
        attempts: u32,
        class: FailureClass,
        #[source]
        source: LlmError,
    },
}

impl RetryError {
    /// The upstream call succeeded but carried no text to use.
    pub fn content_missing(attempt: u32) -> Self {
        RetryError::Fatal {
            attempt,
            class: FailureClass::Blocked,
            source: LlmError::EmptyContent,
        }
    }

    pub fn class(&self) -> FailureClass {
        match self {
            RetryError::Fatal { class, .. } | RetryError::Exhausted { class, .. } => *class,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Fatal { attempt, .. } => *attempt,
            RetryError::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }

    /// The last underlying upstream failure.
    pub fn last_error(&self) -> &LlmError {
        match self {
            RetryError::Fatal { source, .. } | RetryError::Exhausted { source, .. } => source,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{api_error, api_error_with_reason, network_error};
    use super::*;

    #[test]
    fn test_status_codes_win_over_message() {
        assert_eq!(classify(&api_error(503, "whatever")), FailureClass::Overloaded);
        assert_eq!(classify(&api_error(429, "quota")), FailureClass::RateLimited);
        assert_eq!(classify(&api_error(500, "internal")), FailureClass::ServerError);
        assert_eq!(classify(&api_error(401, "overloaded")), FailureClass::Unauthorized);
        assert_eq!(classify(&api_error(403, "denied")), FailureClass::Unauthorized);
    }

    #[test]
    fn test_message_inspected_for_unrecognised_status() {
        assert_eq!(
            classify(&api_error(400, "API key not valid. Please pass a valid API key.")),
            FailureClass::Unauthorized
        );
        assert_eq!(
            classify(&api_error(502, "The model is overloaded. Please try again later.")),
            FailureClass::Overloaded
        );
        assert_eq!(
            classify(&api_error(400, "Invalid JSON payload")),
            FailureClass::Rejected
        );
    }

    #[test]
    fn test_gemini_status_beats_message_for_unrecognised_code() {
        assert_eq!(
            classify(&api_error_with_reason(502, "UNAVAILABLE", "Bad gateway")),
            FailureClass::Overloaded
        );
        assert_eq!(
            classify(&api_error_with_reason(400, "RESOURCE_EXHAUSTED", "API key quota used up")),
            FailureClass::RateLimited
        );
        assert_eq!(
            classify(&api_error_with_reason(400, "INVALID_ARGUMENT", "API key not valid.")),
            FailureClass::Unauthorized
        );
        // The HTTP status still decides first.
        assert_eq!(
            classify(&api_error_with_reason(429, "UNAVAILABLE", "slow down")),
            FailureClass::RateLimited
        );
    }

    #[test]
    fn test_network_and_content_failures() {
        assert_eq!(classify(&network_error()), FailureClass::Network);
        assert_eq!(
            classify(&LlmError::Network("upstream said 503".into())),
            FailureClass::Overloaded
        );
        assert_eq!(classify(&LlmError::EmptyContent), FailureClass::Blocked);
    }

    #[test]
    fn test_transient_classes() {
        assert!(FailureClass::Overloaded.is_transient());
        assert!(FailureClass::RateLimited.is_transient());
        assert!(FailureClass::ServerError.is_transient());
        assert!(!FailureClass::Network.is_transient());
        assert!(!FailureClass::Unauthorized.is_transient());
        assert!(!FailureClass::Blocked.is_transient());
        assert!(!FailureClass::Rejected.is_transient());
    }

    #[test]
    fn test_content_missing_is_fatal_blocked() {
        let err = RetryError::content_missing(2);
        assert_eq!(err.class(), FailureClass::Blocked);
        assert_eq!(err.attempts(), 2);
        assert!(!err.is_exhausted());
        assert!(matches!(err.last_error(), LlmError::EmptyContent));
    }
}
