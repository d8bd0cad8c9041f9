/// LLM Client: the single point of entry for all Gemini API calls.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// Everything upstream goes through the `TextGenerator` trait, which
/// `GeminiClient` implements and tests replace with scripted generators.
///
/// A `GeminiClient` call is a single shot. Retry policy lives in `resilience`.
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

pub mod types;

pub use types::{GenerateContentRequest, GenerateContentResponse, GenerationConfig};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT_SECS: u64 = 120;
/// Substituted when an error body is not valid JSON.
const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// `reason` is the envelope's `error.status`, e.g. `UNAVAILABLE`.
    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        reason: Option<String>,
        message: String,
    },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned no content (the response may have been filtered by safety settings)")]
    EmptyContent,
}

impl LlmError {
    /// HTTP status of the upstream response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Gemini's symbolic status (`UNAVAILABLE`, `RESOURCE_EXHAUSTED`, ...).
    pub fn reason(&self) -> Option<&str> {
        match self {
            LlmError::Api { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            LlmError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Network(Box::new(err))
    }
}

/// Anything that can run a `generateContent` call against a named model.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, LlmError>;
}

/// Gemini `generateContent` client. Holds the API key; cheap to clone.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>, api_key: String) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, LlmError> {
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let (message, reason) = parse_error_body(status, &body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                reason,
                message,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;

        debug!(
            model,
            candidates = parsed.candidates.len(),
            "Gemini call succeeded"
        );

        Ok(parsed)
    }
}

/// Extracts `error.message` and `error.status` from a Gemini error body.
///
/// Unparseable bodies become "Unknown error"; a parseable envelope without a
/// message falls back to the HTTP status line.
fn parse_error_body(status: StatusCode, body: &str) -> (String, Option<String>) {
    let Ok(envelope) = serde_json::from_str::<types::ErrorEnvelope>(body) else {
        return (UNKNOWN_ERROR_MESSAGE.to_string(), None);
    };
    let (message, reason) = match envelope.error {
        Some(error) => (error.message, error.status),
        None => (None, None),
    };
    let message = message.unwrap_or_else(|| {
        format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown status")
        )
    });
    (message, reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> GenerateContentRequest {
        GenerateContentRequest::from_prompt("Describe Naruto", GenerationConfig::avatar())
    }

    #[tokio::test]
    async fn test_sends_key_header_and_extracts_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "Spiky blond hair" }] },
                    "finishReason": "STOP"
                }]
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(server.uri(), "test-key".to_string()).unwrap();
        let response = client
            .generate_content("gemini-1.5-flash", &request())
            .await
            .unwrap();

        assert_eq!(response.text(), Some("Spiky blond hair"));
    }

    #[tokio::test]
    async fn test_maps_error_envelope_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "error": { "code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE" }
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(server.uri(), "k".to_string()).unwrap();
        let err = client
            .generate_content("gemini-1.5-pro", &request())
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(503));
        assert_eq!(err.reason(), Some("UNAVAILABLE"));
        assert_eq!(err.message(), "The model is overloaded.");
    }

    #[tokio::test]
    async fn test_unparseable_error_body_becomes_unknown_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = GeminiClient::new(server.uri(), "k".to_string()).unwrap();
        let err = client
            .generate_content("gemini-1.5-flash", &request())
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert_eq!(err.reason(), None);
        assert_eq!(err.message(), "Unknown error");
    }

    #[test]
    fn test_envelope_without_message_uses_status_line() {
        let (msg, reason) = parse_error_body(StatusCode::BAD_REQUEST, r#"{"error": {"code": 400}}"#);
        assert_eq!(msg, "HTTP 400: Bad Request");
        assert_eq!(reason, None);
    }

    #[tokio::test]
    async fn test_connection_failure_is_network_error() {
        // Bind then drop to get a local port nobody is listening on.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client = GeminiClient::new(format!("http://127.0.0.1:{port}"), "k".to_string()).unwrap();
        let err = client
            .generate_content("gemini-1.5-flash", &request())
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Network(_)));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = GeminiClient::new("http://localhost:1234/v1beta/", "k".to_string()).unwrap();
        assert_eq!(
            client.endpoint("gemini-1.5-flash"),
            "http://localhost:1234/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }
}
