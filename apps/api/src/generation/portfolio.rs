//! Portfolio generation: orchestrates the fixed-model retrier and falls
//! back to a starter portfolio built from the profile.
//!
//! Flow: build prompt → retrier (single model) → extract text → parse
//! sections. A retrier failure or a response without text yields the
//! fallback portfolio with a warning instead of an error.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::generation::fallback::fallback_portfolio;
use crate::generation::outcome::{portfolio_warning, GenerationMethod};
use crate::generation::prompts::build_portfolio_prompt;
use crate::generation::sections::{parse_sections, PortfolioSections};
use crate::llm_client::{GenerateContentRequest, GenerationConfig, TextGenerator};
use crate::models::profile::UserProfile;
use crate::resilience::{Attempted, FixedModelRetrier, RetryError};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioOutcome {
    pub portfolio: String,
    pub sections: PortfolioSections,
    pub method: GenerationMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
    pub generated_at: DateTime<Utc>,
}

/// Generates a portfolio for `profile`. Never fails.
pub async fn generate_portfolio(
    generator: &dyn TextGenerator,
    retrier: &FixedModelRetrier,
    profile: &UserProfile,
) -> PortfolioOutcome {
    let request = GenerateContentRequest::from_prompt(
        &build_portfolio_prompt(profile),
        GenerationConfig::portfolio(),
    );

    let (portfolio, method, model, warning) =
        match request_portfolio(generator, retrier, &request).await {
            Ok(attempted) => {
                info!(
                    name = %profile.name,
                    model = %attempted.model,
                    attempts = attempted.attempts,
                    chars = attempted.value.len(),
                    "Portfolio generated with AI"
                );
                (
                    attempted.value,
                    GenerationMethod::AiGenerated,
                    Some(attempted.model),
                    None,
                )
            }
            Err(err) => {
                warn!(
                    name = %profile.name,
                    class = ?err.class(),
                    attempts = err.attempts(),
                    exhausted = err.is_exhausted(),
                    upstream = %err.last_error(),
                    "AI portfolio generation failed, using fallback"
                );
                (
                    fallback_portfolio(profile),
                    GenerationMethod::Fallback,
                    None,
                    Some(portfolio_warning(err.class())),
                )
            }
        };

    PortfolioOutcome {
        sections: parse_sections(&portfolio),
        portfolio,
        method,
        model,
        warning,
        generated_at: Utc::now(),
    }
}

/// Runs the retrier and pulls out the generated text. A response without
/// text is a non-retryable content-missing failure.
async fn request_portfolio(
    generator: &dyn TextGenerator,
    retrier: &FixedModelRetrier,
    request: &GenerateContentRequest,
) -> Result<Attempted<String>, RetryError> {
    let attempted = retrier.run(generator, request).await?;

    match attempted.value.text().filter(|t| !t.trim().is_empty()) {
        Some(text) => Ok(Attempted {
            value: text.to_string(),
            model: attempted.model,
            attempts: attempted.attempts,
        }),
        None => {
            warn!(
                finish_reason = attempted.value.finish_reason().unwrap_or("none"),
                "Gemini returned no portfolio text"
            );
            Err(RetryError::content_missing(attempted.attempts))
        }
    }
}
