//! Avatar generation: orchestrates the model-switching retrier and falls
//! back to a locally rendered avatar.
//!
//! Flow: build prompt → retrier (model list, jittered backoff) → shorten the
//! description → render SVG. Any retrier failure yields the fallback avatar
//! with a warning instead of an error.

use serde::Serialize;
use tracing::{info, warn};

use crate::generation::fallback::avatar_data_url;
use crate::generation::outcome::{avatar_warning, GenerationMethod};
use crate::generation::prompts::build_avatar_prompt;
use crate::llm_client::{GenerateContentRequest, GenerationConfig, LlmError, TextGenerator};
use crate::resilience::ModelSwitchingRetrier;

/// Characters of model output kept for the description.
const DESCRIPTION_CHARS: usize = 150;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarOutcome {
    pub avatar_url: String,
    pub description: String,
    pub method: GenerationMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
}

/// Generates an avatar for `character_name` in `anime_style`. Never fails.
pub async fn generate_avatar(
    generator: &dyn TextGenerator,
    retrier: &ModelSwitchingRetrier,
    prompt: &str,
    character_name: &str,
    anime_style: &str,
) -> AvatarOutcome {
    let request =
        GenerateContentRequest::from_prompt(&build_avatar_prompt(prompt), GenerationConfig::avatar());
    let request = &request;

    let result = retrier
        .run(|model| async move {
            let response = generator.generate_content(&model, request).await?;
            response
                .text()
                .filter(|t| !t.trim().is_empty())
                .map(str::to_owned)
                .ok_or(LlmError::EmptyContent)
        })
        .await;

    match result {
        Ok(attempted) => {
            info!(
                character = character_name,
                style = anime_style,
                model = %attempted.model,
                attempts = attempted.attempts,
                "Avatar generated with AI"
            );
            AvatarOutcome {
                avatar_url: avatar_data_url(character_name, anime_style),
                description: shorten_description(&attempted.value),
                method: GenerationMethod::AiGenerated,
                model: Some(attempted.model),
                warning: None,
            }
        }
        Err(err) => {
            warn!(
                character = character_name,
                style = anime_style,
                class = ?err.class(),
                attempts = err.attempts(),
                exhausted = err.is_exhausted(),
                upstream = %err.last_error(),
                "AI avatar generation failed, using fallback"
            );
            AvatarOutcome {
                avatar_url: avatar_data_url(character_name, anime_style),
                description: format!("Fallback avatar for {character_name} from {anime_style}"),
                method: GenerationMethod::Fallback,
                model: None,
                warning: Some(avatar_warning(err.class())),
            }
        }
    }
}

/// First 150 chars, keeping only word characters, whitespace and hyphens.
fn shorten_description(text: &str) -> String {
    text.chars()
        .take(DESCRIPTION_CHARS)
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_string()
}
