//! Axum route handlers for the Generation API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::avatar::{generate_avatar, AvatarOutcome};
use crate::generation::portfolio::{generate_portfolio, PortfolioOutcome};
use crate::models::profile::UserProfile;
use crate::state::AppState;

const DEFAULT_CHARACTER_NAME: &str = "Anime Hero";
const DEFAULT_ANIME_STYLE: &str = "shonen";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Unknown fields such as `userPhoto` are accepted and ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarRequest {
    #[serde(default)]
    pub prompt: String,
    pub character_name: Option<String>,
    pub anime_style: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarResponse {
    pub success: bool,
    pub request_id: Uuid,
    pub character_name: String,
    pub anime_style: String,
    #[serde(flatten)]
    pub outcome: AvatarOutcome,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioRequest {
    pub user_data: UserProfile,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioResponse {
    pub success: bool,
    pub request_id: Uuid,
    #[serde(flatten)]
    pub outcome: PortfolioOutcome,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/generate-avatar
///
/// Describes the character with Gemini and renders the styled avatar.
/// Upstream failures still return 200 with the fallback avatar and a warning.
pub async fn handle_generate_avatar(
    State(state): State<AppState>,
    Json(request): Json<AvatarRequest>,
) -> Result<Json<AvatarResponse>, AppError> {
    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return Err(AppError::Validation("Prompt is required".to_string()));
    }
    let generator = state.generator()?;

    let character_name = non_blank(request.character_name, DEFAULT_CHARACTER_NAME);
    let anime_style = non_blank(request.anime_style, DEFAULT_ANIME_STYLE);
    let request_id = Uuid::new_v4();
    info!(%request_id, character = %character_name, style = %anime_style, "Generating avatar");

    let outcome = generate_avatar(
        generator,
        &state.avatar_retrier,
        prompt,
        &character_name,
        &anime_style,
    )
    .await;

    Ok(Json(AvatarResponse {
        success: true,
        request_id,
        character_name,
        anime_style,
        outcome,
    }))
}

/// POST /api/generate-portfolio
///
/// Writes the anime-styled portfolio for `userData`, split into sections.
/// Upstream failures still return 200 with the starter portfolio and a warning.
pub async fn handle_generate_portfolio(
    State(state): State<AppState>,
    Json(request): Json<PortfolioRequest>,
) -> Result<Json<PortfolioResponse>, AppError> {
    if request.user_data.name.trim().is_empty() {
        return Err(AppError::Validation("User name is required".to_string()));
    }
    let generator = state.generator()?;

    let request_id = Uuid::new_v4();
    info!(%request_id, name = %request.user_data.name, "Generating portfolio");

    let outcome =
        generate_portfolio(generator, &state.portfolio_retrier, &request.user_data).await;

    Ok(Json(PortfolioResponse {
        success: true,
        request_id,
        outcome,
    }))
}

fn non_blank(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
