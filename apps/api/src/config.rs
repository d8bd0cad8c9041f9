use std::str::FromStr;

use anyhow::{ensure, Context, Result};

use crate::llm_client::DEFAULT_BASE_URL;
use crate::resilience::fixed_model::DEFAULT_MAX_RETRIES;

const DEFAULT_AVATAR_MODELS: &str = "gemini-1.5-flash,gemini-1.5-pro";
const DEFAULT_PORTFOLIO_MODEL: &str = "gemini-1.5-flash-latest";

/// Application configuration loaded from environment variables.
///
/// A missing `GEMINI_API_KEY` does not stop startup; generation routes
/// report it per request instead. Malformed values do stop startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub avatar_models: Vec<String>,
    pub avatar_max_attempts: u32,
    pub avatar_base_delay_ms: u64,
    pub portfolio_model: String,
    pub portfolio_max_retries: u32,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let avatar_models: Vec<String> = get("AVATAR_MODELS")
            .unwrap_or_else(|| DEFAULT_AVATAR_MODELS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect();
        ensure!(
            !avatar_models.is_empty(),
            "AVATAR_MODELS must name at least one model"
        );

        let config = Config {
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            avatar_models,
            avatar_max_attempts: parse_or(&get, "AVATAR_MAX_ATTEMPTS", 4)?,
            avatar_base_delay_ms: parse_or(&get, "AVATAR_BASE_DELAY_MS", 1500)?,
            portfolio_model: get("PORTFOLIO_MODEL")
                .unwrap_or_else(|| DEFAULT_PORTFOLIO_MODEL.to_string()),
            portfolio_max_retries: parse_or(&get, "PORTFOLIO_MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
            port: parse_or(&get, "PORT", 8080)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        };

        ensure!(config.avatar_max_attempts > 0, "AVATAR_MAX_ATTEMPTS must be at least 1");
        ensure!(config.portfolio_max_retries > 0, "PORTFOLIO_MAX_RETRIES must be at least 1");

        Ok(config)
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
