use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::{GeminiClient, TextGenerator};
use crate::resilience::{FixedModelRetrier, ModelSwitchingRetrier};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// `None` when `GEMINI_API_KEY` is unset; generation routes then answer NOT_CONFIGURED.
    generator: Option<Arc<dyn TextGenerator>>,
    pub avatar_retrier: ModelSwitchingRetrier,
    pub portfolio_retrier: FixedModelRetrier,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let generator = match &config.gemini_api_key {
            Some(key) => {
                let client = GeminiClient::new(config.gemini_base_url.clone(), key.clone())
                    .context("Failed to build Gemini HTTP client")?;
                Some(Arc::new(client) as Arc<dyn TextGenerator>)
            }
            None => None,
        };

        Ok(Self {
            generator,
            avatar_retrier: ModelSwitchingRetrier::new(
                config.avatar_models.clone(),
                config.avatar_max_attempts,
                Duration::from_millis(config.avatar_base_delay_ms),
            )?,
            portfolio_retrier: FixedModelRetrier::new(
                config.portfolio_model.clone(),
                config.portfolio_max_retries,
            )?,
        })
    }

    /// Replaces the upstream generator. Passing `None` simulates a missing key.
    #[cfg(test)]
    pub fn with_generator(mut self, generator: Option<Arc<dyn TextGenerator>>) -> Self {
        self.generator = generator;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    pub fn generator(&self) -> Result<&dyn TextGenerator, AppError> {
        self.generator.as_deref().ok_or(AppError::NotConfigured)
    }
}
