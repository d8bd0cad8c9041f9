// Avatar and portfolio generation.
// Upstream calls go through llm_client and the resilience retriers; every
// failure ends in a fallback artifact, never an HTTP error.

pub mod avatar;
pub mod fallback;
pub mod handlers;
pub mod outcome;
pub mod portfolio;
pub mod prompts;
pub mod sections;
