//! Result tagging shared by both generation types: how an artifact was
//! produced, and the friendly warning shown when it came from the fallback.

use serde::Serialize;

use crate::resilience::FailureClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationMethod {
    AiGenerated,
    Fallback,
}

/// User-facing warnings. Raw upstream messages never leave the server.
pub mod warnings {
    pub const AVATAR_OVERLOADED: &str =
        "AI service is temporarily overloaded. Using styled avatar - try again in a few minutes.";
    pub const AVATAR_UNAVAILABLE: &str = "AI service temporarily unavailable, using styled avatar";

    pub const PORTFOLIO_OVERLOADED: &str =
        "The AI model is currently overloaded. Please try again in a few moments!";
    pub const PORTFOLIO_BAD_KEY: &str =
        "Invalid API key. Please check your Gemini API key configuration.";
    pub const PORTFOLIO_BLOCKED: &str =
        "No content generated by the AI. The response may have been filtered by safety settings, so here is a starter portfolio instead.";
    pub const PORTFOLIO_UNAVAILABLE: &str =
        "AI service temporarily unavailable. Here is a starter portfolio - try regenerating in a few minutes.";
}

pub fn avatar_warning(class: FailureClass) -> &'static str {
    if class.is_overload() {
        warnings::AVATAR_OVERLOADED
    } else {
        warnings::AVATAR_UNAVAILABLE
    }
}

pub fn portfolio_warning(class: FailureClass) -> &'static str {
    match class {
        FailureClass::Overloaded | FailureClass::RateLimited => warnings::PORTFOLIO_OVERLOADED,
        FailureClass::Unauthorized => warnings::PORTFOLIO_BAD_KEY,
        FailureClass::Blocked => warnings::PORTFOLIO_BLOCKED,
        FailureClass::ServerError | FailureClass::Network | FailureClass::Rejected => {
            warnings::PORTFOLIO_UNAVAILABLE
        }
    }
}
