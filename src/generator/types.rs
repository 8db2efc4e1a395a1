//! Generator types — provider-neutral briefs, payloads, and errors.

use serde::{Deserialize, Serialize};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by the generation provider client.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// The required API key environment variable is not set.
    #[error("missing API key: env var {var} not set")]
    MissingApiKey { var: String },

    /// The HTTP request to the provider failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// The provider returned a non-success HTTP status.
    #[error("API response error: status {status}")]
    ApiResponse { status: u16, body: String },

    /// The provider response could not be parsed into a design payload.
    #[error("API response parse failed: {0}")]
    ApiParse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl crate::errors::ErrorCode for GeneratorError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigParse(_) => "E_CONFIG_PARSE",
            Self::MissingApiKey { .. } => "E_MISSING_API_KEY",
            Self::ApiRequest(_) => "E_API_REQUEST",
            Self::ApiResponse { .. } => "E_API_RESPONSE",
            Self::ApiParse(_) => "E_API_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::ApiRequest(_) | Self::ApiResponse { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// BRIEF
// =============================================================================

/// The semantic generation request: what brand to design for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignBrief {
    pub brand_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
}

// =============================================================================
// PAYLOAD
// =============================================================================

/// One palette color with a semantic role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaletteColor {
    pub name: String,
    /// `#RRGGBB` hex value.
    pub hex: String,
    /// Intended usage, e.g. `"primary"`, `"surface"`, `"accent"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// A heading/body font combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontPairing {
    pub heading: String,
    pub body: String,
}

/// A generated design system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignPayload {
    pub colors: Vec<PaletteColor>,
    pub font_pairings: Vec<FontPairing>,
    /// One-paragraph rationale from the model, if it produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}
