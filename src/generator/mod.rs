//! Design generation — external AI collaborator behind a narrow trait.
//!
//! DESIGN
//! ======
//! The entitlement core only ever sees [`GenerateDesign`]; the concrete
//! client speaks an OpenAI-compatible chat-completions API. Configured from
//! environment variables; absence of configuration disables generation
//! without taking the rest of the service down.

pub mod client;
pub mod types;

use types::{DesignBrief, DesignPayload, GeneratorError};

use crate::tiers::TierParams;

/// Produce a design system for a brief at the given tier parameters.
///
/// Invoked only after the entitlement gate has reserved budget; a failure
/// here does not refund the reservation (compensation is an operator
/// concern, logged by the caller).
#[async_trait::async_trait]
pub trait GenerateDesign: Send + Sync {
    async fn generate(
        &self,
        brief: &DesignBrief,
        params: &TierParams,
    ) -> Result<DesignPayload, GeneratorError>;
}

// =============================================================================
// CLIENT
// =============================================================================

/// Concrete generation client for OpenAI-compatible providers.
pub struct GeneratorClient {
    inner: client::ChatClient,
    model: String,
}

impl GeneratorClient {
    /// Build a generator client from environment variables.
    ///
    /// - `GENERATOR_API_KEY_ENV`: name of env var holding the API key
    ///   (default `OPENAI_API_KEY`)
    /// - `GENERATOR_MODEL`: model name (default `"gpt-4o-mini"`)
    /// - `GENERATOR_BASE_URL`: custom base URL for compatible APIs
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or the HTTP client fails
    /// to build.
    pub fn from_env() -> Result<Self, GeneratorError> {
        let key_var =
            std::env::var("GENERATOR_API_KEY_ENV").unwrap_or_else(|_| "OPENAI_API_KEY".into());
        let api_key = std::env::var(&key_var)
            .map_err(|_| GeneratorError::MissingApiKey { var: key_var })?;
        let model = std::env::var("GENERATOR_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        let base_url = std::env::var("GENERATOR_BASE_URL").ok();

        let inner = client::ChatClient::new(api_key, base_url.as_deref())?;
        Ok(Self { inner, model })
    }

    /// Return the configured model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl GenerateDesign for GeneratorClient {
    async fn generate(
        &self,
        brief: &DesignBrief,
        params: &TierParams,
    ) -> Result<DesignPayload, GeneratorError> {
        self.inner.generate(&self.model, brief, params).await
    }
}
