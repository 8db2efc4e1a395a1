//! OpenAI-compatible chat-completions client for design generation.
//!
//! Builds a strict-JSON prompt from the brief and tier parameters, posts to
//! `/chat/completions`, and parses the model's reply into a
//! [`DesignPayload`]. Oversized palettes and pairing lists are truncated to
//! the tier budgets rather than rejected.

use std::fmt::Write;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::{DesignBrief, DesignPayload, GeneratorError};
use crate::tiers::TierParams;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT_SECS: u64 = 120;
const CONNECT_TIMEOUT_SECS: u64 = 10;

pub struct ChatClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ChatClient {
    pub fn new(api_key: String, base_url: Option<&str>) -> Result<Self, GeneratorError> {
        let base_url = base_url
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| GeneratorError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, api_key, base_url })
    }

    pub async fn generate(
        &self,
        model: &str,
        brief: &DesignBrief,
        params: &TierParams,
    ) -> Result<DesignPayload, GeneratorError> {
        let system = build_system_prompt(params);
        let user = build_user_prompt(brief);
        let body = CcRequest {
            model,
            max_tokens: params.max_output_tokens,
            temperature: params.creativity,
            messages: &[
                CcMessage { role: "system", content: &system },
                CcMessage { role: "user", content: &user },
            ],
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GeneratorError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| GeneratorError::ApiRequest(e.to_string()))?;
        if status != 200 {
            return Err(GeneratorError::ApiResponse { status, body: text });
        }

        let mut payload = parse_response(&text)?;
        payload.colors.truncate(params.color_count as usize);
        payload.font_pairings.truncate(params.font_pairings as usize);
        Ok(payload)
    }
}

// =============================================================================
// PROMPTS
// =============================================================================

fn build_system_prompt(params: &TierParams) -> String {
    format!(
        "You are a brand design-system generator. Respond with a single JSON \
         object and nothing else, with this shape: \
         {{\"colors\": [{{\"name\": str, \"hex\": \"#RRGGBB\", \"role\": str}}], \
         \"font_pairings\": [{{\"heading\": str, \"body\": str}}], \
         \"summary\": str}}. \
         Produce exactly {} colors and {} font pairings.",
        params.color_count, params.font_pairings
    )
}

fn build_user_prompt(brief: &DesignBrief) -> String {
    let mut prompt = format!("Brand description: {}", brief.brand_description.trim());
    if let Some(industry) = brief.industry.as_deref() {
        let _ = write!(prompt, "\nIndustry: {}", industry.trim());
    }
    if let Some(audience) = brief.audience.as_deref() {
        let _ = write!(prompt, "\nTarget audience: {}", audience.trim());
    }
    prompt
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct CcRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: &'a [CcMessage<'a>],
}

#[derive(Serialize)]
struct CcMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CcResponse {
    choices: Vec<CcChoice>,
}

#[derive(Deserialize)]
struct CcChoice {
    message: CcResponseMessage,
}

#[derive(Deserialize)]
struct CcResponseMessage {
    content: Option<String>,
}

// =============================================================================
// PARSING
// =============================================================================

/// Strip optional markdown code fences models wrap JSON in.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn parse_response(text: &str) -> Result<DesignPayload, GeneratorError> {
    let response: CcResponse =
        serde_json::from_str(text).map_err(|e| GeneratorError::ApiParse(e.to_string()))?;
    let content = response
        .choices
        .first()
        .and_then(|c| c.message.content.as_deref())
        .ok_or_else(|| GeneratorError::ApiParse("empty completion".into()))?;

    serde_json::from_str(strip_code_fences(content))
        .map_err(|e| GeneratorError::ApiParse(format!("design payload: {e}")))
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
