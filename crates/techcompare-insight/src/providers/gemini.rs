use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GeminiConfig;
use crate::error::ProviderError;
use crate::prompt::{render_prompt, SYSTEM_INSTRUCTION};
use crate::traits::NarrativeProvider;
use crate::types::{NarrativeRequest, NarrativeResponse};

#[derive(Clone)]
pub struct GeminiNarrativeProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiNarrativeProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::Config("api key is empty".to_string()));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model,
            self.config.api_key
        )
    }
}

#[async_trait::async_trait]
impl NarrativeProvider for GeminiNarrativeProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn summarize(
        &self,
        request: NarrativeRequest,
    ) -> Result<NarrativeResponse, ProviderError> {
        if request.subjects.is_empty() {
            return Err(ProviderError::Config(
                "narrative request has no subjects".to_string(),
            ));
        }

        let payload = GenerateRequest {
            system_instruction: Content::from_text(None, SYSTEM_INSTRUCTION),
            contents: vec![Content::from_text(Some("user"), &render_prompt(&request))],
            generation_config: GenerationConfig {
                max_output_tokens: self.config.max_output_tokens,
            },
        };

        let res = self
            .client
            .post(self.generate_url())
            .json(&payload)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            debug!(status, model = %self.config.model, "generateContent rejected");
            return Err(ProviderError::Api { status, body });
        }

        let parsed: GenerateResponse = res.json().await?;
        Ok(NarrativeResponse {
            provider: self.name().to_string(),
            model: self.config.model.clone(),
            summary: candidate_text(parsed)?,
        })
    }
}

/// Joins the text parts of the first candidate that has any.
fn candidate_text(parsed: GenerateResponse) -> Result<String, ProviderError> {
    if parsed.candidates.is_empty() {
        return Err(ProviderError::InvalidResponse(
            "generateContent returned no candidates".to_string(),
        ));
    }
    parsed
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
                .trim()
                .to_string()
        })
        .find(|text| !text.is_empty())
        .ok_or_else(|| ProviderError::EmptySummary { provider: "gemini" })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

impl Content {
    fn from_text(role: Option<&'static str>, text: &str) -> Self {
        Self {
            role,
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_parts_of_first_candidate() {
        let parsed: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [
                { "content": { "parts": [ { "text": "Pick Go. " }, { "text": "It scales." } ] } }
            ]
        }))
        .expect("parse response");
        assert_eq!(candidate_text(parsed).expect("text"), "Pick Go. It scales.");
    }

    #[test]
    fn blocked_candidates_are_invalid() {
        let parsed: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [ { "finishReason": "SAFETY" } ]
        }))
        .expect("parse response");
        assert!(matches!(
            candidate_text(parsed),
            Err(ProviderError::EmptySummary { .. })
        ));
    }

    #[test]
    fn missing_candidates_are_invalid() {
        let parsed: GenerateResponse =
            serde_json::from_value(serde_json::json!({})).expect("parse response");
        assert!(matches!(
            candidate_text(parsed),
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[test]
    fn request_body_uses_camel_case_keys() {
        let body = serde_json::to_value(GenerateRequest {
            system_instruction: Content::from_text(None, "sys"),
            contents: vec![Content::from_text(Some("user"), "hi")],
            generation_config: GenerationConfig {
                max_output_tokens: 64,
            },
        })
        .expect("serialize");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "sys");
        assert!(body["systemInstruction"].get("role").is_none());
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 64);
    }
}
