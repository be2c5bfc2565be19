use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::OpenAiCompatibleConfig;
use crate::error::ProviderError;
use crate::prompt::{render_prompt, SYSTEM_INSTRUCTION};
use crate::traits::NarrativeProvider;
use crate::types::{NarrativeRequest, NarrativeResponse};

#[derive(Clone)]
pub struct OpenAiCompatibleNarrativeProvider {
    config: OpenAiCompatibleConfig,
    client: Client,
}

impl OpenAiCompatibleNarrativeProvider {
    pub fn new(config: OpenAiCompatibleConfig) -> Result<Self, ProviderError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::Config("api key is empty".to_string()));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait::async_trait]
impl NarrativeProvider for OpenAiCompatibleNarrativeProvider {
    fn name(&self) -> &'static str {
        "openai-compatible"
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

        let prompt = render_prompt(&request);
        let payload = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessageOut {
                    role: "system",
                    content: SYSTEM_INSTRUCTION,
                },
                ChatMessageOut {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let res = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            debug!(status, model = %self.config.model, "chat completion rejected");
            return Err(ProviderError::Api { status, body });
        }

        let parsed: ChatResponse = res.json().await?;
        let model = parsed.model.clone().unwrap_or_else(|| self.config.model.clone());
        Ok(NarrativeResponse {
            provider: self.name().to_string(),
            model,
            summary: first_choice_text(parsed)?,
        })
    }
}

fn first_choice_text(parsed: ChatResponse) -> Result<String, ProviderError> {
    if parsed.choices.is_empty() {
        return Err(ProviderError::InvalidResponse(
            "completion has no choices".to_string(),
        ));
    }
    parsed
        .choices
        .into_iter()
        .filter_map(|choice| choice.message.content)
        .map(|text| text.trim().to_string())
        .find(|text| !text.is_empty())
        .ok_or_else(|| ProviderError::EmptySummary { provider: "openai-compatible" })
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessageOut<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessageOut<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}
