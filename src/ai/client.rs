//! LLM provider clients.
//!
//! Two wire protocols are supported: OpenAI-compatible chat completions
//! (which also covers self-hosted gateways speaking the same API) and the
//! Anthropic messages API.

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::{AiProvider, AI_MAX_OUTPUT_TOKENS, ANTHROPIC_API_VERSION};
use crate::error_handling::{categorize_reqwest_error, categorize_status, AnalysisError};

use super::types::TokenUsage;

const TEMPERATURE: f32 = 0.1;

/// Text content and token usage of one completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub usage: Option<TokenUsage>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<MessagesUsage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct MessagesUsage {
    input_tokens: u32,
    output_tokens: u32,
}

pub struct AiClient {
    http: Arc<reqwest::Client>,
    provider: AiProvider,
    api_base: String,
    api_key: Option<String>,
    model: String,
    max_output_tokens: u32,
}

impl AiClient {
    pub fn new(
        http: Arc<reqwest::Client>,
        provider: AiProvider,
        api_base: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http,
            provider,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.into(),
            max_output_tokens: AI_MAX_OUTPUT_TOKENS,
        }
    }

    pub fn provider(&self) -> AiProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Sends one system + user exchange and returns the answer text.
    ///
    /// # Errors
    ///
    /// `api_key_invalid` without any request when no key is configured,
    /// otherwise the categorized HTTP or decoding failure.
    pub async fn complete(&self, system: &str, user: &str) -> Result<Completion, AnalysisError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(
                AnalysisError::api_key_invalid(format!(
                    "No API key configured for {}",
                    self.provider.as_str()
                ))
                .with_code("api_key_missing"),
            );
        };

        debug!("Requesting {} completion from {}", self.model, self.provider.as_str());
        match self.provider {
            AiProvider::OpenAi => self.chat_completion(api_key, system, user).await,
            AiProvider::Anthropic => self.messages(api_key, system, user).await,
        }
    }

    async fn chat_completion(
        &self,
        api_key: &str,
        system: &str,
        user: &str,
    ) -> Result<Completion, AnalysisError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            response_format: ResponseFormat { kind: "json_object" },
            max_tokens: self.max_output_tokens,
            temperature: TEMPERATURE,
        };
        let request = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(api_key)
            .json(&body);
        let parsed: ChatCompletionResponse = send_json(request).await?;

        let content = parsed
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AnalysisError::parse("Completion contains no message content"))?;
        Ok(Completion {
            content,
            usage: parsed.usage.map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
        })
    }

    async fn messages(
        &self,
        api_key: &str,
        system: &str,
        user: &str,
    ) -> Result<Completion, AnalysisError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_output_tokens,
            system,
            messages: vec![ChatMessage { role: "user", content: user }],
            temperature: TEMPERATURE,
        };
        let request = self
            .http
            .post(format!("{}/messages", self.api_base))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .json(&body);
        let parsed: MessagesResponse = send_json(request).await?;

        let content: String = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();
        if content.trim().is_empty() {
            return Err(AnalysisError::parse("Message contains no text content"));
        }
        Ok(Completion {
            content,
            usage: parsed.usage.map(|u| TokenUsage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            }),
        })
    }
}

async fn send_json<T: serde::de::DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, AnalysisError> {
    let response = request
        .send()
        .await
        .map_err(|e| categorize_reqwest_error(&e))?;
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(categorize_status(status.as_u16(), &text));
    }
    let text = response
        .text()
        .await
        .map_err(|e| categorize_reqwest_error(&e))?;
    serde_json::from_str(&text)
        .map_err(|e| AnalysisError::parse(format!("Invalid provider response: {e}")))
}
