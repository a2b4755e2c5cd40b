use async_trait::async_trait;
use log::debug;
use reqwest::{Client as HttpClient, header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION}};
use serde::{Deserialize, Serialize};

use super::{ChatClient, CompletionResponse, LlmMessage};
use crate::error::ClientError;
use crate::llm::LlmConfig;

const APP_TITLE: &str = "Healthcare Lead Discovery Agent";

/// Client for OpenAI-compatible chat completion endpoints (OpenRouter, OpenAI).
pub struct OpenRouterChatClient {
    http: HttpClient,
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [LlmMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    error: Option<ProviderError>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ProviderError {
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    message: String,
}

impl OpenRouterChatClient {
    pub fn new(
        api_key: &str,
        model: &str,
        base_url: &str,
        config: &LlmConfig,
    ) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", api_key))?);
        headers.insert("X-Title", HeaderValue::from_static(APP_TITLE));

        let http = HttpClient::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn from_config(config: &LlmConfig, model: &str) -> Result<Self, ClientError> {
        let api_key = config.api_key
            .as_deref()
            .ok_or(ClientError::MissingCredential("LLM API key"))?;
        let base_url = config.base_url
            .clone()
            .unwrap_or_else(|| config.llm_type.default_base_url().to_string());

        Self::new(api_key, model, &base_url, config)
    }
}

#[async_trait]
impl ChatClient for OpenRouterChatClient {
    async fn complete(&self, messages: &[LlmMessage]) -> Result<CompletionResponse, ClientError> {
        let url = format!("{}/chat/completions", self.base_url);
        let req = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        };

        debug!("Sending {} messages to {}", messages.len(), self.model);
        let resp = self.http.post(&url).json(&req).send().await?;
        if !resp.status().is_success() {
            return Err(ClientError::from_response("OpenRouter", resp).await);
        }

        let body = resp.json::<ChatCompletionResponse>().await?;
        if let Some(err) = body.error {
            let code = err.code.map(|c| c.to_string()).unwrap_or_default();
            return Err(ClientError::Malformed(format!("provider error {}: {}", code, err.message)));
        }

        let content = body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ClientError::Malformed(format!("empty completion from {}", self.model)))?;

        Ok(CompletionResponse { response: content, model: self.model.clone() })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }
}
