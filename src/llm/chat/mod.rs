pub mod openrouter;

use async_trait::async_trait;
use lazy_static::lazy_static;
use log::warn;
use regex::RegexSet;
use serde::{ Deserialize, Serialize };
use std::sync::Arc;
use super::LlmConfig;
use self::openrouter::OpenRouterChatClient;
use crate::error::ClientError;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LlmMessage {
    pub role: String,
    pub content: String,
}

impl LlmMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: content.into() }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct CompletionResponse {
    pub response: String,
    pub model: String,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, messages: &[LlmMessage]) -> Result<CompletionResponse, ClientError>;

    fn get_model(&self) -> String;
}

/// Tries each client in order and returns the first successful completion.
pub struct FallbackChatClient {
    clients: Vec<Arc<dyn ChatClient>>,
}

impl FallbackChatClient {
    pub fn new(clients: Vec<Arc<dyn ChatClient>>) -> Self {
        Self { clients }
    }
}

#[async_trait]
impl ChatClient for FallbackChatClient {
    async fn complete(&self, messages: &[LlmMessage]) -> Result<CompletionResponse, ClientError> {
        let mut last_error = None;
        for (i, client) in self.clients.iter().enumerate() {
            match client.complete(messages).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    warn!("Model {} (#{}) failed, trying next: {}", client.get_model(), i, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| ClientError::Malformed("No chat models configured".to_string())))
    }

    fn get_model(&self) -> String {
        self.clients
            .first()
            .map(|c| c.get_model())
            .unwrap_or_default()
    }
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, ClientError> {
    let mut clients: Vec<Arc<dyn ChatClient>> = Vec::new();
    let models = std::iter::once(&config.completion_model).chain(config.fallback_models.iter());
    for model in models {
        let model = model.trim();
        if model.is_empty() || clients.iter().any(|c| c.get_model() == model) {
            continue;
        }
        clients.push(Arc::new(OpenRouterChatClient::from_config(config, model)?));
    }

    if clients.len() == 1 {
        return Ok(clients.remove(0));
    }
    Ok(Arc::new(FallbackChatClient::new(clients)))
}

lazy_static! {
    static ref CODE_PATTERNS: RegexSet = RegexSet::new([
        r"(?i)\bimport\s+.*\bfrom\b",
        r"(?i)\bfunction\s*\(",
        r"\bconst\s+\w+\s*=",
        // "world class care" is prose, "class Clinic {" is not
        r"\bclass\s+[A-Z]\w*\s*(?:\{|\(|:|extends\b|implements\b)",
        r"(?i)\.prototype\.",
        r"(?i)\bexport\s+(?:default|const)\b",
        r"(?i)React\.useState",
        r"<\w+\s+.*>",
        r"(?s)\{.*\}",
        r"(?i)console\.log",
        r"(?i)\basync\s+function\b",
        r"(?i)\bawait\s+fetch\b",
        r"(?i)\bpublic\s+int\b",
        r"(?i)Map<.*>",
    ]).unwrap();
}

/// Heuristic for replies where the model drifted into writing code.
pub fn looks_like_code(text: &str) -> bool {
    CODE_PATTERNS.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{ AtomicUsize, Ordering };

    struct StubClient {
        model: String,
        reply: Option<String>,
        calls: AtomicUsize,
    }

    impl StubClient {
        fn new(model: &str, reply: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                model: model.to_string(),
                reply: reply.map(str::to_string),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ChatClient for StubClient {
        async fn complete(&self, _messages: &[LlmMessage]) -> Result<CompletionResponse, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Some(r) => Ok(CompletionResponse { response: r.clone(), model: self.model.clone() }),
                None => Err(ClientError::Api { service: "stub", status: 429, body: "busy".into() }),
            }
        }

        fn get_model(&self) -> String {
            self.model.clone()
        }
    }

    #[tokio::test]
    async fn fallback_moves_to_next_model() {
        let first = StubClient::new("a", None);
        let second = StubClient::new("b", Some("hello"));
        let third = StubClient::new("c", Some("unused"));
        let chain = FallbackChatClient::new(vec![
            first.clone() as Arc<dyn ChatClient>,
            second.clone() as Arc<dyn ChatClient>,
            third.clone() as Arc<dyn ChatClient>,
        ]);

        let resp = chain.complete(&[LlmMessage::user("hi")]).await.unwrap();
        assert_eq!(resp.response, "hello");
        assert_eq!(resp.model, "b");
        assert_eq!(third.calls.load(Ordering::SeqCst), 0);
        assert_eq!(chain.get_model(), "a");
    }

    #[tokio::test]
    async fn fallback_returns_last_error_when_all_fail() {
        let chain = FallbackChatClient::new(vec![
            StubClient::new("a", None) as Arc<dyn ChatClient>,
            StubClient::new("b", None) as Arc<dyn ChatClient>,
        ]);
        let err = chain.complete(&[LlmMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 429, .. }));
    }

    #[test]
    fn new_client_builds_a_chain_without_duplicates() {
        let config = LlmConfig {
            api_key: Some("key".into()),
            completion_model: "a/one".into(),
            fallback_models: vec!["a/one".into(), " ".into(), "b/two".into()],
            ..Default::default()
        };
        let client = new_client(&config).unwrap();
        assert_eq!(client.get_model(), "a/one");

        let single = LlmConfig { fallback_models: Vec::new(), ..config };
        assert_eq!(new_client(&single).unwrap().get_model(), "a/one");
    }

    #[test]
    fn detects_code_like_replies() {
        assert!(looks_like_code("import React from 'react'"));
        assert!(looks_like_code("const x = 5;"));
        assert!(!looks_like_code("Oran Aesthetics offers botox. Phone: 020 - 2157338."));
    }

    #[test]
    fn multi_line_script_is_code() {
        let reply = "export default async () => {\n  await fetch('/clinics');\n  console.log(data);\n}";
        assert!(looks_like_code(reply));
        assert!(looks_like_code("class Clinic {\n  constructor() {}\n}"));
        assert!(looks_like_code("<div class=\"clinic\">Oran</div>"));
    }

    #[test]
    fn healthcare_prose_is_not_code() {
        let reply = "Amsterdam Lung Centre tests lung function and offers world class care. \
            Important information from the clinic: open Monday to Friday, call 020 - 2157338.";
        assert!(!looks_like_code(reply));
    }
}
