pub mod chat;
use serde::{ Deserialize, Serialize };
use std::str::FromStr;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmType {
    OpenRouter,
    OpenAI,
}

impl LlmType {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            LlmType::OpenRouter => "https://openrouter.ai/api/v1",
            LlmType::OpenAI => "https://api.openai.com/v1",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseLlmTypeError {
    message: String,
}

impl fmt::Display for ParseLlmTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseLlmTypeError {}
impl FromStr for LlmType {
    type Err = ParseLlmTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openrouter" => Ok(LlmType::OpenRouter),
            "openai" => Ok(LlmType::OpenAI),
            _ =>
                Err(ParseLlmTypeError {
                    message: format!("Invalid LLM type: '{}'", s),
                }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub llm_type: LlmType,
    pub api_key: Option<String>,
    pub completion_model: String,
    /// Tried in order after `completion_model` fails.
    pub fallback_models: Vec<String>,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            llm_type: LlmType::OpenRouter,
            api_key: None,
            completion_model: "deepseek/deepseek-chat-v3.1:free".to_string(),
            fallback_models: Vec::new(),
            base_url: None,
            temperature: 0.7,
            max_tokens: 1500,
            timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_llm_type_case_insensitively() {
        assert_eq!("OpenRouter".parse::<LlmType>(), Ok(LlmType::OpenRouter));
        assert_eq!("openai".parse::<LlmType>(), Ok(LlmType::OpenAI));
        assert!("ollama".parse::<LlmType>().is_err());
    }
}
