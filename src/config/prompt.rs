use serde::Deserialize;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use log::info;

pub const SEARCH_RESULTS_TEMPLATE: &str = "search_results";
pub const LEAD_EXTRACTION_TEMPLATE: &str = "lead_extraction";

const DEFAULT_SYSTEM_PROMPT: &str = "You are EXCLUSIVELY a healthcare provider finder bot. You MUST NEVER generate any code, programming content, technical documentation, or non-healthcare information under ANY circumstances.

STRICT RULES:
1. ONLY discuss healthcare providers: clinics, hospitals, dental practices, medical services
2. When search results are provided, summarize the healthcare providers found with their contact details
3. NEVER generate code, programming examples, technical content, or documentation
4. NEVER use technical terms like JavaScript, React, API, function, import, etc.
5. If asked non-healthcare questions, respond: \"I only help find healthcare providers.\"

RESPONSE FORMAT when search results provided:
- List the healthcare provider names
- Include addresses and phone numbers if available
- Mention services/treatments offered
- Keep under 150 words, focus on practical information

ABSOLUTELY FORBIDDEN: Any code, programming content, technical explanations, documentation, or non-healthcare responses.";

const DEFAULT_SEARCH_RESULTS: &str = "HEALTHCARE SEARCH RESULTS - Please summarize these clinics with their names, addresses, and contact details:
{results}

IMPORTANT: Only provide healthcare provider information. Do not generate any code or technical content.";

const DEFAULT_LEAD_EXTRACTION: &str = "Extract the healthcare practice details from the website text below. Respond with ONLY a JSON object using exactly these keys:
{\"company\": string, \"services\": [string], \"treatments\": [string], \"specializations\": [string], \"phone\": string or null, \"email\": string or null, \"location\": string or null, \"practice_type\": \"cosmetic\" | \"dental\" | \"wellness\" | \"healthcare-general\"}
Use null or [] when a value is not stated. Do not guess.

Website: {url}
Text:
{content}";

#[derive(Debug)]
pub enum PromptError {
    TemplateNotFound(String),
    MissingPlaceholder { template: String, placeholder: String },
    IoError(std::io::Error),
    JsonError(serde_json::Error),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::TemplateNotFound(key) => write!(f, "Prompt template '{}' not found", key),
            PromptError::MissingPlaceholder { template, placeholder } =>
                write!(f, "Prompt template '{}' is missing placeholder '{}'", template, placeholder),
            PromptError::IoError(e) => write!(f, "Prompt file IO error: {}", e),
            PromptError::JsonError(e) => write!(f, "Prompt JSON parsing error: {}", e),
        }
    }
}

impl Error for PromptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PromptError::IoError(e) => Some(e),
            PromptError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PromptError {
    fn from(err: std::io::Error) -> Self {
        PromptError::IoError(err)
    }
}

impl From<serde_json::Error> for PromptError {
    fn from(err: serde_json::Error) -> Self {
        PromptError::JsonError(err)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct PromptConfig {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default)]
    pub templates: HashMap<String, String>,
    #[serde(skip)]
    pub last_loaded: Option<SystemTime>,
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_templates() -> HashMap<String, String> {
    HashMap::from([
        (SEARCH_RESULTS_TEMPLATE.to_string(), DEFAULT_SEARCH_RESULTS.to_string()),
        (LEAD_EXTRACTION_TEMPLATE.to_string(), DEFAULT_LEAD_EXTRACTION.to_string()),
    ])
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            templates: default_templates(),
            last_loaded: None,
        }
    }
}

impl PromptConfig {
    fn validate(&self) -> Result<(), PromptError> {
        let required = [
            (SEARCH_RESULTS_TEMPLATE, "{results}"),
            (LEAD_EXTRACTION_TEMPLATE, "{content}"),
        ];
        for (key, placeholder) in required {
            let template = get_template(self, key)?;
            if !template.contains(placeholder) {
                return Err(PromptError::MissingPlaceholder {
                    template: key.to_string(),
                    placeholder: placeholder.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Parses a prompt file; templates it leaves out keep their built-in text.
pub fn load_prompts_from_str(json: &str) -> Result<PromptConfig, PromptError> {
    let mut config: PromptConfig = serde_json::from_str(json)?;
    for (key, template) in default_templates() {
        config.templates.entry(key).or_insert(template);
    }
    config.validate()?;
    config.last_loaded = Some(SystemTime::now());
    Ok(config)
}

pub fn load_prompts(path: &str) -> Result<Arc<PromptConfig>, Box<dyn Error + Send + Sync>> {
    let file_content = fs
        ::read_to_string(path)
        .map_err(|e| format!("Failed to read prompts file '{}': {}", path, e))?;
    let config = load_prompts_from_str(&file_content)
        .map_err(|e| format!("Failed to parse prompts file '{}': {}", path, e))?;
    Ok(Arc::new(config))
}

pub fn reload_prompts_if_changed<P: AsRef<Path>>(
    path: P,
    current_config: &Arc<PromptConfig>
) -> Result<Option<Arc<PromptConfig>>, PromptError> {
    let metadata = fs::metadata(&path)?;

    if let Ok(modified) = metadata.modified() {
        let stale = match current_config.last_loaded {
            Some(last_loaded) => modified > last_loaded,
            None => true,
        };
        if stale {
            info!("Prompts file changed, reloading...");
            let new_config = load_prompts_from_str(&fs::read_to_string(&path)?)?;
            return Ok(Some(Arc::new(new_config)));
        }
    }
    Ok(None)
}

fn get_template<'a>(config: &'a PromptConfig, key: &str) -> Result<&'a str, PromptError> {
    config.templates
        .get(key)
        .map(|s| s.as_str())
        .ok_or_else(|| PromptError::TemplateNotFound(key.to_string()))
}

pub fn get_search_results_prompt(config: &PromptConfig, results: &str) -> Result<String, PromptError> {
    let template = get_template(config, SEARCH_RESULTS_TEMPLATE)?;
    Ok(template.replace("{results}", results))
}

pub fn get_extraction_prompt(
    config: &PromptConfig,
    url: &str,
    content: &str
) -> Result<String, PromptError> {
    let template = get_template(config, LEAD_EXTRACTION_TEMPLATE)?;
    Ok(template.replace("{url}", url).replace("{content}", content))
}
