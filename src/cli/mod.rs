use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Search Provider Args ---
    /// API key for the Exa search API. Without it every practice lookup uses fallback data.
    #[arg(long, env = "EXA_API_KEY")]
    pub exa_api_key: Option<String>,

    /// Base URL for the Exa API.
    #[arg(long, env = "EXA_BASE_URL", default_value = "https://api.exa.ai")]
    pub exa_base_url: String,

    /// Number of results requested when looking up a single practice domain.
    #[arg(long, env = "EXA_NUM_RESULTS", default_value = "3")]
    pub exa_num_results: usize,

    /// Maximum characters of page text returned per search result.
    #[arg(long, env = "EXA_MAX_CHARACTERS", default_value = "4000")]
    pub exa_max_characters: usize,

    // --- Chat LLM Provider Args ---
    /// Type of LLM provider for chat completion (openrouter, openai)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "openrouter")]
    pub chat_llm_type: String,

    /// API Key for the Chat LLM provider (OpenRouter by default)
    #[arg(long, env = "OPENROUTER_API_KEY")]
    pub chat_api_key: Option<String>,

    /// Base URL for the Chat LLM provider API (e.g., https://openrouter.ai/api/v1)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let adapters handle defaults if None
    pub chat_base_url: Option<String>,

    /// Primary model name for chat completion.
    #[arg(long, env = "CHAT_MODEL", default_value = "deepseek/deepseek-chat-v3.1:free")]
    pub chat_model: String,

    /// Comma separated models tried in order when the primary model fails.
    #[arg(
        long,
        env = "CHAT_FALLBACK_MODELS",
        value_delimiter = ',',
        default_value = "meta-llama/llama-3.3-70b-instruct:free,qwen/qwen-2.5-72b-instruct:free"
    )]
    pub chat_fallback_models: Vec<String>,

    /// Sampling temperature for chat completions.
    #[arg(long, env = "CHAT_TEMPERATURE", default_value = "0.7")]
    pub chat_temperature: f32,

    /// Maximum tokens generated per chat completion.
    #[arg(long, env = "CHAT_MAX_TOKENS", default_value = "1500")]
    pub chat_max_tokens: u32,

    /// Ask the LLM for structured JSON extraction on top of the regex extractor.
    #[arg(long, env = "LLM_EXTRACTION", default_value = "false")]
    pub llm_extraction: bool,

    // --- Storage Args ---
    /// Notion integration token. Without it leads get a fallback id instead of a page.
    #[arg(long, env = "NOTION_TOKEN")]
    pub notion_token: Option<String>,

    /// Notion database receiving one page per lead.
    #[arg(long, env = "NOTION_DATABASE_ID", default_value = "22441ac0-dfef-81a6-9954-cdce1dfcba1d")]
    pub notion_database_id: String,

    /// Base URL for the Notion API.
    #[arg(long, env = "NOTION_BASE_URL", default_value = "https://api.notion.com")]
    pub notion_base_url: String,

    // --- Messaging Args ---
    /// Telegram bot token. Without it replies are logged and skipped.
    #[arg(long, env = "TELEGRAM_BOT_TOKEN")]
    pub telegram_bot_token: Option<String>,

    /// Base URL for the Telegram Bot API.
    #[arg(long, env = "TELEGRAM_BASE_URL", default_value = "https://api.telegram.org")]
    pub telegram_base_url: String,

    // --- Limits ---
    /// Maximum webhook messages accepted per chat within the rate limit window.
    #[arg(long, env = "RATE_LIMIT_MAX", default_value = "10")]
    pub rate_limit_max: usize,

    /// Length of the per-chat rate limit window in seconds.
    #[arg(long, env = "RATE_LIMIT_WINDOW_SECS", default_value = "60")]
    pub rate_limit_window_secs: u64,

    /// Maximum messages kept per conversation.
    #[arg(long, env = "HISTORY_MAX_MESSAGES", default_value = "20")]
    pub history_max_messages: usize,

    /// Number of past messages sent to the LLM with each chat turn.
    #[arg(long, env = "HISTORY_FOR_PROMPT_LEN", default_value = "10")]
    pub history_for_prompt_len: usize,

    /// Conversations with no message for this many seconds are forgotten.
    #[arg(long, env = "HISTORY_IDLE_SECS", default_value = "86400")]
    pub history_idle_secs: u64,

    /// Process-wide cap on inbound HTTP requests per second.
    #[arg(long, env = "GLOBAL_REQUESTS_PER_SECOND", default_value = "50")]
    pub global_requests_per_second: u32,

    /// Timeout applied to every outbound HTTP request.
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value = "30")]
    pub http_timeout_secs: u64,

    // --- General App Args ---
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "0.0.0.0:8080")]
    pub server_addr: String,

    /// Port override, applied to SERVER_ADDR (hosting platforms set PORT).
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Optional path to a JSON file overriding the built-in prompts.
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<String>,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

impl Args {
    /// Address the HTTP server binds to, with `PORT` taking precedence over the port in `SERVER_ADDR`.
    pub fn listen_addr(&self) -> String {
        match self.port {
            Some(port) => {
                let host = self.server_addr
                    .rsplit_once(':')
                    .map(|(host, _)| host)
                    .unwrap_or(self.server_addr.as_str());
                format!("{}:{}", host, port)
            }
            None => self.server_addr.clone(),
        }
    }

    pub fn exa_key(&self) -> Option<String> {
        non_empty(&self.exa_api_key)
    }

    pub fn chat_key(&self) -> Option<String> {
        non_empty(&self.chat_api_key)
    }

    pub fn notion_key(&self) -> Option<String> {
        non_empty(&self.notion_token)
    }

    pub fn telegram_key(&self) -> Option<String> {
        non_empty(&self.telegram_bot_token)
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
