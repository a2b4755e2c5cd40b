use crate::cli::Args;
use crate::config::prompt::{ self, PromptConfig };
use crate::extract::{ company_from_url, extract_lead, fallback_lead, ScoreWeights };
use crate::extract::structured::{ merge_into, parse_extracted_fields };
use crate::history::{ initialize_history_store, HistoryStore, MemoryHistoryStore };
use crate::llm::{ LlmConfig, LlmType };
use crate::llm::chat::{ looks_like_code, new_client as new_chat_client, ChatClient, LlmMessage };
use crate::messaging::{ escape_html, Messenger, TelegramClient };
use crate::models::chat::{ ROLE_ASSISTANT, ROLE_USER };
use crate::models::lead::Lead;
use crate::ratelimit::ChatRateLimiter;
use crate::search::{ joined_text, ExaClient, SearchClient, SearchHit, SearchRequest };
use crate::storage::{ LeadStore, NotionStore, StorageReceipt };

use lazy_static::lazy_static;
use log::{ debug, error, info, warn };
use regex::Regex;
use serde::Serialize;
use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{ AtomicU64, Ordering };
use std::time::{ Duration, Instant };
use tokio::sync::RwLock;
use url::Url;

pub const DEFAULT_SEARCH_RESULTS: usize = 3;
pub const MAX_SEARCH_RESULTS: usize = 10;
/// Characters of page text per hit handed to the LLM for summarising.
const PROMPT_HIT_CHARS: usize = 1000;

const HELP_MESSAGE: &str = "🏥 <b>Healthcare Lead Discovery Agent</b>

Send me:
• A practice website URL to analyse it and store it as a lead
• A request like \"Find 3 dental clinics in Amsterdam\" to search for providers

Commands:
/help Show this message
/clear Reset our conversation";

const CLEARED_MESSAGE: &str = "🧹 Conversation cleared. Send a practice URL or a provider search to start again.";
const RATE_LIMITED_MESSAGE: &str = "⏳ Too many requests. Please wait a minute before sending more messages.";
const NO_LLM_MESSAGE: &str = "I only help find healthcare providers. Send a practice URL or ask me to find clinics, dentists or doctors in a city.";
const LLM_ERROR_MESSAGE: &str = "⚠️ Sorry, I couldn't process that right now. Please try again in a moment.";
const NO_SEARCH_MESSAGE: &str = "🔍 Provider search is not configured right now. Send a practice URL instead.";
const SEARCH_ERROR_MESSAGE: &str = "❌ The provider search failed. Please try again in a moment.";
const NO_RESULTS_MESSAGE: &str = "🔍 No healthcare providers found for that request. Try a different city or specialty.";

lazy_static! {
    static ref URL_PATTERN: Regex = Regex::new(r"https?://[^\s]+").unwrap();
    static ref SEARCH_PATTERN: Regex = Regex::new(
        r"(?i)\b(?:find|search|looking for|recommend|near me|clinics?|dentists?|dental|doctors?|hospitals?|practices?|providers?|physicians?|dermatologists?|kliniek|tandarts)\b"
    ).unwrap();
    static ref COUNT_PATTERN: Regex = Regex::new(
        r"(?i)\b(?:find|show|list|search for|give)\s+(?:me\s+)?(\d{1,3})\b"
    ).unwrap();
}

/// Lead produced by the URL workflow together with where it was stored.
#[derive(Debug, Clone, Serialize)]
pub struct AutomationOutcome {
    pub lead: Lead,
    pub storage: StorageReceipt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookOutcome {
    Ok,
    RateLimited,
    Ignored,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub exa_configured: bool,
    pub llm_configured: bool,
    pub notion_configured: bool,
    pub telegram_configured: bool,
    pub llm_extraction: bool,
    pub model: Option<String>,
    pub notion_database_id: String,
    pub leads_processed: u64,
    pub messages_handled: u64,
    pub rate_limited: u64,
    pub errors: u64,
    pub active_conversations: usize,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub practice_results: usize,
    pub max_characters: usize,
    pub llm_extraction: bool,
    pub history_for_prompt_len: usize,
    pub history_idle: Duration,
    pub prompts_path: Option<String>,
    pub notion_database_id: String,
}

impl AgentSettings {
    pub fn from_args(args: &Args) -> Self {
        Self {
            practice_results: args.exa_num_results,
            max_characters: args.exa_max_characters,
            llm_extraction: args.llm_extraction,
            history_for_prompt_len: args.history_for_prompt_len,
            history_idle: Duration::from_secs(args.history_idle_secs),
            prompts_path: args.prompts_path.clone().filter(|p| !p.trim().is_empty()),
            notion_database_id: args.notion_database_id.clone(),
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            practice_results: 3,
            max_characters: 4000,
            llm_extraction: false,
            history_for_prompt_len: 10,
            history_idle: Duration::from_secs(24 * 60 * 60),
            prompts_path: None,
            notion_database_id: String::new(),
        }
    }
}

/// Collaborators of the agent. Integrations left as `None` take their fallback path.
pub struct AgentParts {
    pub search: Option<Arc<dyn SearchClient>>,
    pub chat: Option<Arc<dyn ChatClient>>,
    pub store: Option<Arc<dyn LeadStore>>,
    pub messenger: Option<Arc<dyn Messenger>>,
    pub history: Arc<dyn HistoryStore>,
    pub rate_limiter: ChatRateLimiter,
}

impl Default for AgentParts {
    fn default() -> Self {
        Self {
            search: None,
            chat: None,
            store: None,
            messenger: None,
            history: Arc::new(MemoryHistoryStore::new(20)),
            rate_limiter: ChatRateLimiter::new(10, Duration::from_secs(60)),
        }
    }
}

#[derive(Default)]
struct AgentStats {
    leads_processed: AtomicU64,
    messages_handled: AtomicU64,
    rate_limited: AtomicU64,
    errors: AtomicU64,
}

pub struct LeadAgent {
    search_client: Option<Arc<dyn SearchClient>>,
    chat_client: Option<Arc<dyn ChatClient>>,
    lead_store: Option<Arc<dyn LeadStore>>,
    messenger: Option<Arc<dyn Messenger>>,
    history_store: Arc<dyn HistoryStore>,
    rate_limiter: ChatRateLimiter,
    prompt_config: RwLock<Arc<PromptConfig>>,
    settings: AgentSettings,
    stats: AgentStats,
    started: Instant,
}

impl LeadAgent {
    fn initialize_chat_client(
        args: &Args,
        timeout: Duration
    ) -> Result<Option<Arc<dyn ChatClient>>, Box<dyn Error + Send + Sync>> {
        let Some(api_key) = args.chat_key() else {
            warn!("No chat LLM API key configured; chat replies use built-in messages");
            return Ok(None);
        };
        let llm_type: LlmType = args.chat_llm_type.parse()?;
        let config = LlmConfig {
            llm_type,
            api_key: Some(api_key),
            completion_model: args.chat_model.clone(),
            fallback_models: args.chat_fallback_models.clone(),
            base_url: args.chat_base_url.clone().filter(|u| !u.trim().is_empty()),
            temperature: args.chat_temperature,
            max_tokens: args.chat_max_tokens,
            timeout,
        };
        let client = new_chat_client(&config)?;
        info!(
            "Chat client configured: Type={}, Model={}, Fallbacks={:?}, BaseURL={}",
            args.chat_llm_type,
            config.completion_model,
            config.fallback_models,
            config.base_url.as_deref().unwrap_or(llm_type.default_base_url())
        );
        Ok(Some(client))
    }

    pub fn new(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let timeout = Duration::from_secs(args.http_timeout_secs);

        let search = match args.exa_key() {
            Some(key) => {
                let client = ExaClient::new(&key, &args.exa_base_url, timeout)?;
                Some(Arc::new(client) as Arc<dyn SearchClient>)
            }
            None => None,
        };
        let chat = Self::initialize_chat_client(args, timeout)?;
        let store = match args.notion_key() {
            Some(token) => {
                let client = NotionStore::new(
                    &token,
                    &args.notion_database_id,
                    &args.notion_base_url,
                    timeout
                )?;
                Some(Arc::new(client) as Arc<dyn LeadStore>)
            }
            None => None,
        };
        let messenger = match args.telegram_key() {
            Some(token) => {
                let client = TelegramClient::new(&token, &args.telegram_base_url, timeout)?;
                Some(Arc::new(client) as Arc<dyn Messenger>)
            }
            None => None,
        };

        let prompt_config = match &args.prompts_path {
            Some(path) if !path.trim().is_empty() => {
                info!("Loading prompts from {}", path);
                prompt::load_prompts(path)?
            }
            _ => Arc::new(PromptConfig::default()),
        };

        let parts = AgentParts {
            search,
            chat,
            store,
            messenger,
            history: initialize_history_store(args),
            rate_limiter: ChatRateLimiter::new(
                args.rate_limit_max,
                Duration::from_secs(args.rate_limit_window_secs)
            ),
        };
        let mut agent = Self::from_parts(parts, AgentSettings::from_args(args));
        agent.prompt_config = RwLock::new(prompt_config);
        Ok(agent)
    }

    pub fn from_parts(parts: AgentParts, settings: AgentSettings) -> Self {
        Self {
            search_client: parts.search,
            chat_client: parts.chat,
            lead_store: parts.store,
            messenger: parts.messenger,
            history_store: parts.history,
            rate_limiter: parts.rate_limiter,
            prompt_config: RwLock::new(Arc::new(PromptConfig::default())),
            settings,
            stats: AgentStats::default(),
            started: Instant::now(),
        }
    }

    async fn prompts(&self) -> Arc<PromptConfig> {
        Arc::clone(&*self.prompt_config.read().await)
    }

    fn record_error(&self) {
        self.stats.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// Looks the practice up on its own domain and extracts a lead from the page text.
    /// Any missing key or failed call yields the fallback lead.
    pub async fn scrape_practice(&self, url: &Url) -> Lead {
        info!("🔍 Exa search for: {}", url);
        let Some(search) = &self.search_client else {
            warn!("EXA_API_KEY not configured, using fallback data for {}", url);
            return fallback_lead(url);
        };
        let Some(host) = url.host_str() else {
            warn!("URL {} has no host, using fallback data", url);
            return fallback_lead(url);
        };

        let company = company_from_url(url);
        let request = SearchRequest::for_practice(
            &company,
            host,
            self.settings.practice_results,
            self.settings.max_characters
        );
        let hits = match search.search(&request).await {
            Ok(hits) => hits,
            Err(e) => {
                error!("Exa search failed for {}: {}", url, e);
                self.record_error();
                return fallback_lead(url);
            }
        };
        debug!("Exa returned {} results for {}", hits.len(), host);

        let content = joined_text(&hits);
        let mut lead = extract_lead(&content, url.as_str(), &company, &ScoreWeights::URL_AUDIT);
        if self.settings.llm_extraction && !content.is_empty() {
            self.enrich_with_llm(&mut lead, url, &content).await;
        }
        lead
    }

    async fn enrich_with_llm(&self, lead: &mut Lead, url: &Url, content: &str) {
        let Some(chat) = &self.chat_client else {
            return;
        };
        let prompts = self.prompts().await;
        let extraction_prompt = match prompt::get_extraction_prompt(&prompts, url.as_str(), content) {
            Ok(p) => p,
            Err(e) => {
                warn!("Extraction prompt unavailable: {}", e);
                return;
            }
        };

        match chat.complete(&[LlmMessage::user(extraction_prompt)]).await {
            Ok(resp) =>
                match parse_extracted_fields(&resp.response) {
                    Some(fields) => {
                        merge_into(lead, fields, &ScoreWeights::URL_AUDIT);
                        debug!("Merged LLM extraction from {} for {}", resp.model, url);
                    }
                    None => warn!("Model {} returned no usable JSON for {}", resp.model, url),
                }
            Err(e) => {
                warn!("LLM extraction failed for {}: {}", url, e);
                self.record_error();
            }
        }
    }

    /// Writes the lead to the CRM. Never fails; problems produce a fallback receipt.
    pub async fn store_lead(&self, lead: &Lead) -> StorageReceipt {
        info!("📊 Storing lead: {}", lead.company);
        let Some(store) = &self.lead_store else {
            warn!("NOTION_TOKEN not configured, lead {} not stored", lead.company);
            return StorageReceipt::fallback("Notion token not configured");
        };
        match store.store_lead(lead).await {
            Ok(page) => {
                info!("Stored lead {} as {}", lead.company, page.id);
                StorageReceipt::stored(page)
            }
            Err(e) => {
                error!("Notion storage failed for {}: {}", lead.company, e);
                self.record_error();
                StorageReceipt::fallback(e.to_string())
            }
        }
    }

    pub async fn automate(&self, url: &Url) -> AutomationOutcome {
        let lead = self.scrape_practice(url).await;
        let storage = self.store_lead(&lead).await;
        self.stats.leads_processed.fetch_add(1, Ordering::Relaxed);
        AutomationOutcome { lead, storage }
    }

    async fn send(&self, chat_id: i64, html: &str) {
        let Some(messenger) = &self.messenger else {
            debug!("No Telegram token, skipping reply to chat {}", chat_id);
            return;
        };
        if let Err(e) = messenger.send_message(chat_id, html).await {
            error!("Telegram send to chat {} failed: {}", chat_id, e);
            self.record_error();
        }
    }

    pub async fn handle_telegram_message(&self, chat_id: i64, text: &str) -> WebhookOutcome {
        let text = text.trim();
        if !self.rate_limiter.check(chat_id).await {
            warn!("Rate limit exceeded for chat {}", chat_id);
            self.stats.rate_limited.fetch_add(1, Ordering::Relaxed);
            self.send(chat_id, RATE_LIMITED_MESSAGE).await;
            return WebhookOutcome::RateLimited;
        }
        self.stats.messages_handled.fetch_add(1, Ordering::Relaxed);
        let conversation_id = chat_id.to_string();

        match parse_command(text).as_deref() {
            Some("/start") | Some("/help") => {
                self.send(chat_id, HELP_MESSAGE).await;
                return WebhookOutcome::Ok;
            }
            Some("/clear") | Some("/reset") => {
                if let Err(e) = self.history_store.clear(&conversation_id).await {
                    warn!("Failed to clear conversation {}: {}", conversation_id, e);
                }
                self.send(chat_id, CLEARED_MESSAGE).await;
                return WebhookOutcome::Ok;
            }
            _ => {}
        }

        let reply = if let Some(raw_url) = find_url(text) {
            self.run_url_workflow(chat_id, raw_url).await
        } else if is_search_request(text) {
            self.run_search_workflow(&conversation_id, text).await
        } else {
            self.run_chat_turn(&conversation_id, text).await
        };

        self.send(chat_id, &reply).await;
        self.remember(&conversation_id, text, &reply).await;
        WebhookOutcome::Ok
    }

    async fn run_url_workflow(&self, chat_id: i64, raw_url: &str) -> String {
        self.send(
            chat_id,
            &format!(
                "🏥 Healthcare Lead Discovery Agent\n\nProcessing: {}\n\n🔍 Starting 3-step workflow...",
                escape_html(raw_url)
            )
        ).await;

        match Url::parse(raw_url) {
            Ok(url) => format_automation_result(&self.automate(&url).await),
            Err(e) => format!("❌ Error processing {}: {}", escape_html(raw_url), e),
        }
    }

    async fn run_search_workflow(&self, conversation_id: &str, text: &str) -> String {
        let Some(search) = &self.search_client else {
            return NO_SEARCH_MESSAGE.to_string();
        };
        let request = SearchRequest::for_query(
            text,
            requested_result_count(text),
            self.settings.max_characters
        );
        let hits = match search.search(&request).await {
            Ok(hits) => hits,
            Err(e) => {
                error!("Provider search failed for '{}': {}", text, e);
                self.record_error();
                return SEARCH_ERROR_MESSAGE.to_string();
            }
        };
        if hits.is_empty() {
            return NO_RESULTS_MESSAGE.to_string();
        }

        let mut leads = Vec::with_capacity(hits.len());
        for hit in &hits {
            let lead = lead_from_hit(hit);
            let receipt = self.store_lead(&lead).await;
            self.stats.leads_processed.fetch_add(1, Ordering::Relaxed);
            leads.push((lead, receipt));
        }

        match self.summarize_with_llm(conversation_id, text, &hits).await {
            Some(summary) => summary,
            None => format_search_summary(&leads),
        }
    }

    async fn summarize_with_llm(
        &self,
        conversation_id: &str,
        text: &str,
        hits: &[SearchHit]
    ) -> Option<String> {
        let chat = self.chat_client.as_ref()?;
        let prompts = self.prompts().await;
        let injection = match prompt::get_search_results_prompt(&prompts, &format_hits_for_prompt(hits)) {
            Ok(p) => p,
            Err(e) => {
                warn!("Search results prompt unavailable: {}", e);
                return None;
            }
        };

        let mut messages = vec![LlmMessage::system(prompts.system_prompt.clone())];
        messages.extend(self.history_messages(conversation_id).await);
        messages.push(LlmMessage::user(text));
        messages.push(LlmMessage::system(injection));

        match chat.complete(&messages).await {
            Ok(resp) if looks_like_code(&resp.response) => {
                warn!("Model {} answered with code, using formatted summary", resp.model);
                None
            }
            Ok(resp) if resp.response.trim().is_empty() => None,
            Ok(resp) => Some(escape_html(resp.response.trim())),
            Err(e) => {
                warn!("Search summary failed, using formatted summary: {}", e);
                self.record_error();
                None
            }
        }
    }

    async fn run_chat_turn(&self, conversation_id: &str, text: &str) -> String {
        let Some(chat) = &self.chat_client else {
            return NO_LLM_MESSAGE.to_string();
        };
        let prompts = self.prompts().await;
        let mut messages = vec![LlmMessage::system(prompts.system_prompt.clone())];
        messages.extend(self.history_messages(conversation_id).await);
        messages.push(LlmMessage::user(text));

        match chat.complete(&messages).await {
            Ok(resp) if looks_like_code(&resp.response) || resp.response.trim().is_empty() => {
                warn!("Discarding unusable reply from {}", resp.model);
                NO_LLM_MESSAGE.to_string()
            }
            Ok(resp) => escape_html(resp.response.trim()),
            Err(e) => {
                error!("Chat completion failed: {}", e);
                self.record_error();
                LLM_ERROR_MESSAGE.to_string()
            }
        }
    }

    async fn history_messages(&self, conversation_id: &str) -> Vec<LlmMessage> {
        match
            self.history_store.get_conversation(
                conversation_id,
                self.settings.history_for_prompt_len
            ).await
        {
            Ok(conversation) =>
                conversation.messages
                    .into_iter()
                    .map(|m| {
                        if m.role == ROLE_ASSISTANT {
                            LlmMessage::assistant(m.content)
                        } else {
                            LlmMessage::user(m.content)
                        }
                    })
                    .collect(),
            Err(e) => {
                warn!("History read failed for {}: {}", conversation_id, e);
                Vec::new()
            }
        }
    }

    async fn remember(&self, conversation_id: &str, user_text: &str, reply: &str) {
        if let Err(e) = self.history_store.add_message(conversation_id, ROLE_USER, user_text).await {
            warn!("History write (user) failed: {}", e);
        }
        if let Err(e) = self.history_store.add_message(conversation_id, ROLE_ASSISTANT, reply).await {
            warn!("History write (assistant) failed: {}", e);
        }
    }

    pub async fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            exa_configured: self.search_client.is_some(),
            llm_configured: self.chat_client.is_some(),
            notion_configured: self.lead_store.is_some(),
            telegram_configured: self.messenger.is_some(),
            llm_extraction: self.settings.llm_extraction,
            model: self.chat_client.as_ref().map(|c| c.get_model()),
            notion_database_id: self.lead_store
                .as_ref()
                .map(|s| s.target())
                .unwrap_or_else(|| self.settings.notion_database_id.clone()),
            leads_processed: self.stats.leads_processed.load(Ordering::Relaxed),
            messages_handled: self.stats.messages_handled.load(Ordering::Relaxed),
            rate_limited: self.stats.rate_limited.load(Ordering::Relaxed),
            errors: self.stats.errors.load(Ordering::Relaxed),
            active_conversations: self.history_store.conversation_count().await,
            uptime_seconds: self.uptime_seconds(),
        }
    }

    /// Swaps in the prompt file when its modification time has advanced.
    pub async fn reload_prompts_if_changed(&self) -> Result<bool, Box<dyn Error + Send + Sync>> {
        let Some(path) = &self.settings.prompts_path else {
            return Ok(false);
        };
        let current = self.prompts().await;
        match prompt::reload_prompts_if_changed(path, &current)? {
            Some(new_config) => {
                *self.prompt_config.write().await = new_config;
                info!("Prompts successfully reloaded from {}", path);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Forgets expired rate limit windows and idle conversations.
    pub async fn prune_idle_state(&self) {
        self.rate_limiter.prune().await;
        let evicted = self.history_store.prune_idle(self.settings.history_idle).await;
        if evicted > 0 {
            info!("Evicted {} idle conversations", evicted);
        }
        debug!(
            "Tracking rate limits for {} chats, history for {}",
            self.rate_limiter.tracked_chats().await,
            self.history_store.conversation_count().await
        );
    }
}

/// Lowercased command name without any `@botname` suffix.
fn parse_command(text: &str) -> Option<String> {
    let first = text.split_whitespace().next()?;
    if !first.starts_with('/') {
        return None;
    }
    let name = first.split('@').next().unwrap_or(first);
    Some(name.to_lowercase())
}

fn find_url(text: &str) -> Option<&str> {
    URL_PATTERN.find(text).map(|m| m.as_str().trim_end_matches(['.', ',', ')', '!', '?', ';']))
}

fn is_search_request(text: &str) -> bool {
    SEARCH_PATTERN.is_match(text)
}

/// "find 5 dentists" -> 5, clamped to `1..=MAX_SEARCH_RESULTS`.
fn requested_result_count(text: &str) -> usize {
    COUNT_PATTERN.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<usize>().ok())
        .map(|n| n.clamp(1, MAX_SEARCH_RESULTS))
        .unwrap_or(DEFAULT_SEARCH_RESULTS)
}

fn lead_from_hit(hit: &SearchHit) -> Lead {
    let title = hit.title
        .as_deref()
        .and_then(|t| t.split(['|', '–']).next())
        .map(str::trim)
        .filter(|t| !t.is_empty());
    let company = match title {
        Some(t) => t.to_string(),
        None =>
            Url::parse(&hit.url)
                .map(|u| company_from_url(&u))
                .unwrap_or_else(|_| hit.url.clone()),
    };
    let content = format!(
        "{} {}",
        hit.title.as_deref().unwrap_or_default(),
        hit.text.as_deref().unwrap_or_default()
    );
    extract_lead(&content, &hit.url, &company, &ScoreWeights::SEARCH_RESULT)
}

fn format_hits_for_prompt(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            let text: String = hit.text
                .as_deref()
                .unwrap_or_default()
                .chars()
                .take(PROMPT_HIT_CHARS)
                .collect();
            format!(
                "[{}] {}\nURL: {}\n{}",
                i + 1,
                hit.title.as_deref().unwrap_or("Untitled"),
                hit.url,
                text.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn top_three(items: &[String]) -> String {
    if items.is_empty() {
        return "None found".to_string();
    }
    escape_html(&items.iter().take(3).cloned().collect::<Vec<_>>().join(", "))
}

fn format_automation_result(outcome: &AutomationOutcome) -> String {
    let lead = &outcome.lead;
    let stored_line = if outcome.storage.success {
        "✅ Lead stored successfully!"
    } else {
        "⚠️ Lead could not be stored in Notion."
    };
    format!(
        "✅ Healthcare Lead Discovery Complete!\n\n\
         🏥 Practice: {}\n\
         📍 Location: {}\n\
         💊 Treatments: {}\n\
         🔧 Services: {}\n\
         📊 Lead Score: {}/100\n\
         💾 Notion ID: {}\n\n\
         {}",
        escape_html(&lead.company),
        escape_html(lead.location.as_deref().unwrap_or("Unknown")),
        top_three(&lead.treatments),
        top_three(&lead.services),
        lead.lead_score,
        escape_html(&outcome.storage.lead_id),
        stored_line
    )
}

fn format_search_summary(leads: &[(Lead, StorageReceipt)]) -> String {
    let mut out = format!("🔍 Found {} healthcare provider(s):\n", leads.len());
    for (i, (lead, receipt)) in leads.iter().enumerate() {
        out.push_str(&format!("\n{}. <b>{}</b>\n", i + 1, escape_html(&lead.company)));
        if let Some(location) = &lead.location {
            out.push_str(&format!("📍 {}\n", escape_html(location)));
        }
        if let Some(phone) = &lead.phone {
            out.push_str(&format!("📞 {}\n", escape_html(phone)));
        }
        if let Some(email) = &lead.email {
            out.push_str(&format!("📧 {}\n", escape_html(email)));
        }
        if !lead.treatments.is_empty() {
            out.push_str(&format!("💊 {}\n", top_three(&lead.treatments)));
        }
        out.push_str(&format!("🌐 {}\n", escape_html(&lead.website)));
        out.push_str(&format!(
            "📊 Lead Score: {}/100 · 💾 {}\n",
            lead.lead_score,
            escape_html(&receipt.lead_id)
        ));
    }
    out
}
