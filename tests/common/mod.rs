#![allow(dead_code)]

use async_trait::async_trait;
use lead_discovery_agent::agent::{ AgentParts, AgentSettings, LeadAgent };
use lead_discovery_agent::error::ClientError;
use lead_discovery_agent::llm::chat::{ ChatClient, CompletionResponse, LlmMessage };
use lead_discovery_agent::messaging::Messenger;
use lead_discovery_agent::models::lead::Lead;
use lead_discovery_agent::search::{ SearchClient, SearchHit, SearchRequest };
use lead_discovery_agent::storage::{ LeadStore, StoredPage };
use std::sync::{ Arc, Mutex };

pub const CLINIC_TEXT: &str = "Glow Aesthetics offers cosmetic procedures in a calm setting. \
    We offer botox, dermal fillers and laser therapy. Our services include chemical peels. \
    We are located in Austin, Texas. Call (512) 555-0187 or email hello@glowaesthetics.com.";

pub fn hit(title: &str, url: &str, text: &str) -> SearchHit {
    SearchHit {
        title: Some(title.to_string()),
        url: url.to_string(),
        text: Some(text.to_string()),
    }
}

/// Search client returning canned hits and recording each request.
pub struct MockSearch {
    hits: Vec<SearchHit>,
    fail: bool,
    pub requests: Mutex<Vec<SearchRequest>>,
}

impl MockSearch {
    pub fn returning(hits: Vec<SearchHit>) -> Arc<Self> {
        Arc::new(Self { hits, fail: false, requests: Mutex::new(Vec::new()) })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { hits: Vec::new(), fail: true, requests: Mutex::new(Vec::new()) })
    }
}

#[async_trait]
impl SearchClient for MockSearch {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, ClientError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(ClientError::Api { service: "Exa", status: 500, body: "boom".into() });
        }
        Ok(self.hits.iter().take(request.num_results).cloned().collect())
    }
}

pub struct MockChat {
    reply: Option<String>,
    pub calls: Mutex<Vec<Vec<LlmMessage>>>,
}

impl MockChat {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self { reply: Some(reply.to_string()), calls: Mutex::new(Vec::new()) })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { reply: None, calls: Mutex::new(Vec::new()) })
    }
}

#[async_trait]
impl ChatClient for MockChat {
    async fn complete(&self, messages: &[LlmMessage]) -> Result<CompletionResponse, ClientError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        match &self.reply {
            Some(reply) => Ok(CompletionResponse { response: reply.clone(), model: self.get_model() }),
            None => Err(ClientError::Malformed("no choices".into())),
        }
    }

    fn get_model(&self) -> String {
        "mock/model".to_string()
    }
}

pub struct MockStore {
    fail: bool,
    pub stored: Mutex<Vec<Lead>>,
}

impl MockStore {
    pub fn working() -> Arc<Self> {
        Arc::new(Self { fail: false, stored: Mutex::new(Vec::new()) })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { fail: true, stored: Mutex::new(Vec::new()) })
    }
}

#[async_trait]
impl LeadStore for MockStore {
    async fn store_lead(&self, lead: &Lead) -> Result<StoredPage, ClientError> {
        if self.fail {
            return Err(ClientError::Api { service: "Notion", status: 400, body: "validation_error".into() });
        }
        let mut stored = self.stored.lock().unwrap();
        stored.push(lead.clone());
        Ok(StoredPage {
            id: format!("page-{}", stored.len()),
            url: Some(format!("https://www.notion.so/page-{}", stored.len())),
        })
    }

    fn target(&self) -> String {
        "mock-db".to_string()
    }
}

#[derive(Default)]
pub struct MockMessenger {
    pub sent: Mutex<Vec<(i64, String)>>,
}

impl MockMessenger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, text)| text.clone()).collect()
    }

    pub fn last(&self) -> Option<String> {
        self.messages().pop()
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send_message(&self, chat_id: i64, html: &str) -> Result<(), ClientError> {
        self.sent.lock().unwrap().push((chat_id, html.to_string()));
        Ok(())
    }
}

pub fn build_agent(parts: AgentParts) -> Arc<LeadAgent> {
    Arc::new(LeadAgent::from_parts(parts, AgentSettings::default()))
}
