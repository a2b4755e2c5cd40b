use async_trait::async_trait;
use log::debug;
use reqwest::{Client as HttpClient, header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION}};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::time::Duration;

use super::{LeadStore, StoredPage};
use crate::error::ClientError;
use crate::models::lead::Lead;

pub const NOTION_VERSION: &str = "2022-06-28";
/// Notion rejects rich text blocks longer than this.
const MAX_RICH_TEXT: usize = 2000;

pub struct NotionStore {
    http: HttpClient,
    base_url: String,
    database_id: String,
}

#[derive(Deserialize)]
struct PageResponse {
    id: String,
    #[serde(default)]
    url: Option<String>,
}

impl NotionStore {
    pub fn new(
        token: &str,
        database_id: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", token))?);
        headers.insert("Notion-Version", HeaderValue::from_static(NOTION_VERSION));

        let http = HttpClient::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            database_id: database_id.to_string(),
        })
    }
}

fn rich_text(content: &str) -> JsonValue {
    let truncated: String = content.chars().take(MAX_RICH_TEXT).collect();
    json!([{ "text": { "content": truncated } }])
}

/// Page creation payload mapping a lead onto the leads database columns.
pub fn page_payload(database_id: &str, lead: &Lead) -> JsonValue {
    json!({
        "parent": { "database_id": database_id },
        "properties": {
            "Company": { "title": rich_text(&lead.company) },
            "Services": { "rich_text": rich_text(&lead.services.join(", ")) },
            "Treatments": { "rich_text": rich_text(&lead.treatments.join(", ")) },
            "Lead Score": { "number": lead.lead_score },
            "Location": { "rich_text": rich_text(lead.location.as_deref().unwrap_or("Unknown")) },
            "Website": { "url": lead.website },
            "Phone": { "phone_number": lead.phone },
            "Email": { "email": lead.email }
        }
    })
}

#[async_trait]
impl LeadStore for NotionStore {
    async fn store_lead(&self, lead: &Lead) -> Result<StoredPage, ClientError> {
        let url = format!("{}/v1/pages", self.base_url);
        debug!("Creating Notion page for {}", lead.company);

        let resp = self.http
            .post(&url)
            .json(&page_payload(&self.database_id, lead))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ClientError::from_response("Notion", resp).await);
        }

        let page = resp.json::<PageResponse>().await?;
        Ok(StoredPage { id: page.id, url: page.url })
    }

    fn target(&self) -> String {
        self.database_id.clone()
    }
}
