pub mod notion;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use crate::error::ClientError;
use crate::models::lead::Lead;

pub use notion::NotionStore;

/// Identifier and link of a record created in the external CRM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPage {
    pub id: String,
    pub url: Option<String>,
}

#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn store_lead(&self, lead: &Lead) -> Result<StoredPage, ClientError>;

    /// Database the leads are written to, shown on the status page.
    fn target(&self) -> String;
}

/// Outcome of a storage attempt. Failures still carry a synthetic id so
/// replies can reference the lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageReceipt {
    pub success: bool,
    pub lead_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StorageReceipt {
    pub fn stored(page: StoredPage) -> Self {
        Self {
            success: true,
            lead_id: page.id,
            url: page.url,
            error: None,
        }
    }

    pub fn fallback(error: impl Into<String>) -> Self {
        Self {
            success: false,
            lead_id: format!("fallback_{}", Utc::now().timestamp_millis()),
            url: None,
            error: Some(error.into()),
        }
    }
}
