pub mod exa;

use async_trait::async_trait;
use serde::{ Deserialize, Serialize };
use crate::error::ClientError;

pub use exa::ExaClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Neural,
    Auto,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub search_type: SearchType,
    pub num_results: usize,
    pub include_domains: Vec<String>,
    pub max_characters: usize,
}

impl SearchRequest {
    /// Neural search restricted to the practice's own domain.
    pub fn for_practice(company: &str, hostname: &str, num_results: usize, max_characters: usize) -> Self {
        Self {
            query: format!(
                "{} healthcare services treatments specializations contact information",
                company
            ),
            search_type: SearchType::Neural,
            num_results,
            include_domains: vec![hostname.to_string()],
            max_characters,
        }
    }

    /// Open web search for a free-text provider request from chat.
    pub fn for_query(query: &str, num_results: usize, max_characters: usize) -> Self {
        Self {
            query: query.to_string(),
            search_type: SearchType::Auto,
            num_results,
            include_domains: Vec::new(),
            max_characters,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: Option<String>,
    pub url: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, ClientError>;
}

/// Page text of every hit joined with single spaces.
pub fn joined_text(hits: &[SearchHit]) -> String {
    hits.iter()
        .filter_map(|h| h.text.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn practice_request_targets_domain() {
        let req = SearchRequest::for_practice("Glow Aesthetics", "glowaesthetics.com", 3, 4000);
        assert_eq!(
            req.query,
            "Glow Aesthetics healthcare services treatments specializations contact information"
        );
        assert_eq!(req.include_domains, vec!["glowaesthetics.com"]);
        assert_eq!(req.search_type, SearchType::Neural);
    }

    #[test]
    fn joins_non_empty_texts() {
        let hits = vec![
            SearchHit { title: None, url: "a".into(), text: Some(" first ".into()) },
            SearchHit { title: None, url: "b".into(), text: None },
            SearchHit { title: None, url: "c".into(), text: Some("second".into()) },
        ];
        assert_eq!(joined_text(&hits), "first second");
    }
}
