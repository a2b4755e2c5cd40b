use async_trait::async_trait;
use log::debug;
use reqwest::{Client as HttpClient, header::{HeaderMap, HeaderValue, CONTENT_TYPE}};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{SearchClient, SearchHit, SearchRequest, SearchType};
use crate::error::ClientError;

pub struct ExaClient {
    http: HttpClient,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExaSearchRequest<'a> {
    query: &'a str,
    #[serde(rename = "type")]
    search_type: SearchType,
    use_autoprompt: bool,
    num_results: usize,
    #[serde(skip_serializing_if = "no_domains")]
    include_domains: &'a [String],
    contents: ExaContents,
}

fn no_domains(domains: &&[String]) -> bool {
    domains.is_empty()
}

#[derive(Serialize)]
struct ExaContents {
    text: ExaTextOptions,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExaTextOptions {
    max_characters: usize,
    include_html_tags: bool,
}

#[derive(Deserialize)]
struct ExaSearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

impl ExaClient {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-api-key", HeaderValue::from_str(api_key)?);

        let http = HttpClient::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SearchClient for ExaClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, ClientError> {
        let url = format!("{}/search", self.base_url);
        let body = ExaSearchRequest {
            query: &request.query,
            search_type: request.search_type,
            use_autoprompt: true,
            num_results: request.num_results,
            include_domains: &request.include_domains,
            contents: ExaContents {
                text: ExaTextOptions {
                    max_characters: request.max_characters,
                    include_html_tags: false,
                },
            },
        };

        debug!("Exa search: '{}' ({} results)", request.query, request.num_results);
        let resp = self.http.post(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(ClientError::from_response("Exa", resp).await);
        }
        let parsed = resp.json::<ExaSearchResponse>().await?;
        Ok(parsed.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sends_practice_search_and_parses_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("x-api-key", "exa-key"))
            .and(body_json(json!({
                "query": "Glow healthcare services treatments specializations contact information",
                "type": "neural",
                "useAutoprompt": true,
                "numResults": 3,
                "includeDomains": ["glow.com"],
                "contents": {"text": {"maxCharacters": 4000, "includeHtmlTags": false}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"id": "1", "title": "Glow", "url": "https://glow.com/", "text": "We offer botox."},
                    {"id": "2", "url": "https://glow.com/contact"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ExaClient::new("exa-key", &server.uri(), Duration::from_secs(5)).unwrap();
        let hits = client
            .search(&SearchRequest::for_practice("Glow", "glow.com", 3, 4000))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title.as_deref(), Some("Glow"));
        assert_eq!(hits[0].text.as_deref(), Some("We offer botox."));
        assert_eq!(hits[1].text, None);
    }

    #[tokio::test]
    async fn open_queries_omit_domain_filter() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(body_json(json!({
                "query": "Find 1 cosmetic clinic in Amsterdam",
                "type": "auto",
                "useAutoprompt": true,
                "numResults": 1,
                "contents": {"text": {"maxCharacters": 2000, "includeHtmlTags": false}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ExaClient::new("exa-key", &server.uri(), Duration::from_secs(5)).unwrap();
        let hits = client
            .search(&SearchRequest::for_query("Find 1 cosmetic clinic in Amsterdam", 1, 2000))
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn api_errors_are_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let client = ExaClient::new("bad", &server.uri(), Duration::from_secs(5)).unwrap();
        let err = client
            .search(&SearchRequest::for_query("dentist", 3, 2000))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Api { service: "Exa", status: 401, .. }));
    }
}
