use thiserror::Error;

/// Failure of an outbound call to one of the hosted APIs.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} API returned {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{0} credential is not configured")]
    MissingCredential(&'static str),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

impl ClientError {
    /// Reads the body of a non-success response into an `Api` error.
    pub async fn from_response(service: &'static str, resp: reqwest::Response) -> Self {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        ClientError::Api { service, status, body }
    }
}
