use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;

use super::Messenger;
use crate::error::ClientError;
use crate::models::telegram::SendMessageRequest;

/// Telegram's limit on the length of a single message.
pub const MAX_MESSAGE_CHARS: usize = 4096;

pub struct TelegramClient {
    http: HttpClient,
    endpoint: String,
}

#[derive(Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramClient {
    pub fn new(bot_token: &str, base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/bot{}/sendMessage", base_url.trim_end_matches('/'), bot_token),
        })
    }
}

pub fn truncate_message(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(MAX_MESSAGE_CHARS - 1).collect();
    // a half entity or tag makes Telegram reject the whole message
    if let Some(amp) = out.rfind('&') {
        if !out[amp..].contains(';') {
            out.truncate(amp);
        }
    }
    if let Some(lt) = out.rfind('<') {
        if !out[lt..].contains('>') {
            out.truncate(lt);
        }
    }
    out.push('…');
    out
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_message(&self, chat_id: i64, html: &str) -> Result<(), ClientError> {
        let text = truncate_message(html);
        let req = SendMessageRequest {
            chat_id,
            text: &text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        debug!("Sending Telegram message to chat {}", chat_id);
        let resp = self.http.post(&self.endpoint).json(&req).send().await?;
        if !resp.status().is_success() {
            return Err(ClientError::from_response("Telegram", resp).await);
        }
        let body = resp.json::<TelegramResponse>().await?;
        if !body.ok {
            return Err(ClientError::Malformed(
                body.description.unwrap_or_else(|| "Telegram rejected the message".to_string())
            ));
        }
        Ok(())
    }
}
