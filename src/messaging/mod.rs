pub mod telegram;

use async_trait::async_trait;
use crate::error::ClientError;

pub use telegram::TelegramClient;

#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends an HTML formatted message to a chat.
    async fn send_message(&self, chat_id: i64, html: &str) -> Result<(), ClientError>;
}

/// Escapes text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(escape_html("Smith & Sons <Dental>"), "Smith &amp; Sons &lt;Dental&gt;");
        assert_eq!(escape_html("plain"), "plain");
    }
}
