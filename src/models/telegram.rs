use serde::{ Deserialize, Serialize };

/// Inbound webhook payload. Only the fields the agent reads are modelled.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelegramUpdate {
    #[serde(default)]
    pub update_id: Option<i64>,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
    #[serde(default)]
    pub edited_message: Option<TelegramMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramMessage {
    #[serde(default)]
    pub message_id: Option<i64>,
    pub chat: TelegramChat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

impl TelegramUpdate {
    /// Chat id and text of the message carried by this update, if it has any text.
    pub fn chat_text(&self) -> Option<(i64, &str)> {
        let message = self.message.as_ref().or(self.edited_message.as_ref())?;
        let text = message.text.as_deref()?.trim();
        if text.is_empty() {
            return None;
        }
        Some((message.chat.id, text))
    }
}

#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    pub parse_mode: &'a str,
    pub disable_web_page_preview: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_chat_and_text_from_message() {
        let update: TelegramUpdate = serde_json::from_str(
            r#"{"update_id": 1, "message": {"message_id": 7, "chat": {"id": 42, "type": "private"}, "text": " hi "}}"#
        ).unwrap();
        assert_eq!(update.chat_text(), Some((42, "hi")));
    }

    #[test]
    fn falls_back_to_edited_message() {
        let update: TelegramUpdate = serde_json::from_str(
            r#"{"edited_message": {"chat": {"id": 5}, "text": "/clear"}}"#
        ).unwrap();
        assert_eq!(update.chat_text(), Some((5, "/clear")));
    }

    #[test]
    fn updates_without_text_are_ignored() {
        let update: TelegramUpdate = serde_json::from_str(
            r#"{"message": {"chat": {"id": 5}, "sticker": {}}}"#
        ).unwrap();
        assert_eq!(update.chat_text(), None);
        assert_eq!(TelegramUpdate::default().chat_text(), None);
    }
}
