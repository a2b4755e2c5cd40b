use async_trait::async_trait;
use crate::models::chat::{ ChatMessage, Conversation };
use crate::history::HistoryStore;
use std::collections::{ HashMap, VecDeque };
use std::error::Error;
use std::time::Duration;
use chrono::Utc;
use tokio::sync::Mutex;

/// Per-chat message log living only in process memory. Each conversation
/// keeps at most `max_messages`, evicting the oldest first.
pub struct MemoryHistoryStore {
    max_messages: usize,
    conversations: Mutex<HashMap<String, VecDeque<ChatMessage>>>,
}

impl MemoryHistoryStore {
    pub fn new(max_messages: usize) -> Self {
        Self {
            max_messages,
            conversations: Mutex::new(HashMap::new()),
        }
    }

    /// Drops conversations whose latest message is older than `cutoff` (unix seconds).
    async fn evict_before(&self, cutoff: i64) -> usize {
        let mut conversations = self.conversations.lock().await;
        let before = conversations.len();
        conversations.retain(|_, messages| {
            messages.back().map(|last| last.timestamp >= cutoff).unwrap_or(false)
        });
        before - conversations.len()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn add_message(
        &self,
        conversation_id: &str,
        role: &str,
        content: &str
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut conversations = self.conversations.lock().await;
        let messages = conversations.entry(conversation_id.to_string()).or_default();
        messages.push_back(ChatMessage {
            role: role.to_string(),
            content: content.to_string(),
            timestamp: Utc::now().timestamp(),
        });
        while messages.len() > self.max_messages {
            messages.pop_front();
        }
        Ok(())
    }

    async fn get_conversation(
        &self,
        conversation_id: &str,
        limit: usize
    ) -> Result<Conversation, Box<dyn Error + Send + Sync>> {
        let conversations = self.conversations.lock().await;
        let messages = conversations
            .get(conversation_id)
            .map(|stored| {
                let skip = stored.len().saturating_sub(limit);
                stored.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default();

        Ok(Conversation {
            id: conversation_id.to_string(),
            messages,
        })
    }

    async fn clear(&self, conversation_id: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.conversations.lock().await.remove(conversation_id);
        Ok(())
    }

    async fn conversation_count(&self) -> usize {
        self.conversations.lock().await.len()
    }

    async fn prune_idle(&self, max_idle: Duration) -> usize {
        let idle_secs = i64::try_from(max_idle.as_secs()).unwrap_or(i64::MAX);
        self.evict_before(Utc::now().timestamp().saturating_sub(idle_secs)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn conversation_never_exceeds_cap() {
        let store = MemoryHistoryStore::new(20);
        for i in 0..35 {
            store.add_message("chat-1", "user", &format!("question {}", i)).await.unwrap();
            store.add_message("chat-1", "assistant", &format!("answer {}", i)).await.unwrap();
        }
        let conversation = store.get_conversation("chat-1", usize::MAX).await.unwrap();
        assert_eq!(conversation.messages.len(), 20);
        assert_eq!(conversation.messages[0].content, "question 25");
        assert_eq!(conversation.messages[19].content, "answer 34");
    }

    #[tokio::test]
    async fn limit_returns_most_recent_in_order() {
        let store = MemoryHistoryStore::new(20);
        for i in 0..5 {
            store.add_message("c", "user", &i.to_string()).await.unwrap();
        }
        let conversation = store.get_conversation("c", 2).await.unwrap();
        let contents: Vec<_> = conversation.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["3", "4"]);
    }

    #[tokio::test]
    async fn clear_drops_only_that_chat() {
        let store = MemoryHistoryStore::new(20);
        store.add_message("a", "user", "hi").await.unwrap();
        store.add_message("b", "user", "hello").await.unwrap();
        store.clear("a").await.unwrap();
        assert!(store.get_conversation("a", 10).await.unwrap().messages.is_empty());
        assert_eq!(store.get_conversation("b", 10).await.unwrap().messages.len(), 1);
        assert_eq!(store.conversation_count().await, 1);
    }

    #[tokio::test]
    async fn idle_conversations_are_evicted() {
        let store = MemoryHistoryStore::new(20);
        store.add_message("old", "user", "hi").await.unwrap();
        store.add_message("new", "user", "hello").await.unwrap();
        {
            let mut conversations = store.conversations.lock().await;
            for message in conversations.get_mut("old").unwrap().iter_mut() {
                message.timestamp -= 7200;
            }
        }

        assert_eq!(store.prune_idle(Duration::from_secs(3600)).await, 1);
        assert_eq!(store.conversation_count().await, 1);
        assert_eq!(store.get_conversation("new", 10).await.unwrap().messages.len(), 1);
        assert_eq!(store.prune_idle(Duration::from_secs(3600)).await, 0);
    }
}
