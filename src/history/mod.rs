mod memory;
use async_trait::async_trait;
use log::info;
use std::error::Error;
use crate::cli::Args;
use std::sync::Arc;
use std::time::Duration;
use crate::models::chat::Conversation;

pub use memory::MemoryHistoryStore;

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn add_message(
        &self,
        conversation_id: &str,
        role: &str,
        content: &str
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// The most recent `limit` messages, oldest first.
    async fn get_conversation(
        &self,
        conversation_id: &str,
        limit: usize
    ) -> Result<Conversation, Box<dyn Error + Send + Sync>>;

    async fn clear(&self, conversation_id: &str) -> Result<(), Box<dyn Error + Send + Sync>>;

    async fn conversation_count(&self) -> usize;

    /// Forgets conversations with no message in the last `max_idle`; returns how many.
    async fn prune_idle(&self, max_idle: Duration) -> usize;
}

pub fn initialize_history_store(args: &Args) -> Arc<dyn HistoryStore> {
    info!(
        "Chat history kept in memory, capped at {} messages per conversation",
        args.history_max_messages
    );
    Arc::new(MemoryHistoryStore::new(args.history_max_messages))
}
