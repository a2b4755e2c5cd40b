pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod history;
pub mod llm;
pub mod messaging;
pub mod models;
pub mod ratelimit;
pub mod search;
pub mod server;
pub mod storage;

use agent::LeadAgent;
use cli::Args;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

fn availability(configured: bool) -> &'static str {
    if configured { "✅ Available" } else { "❌ Missing (fallback)" }
}

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = args.listen_addr();

    info!("--- Healthcare Lead Discovery Agent ---");
    info!("Server Address: {}", addr);
    info!("Workflow: Telegram → Exa Search → Notion → Telegram Output");
    info!("Exa API: {}", availability(args.exa_key().is_some()));
    info!("Chat LLM ({}): {}", args.chat_llm_type, availability(args.chat_key().is_some()));
    info!("Chat Model: {}", args.chat_model);
    info!("LLM Extraction: {}", args.llm_extraction);
    info!("Notion: {}", availability(args.notion_key().is_some()));
    info!("Notion DB: {}", args.notion_database_id);
    info!("Telegram Bot: {}", availability(args.telegram_key().is_some()));
    info!(
        "Rate Limit: {} messages per {}s per chat",
        args.rate_limit_max,
        args.rate_limit_window_secs
    );
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("built-in"));
    info!("TLS Enabled: {}", args.enable_tls);
    info!("---------------------------------------");

    let agent = Arc::new(LeadAgent::new(&args)?);
    let server = Server::new(addr, agent, args);
    server.run().await?;

    Ok(())
}
