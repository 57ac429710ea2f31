//! dify-chat - terminal chat panel for a Dify procurement assistant
//!
//! Sends each query to a Dify chat-messages endpoint, keeps the conversation
//! going via conversation_id, and highlights recommended category codes.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt};

use dify_chat::config::{self, ClientConfig, Config, DEFAULT_ENDPOINT, DEFAULT_USER};
use dify_chat::repl::{self, colors};
use dify_chat::{ConversationClient, panel};

#[derive(Parser)]
#[command(name = "dify-chat")]
#[command(about = "Chat with a Dify procurement category assistant")]
struct Args {
    /// Dify app API key
    #[arg(long, env = "DIFY_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Chat-messages endpoint URL
    #[arg(long, env = "DIFY_ENDPOINT")]
    endpoint: Option<String>,

    /// End-user identifier sent with each query
    #[arg(long, env = "DIFY_USER")]
    user: Option<String>,

    /// Continue an existing conversation
    #[arg(long)]
    conversation_id: Option<String>,

    /// Send a single query, print the reply and exit
    #[arg(long, short = 'a')]
    ask: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (from ~/.dify-chat/.env or current dir)
    let env_path = Some(config::data_dir().join(".env")).filter(|p| p.exists());
    if let Some(path) = env_path {
        let _ = dotenvy::from_path(&path);
    } else {
        let _ = dotenvy::dotenv();
    }

    // Logs go to stderr so they don't interleave with the panel
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let file_config = Config::load();

    // Resolve values: CLI args > env vars (handled by clap) > config file > defaults
    let api_key = args
        .api_key
        .or(file_config.api_key)
        .filter(|k| !k.trim().is_empty())
        .context("DIFY_API_KEY required (set via --api-key, env var, or ~/.dify-chat/config.toml)")?;

    let endpoint = args
        .endpoint
        .or(file_config.endpoint)
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    if endpoint.trim().is_empty() {
        anyhow::bail!("Endpoint must not be empty");
    }

    let user = args
        .user
        .or(file_config.user)
        .unwrap_or_else(|| DEFAULT_USER.to_string());

    let client_config = ClientConfig::new(api_key, endpoint);
    tracing::debug!(config = ?client_config, user = %user, "Resolved configuration");

    let client = Arc::new(ConversationClient::new(client_config).with_user(user));
    if let Some(id) = args.conversation_id {
        client.set_conversation_id(Some(id));
    }

    if let Some(query) = args.ask {
        return ask_once(&client, &query).await;
    }

    let config = client.config();
    println!();
    println!("{}", colors::banner_line("Endpoint", &config.endpoint));
    println!("{}", colors::banner_line("API key", &config.redacted_key()));
    println!(
        "{}",
        colors::banner_line(
            "Session",
            &client
                .get_conversation_id()
                .unwrap_or_else(|| "new".to_string())
        )
    );
    println!("{}", colors::status("Type /help for commands, Ctrl+D to exit"));
    println!();

    repl::run(client).await
}

/// One-shot mode: print the answer, then any category codes
async fn ask_once(client: &ConversationClient, query: &str) -> Result<()> {
    let response = client
        .send_message(query)
        .await
        .map_err(|e| anyhow::anyhow!(panel::error_reply(&e.to_string())))?;

    println!("{}", response.answer);
    if response.has_categories() {
        let codes = response.category_codes();
        if !codes.is_empty() {
            println!();
            println!("品类编码: {}", codes.join(", "));
        }
    }
    if let Some(id) = client.get_conversation_id() {
        tracing::info!(conversation_id = %id, "Conversation established");
    }
    Ok(())
}
