use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tracing::warn;

use concept_insight::chat::mcp_client::DEFAULT_MCP_URL;
use concept_insight::chat::ollama::{DEFAULT_MODEL, DEFAULT_OLLAMA_URL};
use concept_insight::chat::repl::{run_interactive, write_banner, write_model_list, write_tool_list};
use concept_insight::chat::session::DEFAULT_MAX_TOOL_ROUNDS;
use concept_insight::chat::{ChatModel, ChatSession, McpToolClient, OllamaClient};
use concept_insight::logging::init_logging;

/// Chat with a local Ollama model, letting it call MCP tools
#[derive(Parser, Debug)]
#[command(name = "local-chat", version, about, long_about = None)]
struct Cli {
    /// Ollama model to use
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Ollama server URL
    #[arg(long, default_value = DEFAULT_OLLAMA_URL)]
    url: String,

    /// MCP server URL (empty to disable)
    #[arg(long, default_value = DEFAULT_MCP_URL)]
    mcp: String,

    /// List available models
    #[arg(long)]
    list: bool,

    /// List available MCP tools
    #[arg(long)]
    tools: bool,

    /// Send a single message and exit
    #[arg(long)]
    message: Option<String>,

    /// Enable debug output
    #[arg(long)]
    debug: bool,

    /// LLM request timeout in seconds
    #[arg(long, default_value_t = 300)]
    timeout: u64,

    /// MCP request timeout in seconds
    #[arg(long, default_value_t = 60)]
    tool_timeout: u64,

    /// Tool rounds allowed per message
    #[arg(long, default_value_t = DEFAULT_MAX_TOOL_ROUNDS)]
    max_tool_rounds: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_logging(if cli.debug { "debug" } else { "warn" })?;

    let llm = Arc::new(OllamaClient::new(
        &cli.url,
        Duration::from_secs(cli.timeout),
    )?);
    let mut session = ChatSession::new(llm.clone(), cli.model.clone())
        .with_max_tool_rounds(cli.max_tool_rounds)
        .with_tool_observer(|name, _| println!("Using tool: {}", name));

    let mcp_url = Some(cli.mcp.as_str()).filter(|url| !url.trim().is_empty());
    if let Some(url) = mcp_url {
        println!("Loading MCP tools from {}...", url);
        let client = McpToolClient::new(url, Duration::from_secs(cli.tool_timeout))?;

        match client.discover_tools().await {
            Ok(definitions) => {
                println!("Loaded {} MCP tools", definitions.len());
                session = session.with_tools(Arc::new(client), definitions);
            }
            Err(e) => {
                warn!("Tool discovery failed: {}", e);
                println!("Warning: Could not load MCP tools: {}", e);
                println!("Continuing without MCP integration...");
            }
        }
    }

    let mut stdout = std::io::stdout();

    if cli.tools {
        write_tool_list(&mut stdout, session.tool_definitions())?;
        return Ok(());
    }

    if cli.list {
        let models = llm.list_models().await.context("Error listing models")?;
        write_model_list(&mut stdout, &models, None)?;
        return Ok(());
    }

    if let Some(message) = cli.message.filter(|m| !m.is_empty()) {
        let reply = session.send(&message).await?;
        writeln!(stdout, "{}", reply)?;
        return Ok(());
    }

    write_banner(&mut stdout, &cli.url, mcp_url, &session)?;
    run_interactive(&mut session, BufReader::new(tokio::io::stdin()), &mut stdout).await?;

    Ok(())
}
