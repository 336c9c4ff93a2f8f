use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use concept_insight::config::{Config, Transport};
use concept_insight::logging::init_logging;
use concept_insight::mcp::handlers::RequestHandler;
use concept_insight::mcp::http;
use concept_insight::mcp::server::McpServer;
use concept_insight::slack::SlackClient;

/// MCP server exposing Slack search tools
#[derive(Parser, Debug)]
#[command(name = "concept-insight", version, about)]
struct Args {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, env = "INSIGHT_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides `server.transport` from the configuration
    #[arg(long, value_enum)]
    transport: Option<Transport>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let args = Args::parse();
    init_logging("warn")?;

    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(transport) = args.transport {
        config.server.transport = transport;
    }

    let slack = Arc::new(SlackClient::new(&config)?);
    let handler = RequestHandler::new(slack, &config);

    match config.server.transport {
        Transport::Stdio => {
            let server = McpServer::new(handler, true);

            tokio::select! {
                result = server.run_stdio() => {
                    if let Err(e) = result {
                        error!("MCP server error: {}", e);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutting down");
                }
            }
        }
        Transport::Http => {
            let server = Arc::new(McpServer::new(handler, false));
            let addr = format!("{}:{}", config.server.host, config.server.port);

            http::serve(server, &addr, &config.server.path, async {
                tokio::signal::ctrl_c().await.ok();
                info!("Shutting down");
            })
            .await?;
        }
    }

    Ok(())
}
