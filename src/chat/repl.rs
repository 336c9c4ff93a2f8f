use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use super::commands::{Command, parse_command};
use super::session::ChatSession;
use super::types::ToolDefinition;

pub fn write_tool_list<W: Write>(out: &mut W, tools: &[ToolDefinition]) -> std::io::Result<()> {
    if tools.is_empty() {
        return writeln!(out, "No MCP tools available");
    }

    writeln!(out, "Available MCP tools:")?;
    for tool in tools {
        writeln!(out, "  - {}: {}", tool.name(), tool.description())?;
    }
    Ok(())
}

/// `current` marks the active model
pub fn write_model_list<W: Write>(
    out: &mut W,
    models: &[String],
    current: Option<&str>,
) -> std::io::Result<()> {
    writeln!(out, "Available models:")?;
    for model in models {
        if current == Some(model.as_str()) {
            writeln!(out, "  * {} (current)", model)?;
        } else {
            writeln!(out, "  - {}", model)?;
        }
    }
    Ok(())
}

pub fn write_banner<W: Write>(
    out: &mut W,
    ollama_url: &str,
    mcp_url: Option<&str>,
    session: &ChatSession,
) -> std::io::Result<()> {
    writeln!(out, "Ollama CLI Chat with MCP Integration")?;
    writeln!(out, "Connected to Ollama: {}", ollama_url)?;
    if let Some(mcp_url) = mcp_url {
        writeln!(
            out,
            "Connected to MCP: {} ({} tools available)",
            mcp_url,
            session.tool_definitions().len()
        )?;
    }
    writeln!(out, "Using model: {}", session.model())?;
    writeln!(out, "Type 'quit', 'exit', or press Ctrl+C to exit")?;
    writeln!(out, "Type '/clear' to clear conversation history")?;
    writeln!(out, "Type '/models' to list available models")?;
    writeln!(out, "Type '/tools' to list available MCP tools")?;
    writeln!(out, "Type '/model <name>' to switch models")?;
    writeln!(out, "---")
}

/// Read lines until `quit`/`exit` or end of input. Exchange failures are
/// printed and the conversation stays as it was before the failed turn.
pub async fn run_interactive<R, W>(
    session: &mut ChatSession,
    reader: R,
    out: &mut W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = reader.lines();

    loop {
        write!(out, "\n> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_command(&line) {
            Command::Empty => continue,
            Command::Quit => {
                writeln!(out, "Goodbye!")?;
                break;
            }
            Command::Clear => {
                session.clear();
                writeln!(out, "Conversation cleared.")?;
            }
            Command::ListModels => match session.list_models().await {
                Ok(models) => write_model_list(out, &models, Some(session.model()))?,
                Err(e) => writeln!(out, "Error listing models: {}", e)?,
            },
            Command::ListTools => write_tool_list(out, session.tool_definitions())?,
            Command::SwitchModel(model) => {
                session.set_model(model);
                writeln!(out, "Switched to model: {}", session.model())?;
            }
            Command::ModelUsage => writeln!(out, "Usage: /model <model_name>")?,
            Command::Chat(input) => {
                write!(out, "Processing...")?;
                out.flush()?;

                let result = session.send(&input).await;
                write!(out, "\r{}\r", " ".repeat(15))?;

                match result {
                    Ok(reply) if !reply.is_empty() => writeln!(out, "Assistant: {}", reply)?,
                    Ok(_) => debug!("Model returned an empty reply"),
                    Err(e) => writeln!(out, "\nError: {}", e)?,
                }
            }
        }
    }

    Ok(())
}
