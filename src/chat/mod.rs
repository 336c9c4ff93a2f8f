//! Command-line chat client for a local LLM with MCP tool support

pub mod commands;
pub mod error;
pub mod mcp_client;
pub mod ollama;
pub mod repl;
pub mod result;
pub mod session;
pub mod types;

pub use error::{ChatError, ChatResult};
pub use mcp_client::{McpToolClient, ToolInvoker};
pub use ollama::{ChatModel, OllamaClient};
pub use session::ChatSession;
pub use types::{Message, Role, ToolCall, ToolDefinition};
