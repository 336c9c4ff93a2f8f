use crate::config::ResultFormat;
use crate::error::{McpError, McpResult};
use crate::mcp::types::{CallToolResult, ToolContent};
use serde_json::Value;

/// What a tool hands back before it is encoded for `tools/call`
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// Flat list of records (messages, users)
    Records(Vec<Value>),
    /// A plain sentence for the model
    Text(String),
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        ToolOutput::Text(text.into())
    }

    /// Encode for the wire in the configured result format
    pub fn into_call_result(self, format: ResultFormat) -> McpResult<CallToolResult> {
        let content = match (self, format) {
            (ToolOutput::Text(text), _) => ToolContent::text(text),
            (ToolOutput::Records(records), ResultFormat::Records) => ToolContent::Records(records),
            (ToolOutput::Records(records), ResultFormat::Text) => {
                ToolContent::text(serde_json::to_string_pretty(&records)?)
            }
        };

        Ok(CallToolResult {
            content: vec![content],
            is_error: false,
        })
    }
}

/// Tool failure reported in-band, as MCP expects
pub fn error_result(err: &McpError) -> CallToolResult {
    let text = match err {
        McpError::InvalidParameter(msg) | McpError::Internal(msg) => format!("Error: {}", msg),
        other => format!("Error: {}", other),
    };

    CallToolResult {
        content: vec![ToolContent::text(text)],
        is_error: true,
    }
}
