use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use super::error::{ChatError, ChatResult};
use super::result::render_content;
use super::types::ToolDefinition;
use crate::mcp::types::{JsonRpcRequest, JsonRpcResponse, ListToolsResult};

pub const DEFAULT_MCP_URL: &str = "http://localhost:8080";
pub const MCP_PATH: &str = "/mcp";

/// Executes a tool by name and returns its rendered text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn invoke(&self, name: &str, arguments: Map<String, Value>) -> ChatResult<String>;
}

/// `tools/call` result as sent by arbitrary servers; `content` is left
/// untyped so every known shape can be tried
#[derive(Debug, Deserialize)]
struct RawCallResult {
    #[serde(default)]
    content: Value,
    #[serde(default, rename = "isError")]
    is_error: bool,
}

/// JSON-RPC client for an MCP server's HTTP endpoint
pub struct McpToolClient {
    client: Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl McpToolClient {
    /// `base_url` is the server root; requests go to `<base_url>/mcp`
    pub fn new(base_url: &str, timeout: Duration) -> ChatResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), MCP_PATH),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn rpc(&self, method: &str, params: Option<Value>) -> ChatResult<JsonRpcResponse> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, method, params);

        debug!(
            "MCP request to {}: {}",
            self.endpoint,
            serde_json::to_string(&request).unwrap_or_default()
        );
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("MCP response status: {}", status.as_u16());
        debug!("MCP response body: {}", body);

        match serde_json::from_str::<JsonRpcResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(ChatError::Connection(format!(
                "MCP server error (status {}): {}",
                status.as_u16(),
                body
            ))),
            Err(e) => Err(ChatError::Protocol(format!(
                "invalid JSON-RPC response: {}",
                e
            ))),
        }
    }

    /// Fetch the server's tools in the model's function-calling format
    pub async fn discover_tools(&self) -> ChatResult<Vec<ToolDefinition>> {
        let response = self.rpc("tools/list", Some(json!({}))).await?;

        if let Some(error) = response.error {
            return Err(ChatError::Protocol(format!(
                "tools/list failed ({}): {}",
                error.code, error.message
            )));
        }

        let result = response
            .result
            .ok_or_else(|| ChatError::Protocol("tools/list returned no result".to_string()))?;
        let list: ListToolsResult = serde_json::from_value(result)
            .map_err(|e| ChatError::Protocol(format!("invalid tools/list result: {}", e)))?;

        debug!("Discovered {} MCP tools", list.tools.len());
        Ok(list.tools.into_iter().map(ToolDefinition::from).collect())
    }
}

#[async_trait]
impl ToolInvoker for McpToolClient {
    async fn invoke(&self, name: &str, arguments: Map<String, Value>) -> ChatResult<String> {
        let params = json!({"name": name, "arguments": arguments});
        let response = self.rpc("tools/call", Some(params)).await?;

        if let Some(error) = response.error {
            return Err(ChatError::ToolExecution(format!(
                "{} ({})",
                error.message, error.code
            )));
        }

        let result = response
            .result
            .ok_or_else(|| ChatError::Protocol("tools/call returned no result".to_string()))?;
        let call: RawCallResult = serde_json::from_value(result)
            .map_err(|e| ChatError::Protocol(format!("invalid tools/call result: {}", e)))?;

        debug!("Tool {} content: {}", name, call.content);
        let text = render_content(&call.content);
        if call.is_error {
            return Err(ChatError::ToolExecution(text));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_appends_mcp_path() {
        let client = McpToolClient::new("http://localhost:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/mcp");
    }

    #[test]
    fn test_raw_call_result_defaults() {
        let raw: RawCallResult = serde_json::from_value(json!({})).unwrap();
        assert!(!raw.is_error);
        assert!(raw.content.is_null());
    }
}
