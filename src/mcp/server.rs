use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::handlers::RequestHandler;
use super::types::*;

pub const SERVER_NAME: &str = "concept-insight";

pub struct McpServer {
    handler: Arc<RequestHandler>,
    initialized: Arc<RwLock<bool>>,
    require_initialize: bool,
}

impl McpServer {
    /// `require_initialize` gates `tools/*` behind the `initialize`
    /// handshake; stateless HTTP clients skip it
    pub fn new(handler: RequestHandler, require_initialize: bool) -> Self {
        Self {
            handler: Arc::new(handler),
            initialized: Arc::new(RwLock::new(false)),
            require_initialize,
        }
    }

    /// Serve newline-delimited JSON-RPC over stdin/stdout
    pub async fn run_stdio(&self) -> Result<()> {
        info!("Serving MCP over stdio");
        self.serve_lines(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    pub async fn serve_lines<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buffer = String::new();

        loop {
            buffer.clear();

            match reader.read_line(&mut buffer).await {
                Ok(0) => break,
                Ok(_) => {
                    let trimmed = buffer.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    let response = match self.process_request(trimmed).await {
                        Ok(Some(response)) => response,
                        Ok(None) => continue,
                        Err(e) => {
                            error!("Error processing request: {}", e);
                            JsonRpcResponse::error(None, JsonRpcError::internal_error(e.to_string()))
                        }
                    };

                    let response_str = serde_json::to_string(&response)?;
                    writer.write_all(response_str.as_bytes()).await?;
                    writer.write_all(b"\n").await?;
                    writer.flush().await?;
                }
                Err(e) => {
                    error!("Error reading from stdin: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }

    pub async fn process_request(&self, input: &str) -> Result<Option<JsonRpcResponse>> {
        match Self::parse_request(input) {
            Ok(request) => self.dispatch(request).await,
            Err(response) => Ok(Some(response)),
        }
    }

    /// Parse and validate the envelope; failures come back as ready-made
    /// error responses
    pub fn parse_request(input: &str) -> std::result::Result<JsonRpcRequest, JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(input) {
            Ok(req) => req,
            Err(e) => {
                warn!("Failed to parse request: {}", e);
                return Err(JsonRpcResponse::error(None, JsonRpcError::parse_error()));
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Err(JsonRpcResponse::error(
                request.id.clone(),
                JsonRpcError::invalid_request(),
            ));
        }

        Ok(request)
    }

    pub async fn dispatch(&self, request: JsonRpcRequest) -> Result<Option<JsonRpcResponse>> {
        debug!("Handling {}", request.method);

        match request.method.as_str() {
            "initialize" => self.handle_initialize(request).await.map(Some),
            "initialized" | "notifications/initialized" => self.handle_initialized(request).await,
            "ping" => Ok(Some(JsonRpcResponse::success(
                request.id,
                serde_json::json!({}),
            ))),
            "tools/list" => self.handle_list_tools(request).await.map(Some),
            "tools/call" => self.handle_call_tool(request).await.map(Some),
            "prompts/list" => self.handle_list_prompts(request).await.map(Some),
            "resources/list" => self.handle_list_resources(request).await.map(Some),
            _ if request.is_notification() => {
                debug!("Ignoring notification: {}", request.method);
                Ok(None)
            }
            _ => {
                warn!("Unknown method: {}", request.method);
                Ok(Some(JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::method_not_found(&request.method),
                )))
            }
        }
    }

    async fn handle_initialize(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
        let params: InitializeRequest = match request.params.map(serde_json::from_value) {
            Some(Ok(p)) => p,
            Some(Err(e)) => {
                return Ok(JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params(format!("Invalid params: {}", e)),
                ));
            }
            None => {
                return Ok(JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params("Missing params".to_string()),
                ));
            }
        };

        // Support both protocol versions
        let protocol_version = if params.protocol_version.starts_with("2025") {
            PROTOCOL_VERSION_2025.to_string()
        } else {
            PROTOCOL_VERSION.to_string()
        };

        if let Some(client) = &params.client_info {
            info!("Client connected: {} {}", client.name, client.version);
        }

        let result = InitializeResult {
            protocol_version,
            capabilities: ServerCapabilities {
                tools: ToolsCapability::default(),
                experimental: Default::default(),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        Ok(JsonRpcResponse::success(
            request.id,
            serde_json::to_value(result)?,
        ))
    }

    async fn handle_initialized(&self, request: JsonRpcRequest) -> Result<Option<JsonRpcResponse>> {
        let mut initialized = self.initialized.write().await;
        *initialized = true;

        // Notifications don't get responses
        if request.is_notification() {
            Ok(None)
        } else {
            Ok(Some(JsonRpcResponse::success(request.id, Value::Null)))
        }
    }

    async fn ensure_initialized(&self, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        if !self.require_initialize || *self.initialized.read().await {
            return None;
        }

        Some(JsonRpcResponse::error(
            request.id.clone(),
            JsonRpcError::internal_error("Server not initialized".to_string()),
        ))
    }

    async fn handle_list_tools(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
        if let Some(rejection) = self.ensure_initialized(&request).await {
            return Ok(rejection);
        }

        let result = ListToolsResult {
            tools: self.handler.list_tools(),
        };

        Ok(JsonRpcResponse::success(
            request.id,
            serde_json::to_value(result)?,
        ))
    }

    async fn handle_call_tool(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
        if let Some(rejection) = self.ensure_initialized(&request).await {
            return Ok(rejection);
        }

        let params: CallToolRequest = match request.params.map(serde_json::from_value) {
            Some(Ok(p)) => p,
            Some(Err(e)) => {
                return Ok(JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params(format!("Invalid params: {}", e)),
                ));
            }
            None => {
                return Ok(JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params("Missing params".to_string()),
                ));
            }
        };

        info!("Calling tool {}", params.name);

        match self.handler.call_tool(&params.name, params.arguments).await {
            Ok(result) => Ok(JsonRpcResponse::success(
                request.id,
                serde_json::to_value(result)?,
            )),
            Err(e) => {
                error!("Tool execution failed: {}", e);
                Ok(JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::internal_error(e.to_string()),
                ))
            }
        }
    }

    async fn handle_list_prompts(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
        // We don't have prompts, return empty list
        let result = serde_json::json!({
            "prompts": []
        });

        Ok(JsonRpcResponse::success(request.id, result))
    }

    async fn handle_list_resources(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
        // We don't have resources, return empty list
        let result = serde_json::json!({
            "resources": []
        });

        Ok(JsonRpcResponse::success(request.id, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::slack::MockSlackProvider;
    use serde_json::json;

    fn server(require_initialize: bool) -> McpServer {
        let config = Config::build(None, Some("xoxp-test".to_string())).unwrap();
        let handler = RequestHandler::new(Arc::new(MockSlackProvider::new()), &config);
        McpServer::new(handler, require_initialize)
    }

    async fn call(server: &McpServer, request: Value) -> Option<JsonRpcResponse> {
        server
            .process_request(&request.to_string())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_parse_error() {
        let response = server(false).process_request("{not json").await.unwrap().unwrap();
        assert_eq!(response.error.unwrap().code, error_codes::PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_wrong_jsonrpc_version() {
        let response = call(
            &server(false),
            json!({"jsonrpc": "1.0", "id": 1, "method": "tools/list"}),
        )
        .await
        .unwrap();
        assert_eq!(response.error.unwrap().code, error_codes::INVALID_REQUEST);
        assert_eq!(response.id, Some(json!(1)));
    }

    #[tokio::test]
    async fn test_initialize_negotiates_version() {
        let response = call(
            &server(true),
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2025-06-18",
                    "capabilities": {},
                    "clientInfo": {"name": "test", "version": "0.0.1"}
                }
            }),
        )
        .await
        .unwrap();

        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION_2025);
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
        assert_eq!(result["capabilities"]["tools"]["listChanged"], json!(false));
    }

    #[tokio::test]
    async fn test_stdio_mode_requires_initialize() {
        let server = server(true);
        let list = json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"});

        let response = call(&server, list.clone()).await.unwrap();
        assert!(response.error.is_some());

        let ack = call(
            &server,
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        )
        .await;
        assert!(ack.is_none());

        let response = call(&server, list).await.unwrap();
        assert_eq!(response.result.unwrap()["tools"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_stateless_mode_lists_tools_directly() {
        let response = call(
            &server(false),
            json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
        )
        .await
        .unwrap();
        assert_eq!(response.result.unwrap()["tools"][0]["name"], "find-technology-posts");
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = call(
            &server(false),
            json!({"jsonrpc": "2.0", "id": 3, "method": "sampling/createMessage"}),
        )
        .await
        .unwrap();
        assert_eq!(response.error.unwrap().code, error_codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_call_unknown_tool_is_rpc_error() {
        let response = call(
            &server(false),
            json!({
                "jsonrpc": "2.0",
                "id": 4,
                "method": "tools/call",
                "params": {"name": "nope", "arguments": {}}
            }),
        )
        .await
        .unwrap();

        let error = response.error.unwrap();
        assert_eq!(error.code, error_codes::INTERNAL_ERROR);
        assert!(error.message.contains("Tool not found: nope"));
    }

    #[tokio::test]
    async fn test_call_tool_without_params() {
        let response = call(
            &server(false),
            json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call"}),
        )
        .await
        .unwrap();
        assert_eq!(response.error.unwrap().code, error_codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_serve_lines_answers_each_request() {
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n",
            "\n",
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"prompts/list\"}\n",
        );
        let mut output = Vec::new();

        server(true)
            .serve_lines(BufReader::new(input.as_bytes()), &mut output)
            .await
            .unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[1]["result"]["prompts"], json!([]));
    }
}
