use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{Config, ResultFormat};
use crate::error::McpError;
use crate::slack::SlackProvider;
use crate::tools::response::error_result;
use crate::tools::{Tool, posts, technology, users};

use super::types::{CallToolResult, Tool as McpTool};

pub struct RequestHandler {
    tools: HashMap<String, Box<dyn Tool + Send + Sync>>,
    result_format: ResultFormat,
}

macro_rules! register_tool {
    ($tools:expr, $tool:expr) => {{
        let tool = $tool;
        $tools.insert(tool.name().to_string(), Box::new(tool));
    }};
}

impl RequestHandler {
    pub fn new(slack: Arc<dyn SlackProvider>, config: &Config) -> Self {
        let mut tools: HashMap<String, Box<dyn Tool + Send + Sync>> = HashMap::new();

        register_tool!(
            tools,
            technology::FindTechnologyPostsTool::new(slack.clone(), config.search.channels.clone())
        );
        register_tool!(tools, users::GetUserDetailsTool::new(slack.clone()));
        register_tool!(
            tools,
            posts::GetLatestPostsByUserTool::new(slack, config.search.user_posts_limit as usize)
        );

        debug!("Registered {} tools", tools.len());

        Self {
            tools,
            result_format: config.server.result_format,
        }
    }

    /// Tools sorted by name so listings are stable
    pub fn list_tools(&self) -> Vec<McpTool> {
        let mut tool_list: Vec<McpTool> = self
            .tools
            .values()
            .map(|tool| Self::tool_to_mcp_tool(tool.as_ref()))
            .collect();

        tool_list.sort_by(|a, b| a.name.cmp(&b.name));
        tool_list
    }

    /// Unknown tools are protocol errors; failures inside a tool are
    /// reported in-band with `isError`
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<CallToolResult, McpError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| McpError::NotFound(format!("Tool not found: {}", name)))?;

        match tool.execute(arguments).await {
            Ok(output) => output.into_call_result(self.result_format),
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                Ok(error_result(&e))
            }
        }
    }

    fn tool_to_mcp_tool(tool: &(dyn Tool + Send + Sync)) -> McpTool {
        McpTool {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            input_schema: serde_json::to_value(tool.input_schema())
                .unwrap_or_else(|_| serde_json::json!({"type": "object"})),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slack::{MessageInfo, MockSlackProvider};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn handler(mock: MockSlackProvider) -> RequestHandler {
        let config = Config::build(None, Some("xoxp-test".to_string())).unwrap();
        RequestHandler::new(Arc::new(mock), &config)
    }

    #[test]
    fn test_list_tools_is_sorted_with_schemas() {
        let tools = handler(MockSlackProvider::new()).list_tools();

        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "find-technology-posts",
                "get-latest-posts-by-user",
                "get-user-details"
            ]
        );
        assert_eq!(tools[0].input_schema["required"], json!(["technology"]));
        assert_eq!(
            tools[1].input_schema["properties"]["limit"]["default"],
            json!(200)
        );
    }

    #[tokio::test]
    async fn test_call_unknown_tool() {
        let err = handler(MockSlackProvider::new())
            .call_tool("send-message", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_call_tool_returns_records() {
        let mut mock = MockSlackProvider::new();
        mock.expect_search_posts_by_author().returning(|user_id, _| {
            Ok(vec![MessageInfo {
                message: "hello".to_string(),
                author: "alexis".to_string(),
                author_slack_id: user_id.to_string(),
                posted: "1609459200.000000".to_string(),
                channel: None,
                permalink: None,
            }])
        });

        let result = handler(mock)
            .call_tool("get-latest-posts-by-user", json!({"slack_user_id": "U1"}))
            .await
            .unwrap();

        let value = serde_json::to_value(result).unwrap();
        assert_eq!(value["isError"], json!(false));
        assert_eq!(value["content"][0][0]["author_slack_id"], "U1");
    }

    #[tokio::test]
    async fn test_tool_failure_is_in_band() {
        let result = handler(MockSlackProvider::new())
            .call_tool("get-user-details", json!({}))
            .await
            .unwrap();

        assert!(result.is_error);
        let value = serde_json::to_value(result).unwrap();
        assert_eq!(
            value["content"][0]["text"],
            "Error: 'search' parameter is required and must be a string"
        );
    }
}
