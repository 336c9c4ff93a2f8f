use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::error::{ChatError, ChatResult};
use crate::mcp::types::Tool as McpTool;

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tool_calls: Vec<ToolCall>,
    /// Set on tool results so the model can tell them apart
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_name: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn tool_result(tool_name: &str, content: impl Into<String>) -> Self {
        Self {
            tool_name: Some(tool_name.to_string()),
            ..Self::new(Role::Tool, content)
        }
    }

    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.tool_calls = tool_calls;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub call_type: Option<String>,
    pub function: FunctionCall,
}

impl ToolCall {
    pub fn new(name: &str, arguments: Value) -> Self {
        Self {
            id: None,
            call_type: None,
            function: FunctionCall {
                name: name.to_string(),
                arguments,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl FunctionCall {
    /// Arguments as an object. Models send either an object or a string
    /// holding one; absent arguments mean none.
    pub fn parsed_arguments(&self) -> ChatResult<Map<String, Value>> {
        let invalid = |reason: String| ChatError::Argument {
            tool: self.name.clone(),
            reason,
        };

        match &self.arguments {
            Value::Null => Ok(Map::new()),
            Value::Object(map) => Ok(map.clone()),
            Value::String(raw) if raw.trim().is_empty() => Ok(Map::new()),
            Value::String(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(other) => Err(invalid(format!("expected a JSON object, got {}", other))),
                Err(e) => Err(invalid(e.to_string())),
            },
            other => Err(invalid(format!("expected a JSON object, got {}", other))),
        }
    }
}

/// Tool description in the LLM's function-calling format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn name(&self) -> &str {
        &self.function.name
    }

    pub fn description(&self) -> &str {
        &self.function.description
    }
}

impl From<McpTool> for ToolDefinition {
    fn from(tool: McpTool) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: tool.name,
                description: tool.description,
                parameters: tool.input_schema,
            },
        }
    }
}

fn no_tools(tools: &&[ToolDefinition]) -> bool {
    tools.is_empty()
}

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub stream: bool,
    #[serde(skip_serializing_if = "no_tools")]
    pub tools: &'a [ToolDefinition],
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub created_at: String,
    pub message: Message,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelList {
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_request_omits_empty_tools() {
        let messages = vec![Message::user("hi")];
        let request = ChatRequest {
            model: "llama3.2:latest",
            messages: &messages,
            stream: false,
            tools: &[],
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "llama3.2:latest",
                "messages": [{"role": "user", "content": "hi"}],
                "stream": false
            })
        );
    }

    #[test]
    fn test_request_includes_tools() {
        let tool = ToolDefinition::from(McpTool {
            name: "get-user-details".to_string(),
            description: "Find a user".to_string(),
            input_schema: json!({"type": "object", "properties": {}}),
        });
        let request = ChatRequest {
            model: "m",
            messages: &[],
            stream: false,
            tools: std::slice::from_ref(&tool),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["tools"][0]["type"], "function");
        assert_eq!(value["tools"][0]["function"]["name"], "get-user-details");
        assert_eq!(value["tools"][0]["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn test_response_with_null_fields() {
        let response: ChatResponse = serde_json::from_value(json!({
            "model": "m",
            "message": {"role": "assistant", "content": null, "tool_calls": null},
            "done": true
        }))
        .unwrap();

        assert_eq!(response.message.content, "");
        assert!(response.message.tool_calls.is_empty());
    }

    #[test]
    fn test_tool_result_message_serialization() {
        let message = Message::tool_result("get-user-details", "[]");
        assert_eq!(
            serde_json::to_value(message).unwrap(),
            json!({"role": "tool", "content": "[]", "tool_name": "get-user-details"})
        );
    }

    #[rstest]
    #[case(json!({"technology": "rust"}))]
    #[case(json!("{\"technology\": \"rust\"}"))]
    fn test_parsed_arguments_accepts_object_or_string(#[case] arguments: Value) {
        let call = ToolCall::new("find-technology-posts", arguments);
        let args = call.function.parsed_arguments().unwrap();
        assert_eq!(args["technology"], "rust");
    }

    #[rstest]
    #[case(Value::Null)]
    #[case(json!(""))]
    fn test_parsed_arguments_empty(#[case] arguments: Value) {
        let call = ToolCall::new("list", arguments);
        assert!(call.function.parsed_arguments().unwrap().is_empty());
    }

    #[rstest]
    #[case(json!("not json"))]
    #[case(json!("[1, 2]"))]
    #[case(json!(42))]
    #[case(json!(["a"]))]
    fn test_parsed_arguments_rejects(#[case] arguments: Value) {
        let call = ToolCall::new("find-technology-posts", arguments);
        let err = call.function.parsed_arguments().unwrap_err();
        assert!(matches!(err, ChatError::Argument { tool, .. } if tool == "find-technology-posts"));
    }
}
