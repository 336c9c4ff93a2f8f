//! Conversation state and the tool-call resolution loop.
//!
//! One exchange sends the conversation to the model; while the reply carries
//! tool calls, every call is run through the [`ToolInvoker`] and its result is
//! appended as a `tool` message before asking the model again. The exchange
//! works on a copy of the conversation, which replaces the session's only
//! when the whole exchange succeeds.

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::{ChatError, ChatResult};
use super::mcp_client::ToolInvoker;
use super::ollama::ChatModel;
use super::types::{Message, ToolDefinition};

pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 10;

/// Called with the tool name and arguments before each invocation
pub type ToolObserver = Box<dyn Fn(&str, &Map<String, Value>) + Send + Sync>;

pub struct ChatSession {
    llm: Arc<dyn ChatModel>,
    tools: Option<Arc<dyn ToolInvoker>>,
    tool_definitions: Vec<ToolDefinition>,
    model: String,
    conversation: Vec<Message>,
    max_tool_rounds: usize,
    observer: Option<ToolObserver>,
}

impl ChatSession {
    pub fn new(llm: Arc<dyn ChatModel>, model: impl Into<String>) -> Self {
        Self {
            llm,
            tools: None,
            tool_definitions: Vec::new(),
            model: model.into(),
            conversation: Vec::new(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            observer: None,
        }
    }

    /// Offer `definitions` to the model and route its calls to `invoker`
    pub fn with_tools(
        mut self,
        invoker: Arc<dyn ToolInvoker>,
        definitions: Vec<ToolDefinition>,
    ) -> Self {
        self.tools = Some(invoker);
        self.tool_definitions = definitions;
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn with_tool_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&str, &Map<String, Value>) + Send + Sync + 'static,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub fn conversation(&self) -> &[Message] {
        &self.conversation
    }

    pub fn clear(&mut self) {
        self.conversation.clear();
    }

    pub fn tool_definitions(&self) -> &[ToolDefinition] {
        &self.tool_definitions
    }

    pub async fn list_models(&self) -> ChatResult<Vec<String>> {
        self.llm.list_models().await
    }

    /// Add a user message, resolve all tool calls and return the final
    /// assistant text. On error the conversation is left as it was.
    pub async fn send(&mut self, input: &str) -> ChatResult<String> {
        let mut working = self.conversation.clone();
        working.push(Message::user(input));

        let working = self.resolve(working).await?;
        let reply = working
            .last()
            .map(|message| message.content.clone())
            .unwrap_or_default();

        self.conversation = working;
        Ok(reply)
    }

    /// Run the model until it answers without tool calls
    pub async fn resolve(&self, mut messages: Vec<Message>) -> ChatResult<Vec<Message>> {
        let mut round = 0;

        loop {
            let reply = self
                .llm
                .chat(&self.model, &messages, &self.tool_definitions)
                .await?;

            if reply.tool_calls.is_empty() {
                messages.push(reply);
                return Ok(messages);
            }

            if round >= self.max_tool_rounds {
                warn!(
                    "Model requested {} more tool calls after {} rounds",
                    reply.tool_calls.len(),
                    round
                );
                return Err(ChatError::RoundLimit(self.max_tool_rounds));
            }
            round += 1;

            let calls = reply.tool_calls.clone();
            messages.push(reply);

            for call in &calls {
                let arguments = call.function.parsed_arguments()?;
                let content = self.run_tool(&call.function.name, arguments).await;
                messages.push(Message::tool_result(&call.function.name, content));
            }

            debug!("Tool round {} appended {} results", round, calls.len());
        }
    }

    async fn run_tool(&self, name: &str, arguments: Map<String, Value>) -> String {
        if let Some(observer) = &self.observer {
            observer(name, &arguments);
        }
        info!("Calling tool {}", name);
        debug!("Tool {} arguments: {}", name, serde_json::Value::Object(arguments.clone()));

        let result = match &self.tools {
            Some(invoker) => invoker.invoke(name, arguments).await,
            None => Err(ChatError::ToolExecution(
                "no tool server configured".to_string(),
            )),
        };

        match result {
            Ok(text) => {
                debug!("Tool {} result: {}", name, text);
                text
            }
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                format!("Error calling tool: {}", e)
            }
        }
    }
}
