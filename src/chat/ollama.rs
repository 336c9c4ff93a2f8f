use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::error::{ChatError, ChatResult};
use super::types::{ChatRequest, ChatResponse, Message, ModelList, ToolDefinition};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.2:latest";

/// An LLM chat endpoint
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// One non-streaming completion over the whole conversation
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> ChatResult<Message>;

    async fn list_models(&self) -> ChatResult<Vec<String>>;
}

pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, timeout: Duration) -> ChatResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ChatResult<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ChatError::Connection(format!(
                "ollama API error (status {}): {}",
                status.as_u16(),
                body
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| ChatError::Protocol(format!("error decoding response: {}", e)))
    }
}

#[async_trait]
impl ChatModel for OllamaClient {
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> ChatResult<Message> {
        let request = ChatRequest {
            model,
            messages,
            stream: false,
            tools,
        };

        debug!(
            "Sending {} messages to {} ({} tools)",
            messages.len(),
            model,
            tools.len()
        );

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await?;

        let chat: ChatResponse = Self::decode(response).await?;
        debug!(
            "Model replied with {} tool calls (done: {})",
            chat.message.tool_calls.len(),
            chat.done
        );
        Ok(chat.message)
    }

    async fn list_models(&self) -> ChatResult<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await?;

        let list: ModelList = Self::decode(response).await?;
        Ok(list.models.into_iter().map(|m| m.name).collect())
    }
}
