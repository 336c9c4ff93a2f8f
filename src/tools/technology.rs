use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use super::format::format_message;
use super::{Tool, ToolOutput};
use crate::error::{McpError, McpResult};
use crate::mcp::types::ToolInputSchema;
use crate::slack::SlackProvider;
use crate::utils::required_str;

pub struct FindTechnologyPostsTool {
    slack: Arc<dyn SlackProvider>,
    channels: Vec<String>,
}

impl FindTechnologyPostsTool {
    pub fn new(slack: Arc<dyn SlackProvider>, channels: Vec<String>) -> Self {
        Self { slack, channels }
    }
}

#[async_trait]
impl Tool for FindTechnologyPostsTool {
    fn name(&self) -> &str {
        "find-technology-posts"
    }

    fn description(&self) -> &str {
        "Find posts from a specific technology. Returns an array containing the post, the slack id of the author, the timestamp of the message."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::object().required_string(
            "technology",
            "The technology to search for (e.g., python, react, golang)",
        )
    }

    async fn execute(&self, params: Value) -> McpResult<ToolOutput> {
        let technology = required_str(&params, "technology")?;

        let mut records = Vec::new();
        let mut search_errors = Vec::new();

        for channel in &self.channels {
            match self.slack.search_channel_posts(&technology, channel).await {
                Ok(messages) => records.extend(messages.iter().map(format_message)),
                Err(e) => {
                    warn!("Search for {} in {} failed: {}", technology, channel, e);
                    search_errors.push(format!("Error searching in {}: {}", channel, e));
                }
            }
        }

        // Partial results win over partial failures
        if records.is_empty() && !search_errors.is_empty() {
            return Err(McpError::Internal(format!(
                "Failed to retrieve messages: {}",
                search_errors.join("; ")
            )));
        }

        Ok(ToolOutput::Records(records))
    }
}
