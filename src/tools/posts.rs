use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::Arc;

use super::format::format_message;
use super::{Tool, ToolOutput};
use crate::error::{IntoMcpError, McpResult};
use crate::mcp::types::ToolInputSchema;
use crate::slack::SlackProvider;
use crate::utils::{parse_params, required_str};

pub struct GetLatestPostsByUserTool {
    slack: Arc<dyn SlackProvider>,
    max_posts: usize,
}

impl GetLatestPostsByUserTool {
    pub fn new(slack: Arc<dyn SlackProvider>, max_posts: usize) -> Self {
        Self { slack, max_posts }
    }
}

#[derive(Debug, Deserialize)]
struct LatestPostsOptions {
    #[serde(default, deserialize_with = "lenient_limit")]
    limit: Option<usize>,
}

/// Models send `10`, `10.0` or `"10"`; anything else means no limit given
fn lenient_limit<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;

    let limit = match &value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    Ok(limit.map(|l| l as usize))
}

#[async_trait]
impl Tool for GetLatestPostsByUserTool {
    fn name(&self) -> &str {
        "get-latest-posts-by-user"
    }

    fn description(&self) -> &str {
        "Retrieve the latest posts of a user identified by its slack user id"
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::object()
            .required_string(
                "slack_user_id",
                "slack user id of the user we want to list the posts from",
            )
            .optional_integer(
                "limit",
                "Maximum number of posts to return",
                self.max_posts as u64,
            )
    }

    async fn execute(&self, params: Value) -> McpResult<ToolOutput> {
        let user_id = required_str(&params, "slack_user_id")?;
        let options: LatestPostsOptions = parse_params(params)?;
        let limit = options
            .limit
            .unwrap_or(self.max_posts)
            .clamp(1, self.max_posts.max(1));

        let posts = self
            .slack
            .search_posts_by_author(&user_id, limit)
            .await
            .mcp_context("Error fetching user's posts")?;

        Ok(ToolOutput::Records(posts.iter().map(format_message).collect()))
    }
}
