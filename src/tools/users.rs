use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::format::format_user;
use super::{Tool, ToolOutput};
use crate::error::{IntoMcpError, McpResult};
use crate::mcp::types::ToolInputSchema;
use crate::slack::{SlackProvider, WorkspaceUser};
use crate::utils::required_str;

pub struct GetUserDetailsTool {
    slack: Arc<dyn SlackProvider>,
}

impl GetUserDetailsTool {
    pub fn new(slack: Arc<dyn SlackProvider>) -> Self {
        Self { slack }
    }
}

/// Case-insensitive substring match on id and every name field
fn matches_user(user: &WorkspaceUser, needle_lower: &str) -> bool {
    [
        &user.slack_id,
        &user.slack_name,
        &user.real_name,
        &user.display_name,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle_lower))
}

#[async_trait]
impl Tool for GetUserDetailsTool {
    fn name(&self) -> &str {
        "get-user-details"
    }

    fn description(&self) -> &str {
        "Get the user details of a Concept employee using its slack id or part of its name"
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::object().required_string(
            "search",
            "search parameter, could be slack_id, part of the name of the user you are looking for",
        )
    }

    async fn execute(&self, params: Value) -> McpResult<ToolOutput> {
        let search = required_str(&params, "search")?;

        let users = self
            .slack
            .list_active_users()
            .await
            .mcp_context("Error fetching users")?;

        let needle = search.to_lowercase();
        let matches: Vec<Value> = users
            .iter()
            .filter(|u| matches_user(u, &needle))
            .map(format_user)
            .collect();

        if matches.is_empty() {
            return Ok(ToolOutput::text(format!(
                "No users found matching '{}'",
                search
            )));
        }

        Ok(ToolOutput::Records(matches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::McpError;
    use crate::slack::MockSlackProvider;
    use rstest::rstest;
    use serde_json::json;

    fn user(id: &str, name: &str, real_name: &str, display_name: &str) -> WorkspaceUser {
        WorkspaceUser {
            slack_id: id.to_string(),
            slack_name: name.to_string(),
            real_name: real_name.to_string(),
            display_name: display_name.to_string(),
            title: String::new(),
        }
    }

    fn directory() -> MockSlackProvider {
        let mut mock = MockSlackProvider::new();
        mock.expect_list_active_users().returning(|| {
            Ok(vec![
                user("U7D3Q7N8Y", "alexis", "Alexis Zankowitch", "Alex"),
                user("U0000BOB1", "bob", "Bob Martin", ""),
                user("U0000CAR2", "carol", "Carol Danvers", "captain"),
            ])
        });
        mock
    }

    #[rstest]
    #[case("u7d3q7n8y", "U7D3Q7N8Y")]
    #[case("MARTIN", "U0000BOB1")]
    #[case("capt", "U0000CAR2")]
    #[case("alexis", "U7D3Q7N8Y")]
    #[tokio::test]
    async fn test_matches_single_user(#[case] search: &str, #[case] expected_id: &str) {
        let tool = GetUserDetailsTool::new(Arc::new(directory()));

        let output = tool.execute(json!({ "search": search })).await.unwrap();

        let ToolOutput::Records(records) = output else {
            panic!("Expected records");
        };
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["slack_id"], expected_id);
    }

    #[tokio::test]
    async fn test_matches_several_users() {
        let tool = GetUserDetailsTool::new(Arc::new(directory()));

        // "ar" appears in "Martin" and "carol"
        let output = tool.execute(json!({"search": "ar"})).await.unwrap();
        assert!(matches!(output, ToolOutput::Records(r) if r.len() == 2));
    }

    #[tokio::test]
    async fn test_no_match_is_text() {
        let tool = GetUserDetailsTool::new(Arc::new(directory()));

        let output = tool.execute(json!({"search": "zed"})).await.unwrap();
        assert_eq!(output, ToolOutput::text("No users found matching 'zed'"));
    }

    #[tokio::test]
    async fn test_slack_failure_is_an_error() {
        let mut mock = MockSlackProvider::new();
        mock.expect_list_active_users()
            .returning(|| Err(McpError::SlackApi("users.list: invalid_auth".to_string())));
        let tool = GetUserDetailsTool::new(Arc::new(mock));

        let err = tool.execute(json!({"search": "bob"})).await.unwrap_err();
        assert!(err.to_string().contains("Error fetching users"));
    }
}
