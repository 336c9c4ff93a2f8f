pub mod client;
pub mod messages;
pub mod types;
pub mod users;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Config;
use crate::error::McpResult;

pub use client::SlackApiClient;
pub use messages::{SearchSort, SlackMessages};
pub use types::{MessageInfo, WorkspaceUser};
pub use users::SlackUsers;

/// Read-only Slack queries consumed by the tools
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SlackProvider: Send + Sync {
    async fn search_channel_posts(
        &self,
        keyword: &str,
        channel: &str,
    ) -> McpResult<Vec<MessageInfo>>;

    async fn list_active_users(&self) -> McpResult<Vec<WorkspaceUser>>;

    async fn search_posts_by_author(
        &self,
        user_id: &str,
        limit: usize,
    ) -> McpResult<Vec<MessageInfo>>;
}

pub struct SlackClient {
    pub users: SlackUsers,
    pub messages: SlackMessages,
}

impl SlackClient {
    pub fn new(config: &Config) -> McpResult<Self> {
        let api = Arc::new(SlackApiClient::new(config)?);

        Ok(Self {
            users: SlackUsers::new(api.clone()),
            messages: SlackMessages::new(api, config.search.channel_result_count),
        })
    }
}

#[async_trait]
impl SlackProvider for SlackClient {
    async fn search_channel_posts(
        &self,
        keyword: &str,
        channel: &str,
    ) -> McpResult<Vec<MessageInfo>> {
        self.messages.search_channel_posts(keyword, channel).await
    }

    async fn list_active_users(&self) -> McpResult<Vec<WorkspaceUser>> {
        let users = self.users.fetch_active_users().await?;
        Ok(users.iter().map(WorkspaceUser::from).collect())
    }

    async fn search_posts_by_author(
        &self,
        user_id: &str,
        limit: usize,
    ) -> McpResult<Vec<MessageInfo>> {
        self.messages.search_posts_by_author(user_id, limit).await
    }
}
