use std::sync::Arc;
use tracing::debug;

use super::client::SlackApiClient;
use super::types::{SlackUser, UsersListResponse};
use crate::error::McpResult;

const USERS_PAGE_SIZE: u32 = 200;

pub struct SlackUsers {
    api: Arc<SlackApiClient>,
}

impl SlackUsers {
    pub fn new(api: Arc<SlackApiClient>) -> Self {
        Self { api }
    }

    /// Fetch every workspace member, following `users.list` cursors
    pub async fn fetch_all_users(&self) -> McpResult<Vec<SlackUser>> {
        let mut users = Vec::new();
        let mut cursor = String::new();

        loop {
            let mut params = vec![("limit", USERS_PAGE_SIZE.to_string())];
            if !cursor.is_empty() {
                params.push(("cursor", cursor.clone()));
            }

            let page: UsersListResponse = self.api.get("users.list", &params).await?;
            users.extend(page.members);

            cursor = page.response_metadata.next_cursor;
            if cursor.is_empty() {
                break;
            }
        }

        debug!("Fetched {} users", users.len());
        Ok(users)
    }

    pub async fn fetch_active_users(&self) -> McpResult<Vec<SlackUser>> {
        let users = self.fetch_all_users().await?;
        Ok(users.into_iter().filter(|u| u.is_active_human()).collect())
    }
}
