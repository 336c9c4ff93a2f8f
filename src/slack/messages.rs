use std::sync::Arc;
use tracing::{debug, info};

use super::client::SlackApiClient;
use super::types::{MessageInfo, SearchMessages, SearchMessagesResponse};
use crate::error::McpResult;

/// `search.messages` caps `count` at 100
const MAX_SEARCH_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchSort {
    Score,
    Timestamp,
}

impl SearchSort {
    fn as_str(self) -> &'static str {
        match self {
            SearchSort::Score => "score",
            SearchSort::Timestamp => "timestamp",
        }
    }
}

pub struct SlackMessages {
    api: Arc<SlackApiClient>,
    channel_result_count: u32,
}

impl SlackMessages {
    pub fn new(api: Arc<SlackApiClient>, channel_result_count: u32) -> Self {
        Self {
            api,
            channel_result_count,
        }
    }

    /// One page of `search.messages`, best matches first
    pub async fn search_messages(
        &self,
        query: &str,
        sort: SearchSort,
        count: usize,
        page: u32,
    ) -> McpResult<SearchMessages> {
        let params = [
            ("query", query.to_string()),
            ("sort", sort.as_str().to_string()),
            ("sort_dir", "desc".to_string()),
            ("highlight", "false".to_string()),
            ("count", count.to_string()),
            ("page", page.to_string()),
        ];

        let response: SearchMessagesResponse = self.api.get("search.messages", &params).await?;
        Ok(response.messages)
    }

    /// Posts in `channel` carrying the `:keyword:` reaction
    pub async fn search_channel_posts(
        &self,
        keyword: &str,
        channel: &str,
    ) -> McpResult<Vec<MessageInfo>> {
        let query = format!("has::{}: in:{}", keyword, channel);
        info!("Searching Slack: {}", query);

        let result = self
            .search_messages(
                &query,
                SearchSort::Score,
                self.channel_result_count as usize,
                1,
            )
            .await?;

        debug!("Found {} matches for {}", result.matches.len(), query);
        Ok(result.matches.into_iter().map(MessageInfo::from).collect())
    }

    /// Latest posts written by `user_id`, newest first, up to `limit`
    pub async fn search_posts_by_author(
        &self,
        user_id: &str,
        limit: usize,
    ) -> McpResult<Vec<MessageInfo>> {
        let query = format!("from:<@{}>", user_id);
        info!("Searching Slack: {}", query);

        // Page size must stay constant for `page` offsets to line up
        let count = limit.clamp(1, MAX_SEARCH_PAGE_SIZE);
        let mut posts = Vec::new();
        let mut page = 1;

        while posts.len() < limit {
            let result = self
                .search_messages(&query, SearchSort::Timestamp, count, page)
                .await?;

            let exhausted = result.matches.is_empty() || page >= result.paging.pages;
            posts.extend(result.matches.into_iter().map(MessageInfo::from));

            if exhausted {
                break;
            }
            page += 1;
        }

        posts.truncate(limit);
        debug!("Found {} posts from {}", posts.len(), user_id);
        Ok(posts)
    }
}
