use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackUserProfile {
    pub real_name: Option<String>,
    pub display_name: Option<String>,
    pub title: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackUser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub deleted: bool,
    pub real_name: Option<String>,
    pub profile: Option<SlackUserProfile>,
}

impl SlackUser {
    pub fn real_name(&self) -> Option<&str> {
        self.real_name
            .as_deref()
            .or_else(|| self.profile.as_ref()?.real_name.as_deref())
    }

    pub fn display_name(&self) -> Option<&str> {
        self.profile.as_ref()?.display_name.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.profile.as_ref()?.title.as_deref()
    }

    /// Slackbot has no `is_bot` flag, so it is matched by id
    pub fn is_active_human(&self) -> bool {
        !self.deleted && !self.is_bot && self.id != "USLACKBOT"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchChannel {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// One hit of `search.messages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMatch {
    #[serde(default)]
    pub text: String,
    pub user: Option<String>,
    pub username: Option<String>,
    pub ts: String,
    pub channel: Option<MatchChannel>,
    pub permalink: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub pages: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchMessages {
    #[serde(default)]
    pub matches: Vec<SearchMatch>,
    #[serde(default)]
    pub paging: Paging,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchMessagesResponse {
    #[serde(default)]
    pub messages: SearchMessages,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default)]
    pub next_cursor: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsersListResponse {
    #[serde(default)]
    pub members: Vec<SlackUser>,
    #[serde(default)]
    pub response_metadata: ResponseMetadata,
}

/// Envelope shared by every Web API response
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope {
    pub ok: bool,
    pub error: Option<String>,
}

/// A Slack post as handed to tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageInfo {
    pub message: String,
    pub author: String,
    pub author_slack_id: String,
    pub posted: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,
}

impl From<SearchMatch> for MessageInfo {
    fn from(m: SearchMatch) -> Self {
        Self {
            message: m.text,
            author: m.username.unwrap_or_default(),
            author_slack_id: m.user.unwrap_or_default(),
            posted: m.ts,
            channel: m.channel.map(|c| c.name).filter(|n| !n.is_empty()),
            permalink: m.permalink,
        }
    }
}

/// An active member of the workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceUser {
    pub slack_id: String,
    pub slack_name: String,
    pub real_name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub title: String,
}

impl From<&SlackUser> for WorkspaceUser {
    fn from(user: &SlackUser) -> Self {
        Self {
            slack_id: user.id.clone(),
            slack_name: user.name.clone(),
            real_name: user.real_name().unwrap_or_default().to_string(),
            display_name: user.display_name().unwrap_or_default().to_string(),
            title: user.title().unwrap_or_default().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_match_into_message_info() {
        let hit: SearchMatch = serde_json::from_value(json!({
            "type": "message",
            "text": "Rust 1.90 is out",
            "user": "U123",
            "username": "alice",
            "ts": "1609459200.000100",
            "channel": {"id": "C1", "name": "concept-tech"},
            "permalink": "https://example.slack.com/archives/C1/p1609459200000100"
        }))
        .unwrap();

        let info = MessageInfo::from(hit);
        assert_eq!(info.message, "Rust 1.90 is out");
        assert_eq!(info.author, "alice");
        assert_eq!(info.author_slack_id, "U123");
        assert_eq!(info.posted, "1609459200.000100");
        assert_eq!(info.channel.as_deref(), Some("concept-tech"));
    }

    #[test]
    fn test_search_match_without_author() {
        let hit: SearchMatch = serde_json::from_value(json!({
            "text": "bot post",
            "ts": "1.0"
        }))
        .unwrap();

        let info = MessageInfo::from(hit);
        assert_eq!(info.author, "");
        assert_eq!(info.author_slack_id, "");
        assert!(info.channel.is_none());
    }

    #[test]
    fn test_workspace_user_prefers_top_level_real_name() {
        let user: SlackUser = serde_json::from_value(json!({
            "id": "U1",
            "name": "bob",
            "real_name": "Bob Top",
            "profile": {"real_name": "Bob Profile", "display_name": "bobby", "title": "SRE"}
        }))
        .unwrap();

        let details = WorkspaceUser::from(&user);
        assert_eq!(details.real_name, "Bob Top");
        assert_eq!(details.display_name, "bobby");
        assert_eq!(details.title, "SRE");
    }

    #[test]
    fn test_is_active_human() {
        let mut user: SlackUser =
            serde_json::from_value(json!({"id": "U1", "name": "carol"})).unwrap();
        assert!(user.is_active_human());

        user.deleted = true;
        assert!(!user.is_active_human());

        let slackbot: SlackUser =
            serde_json::from_value(json!({"id": "USLACKBOT", "name": "slackbot"})).unwrap();
        assert!(!slackbot.is_active_human());
    }
}
