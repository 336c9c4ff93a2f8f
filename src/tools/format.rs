use crate::slack::types::{MessageInfo, WorkspaceUser};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};

/// Remove fields with empty string values from JSON object
fn remove_empty_strings(value: &mut Value) {
    if let Some(obj) = value.as_object_mut() {
        obj.retain(|_, v| {
            if let Some(s) = v.as_str() {
                !s.is_empty()
            } else {
                true
            }
        });
    }
}

/// Convert Slack timestamp to ISO 8601 format
/// Slack timestamps are Unix timestamps with microseconds (e.g., "1234567890.123456")
pub fn slack_ts_to_iso8601(ts: &str) -> Option<String> {
    ts.parse::<f64>().ok().and_then(|timestamp| {
        let seconds = timestamp as i64;
        let nanos = ((timestamp - seconds as f64) * 1_000_000_000.0) as u32;

        Utc.timestamp_opt(seconds, nanos)
            .single()
            .map(|dt: DateTime<Utc>| dt.to_rfc3339())
    })
}

/// Record for a Slack post, with a readable `datetime` next to the raw ts
pub fn format_message(msg: &MessageInfo) -> Value {
    let mut result = json!({
        "message": msg.message,
        "author": msg.author,
        "author_slack_id": msg.author_slack_id,
        "posted": msg.posted,
    });

    if let Some(iso_time) = slack_ts_to_iso8601(&msg.posted) {
        result["datetime"] = json!(iso_time);
    }
    if let Some(channel) = &msg.channel {
        result["channel"] = json!(channel);
    }
    if let Some(permalink) = &msg.permalink {
        result["permalink"] = json!(permalink);
    }

    remove_empty_strings(&mut result);
    result
}

pub fn format_user(user: &WorkspaceUser) -> Value {
    let mut result = json!({
        "slack_id": user.slack_id,
        "slack_name": user.slack_name,
        "real_name": user.real_name,
        "display_name": user.display_name,
        "title": user.title,
    });

    remove_empty_strings(&mut result);
    result
}
