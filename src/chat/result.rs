//! Rendering of `tools/call` result payloads.
//!
//! Servers disagree on the `content` shape, so each known shape is a parser
//! and the first one that accepts the payload wins. Anything unrecognised is
//! passed through as raw JSON text.

use serde::Deserialize;
use serde_json::{Map, Value};

pub trait ResultShape: Sync {
    fn name(&self) -> &'static str;

    /// `None` when the payload does not have this shape
    fn render(&self, content: &Value) -> Option<String>;
}

/// `[[{..}, {..}], ...]`: lists of records, one pretty JSON block per record
pub struct NestedRecords;

/// `[{"type": "text", "text": ".."}, ...]`: standard MCP content blocks
pub struct ContentBlocks;

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

impl ResultShape for NestedRecords {
    fn name(&self) -> &'static str {
        "nested-records"
    }

    fn render(&self, content: &Value) -> Option<String> {
        let groups = Vec::<Vec<Map<String, Value>>>::deserialize(content).ok()?;

        let records: Vec<String> = groups
            .iter()
            .flatten()
            .filter_map(|record| serde_json::to_string_pretty(record).ok())
            .collect();
        Some(records.join("\n"))
    }
}

impl ResultShape for ContentBlocks {
    fn name(&self) -> &'static str {
        "content-blocks"
    }

    fn render(&self, content: &Value) -> Option<String> {
        let blocks = Vec::<ContentBlock>::deserialize(content).ok()?;

        let texts: Vec<&str> = blocks.iter().map(|b| b.text.as_str()).collect();
        Some(texts.join("\n"))
    }
}

/// Shapes in priority order
pub static RESULT_SHAPES: &[&dyn ResultShape] = &[&NestedRecords, &ContentBlocks];

pub fn render_content(content: &Value) -> String {
    RESULT_SHAPES
        .iter()
        .find_map(|shape| {
            let rendered = shape.render(content)?;
            tracing::debug!("Tool result parsed as {}", shape.name());
            Some(rendered)
        })
        .unwrap_or_else(|| match content {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
}
