pub mod format;
pub mod posts;
pub mod response;
pub mod technology;
pub mod users;

use crate::error::McpResult;
use crate::mcp::types::ToolInputSchema;
use async_trait::async_trait;
use serde_json::Value;

pub use response::ToolOutput;

#[async_trait]
pub trait Tool {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn input_schema(&self) -> ToolInputSchema;
    async fn execute(&self, params: Value) -> McpResult<ToolOutput>;
}
