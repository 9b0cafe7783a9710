//! Tool handler trait.

use anyhow::Result;
use bridge_mcp_types::{CallToolResult, Tool};
use serde_json::Value;

/// A tool the server can advertise and invoke.
///
/// Returning `Err` is reserved for faults the tool could not classify; the
/// server turns it into an error result rather than a protocol error.
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    /// Tool definition advertised by `tools/list`.
    fn tool(&self) -> Tool;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: Value) -> Result<CallToolResult>;
}
