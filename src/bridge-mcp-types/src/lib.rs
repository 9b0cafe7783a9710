//! Model Context Protocol wire types used by the bridge.
//!
//! Only the slice of MCP the bridge actually speaks lives here: JSON-RPC 2.0
//! envelopes, the initialize handshake, tool listing and invocation, content
//! items and log levels.
//!
//! # Example
//! ```rust
//! use bridge_mcp_types::{PropertySchema, Tool, ToolInputSchema};
//!
//! let tool = Tool::new("upload_slack_image", "Copy a Slack image to Cloudinary")
//!     .with_schema(ToolInputSchema::object()
//!         .property("slack_url", PropertySchema::string().description("Private Slack URL"))
//!         .required(vec!["slack_url"]));
//! ```

mod capabilities;
mod content;
mod initialization;
mod jsonrpc;
mod logging;
mod notifications;
mod tools;

/// MCP method name constants.
pub mod methods;

/// MCP protocol version spoken by the server.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub use jsonrpc::{
    ErrorCode, JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    RequestId,
};

pub use initialization::{Implementation, InitializeParams, InitializeResult};

pub use capabilities::{
    ClientCapabilities, LoggingCapability, ServerCapabilities, ToolsCapability,
};

pub use tools::{
    CallToolParams, CallToolResult, ListToolsResult, PropertySchema, Tool, ToolInputSchema,
};

pub use content::Content;

pub use logging::{LogLevel, LogMessage, SetLogLevelParams};

pub use notifications::CancelledNotification;
