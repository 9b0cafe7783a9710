//! Minimal Model Context Protocol server.
//!
//! Hosts a fixed set of [`ToolHandler`]s and speaks newline-delimited
//! JSON-RPC 2.0 over stdio. Only the tool surface is implemented:
//! `initialize`, `ping`, `tools/list`, `tools/call` and `logging/setLevel`.
//!
//! # Example
//! ```rust,no_run
//! use bridge_mcp_server::McpServerBuilder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = McpServerBuilder::new("my-server", "1.0.0").build()?;
//!     server.run_stdio().await
//! }
//! ```

mod builder;
mod handlers;
mod server;

pub use builder::McpServerBuilder;
pub use handlers::ToolHandler;
pub use server::{Incoming, McpServer, ServerState};

pub use bridge_mcp_types;
