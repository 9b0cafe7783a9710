//! Server builder.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, bail};
use bridge_mcp_types::{Implementation, LogLevel, ServerCapabilities};
use tokio::sync::RwLock;

use crate::handlers::ToolHandler;
use crate::server::{McpServer, ServerState};

/// Builder for [`McpServer`].
pub struct McpServerBuilder {
    name: String,
    version: String,
    capabilities: ServerCapabilities,
    tools: Vec<Arc<dyn ToolHandler>>,
    instructions: Option<String>,
}

impl McpServerBuilder {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            capabilities: ServerCapabilities::default(),
            tools: Vec::new(),
            instructions: None,
        }
    }

    /// Advertise `logging/setLevel` support.
    pub fn with_logging_capability(mut self) -> Self {
        self.capabilities = self.capabilities.with_logging();
        self
    }

    /// Register a tool handler.
    pub fn tool_handler(mut self, handler: Arc<dyn ToolHandler>) -> Self {
        self.tools.push(handler);
        self.capabilities = self.capabilities.with_tools();
        self
    }

    /// Instructions returned to clients in the initialize result.
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Build the server. Fails if two handlers share a tool name.
    pub fn build(self) -> Result<Arc<McpServer>> {
        let mut tools: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        for handler in self.tools {
            let name = handler.tool().name;
            if tools.insert(name.clone(), handler).is_some() {
                bail!("Duplicate tool name: {name}");
            }
        }

        Ok(Arc::new(McpServer {
            info: Implementation::new(self.name, self.version),
            capabilities: self.capabilities,
            tools,
            log_level: RwLock::new(LogLevel::Info),
            state: RwLock::new(ServerState::Uninitialized),
            client_info: RwLock::new(None),
            instructions: self.instructions,
            notifier: RwLock::new(None),
        }))
    }
}
