//! MCP server core: request dispatch and the stdio transport.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, error, info, warn};

use bridge_mcp_types::{
    CallToolParams, CallToolResult, CancelledNotification, Implementation, InitializeParams,
    InitializeResult, JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    ListToolsResult, LogLevel, LogMessage, RequestId, ServerCapabilities, SetLogLevelParams, Tool,
    methods,
};

use crate::handlers::ToolHandler;

/// Capacity of the outbound response queue feeding the writer task.
const RESPONSE_QUEUE: usize = 64;

/// Lifecycle state of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Uninitialized,
    /// `initialize` answered, waiting for `notifications/initialized`.
    Initializing,
    Ready,
    Stopped,
}

/// A decoded line from the transport.
#[derive(Debug)]
pub enum Incoming {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
    /// The line could not be used; the response must be sent back as-is.
    Invalid(JsonRpcResponse),
    /// A well-formed message the server has nothing to do with (e.g. a response).
    Ignored,
}

/// A line queued for the transport writer.
#[derive(Debug)]
pub(crate) enum Outgoing {
    Response(JsonRpcResponse),
    Notification(JsonRpcNotification),
}

/// MCP server hosting a fixed set of tools.
pub struct McpServer {
    pub(crate) info: Implementation,
    pub(crate) capabilities: ServerCapabilities,
    pub(crate) tools: HashMap<String, Arc<dyn ToolHandler>>,
    pub(crate) log_level: RwLock<LogLevel>,
    pub(crate) state: RwLock<ServerState>,
    pub(crate) client_info: RwLock<Option<Implementation>>,
    pub(crate) instructions: Option<String>,
    /// Sender into the writer task while `serve` is running.
    pub(crate) notifier: RwLock<Option<mpsc::Sender<Outgoing>>>,
}

impl McpServer {
    pub fn info(&self) -> &Implementation {
        &self.info
    }

    pub fn capabilities(&self) -> &ServerCapabilities {
        &self.capabilities
    }

    pub async fn state(&self) -> ServerState {
        *self.state.read().await
    }

    pub async fn log_level(&self) -> LogLevel {
        *self.log_level.read().await
    }

    /// Client that completed the handshake, if any.
    pub async fn client_info(&self) -> Option<Implementation> {
        self.client_info.read().await.clone()
    }

    /// Registered tools, sorted by name.
    pub fn tools(&self) -> Vec<Tool> {
        let mut tools: Vec<Tool> = self.tools.values().map(|h| h.tool()).collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Send a `notifications/message` to the client.
    ///
    /// Dropped unless the logging capability is advertised, `level` is at or
    /// above the level set through `logging/setLevel`, and a transport is
    /// running.
    pub async fn log(&self, level: LogLevel, logger: &str, data: Value) {
        if self.capabilities.logging.is_none() || level < *self.log_level.read().await {
            return;
        }
        let Some(tx) = self.notifier.read().await.clone() else {
            return;
        };

        let message = LogMessage::new(level, data).with_logger(logger);
        let params = match serde_json::to_value(message) {
            Ok(params) => params,
            Err(e) => {
                warn!(error = %e, "Failed to encode log notification");
                return;
            }
        };
        let notification = JsonRpcNotification::new(methods::LOG_MESSAGE).with_params(params);
        if tx.send(Outgoing::Notification(notification)).await.is_err() {
            debug!("Log notification dropped: writer has stopped");
        }
    }

    // ========================================================================
    // Decoding
    // ========================================================================

    /// Classify one transport line.
    pub fn decode(line: &str) -> Incoming {
        let value: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                return Incoming::Invalid(JsonRpcResponse::error(
                    RequestId::Null,
                    JsonRpcError::parse_error(format!("Invalid JSON: {e}")),
                ));
            }
        };

        let Some(object) = value.as_object() else {
            return Incoming::Invalid(JsonRpcResponse::error(
                RequestId::Null,
                JsonRpcError::invalid_request("Expected a JSON object"),
            ));
        };

        let has_method = object.contains_key("method");
        let id = object.get("id").cloned();

        match (has_method, id) {
            (true, Some(id)) => match serde_json::from_value::<JsonRpcRequest>(value) {
                Ok(request) => Incoming::Request(request),
                Err(e) => {
                    let id = serde_json::from_value(id).unwrap_or(RequestId::Null);
                    Incoming::Invalid(JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_request(format!("Malformed request: {e}")),
                    ))
                }
            },
            (true, None) => match serde_json::from_value::<JsonRpcNotification>(value) {
                Ok(notification) => Incoming::Notification(notification),
                Err(e) => {
                    warn!(error = %e, "Dropping malformed notification");
                    Incoming::Ignored
                }
            },
            (false, _) => Incoming::Ignored,
        }
    }

    // ========================================================================
    // Request Handlers
    // ========================================================================

    /// Handle a JSON-RPC request.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!(method = %request.method, id = %request.id, "Handling request");

        let result = match request.method.as_str() {
            methods::INITIALIZE => self.handle_initialize(request.params).await,
            methods::PING => Ok(json!({})),
            methods::TOOLS_LIST => self.handle_list_tools(),
            methods::TOOLS_CALL => self.handle_call_tool(request.params).await,
            methods::LOGGING_SET_LEVEL => self.handle_set_log_level(request.params).await,
            _ => Err(JsonRpcError::method_not_found(&request.method)),
        };

        match result {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(error) => JsonRpcResponse::error(request.id, error),
        }
    }

    /// Handle a JSON-RPC notification.
    pub async fn handle_notification(&self, notification: JsonRpcNotification) {
        debug!(method = %notification.method, "Handling notification");

        match notification.method.as_str() {
            methods::INITIALIZED => {
                *self.state.write().await = ServerState::Ready;
                info!("Server initialized and ready");
            }
            methods::CANCELLED => {
                // In-flight transfers always run to completion.
                let cancelled = notification
                    .params
                    .and_then(|p| serde_json::from_value::<CancelledNotification>(p).ok());
                if let Some(cancelled) = cancelled {
                    info!(
                        request_id = %cancelled.request_id,
                        reason = cancelled.reason.as_deref().unwrap_or(""),
                        "Cancellation requested but not supported; request will complete"
                    );
                }
            }
            _ => {
                warn!(method = %notification.method, "Unknown notification");
            }
        }
    }

    async fn handle_initialize(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        // Rejected params leave the state untouched so the client can retry.
        let init_params: InitializeParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {e}")))?
            .unwrap_or_default();

        {
            let mut state = self.state.write().await;
            if *state != ServerState::Uninitialized {
                return Err(JsonRpcError::invalid_request("Server already initialized"));
            }
            *state = ServerState::Initializing;
        }

        info!(
            client = %init_params.client_info.name,
            version = %init_params.client_info.version,
            protocol = %init_params.protocol_version,
            "Client connected"
        );
        *self.client_info.write().await = Some(init_params.client_info);

        let result = InitializeResult {
            protocol_version: bridge_mcp_types::PROTOCOL_VERSION.to_string(),
            capabilities: self.capabilities.clone(),
            server_info: self.info.clone(),
            instructions: self.instructions.clone(),
        };

        serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
    }

    fn handle_list_tools(&self) -> Result<Value, JsonRpcError> {
        let result = ListToolsResult::new(self.tools());
        serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
    }

    async fn handle_call_tool(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params = params.ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?;
        let call_params: CallToolParams = serde_json::from_value(params)
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {e}")))?;

        let handler = self.tools.get(&call_params.name).cloned().ok_or_else(|| {
            JsonRpcError::invalid_params(format!("Unknown tool: {}", call_params.name))
        })?;

        debug!(tool = %call_params.name, "Calling tool");
        let arguments = call_params.arguments.unwrap_or_else(|| json!({}));

        // Run on its own task so a panicking handler still yields a result.
        let execution = tokio::spawn(async move { handler.execute(arguments).await }).await;
        let call_result = match execution {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                error!(tool = %call_params.name, error = %e, "Tool failed unexpectedly");
                CallToolResult::error(format!("Unexpected error: {e}"))
            }
            Err(e) => {
                error!(tool = %call_params.name, error = %e, "Tool task aborted");
                CallToolResult::error(format!("Unexpected error: tool task failed: {e}"))
            }
        };

        if call_result.is_error() {
            let message = call_result.first_text().unwrap_or_default();
            self.log(
                LogLevel::Error,
                &call_params.name,
                json!({ "message": message }),
            )
            .await;
        } else {
            self.log(
                LogLevel::Debug,
                &call_params.name,
                json!({ "message": "completed" }),
            )
            .await;
        }

        serde_json::to_value(call_result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
    }

    async fn handle_set_log_level(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params = params.ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?;
        let level_params: SetLogLevelParams = serde_json::from_value(params)
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {e}")))?;

        *self.log_level.write().await = level_params.level;
        debug!(level = %level_params.level, "Log level changed");

        Ok(json!({}))
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Run the server over stdin/stdout until stdin closes.
    pub async fn run_stdio(self: Arc<Self>) -> Result<()> {
        info!(server = %self.info.name, "Starting MCP server with stdio transport");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve newline-delimited JSON-RPC from `reader`, answering on `writer`.
    ///
    /// Each `tools/call` runs on its own task; responses are written in
    /// completion order by a single writer task. Returns once the reader hits EOF and
    /// every in-flight request has been answered.
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Outgoing>(RESPONSE_QUEUE);
        let writer_task = tokio::spawn(write_outgoing(rx, writer));
        *self.notifier.write().await = Some(tx.clone());

        let mut lines = BufReader::new(reader).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("EOF received, shutting down");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Error reading from transport");
                    break;
                }
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match Self::decode(trimmed) {
                Incoming::Request(request) if request.method != methods::TOOLS_CALL => {
                    // Lifecycle and listing requests are answered in arrival order.
                    let response = self.handle_request(request).await;
                    if tx.send(Outgoing::Response(response)).await.is_err() {
                        break;
                    }
                }
                Incoming::Request(request) => {
                    let server = Arc::clone(&self);
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let response = server.handle_request(request).await;
                        if tx.send(Outgoing::Response(response)).await.is_err() {
                            warn!("Response dropped: writer has stopped");
                        }
                    });
                }
                Incoming::Notification(notification) => {
                    self.handle_notification(notification).await;
                }
                Incoming::Invalid(response) => {
                    warn!(line = %trimmed, "Invalid JSON-RPC message");
                    if tx.send(Outgoing::Response(response)).await.is_err() {
                        break;
                    }
                }
                Incoming::Ignored => {
                    debug!("Ignoring message without a method");
                }
            }
        }

        // The writer drains once every spawned request has dropped its sender.
        self.notifier.write().await.take();
        drop(tx);
        let written = writer_task.await.context("Writer task panicked")?;

        *self.state.write().await = ServerState::Stopped;
        info!("MCP server stopped");

        written
    }
}

async fn write_outgoing<W>(mut rx: mpsc::Receiver<Outgoing>, mut writer: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(outgoing) = rx.recv().await {
        let encoded = match &outgoing {
            Outgoing::Response(response) => serde_json::to_vec(response),
            Outgoing::Notification(notification) => serde_json::to_vec(notification),
        };
        let mut line = encoded.context("Failed to serialize outgoing message")?;
        line.push(b'\n');
        writer
            .write_all(&line)
            .await
            .context("Failed to write response")?;
        writer.flush().await.context("Failed to flush response")?;
    }
    Ok(())
}
