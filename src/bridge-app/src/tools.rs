//! The three MCP tools exposed by the bridge.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use bridge_mcp_server::{McpServer, McpServerBuilder, ToolHandler};
use bridge_mcp_types::{CallToolResult, Content, PropertySchema, Tool, ToolInputSchema};

use crate::transfer::{Bridge, ImagePublisher, ImageSource};

/// Name advertised in the initialize handshake.
pub const SERVER_NAME: &str = "Slack-Cloudinary-Bridge";

pub const DOWNLOAD_SLACK_IMAGE: &str = "download_slack_image";
pub const UPLOAD_TO_CLOUDINARY: &str = "upload_to_cloudinary";
pub const UPLOAD_SLACK_IMAGE: &str = "upload_slack_image";

const INSTRUCTIONS: &str = "Copies images from private Slack URLs to public Cloudinary URLs. \
Use upload_slack_image with a files.slack.com URL to get a shareable https link.";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SlackUrlArgs {
    slack_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImageBytesArgs {
    image_bytes: String,
}

/// Parse tool arguments, mapping failures to a readable error result.
fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, CallToolResult> {
    serde_json::from_value(arguments)
        .map_err(|e| CallToolResult::error(format!("Invalid arguments for {tool}: {e}")))
}

fn slack_url_schema() -> ToolInputSchema {
    ToolInputSchema::object()
        .property(
            "slack_url",
            PropertySchema::string()
                .description("Private Slack file URL, e.g. https://files.slack.com/files-pri/...")
                .format("uri")
                .min_len(1),
        )
        .required(vec!["slack_url"])
}

/// Why `image_bytes` could not be turned into an image payload.
#[derive(Error, Debug)]
pub enum ImageBytesError {
    #[error("data URL is not base64 encoded")]
    NotBase64DataUrl,

    #[error("image_bytes is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Decode base64 image data. Accepts a `data:<mime>;base64,` prefix and
/// embedded whitespace.
pub fn decode_image_bytes(input: &str) -> Result<Bytes, ImageBytesError> {
    let payload = match input.trim().strip_prefix("data:") {
        Some(rest) => match rest.split_once(";base64,") {
            Some((_, data)) => data,
            None => return Err(ImageBytesError::NotBase64DataUrl),
        },
        None => input,
    };

    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let decoded = STANDARD.decode(compact.as_bytes())?;
    Ok(Bytes::from(decoded))
}

// ============================================================================
// download_slack_image
// ============================================================================

/// Fetch a private Slack image and return it inline.
pub struct DownloadSlackImageTool<S, P> {
    bridge: Arc<Bridge<S, P>>,
}

impl<S, P> DownloadSlackImageTool<S, P> {
    pub fn new(bridge: Arc<Bridge<S, P>>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl<S, P> ToolHandler for DownloadSlackImageTool<S, P>
where
    S: ImageSource + 'static,
    P: ImagePublisher + 'static,
{
    fn tool(&self) -> Tool {
        Tool::new(
            DOWNLOAD_SLACK_IMAGE,
            "Download an image from a private Slack URL using the bot token. \
             Returns the image as base64 content.",
        )
        .with_schema(slack_url_schema())
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: SlackUrlArgs = match parse_args(DOWNLOAD_SLACK_IMAGE, arguments) {
            Ok(args) => args,
            Err(result) => return Ok(result),
        };

        match self.bridge.fetch_image(&args.slack_url).await {
            Ok(image) => {
                debug!(url = %args.slack_url, size = image.len(), "Downloaded image");
                let data = STANDARD.encode(&image.bytes);
                Ok(CallToolResult::with_content(vec![Content::image(
                    data,
                    image.mime_type(),
                )]))
            }
            Err(e) => Ok(CallToolResult::error(e.to_string())),
        }
    }
}

// ============================================================================
// upload_to_cloudinary
// ============================================================================

/// Upload caller-supplied image bytes and return the public URL.
pub struct UploadToCloudinaryTool<S, P> {
    bridge: Arc<Bridge<S, P>>,
}

impl<S, P> UploadToCloudinaryTool<S, P> {
    pub fn new(bridge: Arc<Bridge<S, P>>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl<S, P> ToolHandler for UploadToCloudinaryTool<S, P>
where
    S: ImageSource + 'static,
    P: ImagePublisher + 'static,
{
    fn tool(&self) -> Tool {
        Tool::new(
            UPLOAD_TO_CLOUDINARY,
            "Upload base64-encoded image data to Cloudinary. Returns the public https URL.",
        )
        .with_schema(
            ToolInputSchema::object()
                .property(
                    "image_bytes",
                    PropertySchema::string()
                        .description("Image data, base64 encoded (a data: URL is accepted)")
                        .content_encoding("base64")
                        .min_len(1),
                )
                .required(vec!["image_bytes"]),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: ImageBytesArgs = match parse_args(UPLOAD_TO_CLOUDINARY, arguments) {
            Ok(args) => args,
            Err(result) => return Ok(result),
        };

        let image = match decode_image_bytes(&args.image_bytes) {
            Ok(image) => image,
            Err(e) => {
                return Ok(CallToolResult::error(format!(
                    "Invalid arguments for {UPLOAD_TO_CLOUDINARY}: {e}"
                )));
            }
        };

        match self.bridge.publish_image(image).await {
            Ok(uploaded) => Ok(CallToolResult::text(uploaded.secure_url)),
            Err(e) => Ok(CallToolResult::error(e.to_string())),
        }
    }
}

// ============================================================================
// upload_slack_image
// ============================================================================

/// Copy a private Slack image to Cloudinary in one call.
pub struct UploadSlackImageTool<S, P> {
    bridge: Arc<Bridge<S, P>>,
}

impl<S, P> UploadSlackImageTool<S, P> {
    pub fn new(bridge: Arc<Bridge<S, P>>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl<S, P> ToolHandler for UploadSlackImageTool<S, P>
where
    S: ImageSource + 'static,
    P: ImagePublisher + 'static,
{
    fn tool(&self) -> Tool {
        Tool::new(
            UPLOAD_SLACK_IMAGE,
            "Copy an image from a private Slack URL to Cloudinary. \
             Returns the public https URL of the uploaded image.",
        )
        .with_schema(slack_url_schema())
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: SlackUrlArgs = match parse_args(UPLOAD_SLACK_IMAGE, arguments) {
            Ok(args) => args,
            Err(result) => return Ok(result),
        };

        match self.bridge.transfer_image(&args.slack_url).await {
            Ok(public_url) => Ok(CallToolResult::text(public_url)),
            Err(e) => Ok(CallToolResult::error(e.to_string())),
        }
    }
}

/// Build the MCP server with all three tools bound to `bridge`.
pub fn build_server<S, P>(bridge: Arc<Bridge<S, P>>) -> Result<Arc<McpServer>>
where
    S: ImageSource + 'static,
    P: ImagePublisher + 'static,
{
    let server = McpServerBuilder::new(SERVER_NAME, env!("CARGO_PKG_VERSION"))
        .with_logging_capability()
        .instructions(INSTRUCTIONS)
        .tool_handler(Arc::new(DownloadSlackImageTool::new(Arc::clone(&bridge))))
        .tool_handler(Arc::new(UploadToCloudinaryTool::new(Arc::clone(&bridge))))
        .tool_handler(Arc::new(UploadSlackImageTool::new(bridge)))
        .build()?;

    info!(tools = server.tools().len(), "Registered bridge tools");
    Ok(server)
}
