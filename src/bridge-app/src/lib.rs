//! Slack to Cloudinary image bridge.
//!
//! Copies images behind private Slack URLs to Cloudinary and returns the
//! public `https` URL. The operations are exposed to agents as MCP tools:
//!
//! - `download_slack_image`: fetch the image with the bot token
//! - `upload_to_cloudinary`: publish caller-supplied bytes
//! - `upload_slack_image`: both steps in one call
//!
//! Credentials are read once at startup into [`Credentials`] and injected
//! into the [`Bridge`]; nothing reads the environment after that.

pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod tools;
pub mod transfer;

pub use config::{BridgeOptions, DEFAULT_HTTP_TIMEOUT_SECS};
pub use credentials::{CredentialName, Credentials};
pub use error::{BridgeError, BridgeResult, TransferStage};
pub use tools::{SERVER_NAME, build_server};
pub use transfer::{Bridge, ImagePublisher, ImageSource};

use std::sync::Arc;

use bridge_cloudinary::CloudinaryUploader;
use bridge_slack::SlackImageFetcher;
use tracing::{info, warn};

/// The production bridge: Slack as source, Cloudinary as publisher.
pub type SlackCloudinaryBridge = Bridge<SlackImageFetcher, CloudinaryUploader>;

/// Build the production bridge from `credentials`.
///
/// Incomplete Cloudinary credentials are not fatal: the bridge is built
/// without a publisher and every transfer reports the configuration error.
pub fn connect(
    credentials: Credentials,
    options: &BridgeOptions,
) -> anyhow::Result<Arc<SlackCloudinaryBridge>> {
    let fetcher = SlackImageFetcher::new(options.fetch_options())?;

    let publisher = match credentials.cloudinary_config() {
        Ok(config) => {
            let config = config.with_api_base(options.cloudinary_api_base.clone());
            info!(cloud = config.cloud_name(), "Cloudinary publisher configured");
            Some(CloudinaryUploader::new(config, options.upload_options())?)
        }
        Err(e) => {
            warn!(error = %e, "Cloudinary publisher not configured");
            None
        }
    };

    let missing = credentials.missing(&CredentialName::ALL);
    if !missing.is_empty() {
        warn!(
            missing = %credentials::join_names(&missing),
            "Starting with incomplete credentials; transfers will fail until they are set"
        );
    }

    Ok(Arc::new(Bridge::new(credentials, fetcher, publisher)))
}
