//! Transfer outcome types.

use bridge_cloudinary::PublishError;
use bridge_slack::FetchError;
use thiserror::Error;

use crate::credentials::{CredentialName, join_names};

/// Where a transfer ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStage {
    Init,
    FailedConfig,
    FailedFetch,
    FailedPublish,
    /// A fault outside the three classified stages.
    FailedUnexpected,
    Succeeded,
}

impl std::fmt::Display for TransferStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::FailedConfig => "failed_config",
            Self::FailedFetch => "failed_fetch",
            Self::FailedPublish => "failed_publish",
            Self::FailedUnexpected => "failed_unexpected",
            Self::Succeeded => "succeeded",
        };
        f.write_str(name)
    }
}

/// Every way a bridge operation can fail.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Required credentials are not configured.
    #[error("Configuration error: missing required environment variables: {}", join_names(.missing))]
    Configuration {
        /// The absent credentials, in check order.
        missing: Vec<CredentialName>,
    },

    /// Downloading from Slack failed.
    #[error("Failed to download image from Slack: {0}")]
    Fetch(#[from] FetchError),

    /// Uploading to Cloudinary failed.
    #[error("Failed to upload image to Cloudinary: {0}")]
    Publish(#[from] PublishError),

    /// Anything not otherwise classified.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl BridgeError {
    /// Terminal stage this error represents.
    pub fn stage(&self) -> TransferStage {
        match self {
            Self::Configuration { .. } => TransferStage::FailedConfig,
            Self::Fetch(_) => TransferStage::FailedFetch,
            Self::Publish(_) => TransferStage::FailedPublish,
            Self::Unexpected(_) => TransferStage::FailedUnexpected,
        }
    }
}

/// Result type for bridge operations.
pub type BridgeResult<T> = std::result::Result<T, BridgeError>;
