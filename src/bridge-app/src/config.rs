//! Runtime options that are not credentials.

use std::time::Duration;

use bridge_cloudinary::{DEFAULT_API_BASE, UploadOptions};
use bridge_slack::FetchOptions;

/// Default deadline applied to every outbound HTTP request.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Transport options shared by the fetch and publish clients.
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Per-request deadline for both providers.
    pub http_timeout: Duration,
    /// Cloudinary API host.
    pub cloudinary_api_base: String,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            cloudinary_api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl BridgeOptions {
    /// Connect deadline: a third of the request deadline, at most 10s.
    fn connect_timeout(&self) -> Duration {
        (self.http_timeout / 3).min(Duration::from_secs(10))
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            timeout: self.http_timeout,
            connect_timeout: self.connect_timeout(),
        }
    }

    pub fn upload_options(&self) -> UploadOptions {
        UploadOptions {
            timeout: self.http_timeout,
            connect_timeout: self.connect_timeout(),
        }
    }
}
