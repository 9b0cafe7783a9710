//! Error types for downloading from Slack.

use thiserror::Error;

/// Errors that can occur while fetching an image.
#[derive(Error, Debug)]
pub enum FetchError {
    /// No bearer token was available.
    #[error("bot token is missing")]
    MissingToken,

    /// The source URL could not be parsed.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// The server answered 2xx with an empty body.
    #[error("response body was empty")]
    EmptyBody,

    /// The server answered 2xx with something that is not an image.
    ///
    /// Slack replies to an unauthorized file request with its sign-in page.
    #[error("expected image data but received '{content_type}' (check the bot token and its files:read scope)")]
    UnexpectedContent {
        /// Reported Content-Type.
        content_type: String,
    },

    /// Network/HTTP error.
    #[error("network error: {0}")]
    Network(String),

    /// The request exceeded its deadline.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else if err.is_connect() {
            FetchError::Network(format!("connection failed: {}", err))
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Result type for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;
