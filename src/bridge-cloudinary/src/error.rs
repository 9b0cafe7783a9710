//! Error types for publishing to Cloudinary.

use thiserror::Error;

/// Errors that can occur while uploading an image.
#[derive(Error, Debug)]
pub enum PublishError {
    /// One or more of the cloud name, API key or API secret is empty.
    #[error("missing Cloudinary credentials: {}", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),

    /// Nothing to upload.
    #[error("image payload is empty")]
    EmptyPayload,

    /// Cloudinary refused the upload.
    #[error("Cloudinary rejected the upload (HTTP {status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Provider error message.
        message: String,
    },

    /// The upload succeeded but the response carried no `secure_url`.
    #[error("Cloudinary response did not include a secure_url")]
    MissingSecureUrl,

    /// The response body was not the expected JSON.
    #[error("malformed Cloudinary response: {0}")]
    MalformedResponse(String),

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

impl From<reqwest::Error> for PublishError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PublishError::Timeout(err.to_string())
        } else if err.is_connect() {
            PublishError::Network(format!("connection failed: {}", err))
        } else if err.is_decode() {
            PublishError::MalformedResponse(err.to_string())
        } else {
            PublishError::Network(err.to_string())
        }
    }
}

/// Result type for publish operations.
pub type PublishResult<T> = std::result::Result<T, PublishError>;
