//! Signed upload of a single image.

use std::collections::BTreeMap;
use std::time::Duration;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::CloudinaryConfig;
use crate::error::{PublishError, PublishResult};
use crate::signature;

/// Transport settings for the uploader.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Deadline for the whole upload request.
    pub timeout: Duration,
    /// Deadline for establishing the connection.
    pub connect_timeout: Duration,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// The uploaded asset as described by Cloudinary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    /// Public HTTPS delivery URL.
    pub secure_url: String,
    pub public_id: Option<String>,
    pub format: Option<String>,
    /// Stored size in bytes.
    pub bytes: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    public_id: Option<String>,
    format: Option<String>,
    bytes: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Uploads images to one Cloudinary account.
///
/// Configuration is applied once here; each [`upload`](Self::upload) only
/// signs and sends the request.
#[derive(Clone)]
pub struct CloudinaryUploader {
    config: CloudinaryConfig,
    client: reqwest::Client,
}

impl CloudinaryUploader {
    pub fn new(config: CloudinaryConfig, options: UploadOptions) -> PublishResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .connect_timeout(options.connect_timeout)
            .build()
            .map_err(|e| PublishError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            cloud_name = config.cloud_name(),
            api_base = config.api_base(),
            "Configured Cloudinary uploader"
        );

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &CloudinaryConfig {
        &self.config
    }

    /// Upload `image` and return the stored asset.
    pub async fn upload(&self, image: Bytes) -> PublishResult<UploadedImage> {
        if image.is_empty() {
            return Err(PublishError::EmptyPayload);
        }

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let params = BTreeMap::from([("timestamp", timestamp.clone())]);
        let signature = signature::sign(&params, self.config.api_secret());

        let size = image.len();
        let file = Part::stream_with_length(image, size as u64).file_name("image");
        let form = Form::new()
            .text("api_key", self.config.api_key().to_string())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .part("file", file);

        let url = self.config.upload_url();
        info!(url = %url, size, "Uploading image to Cloudinary");

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .inspect_err(|e| warn!(error = %e, "Cloudinary upload request failed"))?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| truncate(&body, 200));
            warn!(status = status.as_u16(), message = %message, "Cloudinary rejected the upload");
            return Err(PublishError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        if body.trim().is_empty() {
            return Err(PublishError::MalformedResponse("empty body".to_string()));
        }

        let parsed: UploadResponse = serde_json::from_str(&body)
            .map_err(|e| PublishError::MalformedResponse(e.to_string()))?;

        let secure_url = parsed
            .secure_url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                warn!("Cloudinary response is missing secure_url");
                PublishError::MissingSecureUrl
            })?;

        debug!(secure_url = %secure_url, public_id = ?parsed.public_id, "Upload complete");

        Ok(UploadedImage {
            secure_url,
            public_id: parsed.public_id,
            format: parsed.format,
            bytes: parsed.bytes,
        })
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-data";
    const SECURE_URL: &str = "https://res.cloudinary.com/demo/image/upload/v1/x.png";

    fn uploader(server: &MockServer) -> CloudinaryUploader {
        let config = CloudinaryConfig::new("demo", "1234", "s3cr3t-do-not-send")
            .unwrap()
            .with_api_base(server.uri());
        CloudinaryUploader::new(config, UploadOptions::default()).unwrap()
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[tokio::test]
    async fn test_upload_returns_secure_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1_1/demo/image/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "public_id": "x",
                "format": "png",
                "bytes": 22,
                "secure_url": SECURE_URL,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let uploaded = uploader(&server)
            .upload(Bytes::from_static(PNG))
            .await
            .expect("upload");

        assert_eq!(uploaded.secure_url, SECURE_URL);
        assert_eq!(uploaded.public_id.as_deref(), Some("x"));
        assert_eq!(uploaded.bytes, Some(22));

        let requests = server.received_requests().await.unwrap();
        let body = &requests[0].body;
        assert!(contains(body, PNG), "payload must be sent unmodified");
        assert!(
            requests[0].headers.get("content-length").is_some(),
            "streamed part must keep a known length"
        );
        assert!(contains(body, b"name=\"api_key\""));
        assert!(contains(body, b"name=\"signature\""));
        assert!(contains(body, b"name=\"timestamp\""));
        assert!(
            !contains(body, b"s3cr3t-do-not-send"),
            "secret must never be sent"
        );
    }

    #[tokio::test]
    async fn test_upload_missing_secure_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "public_id": "x" })))
            .mount(&server)
            .await;

        let err = uploader(&server)
            .upload(Bytes::from_static(PNG))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::MissingSecureUrl));
    }

    #[tokio::test]
    async fn test_upload_empty_response_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let err = uploader(&server)
            .upload(Bytes::from_static(PNG))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_upload_rejected_with_provider_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "message": "Invalid Signature abc. String to sign - 'timestamp=1'." }
            })))
            .mount(&server)
            .await;

        let err = uploader(&server)
            .upload(Bytes::from_static(PNG))
            .await
            .unwrap_err();
        match err {
            PublishError::Rejected { status, message } => {
                assert_eq!(status, 401);
                assert!(message.starts_with("Invalid Signature"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_upload_empty_payload_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = uploader(&server).upload(Bytes::new()).await.unwrap_err();
        assert!(matches!(err, PublishError::EmptyPayload));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc…");
    }
}
