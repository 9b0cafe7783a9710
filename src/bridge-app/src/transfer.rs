//! The bridge: credential guard, fetch, publish and the transfer that chains them.

use async_trait::async_trait;
use bytes::Bytes;
use secrecy::SecretString;
use tracing::{debug, info, warn};

use bridge_cloudinary::{CloudinaryUploader, PublishError, PublishResult, UploadedImage};
use bridge_slack::{FetchError, FetchResult, FetchedImage, SlackImageFetcher};

use crate::credentials::{CredentialName, Credentials};
use crate::error::{BridgeError, BridgeResult, TransferStage};

/// Where images come from.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, url: &str, token: &SecretString) -> FetchResult<FetchedImage>;
}

/// Where images go.
#[async_trait]
pub trait ImagePublisher: Send + Sync {
    async fn publish(&self, image: Bytes) -> PublishResult<UploadedImage>;
}

#[async_trait]
impl ImageSource for SlackImageFetcher {
    async fn fetch(&self, url: &str, token: &SecretString) -> FetchResult<FetchedImage> {
        SlackImageFetcher::fetch(self, url, token).await
    }
}

#[async_trait]
impl ImagePublisher for CloudinaryUploader {
    async fn publish(&self, image: Bytes) -> PublishResult<UploadedImage> {
        self.upload(image).await
    }
}

/// Moves images from a private source to a public host.
///
/// Credentials are injected once. The publisher is built by the caller from
/// those credentials; it is `None` when the Cloudinary triple is incomplete.
pub struct Bridge<S, P> {
    credentials: Credentials,
    source: S,
    publisher: Option<P>,
}

impl<S: ImageSource, P: ImagePublisher> Bridge<S, P> {
    pub fn new(credentials: Credentials, source: S, publisher: Option<P>) -> Self {
        Self {
            credentials,
            source,
            publisher,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Names from `required` that are not configured. Empty means all present.
    pub fn check_credentials(&self, required: &[CredentialName]) -> Vec<CredentialName> {
        let missing = self.credentials.missing(required);
        debug!(?required, ?missing, "Checked credentials");
        missing
    }

    /// Download the image at `url` using the bot token.
    pub async fn fetch_image(&self, url: &str) -> BridgeResult<FetchedImage> {
        let token = self.credentials.bot_token().ok_or(FetchError::MissingToken)?;
        let image = self.source.fetch(url, token).await?;
        if image.is_empty() {
            return Err(FetchError::EmptyBody.into());
        }
        Ok(image)
    }

    /// Upload `image` and return the hosted asset.
    pub async fn publish_image(&self, image: Bytes) -> BridgeResult<UploadedImage> {
        let Some(publisher) = self.publisher.as_ref() else {
            let missing = self
                .credentials
                .missing(&CredentialName::CLOUDINARY)
                .into_iter()
                .map(CredentialName::env_var)
                .collect();
            return Err(PublishError::MissingCredentials(missing).into());
        };
        if image.is_empty() {
            return Err(PublishError::EmptyPayload.into());
        }
        Ok(publisher.publish(image).await?)
    }

    /// Copy the image at `url` to the public host and return its URL.
    ///
    /// Linear and single-shot: credential check, fetch, publish. Nothing is
    /// retried and a failure at any step ends the transfer.
    pub async fn transfer_image(&self, url: &str) -> BridgeResult<String> {
        info!(url, stage = %TransferStage::Init, "Starting transfer");

        let result = self.run_transfer(url).await;
        match &result {
            Ok(public_url) => {
                info!(url, public_url = %public_url, stage = %TransferStage::Succeeded, "Transfer finished");
            }
            Err(e) => {
                warn!(url, stage = %e.stage(), error = %e, "Transfer failed");
            }
        }
        result
    }

    async fn run_transfer(&self, url: &str) -> BridgeResult<String> {
        let missing = self.check_credentials(&CredentialName::ALL);
        if !missing.is_empty() {
            return Err(BridgeError::Configuration { missing });
        }

        let image = self.fetch_image(url).await?;
        debug!(url, size = image.len(), "Fetched image, publishing");

        if self.publisher.is_none() {
            return Err(BridgeError::Unexpected(
                "credentials are complete but no publisher was configured".to_string(),
            ));
        }
        let uploaded = self.publish_image(image.bytes).await?;

        Ok(uploaded.secure_url)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bridge_slack::FetchError;
    use pretty_assertions::assert_eq;

    pub(crate) const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";
    pub(crate) const SECURE_URL: &str = "https://res.cloudinary.com/demo/image/upload/v1/x.png";

    /// Source that serves a canned response and counts calls.
    pub(crate) struct StubSource {
        pub(crate) response: fn() -> FetchResult<FetchedImage>,
        pub(crate) calls: AtomicUsize,
        pub(crate) served: Mutex<Vec<Bytes>>,
    }

    impl StubSource {
        pub(crate) fn new(response: fn() -> FetchResult<FetchedImage>) -> Self {
            Self {
                response,
                calls: AtomicUsize::new(0),
                served: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn png() -> Self {
            Self::new(|| {
                Ok(FetchedImage {
                    bytes: Bytes::from_static(PNG),
                    content_type: Some("image/png".to_string()),
                })
            })
        }
    }

    #[async_trait]
    impl ImageSource for StubSource {
        async fn fetch(&self, _url: &str, _token: &SecretString) -> FetchResult<FetchedImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let response = (self.response)();
            if let Ok(image) = &response {
                self.served.lock().unwrap().push(image.bytes.clone());
            }
            response
        }
    }

    /// Publisher that records what it receives.
    pub(crate) struct StubPublisher {
        pub(crate) response: fn() -> PublishResult<UploadedImage>,
        pub(crate) received: Mutex<Vec<Bytes>>,
    }

    impl StubPublisher {
        pub(crate) fn new(response: fn() -> PublishResult<UploadedImage>) -> Self {
            Self {
                response,
                received: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn ok() -> Self {
            Self::new(|| {
                Ok(UploadedImage {
                    secure_url: SECURE_URL.to_string(),
                    public_id: Some("x".to_string()),
                    format: Some("png".to_string()),
                    bytes: None,
                })
            })
        }

        pub(crate) fn calls(&self) -> usize {
            self.received.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ImagePublisher for StubPublisher {
        async fn publish(&self, image: Bytes) -> PublishResult<UploadedImage> {
            self.received.lock().unwrap().push(image);
            (self.response)()
        }
    }

    pub(crate) fn full_credentials() -> Credentials {
        Credentials::default()
            .with(CredentialName::BotToken, "xoxb-test")
            .with(CredentialName::CloudinaryApiKey, "key")
            .with(CredentialName::CloudinaryApiSecret, "secret")
            .with(CredentialName::CloudinaryCloudName, "demo")
    }

    const URL: &str = "https://files.slack.com/files-pri/T1-F1/cat.png";

    #[tokio::test]
    async fn test_happy_path_returns_secure_url() {
        let bridge = Bridge::new(
            full_credentials(),
            StubSource::png(),
            Some(StubPublisher::ok()),
        );

        let url = bridge.transfer_image(URL).await.unwrap();
        assert_eq!(url, SECURE_URL);
    }

    #[tokio::test]
    async fn test_published_bytes_match_fetched_bytes() {
        let bridge = Bridge::new(
            full_credentials(),
            StubSource::png(),
            Some(StubPublisher::ok()),
        );
        bridge.transfer_image(URL).await.unwrap();

        let served = bridge.source.served.lock().unwrap().clone();
        let received = bridge
            .publisher
            .as_ref()
            .unwrap()
            .received
            .lock()
            .unwrap()
            .clone();
        assert_eq!(served, received);
        assert_eq!(received[0].as_ref(), PNG);
    }

    #[tokio::test]
    async fn test_each_missing_credential_is_reported_without_network() {
        for absent in CredentialName::ALL {
            let mut credentials = Credentials::default();
            for name in CredentialName::ALL.into_iter().filter(|n| *n != absent) {
                credentials = credentials.with(name, "value");
            }

            let bridge = Bridge::new(credentials, StubSource::png(), Some(StubPublisher::ok()));
            let err = bridge.transfer_image(URL).await.unwrap_err();

            match err {
                BridgeError::Configuration { missing } => assert_eq!(missing, vec![absent]),
                other => panic!("expected configuration error, got {other}"),
            }
            assert_eq!(bridge.source.calls.load(Ordering::SeqCst), 0);
            assert_eq!(bridge.publisher.as_ref().unwrap().calls(), 0);
        }
    }

    #[tokio::test]
    async fn test_no_credentials_lists_all_four() {
        let bridge: Bridge<StubSource, StubPublisher> =
            Bridge::new(Credentials::default(), StubSource::png(), None);
        let err = bridge.transfer_image(URL).await.unwrap_err();
        match err {
            BridgeError::Configuration { missing } => {
                assert_eq!(missing, CredentialName::ALL.to_vec())
            }
            other => panic!("expected configuration error, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_never_publishes() {
        let source = StubSource::new(|| {
            Err(FetchError::Status {
                status: 404,
                url: URL.to_string(),
            })
        });
        let bridge = Bridge::new(full_credentials(), source, Some(StubPublisher::ok()));

        let err = bridge.transfer_image(URL).await.unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Fetch(FetchError::Status { status: 404, .. })
        ));
        assert_eq!(err.stage(), TransferStage::FailedFetch);
        assert_eq!(bridge.publisher.as_ref().unwrap().calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_fetch_is_a_fetch_error() {
        let source = StubSource::new(|| {
            Ok(FetchedImage {
                bytes: Bytes::new(),
                content_type: None,
            })
        });
        let bridge = Bridge::new(full_credentials(), source, Some(StubPublisher::ok()));

        let err = bridge.transfer_image(URL).await.unwrap_err();
        assert!(matches!(err, BridgeError::Fetch(FetchError::EmptyBody)));
        assert_eq!(bridge.publisher.as_ref().unwrap().calls(), 0);
    }

    #[tokio::test]
    async fn test_publish_failure_is_a_publish_error() {
        let publisher = StubPublisher::new(|| Err(PublishError::MissingSecureUrl));
        let bridge = Bridge::new(full_credentials(), StubSource::png(), Some(publisher));

        let err = bridge.transfer_image(URL).await.unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Publish(PublishError::MissingSecureUrl)
        ));
        assert_eq!(err.stage(), TransferStage::FailedPublish);
    }

    #[tokio::test]
    async fn test_missing_publisher_is_unexpected() {
        let bridge: Bridge<StubSource, StubPublisher> =
            Bridge::new(full_credentials(), StubSource::png(), None);

        let err = bridge.transfer_image(URL).await.unwrap_err();
        assert!(matches!(err, BridgeError::Unexpected(_)));
    }

    #[tokio::test]
    async fn test_publish_image_without_publisher_names_missing_parts() {
        let credentials = Credentials::default().with(CredentialName::CloudinaryApiKey, "key");
        let bridge: Bridge<StubSource, StubPublisher> =
            Bridge::new(credentials, StubSource::png(), None);

        let err = bridge
            .publish_image(Bytes::from_static(PNG))
            .await
            .unwrap_err();
        match err {
            BridgeError::Publish(PublishError::MissingCredentials(missing)) => {
                assert_eq!(missing, vec!["CLOUDINARY_API_SECRET", "CLOUDINARY_CLOUD_NAME"]);
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_image_without_token() {
        let credentials = Credentials::default().with(CredentialName::CloudinaryApiKey, "key");
        let bridge: Bridge<StubSource, StubPublisher> =
            Bridge::new(credentials, StubSource::png(), None);

        let err = bridge.fetch_image(URL).await.unwrap_err();
        assert!(matches!(err, BridgeError::Fetch(FetchError::MissingToken)));
        assert_eq!(bridge.source.calls.load(Ordering::SeqCst), 0);
    }
}
