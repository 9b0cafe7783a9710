//! Account configuration for the uploader.

use secrecy::{ExposeSecret, SecretString};

use crate::error::{PublishError, PublishResult};

/// Public Cloudinary API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com";

/// Cloudinary account credentials plus the API endpoint.
#[derive(Clone)]
pub struct CloudinaryConfig {
    cloud_name: String,
    api_key: String,
    api_secret: SecretString,
    api_base: String,
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl CloudinaryConfig {
    /// Build a configuration, rejecting any empty credential.
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> PublishResult<Self> {
        let cloud_name = cloud_name.into();
        let api_key = api_key.into();
        let api_secret = api_secret.into();

        let mut missing = Vec::new();
        if api_key.trim().is_empty() {
            missing.push("CLOUDINARY_API_KEY");
        }
        if api_secret.trim().is_empty() {
            missing.push("CLOUDINARY_API_SECRET");
        }
        if cloud_name.trim().is_empty() {
            missing.push("CLOUDINARY_CLOUD_NAME");
        }
        if !missing.is_empty() {
            return Err(PublishError::MissingCredentials(missing));
        }

        Ok(Self {
            cloud_name,
            api_key,
            api_secret: SecretString::new(api_secret.into()),
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }

    /// Point the uploader at a different API host.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn cloud_name(&self) -> &str {
        &self.cloud_name
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn api_secret(&self) -> &str {
        self.api_secret.expose_secret()
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Endpoint for image uploads on this account.
    pub fn upload_url(&self) -> String {
        format!("{}/v1_1/{}/image/upload", self.api_base, self.cloud_name)
    }
}
