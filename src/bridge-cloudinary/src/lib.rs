//! Image upload to Cloudinary.
//!
//! [`CloudinaryUploader`] is configured once with the account's cloud name,
//! API key and API secret, then performs one signed upload per call and
//! returns the asset's `secure_url`.
//!
//! # Example
//!
//! ```rust,ignore
//! use bridge_cloudinary::{CloudinaryConfig, CloudinaryUploader, UploadOptions};
//!
//! let config = CloudinaryConfig::new("demo", "1234", "secret")?;
//! let uploader = CloudinaryUploader::new(config, UploadOptions::default())?;
//! let uploaded = uploader.upload(bytes).await?;
//! println!("{}", uploaded.secure_url);
//! ```

pub mod config;
pub mod error;
pub mod signature;
pub mod uploader;

pub use config::{CloudinaryConfig, DEFAULT_API_BASE};
pub use error::{PublishError, PublishResult};
pub use uploader::{CloudinaryUploader, UploadOptions, UploadedImage};
