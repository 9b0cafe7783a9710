//! Image download from Slack private file URLs.
//!
//! Slack serves uploaded files behind `url_private` links that require the
//! bot token as a bearer credential. [`SlackImageFetcher`] performs that one
//! authenticated GET and hands back the raw bytes.
//!
//! # Example
//!
//! ```rust,ignore
//! use bridge_slack::{FetchOptions, SlackImageFetcher};
//! use secrecy::SecretString;
//!
//! let fetcher = SlackImageFetcher::new(FetchOptions::default())?;
//! let token = SecretString::from("xoxb-...");
//! let image = fetcher.fetch("https://files.slack.com/files-pri/T0-F0/cat.png", &token).await?;
//! println!("{} bytes", image.len());
//! ```

pub mod error;
pub mod fetcher;

pub use error::{FetchError, FetchResult};
pub use fetcher::{FetchOptions, FetchedImage, SlackImageFetcher};
