//! Upload request signing.
//!
//! Cloudinary authenticates signed uploads with a SHA-1 digest over the
//! signed parameters: sorted by name, joined as `name=value` with `&`, with
//! the API secret appended. `file`, `api_key` and `signature` itself are
//! never part of the signed string.

use std::collections::BTreeMap;

use sha1::{Digest, Sha1};

/// Parameters excluded from the signed string.
const UNSIGNED: &[&str] = &["file", "api_key", "signature", "resource_type", "cloud_name"];

/// Build the string that gets hashed.
pub fn string_to_sign(params: &BTreeMap<&str, String>) -> String {
    params
        .iter()
        .filter(|(name, value)| !UNSIGNED.contains(name) && !value.is_empty())
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Lowercase hex SHA-1 signature for `params`.
pub fn sign(params: &BTreeMap<&str, String>, api_secret: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(string_to_sign(params).as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_timestamp_only() {
        let params = BTreeMap::from([("timestamp", "1315060510".to_string())]);
        assert_eq!(string_to_sign(&params), "timestamp=1315060510");
        assert_eq!(
            sign(&params, "abcd"),
            "a21ad0f63beb4de2e5575204b79ab90bffb02c10"
        );
    }

    #[test]
    fn test_sign_sorts_and_skips_unsigned() {
        let params = BTreeMap::from([
            ("timestamp", "1315060510".to_string()),
            ("public_id", "sample_image".to_string()),
            ("api_key", "1234".to_string()),
            ("file", "ignored".to_string()),
        ]);
        assert_eq!(
            string_to_sign(&params),
            "public_id=sample_image&timestamp=1315060510"
        );
        assert_eq!(
            sign(&params, "abcd"),
            "b4ad47fb4e25c7bf5f92a20089f9db59bc302313"
        );
    }
}
