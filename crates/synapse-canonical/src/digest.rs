use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::sync::OnceLock;

use crate::validation::ValidationError;

/// Sentinel `previousHash` of the genesis entry: 64 zero characters.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

fn hex64() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9a-f]{64}$").expect("invalid regex"))
}

/// Returns true if `value` has the shape of a lowercase SHA-256 hex digest.
pub fn is_sha256_hex(value: &str) -> bool {
    hex64().is_match(value)
}

/// SHA-256 of `bytes`, lowercase hex.
pub fn sha256_hex(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(bytes.as_ref()))
}

/// Validated lowercase SHA-256 hex digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sha256Hex(String);

impl Sha256Hex {
    /// Parses a digest, rejecting anything that is not 64 lowercase hex chars.
    pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if !is_sha256_hex(&value) {
            return Err(ValidationError::PatternMismatch {
                field: "sha256",
                value,
            });
        }
        Ok(Self(value))
    }

    /// Hashes `bytes` and wraps the result.
    pub fn of(bytes: impl AsRef<[u8]>) -> Self {
        Self(sha256_hex(bytes))
    }

    /// The genesis sentinel.
    pub fn genesis() -> Self {
        Self(GENESIS_HASH.to_string())
    }

    /// Borrowed hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Sha256Hex {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Sha256Hex> for String {
    fn from(value: Sha256Hex) -> Self {
        value.0
    }
}

impl fmt::Display for Sha256Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn genesis_sentinel_has_digest_shape() {
        assert!(is_sha256_hex(GENESIS_HASH));
        assert_eq!(Sha256Hex::genesis().as_str(), GENESIS_HASH);
    }

    #[test]
    fn rejects_uppercase_and_short_values() {
        assert!(Sha256Hex::parse("ABC").is_err());
        assert!(Sha256Hex::parse(GENESIS_HASH.to_uppercase().replace('0', "A")).is_err());
        assert!(Sha256Hex::parse(sha256_hex(b"x")).is_ok());
    }
}
