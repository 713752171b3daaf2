use base64::Engine;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest as Sha2Digest, Sha256};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Supported digest algorithms for canonical text fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DigestAlg {
    /// SHA-256.
    #[serde(rename = "sha-256")]
    Sha256,
}

impl fmt::Display for DigestAlg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DigestAlg::Sha256 => f.write_str("sha-256"),
        }
    }
}

/// Error raised for malformed digest text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DigestError {
    /// The encoded bytes are not 43-44 base64url characters.
    #[error("digest ('{value}') is not base64url encoded")]
    PatternMismatch {
        /// Offending value.
        value: String,
    },
}

fn b64_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{43,44}$").expect("invalid regex"))
}

/// Algorithm + bytes digest, encoded as base64url without padding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digest {
    /// Digest algorithm (currently always `sha-256`).
    pub alg: DigestAlg,
    /// Base64URL (no padding) digest bytes.
    #[serde(rename = "b64")]
    pub b64: String,
}

impl Digest {
    /// Constructs a validated digest.
    pub fn new(alg: DigestAlg, b64: impl Into<String>) -> Result<Self, DigestError> {
        let b64 = b64.into();
        if !b64_pattern().is_match(&b64) {
            return Err(DigestError::PatternMismatch { value: b64 });
        }
        Ok(Digest { alg, b64 })
    }

    /// SHA-256 of UTF-8 text.
    pub fn of_text(text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        let hash_bytes = hasher.finalize();
        Digest {
            alg: DigestAlg::Sha256,
            b64: base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(hash_bytes),
        }
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.alg, self.b64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_digest_passes_validation() {
        let digest = Digest::of_text("a: 1\n");
        assert_eq!(Digest::new(digest.alg, digest.b64.clone()), Ok(digest));
        assert_eq!(
            Digest::new(DigestAlg::Sha256, "not+base64url/"),
            Err(DigestError::PatternMismatch {
                value: "not+base64url/".into()
            })
        );
    }
}
