//! Stable key and content-hash generation.
//!
//! Keys are a fixed prefix plus a truncated hex digest of the exact text, so
//! the same text always yields the same key on every run and platform. The
//! scheme is persisted in the ledger header; every command that derives keys
//! reads it back from there instead of trusting its own configuration.

use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::utils::{basename, normalize_whitespace};

/// Prefix of every generated key.
pub const KEY_PREFIX: &str = "i18n_";

/// Shortest digest length accepted from configuration.
pub const MIN_DIGEST_LENGTH: usize = 6;

const DEFAULT_DIGEST_LENGTH: usize = 12;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha1,
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithm::Sha256 => write!(f, "sha256"),
            HashAlgorithm::Sha1 => write!(f, "sha1"),
        }
    }
}

/// Digest algorithm, truncation length and optional tag used for keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashScheme {
    #[serde(default)]
    pub algorithm: HashAlgorithm,
    #[serde(default = "default_length")]
    pub length: usize,
    /// Inserted between the prefix and the digest, e.g. `i18n_rn_…`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
}

fn default_length() -> usize {
    DEFAULT_DIGEST_LENGTH
}

impl Default for HashScheme {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            length: DEFAULT_DIGEST_LENGTH,
            tag: String::new(),
        }
    }
}

impl HashScheme {
    /// Truncated hex digest of `input`, tag included.
    pub fn digest(&self, input: &str) -> String {
        let full = match self.algorithm {
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(input.as_bytes())),
            HashAlgorithm::Sha1 => hex::encode(Sha1::digest(input.as_bytes())),
        };
        let len = self.length.clamp(MIN_DIGEST_LENGTH, full.len());
        format!("{}{}", self.tag, &full[..len])
    }

    /// Lookup key for the exact text. No trimming or normalization happens
    /// here; callers pass the canonical text.
    pub fn key_for(&self, text: &str) -> String {
        format!("{KEY_PREFIX}{}", self.digest(text))
    }

    /// Identity of an extracted string for reconciliation: normalized text
    /// plus the file's basename, so moving a file between directories keeps
    /// its hashes.
    pub fn content_hash(&self, text: &str, file: &str) -> String {
        let input = format!("{}|{}", normalize_whitespace(text), basename(file));
        self.digest(&input)
    }

    /// Returns a warning when the configured length had to be clamped.
    pub fn length_warning(&self) -> Option<String> {
        let max = match self.algorithm {
            HashAlgorithm::Sha256 => 64,
            HashAlgorithm::Sha1 => 40,
        };
        if self.length < MIN_DIGEST_LENGTH || self.length > max {
            Some(format!(
                "hashScheme.length {} is outside {}..={} for {}; clamped",
                self.length, MIN_DIGEST_LENGTH, max, self.algorithm
            ))
        } else {
            None
        }
    }
}
