//! Content fingerprints for files and units

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Digest used for every fingerprint in a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Blake3,
}

impl HashAlgorithm {
    /// Hex digest of raw bytes.
    pub fn digest(self, bytes: &[u8]) -> String {
        match self {
            HashAlgorithm::Sha256 => format!("{:x}", Sha256::digest(bytes)),
            HashAlgorithm::Blake3 => blake3::hash(bytes).to_hex().to_string(),
        }
    }

    /// Hex digest of a unit's normalized source.
    pub fn unit_digest(self, source: &str) -> String {
        self.digest(normalize_source(source).as_bytes())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Blake3 => "blake3",
        }
    }
}

/// Collapse layout so that reformatting does not change a unit's hash.
///
/// Whitespace runs become a single space between two word characters and
/// vanish next to punctuation, so `f(a,b)` and `f( a,\n  b )` normalize
/// identically while `a b` and `ab` stay distinct.
pub fn normalize_source(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut pending_space = false;

    for ch in source.chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            if let Some(prev) = out.chars().next_back() {
                if is_word_char(prev) && is_word_char(ch) {
                    out.push(' ');
                }
            }
            pending_space = false;
        }
        out.push(ch);
    }

    out
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}
