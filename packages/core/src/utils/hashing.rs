//! Stable hashing helpers
//!
//! Every identifier the engine derives from content (document ids, dimension
//! hashes, subgraph hashes) goes through [`sha256_hex`], so reindexing the same
//! graph always yields the same names.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of `input`
///
/// # Examples
///
/// ```
/// use graphindex_core::utils::sha256_hex;
///
/// let digest = sha256_hex("{}");
/// assert_eq!(digest.len(), 64);
/// assert_eq!(digest, sha256_hex("{}"));
/// ```
pub fn sha256_hex(input: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_ref());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_different_inputs_differ() {
        assert_ne!(sha256_hex("a"), sha256_hex("b"));
    }
}
