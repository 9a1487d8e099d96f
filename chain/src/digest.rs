//! Digest provider.
//!
//! All consensus hashes (transaction digests, block seals, Merkle nodes,
//! peer identities) are hex strings produced by a single process-wide digest
//! algorithm. The algorithm is declared here and *chosen* by the
//! configuration layer at startup, so neither module depends on the other at
//! import time.

use std::sync::OnceLock;

/// Digest algorithms understood by the node.
///
/// SHA3-256 is the network default; SHA-256 is kept for experiments with
/// alternative deployments. Both produce 32-byte digests, rendered as
/// 64-character lowercase hex.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DigestAlgorithm {
    Sha3_256,
    Sha256,
}

impl DigestAlgorithm {
    /// Resolves a configured algorithm name.
    ///
    /// Accepts the spellings used in config files and on the command line
    /// (`"SHA3-256"`, `"sha3_256"`, `"SHA-256"`, `"sha256"`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().replace('-', "_").as_str() {
            "sha3_256" => Some(DigestAlgorithm::Sha3_256),
            "sha_256" | "sha256" => Some(DigestAlgorithm::Sha256),
            _ => None,
        }
    }

    /// Canonical display name of this algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha3_256 => "SHA3-256",
            DigestAlgorithm::Sha256 => "SHA-256",
        }
    }

    /// Length of the hex rendering of a digest, in characters.
    pub fn hex_len(&self) -> usize {
        64
    }

    /// Computes the hex digest of `data` under this algorithm.
    pub fn hash_hex(&self, data: &[u8]) -> String {
        match self {
            DigestAlgorithm::Sha3_256 => {
                use sha3::{Digest, Sha3_256};
                hex::encode(Sha3_256::digest(data))
            }
            DigestAlgorithm::Sha256 => {
                use sha2::{Digest, Sha256};
                hex::encode(Sha256::digest(data))
            }
        }
    }
}

static ACTIVE: OnceLock<DigestAlgorithm> = OnceLock::new();

/// Installs the process-wide digest algorithm.
///
/// Returns `false` if an algorithm was already installed (the first caller
/// wins; the digest is consensus-critical and must not change mid-run).
pub fn select(algorithm: DigestAlgorithm) -> bool {
    ACTIVE.set(algorithm).is_ok()
}

/// Returns the active digest algorithm, defaulting to SHA3-256.
pub fn active() -> DigestAlgorithm {
    *ACTIVE.get_or_init(|| DigestAlgorithm::Sha3_256)
}

/// Hex digest of a byte slice under the active algorithm.
pub fn hash_bytes(data: &[u8]) -> String {
    active().hash_hex(data)
}

/// Hex digest of a UTF-8 string under the active algorithm.
pub fn hash_str(data: &str) -> String {
    hash_bytes(data.as_bytes())
}

/// Digest of the empty string (the Merkle root of an empty block).
pub fn empty() -> String {
    hash_bytes(b"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha3_256_matches_known_vector() {
        // SHA3-256 of the empty string.
        assert_eq!(
            DigestAlgorithm::Sha3_256.hash_hex(b""),
            "a7ffc6f8bf1ed76651c14756a061d62683058b6b4de8a39e23c331dcb6d85b7a"
        );
    }

    #[test]
    fn sha256_matches_known_vector() {
        // SHA-256 of "abc".
        assert_eq!(
            DigestAlgorithm::Sha256.hash_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn from_name_accepts_config_spellings() {
        assert_eq!(
            DigestAlgorithm::from_name("sha3_256"),
            Some(DigestAlgorithm::Sha3_256)
        );
        assert_eq!(
            DigestAlgorithm::from_name("SHA3-256"),
            Some(DigestAlgorithm::Sha3_256)
        );
        assert_eq!(
            DigestAlgorithm::from_name("sha256"),
            Some(DigestAlgorithm::Sha256)
        );
        assert_eq!(DigestAlgorithm::from_name("md5"), None);
    }

    #[test]
    fn hex_rendering_is_lowercase_and_fixed_length() {
        let d = DigestAlgorithm::Sha3_256.hash_hex(b"nonce");
        assert_eq!(d.len(), DigestAlgorithm::Sha3_256.hex_len());
        assert!(d.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
