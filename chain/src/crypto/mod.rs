//! Pluggable signature schemes.
//!
//! Addresses are opaque strings to the rest of the node; only the scheme
//! that minted an address can interpret it. This module declares the
//! [`SignatureScheme`] capability set and a [`SchemeRegistry`] that detects
//! which scheme owns a given address. The configuration layer picks the
//! wallet's scheme *by name* at startup, so crypto and config never import
//! each other.
//!
//! Two schemes are provided:
//!
//! - [`RsaScheme`]: the address is the base64 of the DER-encoded
//!   SubjectPublicKeyInfo.
//! - [`EcdsaScheme`]: secp256k1; the address is the base64 of a JSON
//!   `{x, y}` coordinate pair.
//!
//! Verification failure, including malformed addresses and signatures, is a
//! `false` return. It never raises to the caller.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

pub mod ecdsa;
pub mod rsa;

pub use ecdsa::EcdsaScheme;
pub use rsa::RsaScheme;

/// Capability set offered by a signature scheme.
pub trait SignatureScheme: Send + Sync {
    /// Stable name used in configuration (`"RSA"`, `"ECDSA"`).
    fn name(&self) -> &'static str;

    /// Expected detached-signature length in bytes.
    fn signature_length(&self) -> usize;

    /// Whether `address` is a well-formed address of this scheme.
    fn owns_address(&self, address: &str) -> bool;

    /// Verifies `signature` over `data` under the public key behind
    /// `address`. Any failure, however caused, is `false`.
    fn verify(&self, address: &str, data: &[u8], signature: &[u8]) -> bool;
}

/// Ordered collection of the schemes a node understands.
pub struct SchemeRegistry {
    schemes: Vec<Box<dyn SignatureScheme>>,
}

impl SchemeRegistry {
    /// Builds a registry from an explicit scheme list.
    pub fn with_schemes(schemes: Vec<Box<dyn SignatureScheme>>) -> Self {
        Self { schemes }
    }

    /// The standard registry: RSA (at `rsa_bits`) and secp256k1 ECDSA.
    pub fn standard(rsa_bits: usize) -> Self {
        Self::with_schemes(vec![
            Box::new(RsaScheme::new(rsa_bits)),
            Box::new(EcdsaScheme::new()),
        ])
    }

    /// Finds the scheme that owns `address`, if any.
    pub fn detect(&self, address: &str) -> Option<&dyn SignatureScheme> {
        self.schemes
            .iter()
            .map(|s| s.as_ref())
            .find(|s| s.owns_address(address))
    }

    /// Looks a scheme up by its configured name.
    pub fn by_name(&self, name: &str) -> Option<&dyn SignatureScheme> {
        self.schemes
            .iter()
            .map(|s| s.as_ref())
            .find(|s| s.name().eq_ignore_ascii_case(name))
    }

    /// Expected signature length for `address`, or `None` if no scheme
    /// recognises it.
    pub fn signature_length(&self, address: &str) -> Option<usize> {
        self.detect(address).map(|s| s.signature_length())
    }

    /// Checks that a base64 signature decodes to the length implied by the
    /// sender address.
    pub fn signature_matches_format(&self, address: &str, signature_b64: &str) -> bool {
        let Some(scheme) = self.detect(address) else {
            return false;
        };
        match BASE64.decode(signature_b64) {
            Ok(bytes) => bytes.len() == scheme.signature_length(),
            Err(_) => false,
        }
    }

    /// Verifies a base64 signature over `data` under `address`.
    pub fn verify_b64(&self, address: &str, data: &[u8], signature_b64: &str) -> bool {
        let Some(scheme) = self.detect(address) else {
            return false;
        };
        let Ok(signature) = BASE64.decode(signature_b64) else {
            return false;
        };
        scheme.verify(address, data, &signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_detects_nothing_for_garbage() {
        let registry = SchemeRegistry::standard(1024);
        assert!(registry.detect("not-base64!!").is_none());
        assert!(registry.detect("").is_none());
        assert_eq!(registry.signature_length("not-base64!!"), None);
    }

    #[test]
    fn registry_resolves_schemes_by_name() {
        let registry = SchemeRegistry::standard(1024);
        assert_eq!(registry.by_name("rsa").unwrap().name(), "RSA");
        assert_eq!(registry.by_name("ECDSA").unwrap().name(), "ECDSA");
        assert!(registry.by_name("DSA").is_none());
    }

    #[test]
    fn verify_on_unknown_address_is_false_not_an_error() {
        let registry = SchemeRegistry::standard(1024);
        assert!(!registry.verify_b64("junk", b"data", "c2ln"));
        assert!(!registry.signature_matches_format("junk", "c2ln"));
    }
}
