// chain/src/crypto/rsa.rs

//! RSA signature scheme.
//!
//! Addresses are the base64 of the DER-encoded SubjectPublicKeyInfo.
//! Signatures are PKCS#1 v1.5 over a SHA3-256 digest of the signed bytes,
//! so the detached signature length equals the key size in bytes.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use rsa::{Pkcs1v15Sign, RsaPublicKey, pkcs8::DecodePublicKey, pkcs8::EncodePublicKey};
use sha3::{Digest, Sha3_256};

use super::SignatureScheme;

/// RSA with PKCS#1 v1.5 / SHA3-256 signatures.
pub struct RsaScheme {
    key_bits: usize,
}

impl RsaScheme {
    /// Creates the scheme for a given network key size (e.g. 1024).
    pub fn new(key_bits: usize) -> Self {
        Self { key_bits }
    }

    fn restore_public_key(address: &str) -> Option<RsaPublicKey> {
        let der = BASE64.decode(address).ok()?;
        RsaPublicKey::from_public_key_der(&der).ok()
    }
}

impl SignatureScheme for RsaScheme {
    fn name(&self) -> &'static str {
        "RSA"
    }

    fn signature_length(&self) -> usize {
        self.key_bits / 8
    }

    fn owns_address(&self, address: &str) -> bool {
        Self::restore_public_key(address).is_some()
    }

    fn verify(&self, address: &str, data: &[u8], signature: &[u8]) -> bool {
        let Some(public_key) = Self::restore_public_key(address) else {
            return false;
        };
        let digest = Sha3_256::digest(data);
        public_key
            .verify(Pkcs1v15Sign::new::<Sha3_256>(), &digest, signature)
            .is_ok()
    }
}

/// Derives the textual address for an RSA public key.
pub fn address_of(public_key: &RsaPublicKey) -> Option<String> {
    let der = public_key.to_public_key_der().ok()?;
    Some(BASE64.encode(der.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::RsaPrivateKey;

    // Small key so tests stay fast; the padding still fits a SHA3-256
    // DigestInfo.
    const TEST_BITS: usize = 512;

    fn test_keypair() -> (RsaPrivateKey, RsaPublicKey) {
        let private = RsaPrivateKey::new(&mut rand::thread_rng(), TEST_BITS)
            .expect("RSA key generation should succeed");
        let public = RsaPublicKey::from(&private);
        (private, public)
    }

    #[test]
    fn sign_verify_roundtrip() {
        let (private, public) = test_keypair();
        let scheme = RsaScheme::new(TEST_BITS);
        let address = address_of(&public).expect("address");

        assert!(scheme.owns_address(&address));
        assert_eq!(scheme.signature_length(), TEST_BITS / 8);

        let data = b"Transaction [sender:..., receiver:...]";
        let digest = Sha3_256::digest(data);
        let signature = private
            .sign(Pkcs1v15Sign::new::<Sha3_256>(), &digest)
            .expect("sign");

        assert!(scheme.verify(&address, data, &signature));
        assert!(!scheme.verify(&address, b"tampered", &signature));
    }

    #[test]
    fn garbage_address_is_not_owned() {
        let scheme = RsaScheme::new(TEST_BITS);
        assert!(!scheme.owns_address("bm90LWEta2V5"));
        assert!(!scheme.verify("bm90LWEta2V5", b"data", &[0u8; 64]));
    }
}
