// chain/src/crypto/ecdsa.rs

//! secp256k1 ECDSA signature scheme.
//!
//! Addresses are the base64 of a JSON object carrying the hex-encoded affine
//! coordinates of the public key, `{"x": ..., "y": ..., "algorithm":
//! "ECDSA"}`. Signatures are the fixed 64-byte `r || s` form over a SHA3-256
//! digest of the signed bytes.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{Signature, VerifyingKey};
use k256::{EncodedPoint, FieldBytes};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use super::SignatureScheme;

/// Detached signature length: `r` (32 bytes) followed by `s` (32 bytes).
pub const SIGNATURE_LEN: usize = 64;

/// JSON payload behind an ECDSA address.
#[derive(Debug, Deserialize, Serialize)]
struct AddressPayload {
    x: String,
    y: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    algorithm: Option<String>,
}

/// secp256k1 ECDSA with SHA3-256 prehashing.
#[derive(Default)]
pub struct EcdsaScheme;

impl EcdsaScheme {
    pub fn new() -> Self {
        Self
    }

    fn restore_public_key(address: &str) -> Option<VerifyingKey> {
        let payload = Self::parse_address(address)?;
        let x = hex::decode(&payload.x).ok()?;
        let y = hex::decode(&payload.y).ok()?;
        if x.len() != 32 || y.len() != 32 {
            return None;
        }
        let point = EncodedPoint::from_affine_coordinates(
            FieldBytes::from_slice(&x),
            FieldBytes::from_slice(&y),
            false,
        );
        VerifyingKey::from_encoded_point(&point).ok()
    }

    fn parse_address(address: &str) -> Option<AddressPayload> {
        let json = BASE64.decode(address).ok()?;
        let payload: AddressPayload = serde_json::from_slice(&json).ok()?;
        match payload.algorithm.as_deref() {
            None | Some("ECDSA") => Some(payload),
            Some(_) => None,
        }
    }
}

impl SignatureScheme for EcdsaScheme {
    fn name(&self) -> &'static str {
        "ECDSA"
    }

    fn signature_length(&self) -> usize {
        SIGNATURE_LEN
    }

    fn owns_address(&self, address: &str) -> bool {
        Self::restore_public_key(address).is_some()
    }

    fn verify(&self, address: &str, data: &[u8], signature: &[u8]) -> bool {
        let Some(public_key) = Self::restore_public_key(address) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        let digest = Sha3_256::digest(data);
        public_key.verify_prehash(&digest, &signature).is_ok()
    }
}

/// Derives the textual address for an ECDSA public key.
pub fn address_of(public_key: &VerifyingKey) -> String {
    let point = public_key.to_encoded_point(false);
    let payload = AddressPayload {
        x: hex::encode(point.x().expect("uncompressed point has an x coordinate")),
        y: hex::encode(point.y().expect("uncompressed point has a y coordinate")),
        algorithm: Some("ECDSA".to_string()),
    };
    let json = serde_json::to_string(&payload).expect("address payload is always serializable");
    BASE64.encode(json.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;
    use k256::ecdsa::signature::hazmat::PrehashSigner;

    fn test_key() -> SigningKey {
        SigningKey::random(&mut rand::rngs::OsRng)
    }

    #[test]
    fn sign_verify_roundtrip() {
        let signing_key = test_key();
        let scheme = EcdsaScheme::new();
        let address = address_of(signing_key.verifying_key());

        assert!(scheme.owns_address(&address));

        let data = b"Transaction [sender:..., receiver:...]";
        let digest = Sha3_256::digest(data);
        let signature: Signature = signing_key.sign_prehash(&digest).expect("sign");
        let bytes = signature.to_bytes();

        assert_eq!(bytes.len(), SIGNATURE_LEN);
        assert!(scheme.verify(&address, data, &bytes));
        assert!(!scheme.verify(&address, b"tampered", &bytes));
    }

    #[test]
    fn signature_from_wrong_key_fails() {
        let scheme = EcdsaScheme::new();
        let address = address_of(test_key().verifying_key());

        let other = test_key();
        let digest = Sha3_256::digest(b"data");
        let signature: Signature = other.sign_prehash(&digest).expect("sign");

        assert!(!scheme.verify(&address, b"data", &signature.to_bytes()));
    }

    #[test]
    fn foreign_algorithm_tag_is_rejected() {
        let signing_key = test_key();
        let honest = address_of(signing_key.verifying_key());
        let json = String::from_utf8(BASE64.decode(&honest).unwrap()).unwrap();
        let foreign = BASE64.encode(json.replace("ECDSA", "DSAEC").as_bytes());

        let scheme = EcdsaScheme::new();
        assert!(scheme.owns_address(&honest));
        assert!(!scheme.owns_address(&foreign));
    }

    #[test]
    fn malformed_signatures_are_false_not_errors() {
        let scheme = EcdsaScheme::new();
        let address = address_of(test_key().verifying_key());
        assert!(!scheme.verify(&address, b"data", &[]));
        assert!(!scheme.verify(&address, b"data", &[0u8; SIGNATURE_LEN]));
    }
}
