//! Single-account wallet.
//!
//! Each node embeds one wallet, used both to sign outgoing transactions and
//! to claim mining rewards on blocks it produces. The keypair is generated
//! on first use and persisted under `<root>/<name>/` so the node keeps its
//! identity across restarts:
//!
//! - `scheme.info` holds the signature scheme name,
//! - `private.key` holds PKCS#8 DER for RSA, the raw 32-byte scalar for
//!   ECDSA.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use k256::ecdsa::SigningKey;
use k256::ecdsa::signature::hazmat::PrehashSigner;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha3::{Digest, Sha3_256};

use crate::config::CryptoConfig;
use crate::crypto;
use crate::types::Transaction;

/// Errors raised while loading, creating, or using a wallet.
#[derive(Debug)]
pub enum WalletError {
    /// Key files could not be read or written.
    Io(io::Error),
    /// Key material is corrupt or signing failed.
    Key(String),
    /// The configured scheme name is not recognised.
    UnknownScheme(String),
}

impl fmt::Display for WalletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletError::Io(e) => write!(f, "wallet I/O error: {e}"),
            WalletError::Key(msg) => write!(f, "wallet key error: {msg}"),
            WalletError::UnknownScheme(name) => write!(f, "unknown signature scheme: {name}"),
        }
    }
}

impl std::error::Error for WalletError {}

impl From<io::Error> for WalletError {
    fn from(e: io::Error) -> Self {
        WalletError::Io(e)
    }
}

enum WalletKey {
    Rsa(RsaPrivateKey),
    Ecdsa(SigningKey),
}

/// A named keypair with signing capability.
pub struct Wallet {
    name: String,
    key: WalletKey,
}

impl Wallet {
    /// Generates a fresh in-memory wallet for the configured scheme.
    pub fn generate(name: &str, crypto_cfg: &CryptoConfig) -> Result<Self, WalletError> {
        let key = match crypto_cfg.scheme.to_ascii_uppercase().as_str() {
            "RSA" => {
                let private = RsaPrivateKey::new(&mut rand::thread_rng(), crypto_cfg.rsa_bits)
                    .map_err(|e| WalletError::Key(format!("RSA key generation failed: {e}")))?;
                WalletKey::Rsa(private)
            }
            "ECDSA" => WalletKey::Ecdsa(SigningKey::random(&mut rand::rngs::OsRng)),
            other => return Err(WalletError::UnknownScheme(other.to_string())),
        };
        Ok(Self {
            name: name.to_string(),
            key,
        })
    }

    /// Loads the wallet at `<root>/<name>/`, creating and persisting a fresh
    /// keypair if none exists yet.
    ///
    /// A persisted wallet keeps its original scheme even if the configured
    /// default has changed since.
    pub fn load_or_create(
        root: &Path,
        name: &str,
        crypto_cfg: &CryptoConfig,
    ) -> Result<Self, WalletError> {
        let dir = root.join(name);
        let scheme_path = dir.join("scheme.info");
        let key_path = dir.join("private.key");

        if scheme_path.exists() && key_path.exists() {
            let scheme = fs::read_to_string(&scheme_path)?;
            let bytes = fs::read(&key_path)?;
            let key = match scheme.trim() {
                "RSA" => WalletKey::Rsa(
                    RsaPrivateKey::from_pkcs8_der(&bytes)
                        .map_err(|e| WalletError::Key(format!("bad RSA key file: {e}")))?,
                ),
                "ECDSA" => WalletKey::Ecdsa(
                    SigningKey::from_slice(&bytes)
                        .map_err(|e| WalletError::Key(format!("bad ECDSA key file: {e}")))?,
                ),
                other => return Err(WalletError::UnknownScheme(other.to_string())),
            };
            return Ok(Self {
                name: name.to_string(),
                key,
            });
        }

        let wallet = Self::generate(name, crypto_cfg)?;
        fs::create_dir_all(&dir)?;
        fs::write(&scheme_path, wallet.scheme_name())?;
        match &wallet.key {
            WalletKey::Rsa(private) => {
                let der = private
                    .to_pkcs8_der()
                    .map_err(|e| WalletError::Key(format!("cannot encode RSA key: {e}")))?;
                fs::write(&key_path, der.as_bytes())?;
            }
            WalletKey::Ecdsa(private) => {
                fs::write(&key_path, private.to_bytes())?;
            }
        }
        Ok(wallet)
    }

    /// Wallet name, used as the key directory name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the scheme this wallet signs with.
    pub fn scheme_name(&self) -> &'static str {
        match &self.key {
            WalletKey::Rsa(_) => "RSA",
            WalletKey::Ecdsa(_) => "ECDSA",
        }
    }

    /// The account address derived from this wallet's public key.
    pub fn address(&self) -> String {
        match &self.key {
            WalletKey::Rsa(private) => {
                let public = RsaPublicKey::from(private);
                crypto::rsa::address_of(&public)
                    .expect("a freshly derived RSA public key always encodes")
            }
            WalletKey::Ecdsa(private) => crypto::ecdsa::address_of(private.verifying_key()),
        }
    }

    /// Produces a detached signature over `data`.
    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>, WalletError> {
        let digest = Sha3_256::digest(data);
        match &self.key {
            WalletKey::Rsa(private) => private
                .sign(Pkcs1v15Sign::new::<Sha3_256>(), &digest)
                .map_err(|e| WalletError::Key(format!("RSA signing failed: {e}"))),
            WalletKey::Ecdsa(private) => {
                let signature: k256::ecdsa::Signature = private
                    .sign_prehash(&digest)
                    .map_err(|e| WalletError::Key(format!("ECDSA signing failed: {e}")))?;
                Ok(signature.to_bytes().to_vec())
            }
        }
    }

    /// Signs a transaction in place over its content encoding.
    pub fn sign_transaction(&self, tx: &mut Transaction) -> Result<(), WalletError> {
        let signature = self.sign(tx.content_encoding().as_bytes())?;
        tx.signature = BASE64.encode(signature);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SchemeRegistry;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn ecdsa_cfg() -> CryptoConfig {
        CryptoConfig {
            scheme: "ECDSA".to_string(),
            ..CryptoConfig::default()
        }
    }

    fn scratch_dir() -> PathBuf {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "chain-wallet-test-{}-{n}",
            std::process::id()
        ))
    }

    #[test]
    fn generate_rejects_unknown_scheme() {
        let cfg = CryptoConfig {
            scheme: "DSA".to_string(),
            ..CryptoConfig::default()
        };
        assert!(matches!(
            Wallet::generate("w", &cfg),
            Err(WalletError::UnknownScheme(_))
        ));
    }

    #[test]
    fn signed_transaction_verifies_under_registry() {
        let wallet = Wallet::generate("alice", &ecdsa_cfg()).expect("generate");
        let registry = SchemeRegistry::standard(1024);

        let mut tx = Transaction::new(wallet.address(), wallet.address(), 1.0, 0.1, "self");
        wallet.sign_transaction(&mut tx).expect("sign");

        assert!(registry.signature_matches_format(&tx.sender, &tx.signature));
        assert!(registry.verify_b64(&tx.sender, tx.content_encoding().as_bytes(), &tx.signature));

        // Any content change invalidates the signature.
        tx.amount += 1.0;
        assert!(!registry.verify_b64(&tx.sender, tx.content_encoding().as_bytes(), &tx.signature));
    }

    #[test]
    fn load_or_create_persists_identity() {
        let root = scratch_dir();
        let first = Wallet::load_or_create(&root, "node-a", &ecdsa_cfg()).expect("create");
        let second = Wallet::load_or_create(&root, "node-a", &ecdsa_cfg()).expect("reload");
        assert_eq!(first.address(), second.address());
        assert_eq!(second.scheme_name(), "ECDSA");
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn reload_keeps_original_scheme_over_new_default() {
        let root = scratch_dir();
        let first = Wallet::load_or_create(&root, "node-b", &ecdsa_cfg()).expect("create");

        // Config now says RSA, but the persisted wallet stays ECDSA.
        let reloaded =
            Wallet::load_or_create(&root, "node-b", &CryptoConfig::default()).expect("reload");
        assert_eq!(reloaded.scheme_name(), "ECDSA");
        assert_eq!(reloaded.address(), first.address());
        let _ = fs::remove_dir_all(&root);
    }
}
