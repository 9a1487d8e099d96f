// chain/src/types/tx.rs

//! Signed value-transfer transactions.
//!
//! A transaction moves `amount` coins from `sender` to `receiver` and pays
//! `fee` to whichever miner includes it in a block. The signature covers the
//! *content encoding* (the canonical frame without the `signature` field),
//! so a transaction can be signed exactly once and verified by every node
//! that sees it.

use crate::codec::{self, CodecError};
use crate::digest;
use crate::time;

/// A single value transfer between two accounts.
///
/// Addresses are opaque strings derived from public keys by a
/// [`SignatureScheme`](crate::crypto::SignatureScheme); the transaction layer
/// never interprets them. The signature is carried in its base64 form, as it
/// appears on the wire.
#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    /// Sender's account address.
    pub sender: String,
    /// Receiver's account address.
    pub receiver: String,
    /// Amount transferred from sender to receiver.
    pub amount: f64,
    /// Fee credited to the miner of the including block.
    pub fee: f64,
    /// Creation time, in milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Free-form message attached by the sender.
    pub message: String,
    /// Base64 detached signature over the content encoding.
    pub signature: String,
}

impl Transaction {
    /// Creates an unsigned transaction stamped with the current time.
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: f64,
        fee: f64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
            fee,
            timestamp: time::now_ms(),
            message: message.into(),
            signature: String::new(),
        }
    }

    /// Canonical frame with every field, as sent on the wire.
    pub fn to_wire(&self) -> String {
        codec::render(
            "Transaction",
            &[
                ("sender", codec::encode_str(&self.sender)),
                ("receiver", codec::encode_str(&self.receiver)),
                ("amount", codec::encode_str(&self.amount.to_string())),
                ("fee", codec::encode_str(&self.fee.to_string())),
                ("timestamp", codec::encode_str(&self.timestamp.to_string())),
                ("message", codec::encode_str(&self.message)),
                ("signature", codec::encode_str(&self.signature)),
            ],
        )
    }

    /// Canonical frame without the signature field.
    ///
    /// This is the byte string that gets signed and whose digest identifies
    /// the transaction, so the signature cannot cover itself.
    pub fn content_encoding(&self) -> String {
        codec::render(
            "Transaction",
            &[
                ("sender", codec::encode_str(&self.sender)),
                ("receiver", codec::encode_str(&self.receiver)),
                ("amount", codec::encode_str(&self.amount.to_string())),
                ("fee", codec::encode_str(&self.fee.to_string())),
                ("timestamp", codec::encode_str(&self.timestamp.to_string())),
                ("message", codec::encode_str(&self.message)),
            ],
        )
    }

    /// Hex digest of the content encoding.
    ///
    /// This is the transaction's identity for mempool and chain
    /// deduplication and the leaf value of the Merkle tree.
    pub fn content_digest(&self) -> String {
        digest::hash_str(&self.content_encoding())
    }

    /// Restores a transaction from its canonical frame.
    ///
    /// Unknown fields are ignored; missing fields keep their defaults.
    /// Address and signature validity are checked at admission time, not
    /// here.
    pub fn from_wire(frame: &str) -> Result<Self, CodecError> {
        let mut tx = Transaction {
            sender: String::new(),
            receiver: String::new(),
            amount: 0.0,
            fee: 0.0,
            timestamp: 0,
            message: String::new(),
            signature: String::new(),
        };

        for (name, value) in codec::fields("Transaction", frame)? {
            match name {
                "sender" => tx.sender = codec::decode_str(value)?,
                "receiver" => tx.receiver = codec::decode_str(value)?,
                "amount" => tx.amount = codec::decode_scalar(value)?,
                "fee" => tx.fee = codec::decode_scalar(value)?,
                "timestamp" => tx.timestamp = codec::decode_scalar(value)?,
                "message" => tx.message = codec::decode_str(value)?,
                "signature" => tx.signature = codec::decode_str(value)?,
                _ => {}
            }
        }

        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_tx() -> Transaction {
        Transaction {
            sender: "alice-address".to_string(),
            receiver: "bob-address".to_string(),
            amount: 5.0,
            fee: 0.5,
            timestamp: 1_700_000_000_000,
            message: "rent".to_string(),
            signature: "c2ln".to_string(),
        }
    }

    #[test]
    fn wire_roundtrip_preserves_all_fields() {
        let tx = dummy_tx();
        let restored = Transaction::from_wire(&tx.to_wire()).expect("decode");
        assert_eq!(restored, tx);
    }

    #[test]
    fn content_encoding_omits_signature() {
        let tx = dummy_tx();
        let content = tx.content_encoding();
        assert!(!content.contains("signature"));

        // Content digest is signature-independent.
        let mut resigned = tx.clone();
        resigned.signature = "b3RoZXI=".to_string();
        assert_eq!(resigned.content_digest(), tx.content_digest());
    }

    #[test]
    fn decoder_ignores_unknown_fields() {
        let tx = dummy_tx();
        let frame = tx.to_wire();
        let injected = frame.replace(
            "]",
            &format!(", extra:{}]", codec::encode_str("ignored")),
        );
        let restored = Transaction::from_wire(&injected).expect("decode");
        assert_eq!(restored, tx);
    }

    #[test]
    fn decoder_rejects_wrong_wrapper() {
        assert!(Transaction::from_wire("Block [a:b]").is_err());
    }

    #[test]
    fn amount_rendering_roundtrips_fractions() {
        let mut tx = dummy_tx();
        tx.amount = 0.1 + 0.2; // not exactly representable in binary
        let restored = Transaction::from_wire(&tx.to_wire()).expect("decode");
        assert_eq!(restored.amount, tx.amount);
    }
}
