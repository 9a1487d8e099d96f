// chain/src/types/block.rs

//! Blocks and block sealing.
//!
//! A block links to its parent by hash, carries an ordered transaction list
//! with a derived Merkle root, and is sealed by proof of work: its `hash`
//! must equal the digest of the *seal encoding* (the canonical frame without
//! the `hash` field) and begin with `difficulty` ASCII `'0'` characters.

use crate::codec::{self, CodecError};
use crate::digest;
use crate::merkle;
use crate::time;

use super::Transaction;

/// Previous-hash value carried by the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Returns `true` if `hash` starts with `difficulty` ASCII `'0'` characters.
pub fn meets_difficulty(hash: &str, difficulty: u64) -> bool {
    let wanted = difficulty as usize;
    hash.len() >= wanted && hash.as_bytes()[..wanted].iter().all(|&b| b == b'0')
}

/// A sealed (or in-progress candidate) block.
///
/// The transaction list is kept private so the derived Merkle root can never
/// drift from it; decoders recompute the root and ignore the value on the
/// wire.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    /// Hash of the parent block; `"0"` for genesis.
    pub previous_hash: String,
    /// Seal digest of this block, empty until mined.
    pub hash: String,
    /// Difficulty this block was mined at.
    pub difficulty: u64,
    /// Proof-of-work nonce.
    pub nonce: u64,
    /// Seal time, in milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Address credited with the block reward and fees.
    pub miner: String,
    /// Fixed per-network reward credited virtually by the balance scan.
    pub miner_rewards: f64,
    transactions: Vec<Transaction>,
    merkle_root: String,
}

impl Block {
    /// Assembles an unsealed candidate stamped with the current time.
    pub fn new(
        previous_hash: impl Into<String>,
        difficulty: u64,
        miner: impl Into<String>,
        miner_rewards: f64,
        transactions: Vec<Transaction>,
    ) -> Self {
        let merkle_root = merkle::root(&transactions);
        Self {
            previous_hash: previous_hash.into(),
            hash: String::new(),
            difficulty,
            nonce: 0,
            timestamp: time::now_ms(),
            miner: miner.into(),
            miner_rewards,
            transactions,
            merkle_root,
        }
    }

    /// Ordered transactions included in this block.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Consumes the block, yielding its transactions.
    pub fn into_transactions(self) -> Vec<Transaction> {
        self.transactions
    }

    /// Merkle root derived from the transaction list.
    pub fn merkle_root(&self) -> &str {
        &self.merkle_root
    }

    /// Canonical frame with every field, as sent on the wire.
    pub fn to_wire(&self) -> String {
        let transactions = codec::encode_list(self.transactions.iter().map(Transaction::to_wire));
        codec::render(
            "Block",
            &[
                ("previousHash", codec::encode_str(&self.previous_hash)),
                ("hash", codec::encode_str(&self.hash)),
                ("difficulty", codec::encode_str(&self.difficulty.to_string())),
                ("nonce", codec::encode_str(&self.nonce.to_string())),
                ("timestamp", codec::encode_str(&self.timestamp.to_string())),
                ("transactions", transactions),
                ("merkleTree", codec::encode_str(&self.merkle_root)),
                ("miner", codec::encode_str(&self.miner)),
                ("minerRewards", codec::encode_str(&self.miner_rewards.to_string())),
            ],
        )
    }

    /// Canonical frame without the `hash` field.
    ///
    /// This is the byte string the miner hashes while searching for a nonce,
    /// so the seal cannot cover itself.
    pub fn seal_encoding(&self) -> String {
        let transactions = codec::encode_list(self.transactions.iter().map(Transaction::to_wire));
        codec::render(
            "Block",
            &[
                ("previousHash", codec::encode_str(&self.previous_hash)),
                ("difficulty", codec::encode_str(&self.difficulty.to_string())),
                ("nonce", codec::encode_str(&self.nonce.to_string())),
                ("timestamp", codec::encode_str(&self.timestamp.to_string())),
                ("transactions", transactions),
                ("merkleTree", codec::encode_str(&self.merkle_root)),
                ("miner", codec::encode_str(&self.miner)),
                ("minerRewards", codec::encode_str(&self.miner_rewards.to_string())),
            ],
        )
    }

    /// Hex digest of the seal encoding.
    pub fn seal_digest(&self) -> String {
        digest::hash_str(&self.seal_encoding())
    }

    /// Restores a block from its canonical frame.
    ///
    /// The `merkleTree` field on the wire is informational only: the root is
    /// recomputed from the restored transactions. A transaction that fails
    /// to decode fails the whole block.
    pub fn from_wire(frame: &str) -> Result<Self, CodecError> {
        let mut block = Block {
            previous_hash: String::new(),
            hash: String::new(),
            difficulty: 0,
            nonce: 0,
            timestamp: 0,
            miner: String::new(),
            miner_rewards: 0.0,
            transactions: Vec::new(),
            merkle_root: String::new(),
        };

        for (name, value) in codec::fields("Block", frame)? {
            match name {
                "previousHash" => block.previous_hash = codec::decode_str(value)?,
                "hash" => block.hash = codec::decode_str(value)?,
                "difficulty" => block.difficulty = codec::decode_scalar(value)?,
                "nonce" => block.nonce = codec::decode_scalar(value)?,
                "timestamp" => block.timestamp = codec::decode_scalar(value)?,
                "miner" => block.miner = codec::decode_str(value)?,
                "minerRewards" => block.miner_rewards = codec::decode_scalar(value)?,
                "transactions" => {
                    block.transactions = codec::decode_list(value)?
                        .iter()
                        .map(|tx_frame| Transaction::from_wire(tx_frame))
                        .collect::<Result<_, _>>()?;
                }
                // Recomputed below; the incoming value is ignored.
                "merkleTree" => {}
                _ => {}
            }
        }

        block.merkle_root = merkle::root(&block.transactions);
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_tx(message: &str) -> Transaction {
        Transaction {
            sender: "s".to_string(),
            receiver: "r".to_string(),
            amount: 2.0,
            fee: 0.25,
            timestamp: 1_700_000_000_000,
            message: message.to_string(),
            signature: "c2ln".to_string(),
        }
    }

    fn dummy_block(transactions: Vec<Transaction>) -> Block {
        let mut block = Block::new("0", 1, "miner-address", 10.0, transactions);
        block.timestamp = 1_700_000_001_000;
        block.nonce = 42;
        block.hash = block.seal_digest();
        block
    }

    #[test]
    fn wire_roundtrip_preserves_block() {
        let block = dummy_block(vec![dummy_tx("a"), dummy_tx("b")]);
        let restored = Block::from_wire(&block.to_wire()).expect("decode");
        assert_eq!(restored, block);
    }

    #[test]
    fn empty_block_roundtrips() {
        let block = dummy_block(Vec::new());
        assert_eq!(block.merkle_root(), crate::digest::empty());
        let restored = Block::from_wire(&block.to_wire()).expect("decode");
        assert_eq!(restored, block);
    }

    #[test]
    fn seal_encoding_omits_hash() {
        let block = dummy_block(vec![dummy_tx("a")]);
        assert!(!block.seal_encoding().contains(&codec::encode_str(&block.hash)));
        assert_eq!(block.hash, block.seal_digest());
    }

    #[test]
    fn decoder_recomputes_merkle_root() {
        let block = dummy_block(vec![dummy_tx("a")]);
        let frame = block.to_wire();

        // Swap the merkleTree field for garbage; the decoder must not care.
        let bogus = codec::encode_str("not-a-root");
        let honest = codec::encode_str(block.merkle_root());
        let tampered = frame.replace(&format!("merkleTree:{honest}"), &format!("merkleTree:{bogus}"));
        assert_ne!(frame, tampered);

        let restored = Block::from_wire(&tampered).expect("decode");
        assert_eq!(restored.merkle_root(), block.merkle_root());
    }

    #[test]
    fn tampering_with_rewards_breaks_the_seal() {
        let mut block = dummy_block(vec![dummy_tx("a")]);
        let sealed_hash = block.hash.clone();
        block.miner_rewards += 1.0;
        assert_ne!(block.seal_digest(), sealed_hash);
    }

    #[test]
    fn difficulty_prefix_check() {
        assert!(meets_difficulty("00abc", 2));
        assert!(meets_difficulty("000abc", 2)); // more zeros than required is fine
        assert!(!meets_difficulty("0abc", 2));
        assert!(!meets_difficulty("", 1));
        assert!(meets_difficulty("anything", 0));
    }
}
