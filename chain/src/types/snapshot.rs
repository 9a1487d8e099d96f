// chain/src/types/snapshot.rs

//! Abridged chain snapshot exchanged by the clone protocol.
//!
//! The snapshot carries the difficulty, the known peers, and the full chain.
//! It carries no mempool and no wallet identity. Its frame is the
//! response to the `cloneBlockchain` verb and, unlike every other response,
//! is not base64-wrapped on the wire.

use crate::codec::{self, CodecError};

use super::{Block, PeerAddr};

/// Snapshot of a node's chain state for cloning.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainSnapshot {
    /// The serving node's current target difficulty.
    pub difficulty: u64,
    /// Peers known to the serving node.
    pub peers: Vec<PeerAddr>,
    /// The full chain, genesis first.
    pub chain: Vec<Block>,
}

impl ChainSnapshot {
    /// Canonical frame, as sent in reply to `cloneBlockchain`.
    pub fn to_wire(&self) -> String {
        codec::render(
            "Blockchain",
            &[
                ("difficulty", codec::encode_str(&self.difficulty.to_string())),
                (
                    "networkNodes",
                    codec::encode_list(self.peers.iter().map(PeerAddr::to_wire)),
                ),
                (
                    "chain",
                    codec::encode_list(self.chain.iter().map(Block::to_wire)),
                ),
            ],
        )
    }

    /// Restores a snapshot from its canonical frame.
    pub fn from_wire(frame: &str) -> Result<Self, CodecError> {
        let mut snapshot = ChainSnapshot {
            difficulty: 0,
            peers: Vec::new(),
            chain: Vec::new(),
        };

        for (name, value) in codec::fields("Blockchain", frame)? {
            match name {
                "difficulty" => snapshot.difficulty = codec::decode_scalar(value)?,
                "networkNodes" => {
                    snapshot.peers = codec::decode_list(value)?
                        .iter()
                        .map(|peer_frame| PeerAddr::from_wire(peer_frame))
                        .collect::<Result<_, _>>()?;
                }
                "chain" => {
                    snapshot.chain = codec::decode_list(value)?
                        .iter()
                        .map(|block_frame| Block::from_wire(block_frame))
                        .collect::<Result<_, _>>()?;
                }
                _ => {}
            }
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_block(previous: &str) -> Block {
        let mut block = Block::new(previous, 1, "miner-address", 10.0, Vec::new());
        block.timestamp = 1_700_000_000_000;
        block.hash = block.seal_digest();
        block
    }

    #[test]
    fn wire_roundtrip() {
        let genesis = dummy_block("0");
        let second = dummy_block(&genesis.hash.clone());
        let snapshot = ChainSnapshot {
            difficulty: 3,
            peers: vec![PeerAddr::new("127.0.0.1", 7878), PeerAddr::new("10.0.0.2", 7879)],
            chain: vec![genesis, second],
        };

        let restored = ChainSnapshot::from_wire(&snapshot.to_wire()).expect("decode");
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn empty_snapshot_roundtrips() {
        let snapshot = ChainSnapshot {
            difficulty: 1,
            peers: Vec::new(),
            chain: Vec::new(),
        };
        let restored = ChainSnapshot::from_wire(&snapshot.to_wire()).expect("decode");
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn snapshot_encoding_is_bitwise_stable() {
        let snapshot = ChainSnapshot {
            difficulty: 2,
            peers: vec![PeerAddr::new("a", 1)],
            chain: vec![dummy_block("0")],
        };
        assert_eq!(snapshot.to_wire(), snapshot.to_wire());
    }
}
