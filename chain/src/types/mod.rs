//! Core domain types used by the chain.
//!
//! This module defines the records that cross the wire and get hashed:
//! transactions, blocks, peer addresses, and the clone-protocol snapshot.
//! Each record owns its canonical encoding; digests and signatures are
//! always computed over those encodings, never over ad-hoc formats.

pub mod block;
pub mod peer;
pub mod snapshot;
pub mod tx;

pub use block::{Block, GENESIS_PREVIOUS_HASH, meets_difficulty};
pub use peer::PeerAddr;
pub use snapshot::ChainSnapshot;
pub use tx::Transaction;
