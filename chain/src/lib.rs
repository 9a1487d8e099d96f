//! Chain library crate.
//!
//! This crate provides the core building blocks for a proof-of-work
//! cryptocurrency node:
//!
//! - a canonical textual codec used on the wire and for hashing (`codec`),
//! - a configurable digest provider (`digest`),
//! - a Merkle tree over transaction lists (`merkle`),
//! - pluggable signature schemes and a detection registry (`crypto`),
//! - a single-account wallet with on-disk key persistence (`wallet`),
//! - the domain records and their encodings (`types`),
//! - the chain + mempool state machine (`ledger`),
//! - wire-protocol verbs and reply tokens (`protocol`),
//! - and top-level node configuration (`config`).
//!
//! Higher-level binaries compose these pieces into gossip servers, miners,
//! and experiment harnesses.

pub mod codec;
pub mod config;
pub mod crypto;
pub mod digest;
pub mod ledger;
pub mod merkle;
pub mod protocol;
pub mod time;
pub mod types;
pub mod wallet;

// Re-export top-level configuration types.
pub use config::{ChainRules, CryptoConfig, NetConfig, NodeConfig};

// Re-export the ledger core and its admission outcomes.
pub use ledger::{BlockAdmission, Ledger, Mempool, SnapshotError, TxAdmission};

// Re-export the crypto capability set.
pub use crypto::{EcdsaScheme, RsaScheme, SchemeRegistry, SignatureScheme};

// Re-export the wallet.
pub use wallet::{Wallet, WalletError};

// Re-export the codec error for decoders at the network edge.
pub use codec::CodecError;

// Re-export domain types at the crate root for convenience.
pub use types::*;
