//! Shared node state.

use std::sync::Arc;

use parking_lot::Mutex;

use chain::Ledger;

/// The single coarse-grained state lock.
///
/// It guards the chain, the mempool, the peer set, the difficulty, and the
/// mining flag together. Critical sections stay short and never span an
/// `.await`; in particular, the miner hashes with the lock released.
pub type SharedLedger = Arc<Mutex<Ledger>>;
