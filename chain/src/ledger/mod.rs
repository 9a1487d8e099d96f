//! Chain & mempool state machine.
//!
//! This module bundles:
//!
//! - [`state::Ledger`]: the shared node state and its admission rules,
//! - [`mempool::Mempool`]: the fee-prioritised pool of pending transactions,
//! - [`admission`]: the tagged outcomes admission can produce.

pub mod admission;
pub mod mempool;
pub mod state;

pub use admission::{BlockAdmission, SnapshotError, TxAdmission};
pub use mempool::Mempool;
pub use state::Ledger;
