//! Proof-of-work mining worker.
//!
//! The miner runs as a blocking loop with three states: disabled (sleep and
//! re-check), sealing (nonce search with the state lock released), and
//! publishing (re-acquire the lock, confirm the tip is unchanged, append and
//! broadcast). A pause request takes effect within one hash attempt because
//! the sealing loop polls the mining flag between nonces.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{info, warn};

use chain::protocol::BCAST_BLOCK;
use chain::types::{Block, meets_difficulty};
use chain::{codec, time};

use crate::broadcast::{Outbound, OutboundSender};
use crate::state::SharedLedger;

/// Nonces are drawn from `[0, 2^31)`; collisions are tolerated because each
/// attempt also refreshes the timestamp.
pub const NONCE_BOUND: u64 = 1 << 31;

/// How long the worker sleeps between polls while mining is disabled.
const IDLE_POLL: Duration = Duration::from_millis(500);

/// Per-miner nonce generator.
///
/// Random draws are the default; the sequential mode exists for
/// deterministic experiments.
pub enum NonceSource {
    Sequential(u64),
    Random(StdRng),
}

impl NonceSource {
    pub fn random() -> Self {
        NonceSource::Random(StdRng::from_entropy())
    }

    pub fn sequential() -> Self {
        NonceSource::Sequential(0)
    }

    /// Returns the next nonce in `[0, NONCE_BOUND)`.
    pub fn next(&mut self) -> u64 {
        match self {
            NonceSource::Sequential(counter) => {
                let nonce = *counter % NONCE_BOUND;
                *counter += 1;
                nonce
            }
            NonceSource::Random(rng) => rng.gen_range(0..NONCE_BOUND),
        }
    }
}

/// Seals a candidate in place.
///
/// Each attempt picks a fresh nonce, restamps the candidate, and recomputes
/// the seal digest until it carries the required zero prefix. Returns
/// `false` if `abort` fired first, leaving the candidate unsealed.
pub fn seal(block: &mut Block, nonces: &mut NonceSource, abort: &mut dyn FnMut() -> bool) -> bool {
    loop {
        if abort() {
            return false;
        }
        block.nonce = nonces.next();
        block.timestamp = time::now_ms();
        let digest = block.seal_digest();
        if meets_difficulty(&digest, block.difficulty) {
            block.hash = digest;
            return true;
        }
    }
}

/// Mines the genesis block synchronously.
///
/// Called once at startup, before the gossip server is up.
pub fn mine_genesis(state: &SharedLedger, miner_address: &str) {
    {
        let st = state.lock();
        if st.chain_len() != 0 {
            warn!("chain already initialised, cannot form genesis block");
            return;
        }
        if !st.mining() {
            return;
        }
    }

    info!("creating genesis block");
    let mut genesis = state.lock().assemble_candidate(miner_address);
    let mut nonces = NonceSource::random();
    seal(&mut genesis, &mut nonces, &mut || false);
    info!(hash = %genesis.hash, "genesis block sealed");
    state.lock().commit_mined(genesis);
}

/// The continuous mining loop.
///
/// Runs until `terminate` is set. Sealed blocks that still extend the tip
/// are appended (running the retarget) and fanned out; candidates that lost
/// the race have their surviving transactions requeued.
pub fn run(
    state: SharedLedger,
    outbound: OutboundSender,
    miner_address: String,
    terminate: Arc<AtomicBool>,
) {
    let mut nonces = NonceSource::random();
    info!("miner worker running");

    while !terminate.load(Ordering::Relaxed) {
        if !state.lock().mining() {
            std::thread::sleep(IDLE_POLL);
            continue;
        }

        let mut candidate = state.lock().assemble_candidate(&miner_address);
        let started = Instant::now();

        let sealed = seal(&mut candidate, &mut nonces, &mut || {
            terminate.load(Ordering::Relaxed) || !state.lock().mining()
        });
        if !sealed {
            // Paused or shutting down mid-seal: the drained transactions go
            // back to the head of the mempool.
            state.lock().requeue_stale_candidate(candidate);
            continue;
        }

        info!(
            hash = %candidate.hash,
            difficulty = candidate.difficulty,
            time_cost_secs = started.elapsed().as_secs(),
            "hash found"
        );

        let wire = candidate.to_wire();
        let committed = {
            let mut st = state.lock();
            if st.commit_mined(candidate.clone()) {
                true
            } else {
                st.requeue_stale_candidate(candidate);
                false
            }
        };

        if committed {
            let _ = outbound.send(Outbound::new(BCAST_BLOCK, codec::encode_str(&wire)));
        }
    }

    info!("miner worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonces_stay_in_bounds() {
        let mut random = NonceSource::random();
        for _ in 0..1_000 {
            assert!(random.next() < NONCE_BOUND);
        }

        let mut sequential = NonceSource::sequential();
        assert_eq!(sequential.next(), 0);
        assert_eq!(sequential.next(), 1);
        assert_eq!(sequential.next(), 2);
    }

    #[test]
    fn seal_produces_a_valid_prefix_at_low_difficulty() {
        let mut block = Block::new("0", 1, "miner-address", 10.0, Vec::new());
        let mut nonces = NonceSource::sequential();

        assert!(seal(&mut block, &mut nonces, &mut || false));
        assert!(meets_difficulty(&block.hash, 1));
        assert_eq!(block.hash, block.seal_digest());
    }

    #[test]
    fn seal_aborts_without_a_hash() {
        let mut block = Block::new("0", 1, "miner-address", 10.0, Vec::new());
        let mut nonces = NonceSource::sequential();

        assert!(!seal(&mut block, &mut nonces, &mut || true));
        assert!(block.hash.is_empty());
    }
}
