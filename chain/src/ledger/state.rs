//! The chain & mempool state machine.
//!
//! A [`Ledger`] owns every piece of shared mutable node state: the ordered
//! chain, the mempool, the peer set, the current target difficulty, and the
//! mining flag. Callers are expected to guard the whole ledger behind a
//! single coarse-grained lock; the methods here never block on I/O and keep
//! critical sections short. The one long critical section is signature
//! verification during block admission, which is a consensus step.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::ChainRules;
use crate::crypto::SchemeRegistry;
use crate::merkle;
use crate::types::{Block, ChainSnapshot, GENESIS_PREVIOUS_HASH, PeerAddr, Transaction, meets_difficulty};

use super::admission::{BlockAdmission, SnapshotError, TxAdmission};
use super::mempool::Mempool;

/// Node state guarded by the state lock.
pub struct Ledger {
    rules: ChainRules,
    registry: Arc<SchemeRegistry>,
    difficulty: u64,
    mining: bool,
    chain: Vec<Block>,
    mempool: Mempool,
    peers: Vec<PeerAddr>,
}

impl Ledger {
    /// Creates an empty ledger at the configured starting difficulty, with
    /// mining enabled.
    pub fn new(rules: ChainRules, registry: Arc<SchemeRegistry>) -> Self {
        let difficulty = rules.init_difficulty.max(1);
        Self {
            rules,
            registry,
            difficulty,
            mining: true,
            chain: Vec::new(),
            mempool: Mempool::new(),
            peers: Vec::new(),
        }
    }

    pub fn rules(&self) -> &ChainRules {
        &self.rules
    }

    /// Current target difficulty. Strictly process-local; peers are expected
    /// to retarget in lockstep because they follow the same rule on the same
    /// chain prefix.
    pub fn difficulty(&self) -> u64 {
        self.difficulty
    }

    pub fn mining(&self) -> bool {
        self.mining
    }

    pub fn set_mining(&mut self, enabled: bool) {
        self.mining = enabled;
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn chain_len(&self) -> usize {
        self.chain.len()
    }

    pub fn tip(&self) -> Option<&Block> {
        self.chain.last()
    }

    fn tip_hash(&self) -> &str {
        self.chain
            .last()
            .map(|b| b.hash.as_str())
            .unwrap_or(GENESIS_PREVIOUS_HASH)
    }

    pub fn mempool_len(&self) -> usize {
        self.mempool.len()
    }

    pub fn peers(&self) -> &[PeerAddr] {
        &self.peers
    }

    /// Offers a received transaction to the mempool.
    ///
    /// Checks, in order: address formats, signature length, signature
    /// verification, chain-only balance, mempool duplicate, chain duplicate.
    /// The balance check consults the chain only; pending mempool spends are
    /// not counted against the sender.
    pub fn accept_transaction(&mut self, tx: Transaction) -> TxAdmission {
        if self.registry.detect(&tx.sender).is_none()
            || self.registry.detect(&tx.receiver).is_none()
        {
            warn!("transaction carries an unrecognised address format, discarding");
            return TxAdmission::BadFormat;
        }

        if !self.registry.signature_matches_format(&tx.sender, &tx.signature) {
            warn!("signature format does not match sender address type");
            return TxAdmission::InvalidSig;
        }

        if !self
            .registry
            .verify_b64(&tx.sender, tx.content_encoding().as_bytes(), &tx.signature)
        {
            warn!("transaction does not have a valid signature, discarding");
            return TxAdmission::InvalidSig;
        }

        let total_cost = tx.amount + tx.fee;
        let sender_balance = self.balance(&tx.sender);
        if total_cost > sender_balance {
            warn!(
                required = total_cost,
                available = sender_balance,
                "sender has insufficient funds"
            );
            return TxAdmission::Insufficient;
        }

        let digest = tx.content_digest();
        if self.mempool.contains(&digest) {
            debug!(digest = %digest, "transaction already pending");
            return TxAdmission::Duplicate;
        }
        if self.chain_contains_tx(&digest) {
            debug!(digest = %digest, "transaction already in the chain");
            return TxAdmission::Duplicate;
        }

        info!(digest = %digest, amount = tx.amount, fee = tx.fee, "transaction accepted");
        self.mempool.push_back(tx);
        TxAdmission::Accepted
    }

    /// Offers a received block for appending to the chain.
    ///
    /// Checks, in order: hash not already present, links to the current tip,
    /// difficulty equals the local target, hash carries the zero prefix,
    /// seal digest matches, Merkle root matches, every transaction
    /// signature verifies. On acceptance the block's transactions leave the
    /// mempool.
    pub fn accept_block(&mut self, block: Block) -> BlockAdmission {
        if self.chain.iter().any(|b| b.hash == block.hash) {
            debug!(hash = %block.hash, "duplicated block");
            return BlockAdmission::Duplicate;
        }

        if block.previous_hash != self.tip_hash() {
            warn!(
                previous = %block.previous_hash,
                tip = %self.tip_hash(),
                "block does not extend the current tip, discarding"
            );
            return BlockAdmission::NotTipLinked;
        }

        if block.difficulty != self.difficulty {
            warn!(
                theirs = block.difficulty,
                ours = self.difficulty,
                "difficulty does not match, chain might be out of sync"
            );
            return BlockAdmission::BadDifficulty;
        }

        if !meets_difficulty(&block.hash, self.difficulty) {
            warn!(hash = %block.hash, "hash value does not match the difficulty");
            return BlockAdmission::BadDifficulty;
        }

        if block.seal_digest() != block.hash {
            warn!(hash = %block.hash, "claimed hash does not match the calculated result");
            return BlockAdmission::BadSeal;
        }

        if merkle::root(block.transactions()) != block.merkle_root() {
            warn!("merkle root does not match the transactions within the block");
            return BlockAdmission::BadMerkle;
        }

        for tx in block.transactions() {
            if !self
                .registry
                .verify_b64(&tx.sender, tx.content_encoding().as_bytes(), &tx.signature)
            {
                warn!("block carries a tampered transaction signature");
                return BlockAdmission::BadTxSig;
            }
        }

        let confirmed: Vec<String> = block
            .transactions()
            .iter()
            .map(Transaction::content_digest)
            .collect();
        self.mempool.remove_digests(&confirmed);

        info!(hash = %block.hash, height = self.chain.len(), "block accepted");
        self.chain.push(block);
        BlockAdmission::Accepted
    }

    /// Chain-only balance of an account.
    ///
    /// A full scan: the miner of a block collects `miner_rewards` plus every
    /// fee in it; a sender pays `amount + fee`; a receiver collects
    /// `amount`. The mempool is never consulted.
    pub fn balance(&self, address: &str) -> f64 {
        let mut balance = 0.0;
        for block in &self.chain {
            let is_miner = block.miner == address;
            if is_miner {
                balance += block.miner_rewards;
            }
            for tx in block.transactions() {
                if is_miner {
                    balance += tx.fee;
                }
                if tx.sender == address {
                    balance -= tx.amount + tx.fee;
                }
                if tx.receiver == address {
                    balance += tx.amount;
                }
            }
        }
        balance
    }

    /// Assembles an unsealed candidate block on the current tip.
    ///
    /// Drains up to the configured per-block maximum from the mempool,
    /// highest fees first. The genesis candidate carries no transactions.
    pub fn assemble_candidate(&mut self, miner: &str) -> Block {
        let transactions = if self.chain.is_empty() {
            Vec::new()
        } else {
            self.mempool.drain_for_block(self.rules.max_block_txs)
        };
        Block::new(
            self.tip_hash().to_string(),
            self.difficulty,
            miner,
            self.rules.mining_rewards,
            transactions,
        )
    }

    /// Appends a self-mined block if it still extends the tip.
    ///
    /// Returns `false` when a peer block landed first; the caller should
    /// hand the candidate to [`requeue_stale_candidate`](Self::requeue_stale_candidate).
    /// On success the difficulty retarget runs.
    pub fn commit_mined(&mut self, block: Block) -> bool {
        if block.previous_hash != self.tip_hash() {
            return false;
        }
        info!(hash = %block.hash, height = self.chain.len(), "mined block appended");
        self.chain.push(block);
        self.retarget();
        true
    }

    /// Salvages the transactions of a candidate that lost the tip race.
    ///
    /// Walks the chain forward from the candidate's fork point, drops every
    /// candidate transaction already confirmed in that tail, and re-inserts
    /// the survivors at the head of the mempool.
    pub fn requeue_stale_candidate(&mut self, candidate: Block) {
        let mut fork_index = 0;
        for (i, block) in self.chain.iter().enumerate() {
            if block.hash == candidate.previous_hash {
                fork_index = i;
            }
        }

        let mut survivors = candidate.into_transactions();
        for during in &self.chain[fork_index..] {
            let confirmed: Vec<String> = during
                .transactions()
                .iter()
                .map(Transaction::content_digest)
                .collect();
            survivors.retain(|tx| !confirmed.contains(&tx.content_digest()));
        }

        debug!(requeued = survivors.len(), "candidate lost the tip race");
        for tx in survivors.into_iter().rev() {
            self.mempool.push_front(tx);
        }
    }

    /// Adjusts the difficulty from the average interval of the last window.
    ///
    /// Runs only at window boundaries (`len % window == 1` past the first
    /// window) and only while mining is enabled. Received peer blocks do
    /// not retarget, so nodes that mine at very different rates can drift.
    pub fn retarget(&mut self) {
        if !self.mining {
            return;
        }

        let window = self.rules.adjust_every as usize;
        let len = self.chain.len();
        if window == 0 || len % window != 1 || len <= window {
            return;
        }

        let started = self.chain[len - window - 1].timestamp;
        let ended = self.chain[len - 1].timestamp;
        let average_secs = ((ended - started) / 1000) as f64 / window as f64;

        if average_secs > self.rules.target_block_secs as f64 {
            if self.difficulty > 1 {
                info!(average_secs, "average block time above target, decreasing difficulty");
                self.difficulty -= 1;
            } else {
                self.difficulty = 1;
            }
        } else {
            info!(average_secs, "average block time within target, increasing difficulty");
            self.difficulty += 1;
        }
    }

    /// Stops mining and clears the chain and mempool ahead of a clone.
    pub fn prepare_clone(&mut self) {
        self.mining = false;
        if !self.chain.is_empty() {
            warn!("existing chain storage will be erased by cloning");
        }
        self.chain.clear();
        self.mempool.clear();
    }

    /// Atomically adopts a cloned snapshot.
    ///
    /// A snapshot with fewer than three blocks is accepted without
    /// inter-block checks. Otherwise hash continuity and timestamp ordering
    /// must hold for indices 0 through `len - 2`; the last block is not
    /// checked against a successor. The mempool is cleared and the
    /// snapshot's peers seed the peer set.
    pub fn swap_chain(&mut self, snapshot: ChainSnapshot) -> Result<(), SnapshotError> {
        let chain = &snapshot.chain;
        if chain.len() >= 3 {
            for i in 0..chain.len() - 2 {
                if chain[i + 1].previous_hash != chain[i].hash {
                    return Err(SnapshotError::BrokenLink { index: i + 1 });
                }
                if chain[i + 1].timestamp < chain[i].timestamp {
                    return Err(SnapshotError::TimestampOrder { index: i + 1 });
                }
            }
        }

        self.chain = snapshot.chain;
        self.difficulty = snapshot.difficulty;
        self.mempool.clear();
        for peer in snapshot.peers {
            self.add_peer(peer);
        }
        info!(height = self.chain.len(), "cloned chain adopted");
        Ok(())
    }

    /// Produces the abridged snapshot served to cloning peers.
    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot {
            difficulty: self.difficulty,
            peers: self.peers.clone(),
            chain: self.chain.clone(),
        }
    }

    /// Adds a peer unless an equal endpoint is already known.
    pub fn add_peer(&mut self, peer: PeerAddr) -> bool {
        let identity = peer.identity();
        if self.peers.iter().any(|known| known.identity() == identity) {
            debug!(peer = %peer, "duplicated peer");
            return false;
        }
        info!(peer = %peer, "peer added");
        self.peers.push(peer);
        true
    }

    /// Drops peers that failed during a broadcast.
    pub fn remove_peers(&mut self, gone: &[PeerAddr]) {
        if gone.is_empty() {
            return;
        }
        self.peers.retain(|peer| !gone.contains(peer));
    }

    fn chain_contains_tx(&self, content_digest: &str) -> bool {
        self.chain.iter().any(|block| {
            block
                .transactions()
                .iter()
                .any(|tx| tx.content_digest() == content_digest)
        })
    }
}
