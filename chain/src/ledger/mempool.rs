//! In-memory pool of accepted but unmined transactions.
//!
//! The pool preserves insertion order; draining for a block takes the
//! highest-fee transactions first, with ties broken by insertion order.

use std::collections::VecDeque;

use crate::types::Transaction;

/// FIFO transaction pool with fee-priority draining.
#[derive(Default)]
pub struct Mempool {
    entries: VecDeque<Transaction>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a transaction with this content digest is queued.
    pub fn contains(&self, content_digest: &str) -> bool {
        self.entries
            .iter()
            .any(|tx| tx.content_digest() == content_digest)
    }

    /// Appends a newly accepted transaction.
    pub fn push_back(&mut self, tx: Transaction) {
        self.entries.push_back(tx);
    }

    /// Re-inserts a transaction at the head of the pool.
    ///
    /// Used when a mined candidate loses the tip race and its surviving
    /// transactions go back to the front of the queue.
    pub fn push_front(&mut self, tx: Transaction) {
        self.entries.push_front(tx);
    }

    /// Removes every queued transaction whose content digest appears in
    /// `digests` (they were just confirmed in a block).
    pub fn remove_digests(&mut self, digests: &[String]) {
        self.entries
            .retain(|tx| !digests.contains(&tx.content_digest()));
    }

    /// Removes and returns up to `max` transactions in fee-descending order,
    /// ties broken by insertion order.
    pub fn drain_for_block(&mut self, max: usize) -> Vec<Transaction> {
        let mut sorted: Vec<Transaction> = self.entries.drain(..).collect();
        // Stable sort: equal fees keep their insertion order.
        sorted.sort_by(|a, b| b.fee.total_cmp(&a.fee));
        let rest = sorted.split_off(max.min(sorted.len()));
        self.entries = rest.into();
        sorted
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_tx(message: &str, fee: f64) -> Transaction {
        Transaction {
            sender: "s".to_string(),
            receiver: "r".to_string(),
            amount: 1.0,
            fee,
            timestamp: 1_700_000_000_000,
            message: message.to_string(),
            signature: String::new(),
        }
    }

    #[test]
    fn drain_is_fee_descending_with_stable_ties() {
        let mut pool = Mempool::new();
        pool.push_back(dummy_tx("low", 0.1));
        pool.push_back(dummy_tx("high", 2.0));
        pool.push_back(dummy_tx("tie-first", 1.0));
        pool.push_back(dummy_tx("tie-second", 1.0));

        let drained = pool.drain_for_block(3);
        let messages: Vec<&str> = drained.iter().map(|t| t.message.as_str()).collect();
        assert_eq!(messages, vec!["high", "tie-first", "tie-second"]);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn drain_respects_the_cap() {
        let mut pool = Mempool::new();
        for i in 0..5 {
            pool.push_back(dummy_tx(&format!("tx-{i}"), i as f64));
        }
        assert_eq!(pool.drain_for_block(2).len(), 2);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.drain_for_block(10).len(), 3);
        assert!(pool.is_empty());
    }

    #[test]
    fn contains_and_remove_use_content_digests() {
        let mut pool = Mempool::new();
        let tx = dummy_tx("queued", 0.5);
        let digest = tx.content_digest();
        pool.push_back(tx);

        assert!(pool.contains(&digest));
        pool.remove_digests(std::slice::from_ref(&digest));
        assert!(!pool.contains(&digest));
        assert!(pool.is_empty());
    }

    #[test]
    fn push_front_takes_priority_on_equal_fees() {
        let mut pool = Mempool::new();
        pool.push_back(dummy_tx("old", 1.0));
        pool.push_front(dummy_tx("requeued", 1.0));

        let drained = pool.drain_for_block(2);
        assert_eq!(drained[0].message, "requeued");
    }
}
