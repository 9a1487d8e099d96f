//! Merkle tree over an ordered transaction list.
//!
//! Leaves are transaction content digests. At each level, pairs are combined
//! as `digest(left_hex || right_hex)` where `||` is string concatenation of
//! the hex nodes; an odd trailing node is duplicated into itself. The root
//! of an empty list is the digest of the empty string.

use crate::digest;
use crate::types::Transaction;

/// Computes the Merkle root of an ordered transaction list.
pub fn root(transactions: &[Transaction]) -> String {
    if transactions.is_empty() {
        return digest::empty();
    }

    let mut level: Vec<String> = transactions
        .iter()
        .map(Transaction::content_digest)
        .collect();

    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            next.push(digest::hash_str(&format!("{left}{right}")));
        }
        level = next;
    }

    level.into_iter().next().expect("non-empty level has a root")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_tx(message: &str) -> Transaction {
        Transaction {
            sender: "s".to_string(),
            receiver: "r".to_string(),
            amount: 1.0,
            fee: 0.1,
            timestamp: 1_700_000_000_000,
            message: message.to_string(),
            signature: String::new(),
        }
    }

    #[test]
    fn empty_list_hashes_the_empty_string() {
        assert_eq!(root(&[]), digest::empty());
    }

    #[test]
    fn single_leaf_is_its_own_root() {
        let tx = dummy_tx("only");
        assert_eq!(root(std::slice::from_ref(&tx)), tx.content_digest());
    }

    #[test]
    fn pair_combines_left_then_right() {
        let a = dummy_tx("a");
        let b = dummy_tx("b");
        let expected = digest::hash_str(&format!("{}{}", a.content_digest(), b.content_digest()));
        assert_eq!(root(&[a, b]), expected);
    }

    #[test]
    fn odd_tail_is_duplicated() {
        let a = dummy_tx("a");
        let b = dummy_tx("b");
        let c = dummy_tx("c");

        let ab = digest::hash_str(&format!("{}{}", a.content_digest(), b.content_digest()));
        let cc = digest::hash_str(&format!("{}{}", c.content_digest(), c.content_digest()));
        let expected = digest::hash_str(&format!("{ab}{cc}"));

        assert_eq!(root(&[a, b, c]), expected);
    }

    #[test]
    fn root_depends_on_order() {
        let a = dummy_tx("a");
        let b = dummy_tx("b");
        assert_ne!(root(&[a.clone(), b.clone()]), root(&[b, a]));
    }
}
