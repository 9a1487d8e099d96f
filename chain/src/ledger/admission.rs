use std::fmt;

/// Outcome of offering a transaction to the ledger.
///
/// Every outcome other than `Accepted` is terminal for that transaction; the
/// node never retries admission.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TxAdmission {
    /// Appended to the mempool; should be fanned out to peers.
    Accepted,
    /// Already present in the mempool or the chain.
    Duplicate,
    /// Signature malformed, wrong length, or failing verification.
    InvalidSig,
    /// Sender's chain balance cannot cover `amount + fee`.
    Insufficient,
    /// Sender or receiver address is not a known key format.
    BadFormat,
}

impl TxAdmission {
    pub fn is_accepted(self) -> bool {
        self == TxAdmission::Accepted
    }
}

impl fmt::Display for TxAdmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TxAdmission::Accepted => "accepted",
            TxAdmission::Duplicate => "duplicate transaction",
            TxAdmission::InvalidSig => "invalid signature",
            TxAdmission::Insufficient => "insufficient funds",
            TxAdmission::BadFormat => "unrecognised address format",
        };
        f.write_str(text)
    }
}

/// Outcome of offering a block to the ledger.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BlockAdmission {
    /// Appended to the chain; should be fanned out to peers.
    Accepted,
    /// A block with this hash is already in the chain.
    Duplicate,
    /// `previous_hash` does not name the current tip.
    NotTipLinked,
    /// Difficulty disagrees with the local target, or the hash does not
    /// carry the required zero prefix.
    BadDifficulty,
    /// The recomputed seal digest does not equal the claimed hash.
    BadSeal,
    /// The recomputed Merkle root does not match the block's.
    BadMerkle,
    /// A carried transaction fails signature verification.
    BadTxSig,
}

impl BlockAdmission {
    pub fn is_accepted(self) -> bool {
        self == BlockAdmission::Accepted
    }
}

impl fmt::Display for BlockAdmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BlockAdmission::Accepted => "accepted",
            BlockAdmission::Duplicate => "duplicated block",
            BlockAdmission::NotTipLinked => "does not extend the current tip",
            BlockAdmission::BadDifficulty => "difficulty mismatch",
            BlockAdmission::BadSeal => "claimed hash does not match the seal digest",
            BlockAdmission::BadMerkle => "merkle root does not match the transactions",
            BlockAdmission::BadTxSig => "tampered transaction signature",
        };
        f.write_str(text)
    }
}

/// Reason a clone snapshot was rejected.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SnapshotError {
    /// `chain[index].previous_hash` does not equal `chain[index - 1].hash`.
    BrokenLink { index: usize },
    /// `chain[index].timestamp` precedes `chain[index - 1].timestamp`.
    TimestampOrder { index: usize },
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::BrokenLink { index } => {
                write!(f, "block {index} does not link to block {}", index - 1)
            }
            SnapshotError::TimestampOrder { index } => {
                write!(
                    f,
                    "block {index} has a smaller timestamp than block {}",
                    index - 1
                )
            }
        }
    }
}

impl std::error::Error for SnapshotError {}
