//! Chain-clone client.
//!
//! Used on fresh startup (or on operator request) to catch up with a chosen
//! peer: mining is paused, local chain and mempool are cleared, the peer's
//! snapshot is fetched over one `cloneBlockchain` exchange and validated
//! before adoption. Mining is not resumed automatically.

use std::fmt;
use std::io;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::info;

use chain::protocol::{CLONE_CHAIN, MAX_FRAME_BYTES};
use chain::types::{ChainSnapshot, PeerAddr};
use chain::{CodecError, SnapshotError};

use crate::state::SharedLedger;

/// Reasons a clone attempt failed. The local chain is left empty; the
/// operator can retry against the same or another peer.
#[derive(Debug)]
pub enum CloneError {
    /// Could not connect, send, or read.
    Io(io::Error),
    /// The peer did not answer within the connect timeout.
    Timeout,
    /// The snapshot frame exceeded the wire cap.
    Oversize,
    /// The snapshot frame did not decode.
    Codec(CodecError),
    /// The decoded chain failed link or timestamp validation.
    Snapshot(SnapshotError),
}

impl fmt::Display for CloneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloneError::Io(e) => write!(f, "clone I/O error: {e}"),
            CloneError::Timeout => write!(f, "clone target did not respond in time"),
            CloneError::Oversize => write!(f, "clone snapshot exceeds the frame cap"),
            CloneError::Codec(e) => write!(f, "clone snapshot did not decode: {e}"),
            CloneError::Snapshot(e) => write!(f, "clone snapshot rejected: {e}"),
        }
    }
}

impl std::error::Error for CloneError {}

impl From<io::Error> for CloneError {
    fn from(e: io::Error) -> Self {
        CloneError::Io(e)
    }
}

/// Replaces local chain state wholesale with `target`'s snapshot.
pub async fn clone_from(
    state: &SharedLedger,
    target: &PeerAddr,
    connect_timeout: Duration,
) -> Result<(), CloneError> {
    state.lock().prepare_clone();
    info!(peer = %target, "cloning blockchain");

    let stream = tokio::time::timeout(
        connect_timeout,
        TcpStream::connect((target.host.as_str(), target.port)),
    )
    .await
    .map_err(|_| CloneError::Timeout)??;

    let (read_half, mut write_half) = stream.into_split();
    write_half.write_all(format!("{CLONE_CHAIN}\n").as_bytes()).await?;

    let mut reader = BufReader::new(read_half).take(MAX_FRAME_BYTES as u64 + 1);
    let mut line = String::new();
    reader.read_line(&mut line).await?;
    if line.len() > MAX_FRAME_BYTES {
        return Err(CloneError::Oversize);
    }

    let snapshot = ChainSnapshot::from_wire(line.trim()).map_err(CloneError::Codec)?;
    state.lock().swap_chain(snapshot).map_err(CloneError::Snapshot)?;

    info!("cloning complete");
    Ok(())
}
