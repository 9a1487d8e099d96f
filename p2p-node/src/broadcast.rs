//! Best-effort fan-out to the peer set.
//!
//! Accepted items are queued to a single broadcast worker, which opens one
//! short-lived connection per peer, sends the frame, reads (and discards)
//! one response line, and closes. Any I/O failure, including a timeout,
//! evicts the peer from the set. There is no acknowledged delivery and no
//! retry; duplicate suppression happens at the receiver, so the sender does
//! not avoid echoing back to the peer a message came from.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use chain::protocol::{MAX_FRAME_BYTES, VERB_SEPARATOR};
use chain::types::PeerAddr;

use crate::state::SharedLedger;

/// One queued fan-out: a verb plus its base64 payload.
#[derive(Clone, Debug)]
pub struct Outbound {
    pub verb: &'static str,
    pub body_b64: String,
}

impl Outbound {
    pub fn new(verb: &'static str, body_b64: String) -> Self {
        Self { verb, body_b64 }
    }
}

/// Handle the server and the miner use to queue broadcasts.
pub type OutboundSender = mpsc::UnboundedSender<Outbound>;

/// The broadcast worker loop.
///
/// Drains the queue until every sender is dropped. The peer list is
/// snapshotted per message so the state lock is never held across network
/// I/O; failed peers are pruned afterwards in one step.
pub async fn run(
    state: SharedLedger,
    mut inbox: mpsc::UnboundedReceiver<Outbound>,
    peer_timeout: Duration,
) {
    while let Some(message) = inbox.recv().await {
        let peers: Vec<PeerAddr> = state.lock().peers().to_vec();
        if peers.is_empty() {
            continue;
        }
        debug!(verb = message.verb, peers = peers.len(), "broadcasting");

        let mut failed = Vec::new();
        for peer in peers {
            match send_to(&peer, &message, peer_timeout).await {
                Ok(response) => {
                    debug!(peer = %peer, response = %response, "peer replied");
                }
                Err(e) => {
                    warn!(peer = %peer, error = %e, "broadcast failed, pruning peer");
                    failed.push(peer);
                }
            }
        }

        if !failed.is_empty() {
            state.lock().remove_peers(&failed);
        }
    }
}

async fn send_to(peer: &PeerAddr, message: &Outbound, timeout: Duration) -> io::Result<String> {
    let stream = tokio::time::timeout(
        timeout,
        TcpStream::connect((peer.host.as_str(), peer.port)),
    )
    .await
    .map_err(|_| timed_out())??;

    let (read_half, mut write_half) = stream.into_split();

    let frame = format!("{}{}{}\n", message.verb, VERB_SEPARATOR, message.body_b64);
    write_half.write_all(frame.as_bytes()).await?;

    let mut reader = BufReader::new(read_half).take(MAX_FRAME_BYTES as u64);
    let mut line = String::new();
    tokio::time::timeout(timeout, reader.read_line(&mut line))
        .await
        .map_err(|_| timed_out())??;

    Ok(line.trim().to_string())
}

fn timed_out() -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, "peer did not respond in time")
}
