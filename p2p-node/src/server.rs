//! Gossip server.
//!
//! Binds the configured TCP port, accepts connections, and spawns one task
//! per connection. Each connection handles exactly one line-delimited
//! request, writes one response, and closes. Items that pass admission are
//! queued to the broadcaster for fan-out; rejections become reply tokens,
//! never errors, so a misbehaving peer cannot take the server down.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use chain::protocol::{
    BCAST_BLOCK, BCAST_NEWNODE, BCAST_TRANSACT, CLONE_CHAIN, DO_TRANSACT, GET_BALANCE,
    GET_CLONE_CHAIN_FROM, JOIN_NETWORK, MAX_FRAME_BYTES, MINE_START, MINE_STOP, REPLY_DUP,
    REPLY_DUP_OR_TAMPERED, REPLY_DUPLICATED, REPLY_ERROR, REPLY_OK, VERB_SEPARATOR,
};
use chain::types::{Block, PeerAddr, Transaction};
use chain::codec;

use crate::broadcast::{Outbound, OutboundSender};
use crate::clone;
use crate::state::SharedLedger;

/// Everything a connection handler needs.
#[derive(Clone)]
pub struct ServerCtx {
    pub state: SharedLedger,
    pub outbound: OutboundSender,
    pub peer_timeout: Duration,
}

/// The accept loop. Runs until the shutdown signal flips; in-flight
/// handlers finish their single request and exit on their own.
pub async fn run(listener: TcpListener, ctx: ServerCtx, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, remote)) => {
                    debug!(remote = %remote, "connected");
                    let ctx = ctx.clone();
                    tokio::spawn(handle(stream, ctx));
                }
                Err(e) => warn!(error = %e, "accept failed"),
            },
            _ = shutdown.changed() => {
                info!("gossip server stopping");
                break;
            }
        }
    }
}

async fn handle(stream: TcpStream, ctx: ServerCtx) {
    let (read_half, mut write_half) = stream.into_split();

    // One extra byte past the cap distinguishes "exactly at the limit" from
    // "oversized".
    let mut reader = BufReader::new(read_half).take(MAX_FRAME_BYTES as u64 + 1);
    let mut line = String::new();

    let reply = match reader.read_line(&mut line).await {
        Ok(0) => return,
        Ok(_) if line.len() > MAX_FRAME_BYTES => {
            warn!("request frame exceeds the wire cap, rejecting");
            token_line(REPLY_ERROR)
        }
        Ok(_) => dispatch(line.trim(), &ctx).await,
        Err(e) => {
            warn!(error = %e, "could not read request frame");
            token_line(REPLY_ERROR)
        }
    };

    if let Err(e) = write_half.write_all(reply.as_bytes()).await {
        debug!(error = %e, "could not write response");
    }
}

/// Maps one request line to one response line.
async fn dispatch(message: &str, ctx: &ServerCtx) -> String {
    debug!(request = message, "received");

    let Some((verb, payload_b64)) = split_request(message) else {
        // Bare verbs without payload.
        return match message {
            MINE_START => {
                ctx.state.lock().set_mining(true);
                token_line(REPLY_OK)
            }
            MINE_STOP => {
                ctx.state.lock().set_mining(false);
                token_line(REPLY_OK)
            }
            CLONE_CHAIN => {
                // The one response that is not base64-wrapped.
                let snapshot = ctx.state.lock().snapshot();
                format!("{}\n", snapshot.to_wire())
            }
            _ => {
                warn!("client sent a command the server could not understand");
                token_line(REPLY_ERROR)
            }
        };
    };

    // Payload-carrying verbs: the payload's base64 decode is the canonical
    // encoding of a record.
    let Ok(payload) = codec::decode_str(payload_b64) else {
        return token_line(REPLY_ERROR);
    };

    match verb {
        GET_BALANCE => {
            let balance = ctx.state.lock().balance(&payload);
            token_line(&balance.to_string())
        }

        DO_TRANSACT => match Transaction::from_wire(&payload) {
            Ok(tx) => {
                if ctx.state.lock().accept_transaction(tx).is_accepted() {
                    let _ = ctx
                        .outbound
                        .send(Outbound::new(BCAST_TRANSACT, payload_b64.to_string()));
                    token_line(REPLY_OK)
                } else {
                    token_line(REPLY_ERROR)
                }
            }
            Err(_) => token_line(REPLY_ERROR),
        },

        GET_CLONE_CHAIN_FROM => match PeerAddr::from_wire(&payload) {
            Ok(target) => {
                match clone::clone_from(&ctx.state, &target, ctx.peer_timeout).await {
                    Ok(()) => token_line(REPLY_OK),
                    Err(e) => {
                        warn!(peer = %target, error = %e, "cannot clone blockchain");
                        token_line(REPLY_ERROR)
                    }
                }
            }
            Err(_) => token_line(REPLY_ERROR),
        },

        JOIN_NETWORK => match PeerAddr::from_wire(&payload) {
            Ok(peer) => {
                if ctx.state.lock().add_peer(peer) {
                    let _ = ctx
                        .outbound
                        .send(Outbound::new(BCAST_NEWNODE, payload_b64.to_string()));
                    token_line(REPLY_OK)
                } else {
                    token_line(REPLY_DUP)
                }
            }
            Err(_) => token_line(REPLY_ERROR),
        },

        BCAST_BLOCK => match Block::from_wire(&payload) {
            Ok(block) => {
                if ctx.state.lock().accept_block(block).is_accepted() {
                    let _ = ctx
                        .outbound
                        .send(Outbound::new(BCAST_BLOCK, payload_b64.to_string()));
                    token_line(REPLY_OK)
                } else {
                    token_line(REPLY_DUP_OR_TAMPERED)
                }
            }
            Err(_) => token_line(REPLY_ERROR),
        },

        BCAST_TRANSACT => match Transaction::from_wire(&payload) {
            Ok(tx) => {
                if ctx.state.lock().accept_transaction(tx).is_accepted() {
                    let _ = ctx
                        .outbound
                        .send(Outbound::new(BCAST_TRANSACT, payload_b64.to_string()));
                    token_line(REPLY_OK)
                } else {
                    token_line(REPLY_DUPLICATED)
                }
            }
            Err(_) => token_line(REPLY_ERROR),
        },

        BCAST_NEWNODE => match PeerAddr::from_wire(&payload) {
            Ok(peer) => {
                if ctx.state.lock().add_peer(peer) {
                    let _ = ctx
                        .outbound
                        .send(Outbound::new(BCAST_NEWNODE, payload_b64.to_string()));
                    token_line(REPLY_OK)
                } else {
                    token_line(REPLY_DUP)
                }
            }
            Err(_) => token_line(REPLY_ERROR),
        },

        _ => {
            warn!("client sent a command the server could not understand");
            token_line(REPLY_ERROR)
        }
    }
}

/// Splits `VERB, PAYLOAD` requests; bare verbs return `None`.
fn split_request(message: &str) -> Option<(&str, &str)> {
    message.split_once(VERB_SEPARATOR)
}

/// Renders a base64-wrapped single-token response line.
fn token_line(token: &str) -> String {
    format!("{}\n", codec::encode_str(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_separates_verb_from_payload_once() {
        assert_eq!(
            split_request("doTransact, QUJD"),
            Some(("doTransact", "QUJD"))
        );
        // Only the first separator splits; payloads never contain ", " but
        // the rule is first-match regardless.
        assert_eq!(split_request("a, b, c"), Some(("a", "b, c")));
        assert_eq!(split_request("startMining"), None);
    }

    #[test]
    fn token_lines_are_base64_wrapped_and_terminated() {
        assert_eq!(token_line("Ok"), format!("{}\n", codec::encode_str("Ok")));
        assert!(token_line("Error").ends_with('\n'));
    }
}
