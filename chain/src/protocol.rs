//! Wire protocol verbs and reply tokens.
//!
//! Framing is line-delimited UTF-8 over TCP (`\n` terminator). A request is
//! either `VERB\n` or `VERB, B64PAYLOAD\n`, where the payload's base64
//! decode is the canonical encoding of a record. Responses are always
//! `B64TOKEN\n`, with one exception: [`CLONE_CHAIN`] answers with the raw
//! snapshot encoding. That asymmetry is load-bearing for wire compatibility.

/// Hard cap on a single frame, including the terminator.
///
/// Blocks whose encoded size exceeds this cannot propagate; the server
/// replies with an explicit error instead of silently truncating.
pub const MAX_FRAME_BYTES: usize = 65_536;

/// Separator between a verb and its payload.
pub const VERB_SEPARATOR: &str = ", ";

// Client to server commands.

/// RECV: `getBalance, b64(address)`. RESP: `b64(balance)`.
pub const GET_BALANCE: &str = "getBalance";

/// RECV: `doTransact, b64(transaction)`. RESP: `b64(Ok)`, `b64(Error)`.
pub const DO_TRANSACT: &str = "doTransact";

/// RECV: `getCloneChainFrom, b64(peer)`. RESP: `b64(Ok)`, `b64(Error)`.
pub const GET_CLONE_CHAIN_FROM: &str = "getCloneChainFrom";

/// RECV: `joinNetwork, b64(peer)`. RESP: `b64(Ok)`, `b64(Dup)`.
pub const JOIN_NETWORK: &str = "joinNetwork";

/// RECV: `startMining`. RESP: `b64(Ok)`.
pub const MINE_START: &str = "startMining";

/// RECV: `stopMining`. RESP: `b64(Ok)`.
pub const MINE_STOP: &str = "stopMining";

// Peer-to-peer broadcast messages.

/// RECV: `broadcastedBlock, b64(block)`. RESP: `b64(Ok)`,
/// `b64(Duplicated or Tampered)`.
pub const BCAST_BLOCK: &str = "broadcastedBlock";

/// RECV: `broadcastedTransaction, b64(transaction)`. RESP: `b64(Ok)`,
/// `b64(Duplicated)`.
pub const BCAST_TRANSACT: &str = "broadcastedTransaction";

/// RECV: `broadcastedNewNode, b64(peer)`. RESP: `b64(Ok)`, `b64(Dup)`.
pub const BCAST_NEWNODE: &str = "broadcastedNewNode";

/// RECV: `cloneBlockchain`. RESP: snapshot encoding, not base64-wrapped.
pub const CLONE_CHAIN: &str = "cloneBlockchain";

// Reply tokens.

pub const REPLY_OK: &str = "Ok";
pub const REPLY_DUP: &str = "Dup";
pub const REPLY_ERROR: &str = "Error";
pub const REPLY_DUPLICATED: &str = "Duplicated";
pub const REPLY_DUP_OR_TAMPERED: &str = "Duplicated or Tampered";
