// chain/src/types/peer.rs

//! Peer addresses.
//!
//! A peer is identified by `(host, port)`. For deduplication the identity of
//! a peer is the digest of its canonical encoding, so two records naming the
//! same endpoint collapse to one entry. The wire type name is
//! `NetworkNode` for compatibility with existing peers.

use std::fmt;

use crate::codec::{self, CodecError};
use crate::digest;

/// Address of a gossip peer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PeerAddr {
    /// IP address or hostname.
    pub host: String,
    /// TCP port the peer's gossip server listens on.
    pub port: u16,
}

impl PeerAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Canonical frame, as sent on the wire.
    pub fn to_wire(&self) -> String {
        codec::render(
            "NetworkNode",
            &[
                ("inetAddress", codec::encode_str(&self.host)),
                ("inetPort", codec::encode_str(&self.port.to_string())),
            ],
        )
    }

    /// Restores a peer address from its canonical frame.
    pub fn from_wire(frame: &str) -> Result<Self, CodecError> {
        let mut peer = PeerAddr {
            host: String::new(),
            port: 0,
        };

        for (name, value) in codec::fields("NetworkNode", frame)? {
            match name {
                "inetAddress" => peer.host = codec::decode_str(value)?,
                "inetPort" => peer.port = codec::decode_scalar(value)?,
                _ => {}
            }
        }

        Ok(peer)
    }

    /// Identity digest used for peer-set deduplication.
    pub fn identity(&self) -> String {
        digest::hash_str(&self.to_wire())
    }
}

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_roundtrip() {
        let peer = PeerAddr::new("127.0.0.1", 7878);
        let restored = PeerAddr::from_wire(&peer.to_wire()).expect("decode");
        assert_eq!(restored, peer);
    }

    #[test]
    fn identity_collapses_equal_endpoints() {
        let a = PeerAddr::new("10.0.0.1", 9000);
        let b = PeerAddr::new("10.0.0.1", 9000);
        let c = PeerAddr::new("10.0.0.1", 9001);
        assert_eq!(a.identity(), b.identity());
        assert_ne!(a.identity(), c.identity());
    }

    #[test]
    fn display_is_host_port() {
        assert_eq!(PeerAddr::new("node-a", 81).to_string(), "node-a:81");
    }
}
