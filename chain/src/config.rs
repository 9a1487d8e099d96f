//! Top-level configuration for a node.
//!
//! This module aggregates:
//!
//! - consensus rules (`ChainRules`): difficulty, retarget window, rewards,
//!   and the mempool drain cap,
//! - gossip settings (`NetConfig`): listen port, peer timeouts, frame cap,
//! - crypto choices (`CryptoConfig`): digest and signature scheme names.
//!
//! The node binary constructs a `NodeConfig` from defaults and recognised
//! environment variables. There is no config-file parser.

use std::time::Duration;

/// Consensus parameters shared by every node on a network.
#[derive(Clone, Debug)]
pub struct ChainRules {
    /// Starting difficulty for a fresh chain.
    pub init_difficulty: u64,
    /// Retarget window, in blocks.
    pub adjust_every: u64,
    /// Target block interval, in seconds.
    pub target_block_secs: u64,
    /// Fixed per-block reward credited to the miner.
    pub mining_rewards: f64,
    /// Maximum transactions drained from the mempool into one block.
    pub max_block_txs: usize,
}

impl Default for ChainRules {
    fn default() -> Self {
        Self {
            init_difficulty: 1,
            adjust_every: 10,
            target_block_secs: 30,
            mining_rewards: 10.0,
            max_block_txs: 32,
        }
    }
}

/// Gossip networking parameters.
#[derive(Clone, Debug)]
pub struct NetConfig {
    /// TCP port the gossip server listens on.
    pub listen_port: u16,
    /// Connect and read timeout for outbound peer sockets.
    pub peer_timeout: Duration,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            listen_port: 7878,
            peer_timeout: Duration::from_secs(5),
        }
    }
}

/// Algorithm choices, resolved by name at startup.
#[derive(Clone, Debug)]
pub struct CryptoConfig {
    /// Digest algorithm name (`"SHA3-256"` or `"SHA-256"`).
    pub digest: String,
    /// Wallet signature scheme name (`"RSA"` or `"ECDSA"`).
    pub scheme: String,
    /// RSA key size in bits; ignored by other schemes.
    pub rsa_bits: usize,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            digest: "SHA3-256".to_string(),
            scheme: "RSA".to_string(),
            rsa_bits: 1024,
        }
    }
}

/// Everything a node needs to start.
#[derive(Clone, Debug)]
pub struct NodeConfig {
    /// Name of the wallet directory under `wallets/`.
    pub wallet_name: String,
    pub rules: ChainRules,
    pub net: NetConfig,
    pub crypto: CryptoConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            wallet_name: "DefaultNode".to_string(),
            rules: ChainRules::default(),
            net: NetConfig::default(),
            crypto: CryptoConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Builds a config from defaults plus recognised environment variables.
    ///
    /// Unparseable values fall back to the default silently; these are
    /// operator knobs, not consensus inputs from peers.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            wallet_name: env_string("WALLET_NAME", defaults.wallet_name),
            rules: ChainRules {
                init_difficulty: env_parse("INIT_DIFFICULTY", defaults.rules.init_difficulty),
                adjust_every: env_parse(
                    "ADJUST_DIFFICULTY_IN_EVERY",
                    defaults.rules.adjust_every,
                ),
                target_block_secs: env_parse(
                    "BLOCK_TIME_IN_EVERY",
                    defaults.rules.target_block_secs,
                ),
                mining_rewards: env_parse("MINING_REWARDS", defaults.rules.mining_rewards),
                max_block_txs: env_parse(
                    "MAX_TRANSACTIONS_IN_BLOCK",
                    defaults.rules.max_block_txs,
                ),
            },
            net: NetConfig {
                listen_port: env_parse("SOCKET_PORT", defaults.net.listen_port),
                peer_timeout: defaults.net.peer_timeout,
            },
            crypto: CryptoConfig {
                digest: env_string("HASH_ALGORITHM", defaults.crypto.digest),
                scheme: env_string("KEY_ALGORITHM", defaults.crypto.scheme),
                rsa_bits: env_parse("KEY_LENGTH", defaults.crypto.rsa_bits),
            },
        }
    }
}

fn env_string(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_network_constants() {
        let cfg = NodeConfig::default();
        assert_eq!(cfg.rules.init_difficulty, 1);
        assert_eq!(cfg.rules.adjust_every, 10);
        assert_eq!(cfg.rules.target_block_secs, 30);
        assert_eq!(cfg.rules.mining_rewards, 10.0);
        assert_eq!(cfg.rules.max_block_txs, 32);
        assert_eq!(cfg.net.peer_timeout, Duration::from_secs(5));
        assert_eq!(cfg.crypto.scheme, "RSA");
    }

    #[test]
    fn env_parse_falls_back_on_garbage() {
        // Unset variable.
        assert_eq!(env_parse("CHAIN_TEST_UNSET_VARIABLE", 7u64), 7);
    }
}
