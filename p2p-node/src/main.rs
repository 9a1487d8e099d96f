// p2p-node/src/main.rs

//! Proof-of-work node binary.
//!
//! Wires up the `chain` library into a running node:
//!
//! - wallet loaded (or created) from `wallets/<name>/`
//! - genesis block mined before the network comes up
//! - line-delimited TCP gossip server on the configured port
//! - broadcast worker fanning accepted items out to peers
//! - mining worker on a blocking thread
//! - cooperative shutdown on ctrl-c
//!
//! Usage: `p2p-node [wallet_name] [port]`, with the environment variables
//! recognised by `NodeConfig::from_env` as the base configuration.

mod broadcast;
mod clone;
mod miner;
mod server;
mod state;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use chain::digest::DigestAlgorithm;
use chain::{Ledger, NodeConfig, SchemeRegistry, Wallet};

use state::SharedLedger;

#[tokio::main]
async fn main() {
    // Basic tracing setup.
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "p2p_node=info,chain=info".to_string()),
        )
        .init();

    if let Err(err) = run().await {
        eprintln!("fatal error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let mut cfg = NodeConfig::from_env();

    // Positional overrides: `p2p-node [wallet_name] [port]`.
    let mut args = std::env::args().skip(1);
    if let Some(wallet_name) = args.next() {
        cfg.wallet_name = wallet_name;
    }
    if let Some(port) = args.next() {
        match port.parse() {
            Ok(port) => cfg.net.listen_port = port,
            Err(_) => warn!(default = cfg.net.listen_port, "invalid port argument, using default"),
        }
    }

    // ---------------------------
    // Crypto providers, by name
    // ---------------------------

    let digest_algorithm = DigestAlgorithm::from_name(&cfg.crypto.digest)
        .ok_or_else(|| format!("unknown digest algorithm: {}", cfg.crypto.digest))?;
    chain::digest::select(digest_algorithm);

    let registry = Arc::new(SchemeRegistry::standard(cfg.crypto.rsa_bits));
    if registry.by_name(&cfg.crypto.scheme).is_none() {
        return Err(format!("unknown signature scheme: {}", cfg.crypto.scheme));
    }

    // ---------------------------
    // Wallet
    // ---------------------------

    let wallet = Wallet::load_or_create(Path::new("wallets"), &cfg.wallet_name, &cfg.crypto)
        .map_err(|e| format!("cannot load key pairs: {e}"))?;
    info!(account = %wallet.address(), "account loaded");
    info!(
        algorithm = wallet.scheme_name(),
        digest = digest_algorithm.name(),
        "crypto providers ready"
    );

    // ---------------------------
    // Ledger + broadcast worker
    // ---------------------------

    let state: SharedLedger = Arc::new(Mutex::new(Ledger::new(cfg.rules.clone(), registry)));

    let (outbound, inbox) = mpsc::unbounded_channel();
    tokio::spawn(broadcast::run(state.clone(), inbox, cfg.net.peer_timeout));

    // ---------------------------
    // Genesis, before the network is up
    // ---------------------------

    {
        let genesis_state = state.clone();
        let miner_address = wallet.address();
        tokio::task::spawn_blocking(move || miner::mine_genesis(&genesis_state, &miner_address))
            .await
            .map_err(|e| format!("genesis mining task failed: {e}"))?;
    }

    // ---------------------------
    // Gossip server
    // ---------------------------

    // A bind failure is the one startup error that is fatal to the process.
    let listener = TcpListener::bind(("0.0.0.0", cfg.net.listen_port))
        .await
        .map_err(|e| format!("cannot start network server on port {}: {e}", cfg.net.listen_port))?;
    info!(port = cfg.net.listen_port, "network ready");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ctx = server::ServerCtx {
        state: state.clone(),
        outbound: outbound.clone(),
        peer_timeout: cfg.net.peer_timeout,
    };
    let server_task = tokio::spawn(server::run(listener, ctx, shutdown_rx));

    // ---------------------------
    // Miner worker
    // ---------------------------

    let terminate = Arc::new(AtomicBool::new(false));
    let miner_task = {
        let state = state.clone();
        let outbound = outbound.clone();
        let miner_address = wallet.address();
        let terminate = terminate.clone();
        tokio::task::spawn_blocking(move || miner::run(state, outbound, miner_address, terminate))
    };

    // ---------------------------
    // Cooperative shutdown
    // ---------------------------

    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");

    terminate.store(true, Ordering::Relaxed);
    let _ = shutdown_tx.send(true);
    let _ = miner_task.await;
    let _ = server_task.await;

    Ok(())
}
