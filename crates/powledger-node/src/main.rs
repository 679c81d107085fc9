use std::{net::SocketAddr, time::Duration};

use clap::Parser;
use powledger_core::{config::check_difficulty, Ledger, LedgerConfig, LoopbackPolicy};
use powledger_node::{
    constants::{DEFAULT_LISTEN, PEER_TIMEOUT_MS},
    discovery::advertised_address,
    router, AppState, HttpTransport,
};
use tracing::{info, warn, Level};

#[derive(Parser, Debug)]
struct Args {
    /// Address to listen on, e.g. 0.0.0.0:5000
    #[arg(long, default_value = DEFAULT_LISTEN)]
    listen: String,

    /// Address peers should use to reach this node (defaults to the outbound IP)
    #[arg(long)]
    advertise: Option<String>,

    /// Leading zero hex characters required of block hashes
    #[arg(
        long,
        default_value_t = powledger_core::constants::POW_TARGET_DIFFICULTY,
        value_parser = parse_difficulty
    )]
    difficulty: usize,

    /// Accept localhost / 127.0.0.1 peers (same-host test networks)
    #[arg(long)]
    allow_loopback: bool,

    /// Search nonces on all cores
    #[arg(long)]
    parallel_mining: bool,

    /// Peer to register at startup; repeatable
    #[arg(long = "peer")]
    peers: Vec<String>,

    /// Timeout for every request to a peer, in milliseconds
    #[arg(long, default_value_t = PEER_TIMEOUT_MS)]
    peer_timeout_ms: u64,
}

impl Args {
    fn ledger_config(&self) -> LedgerConfig {
        let loopback = if self.allow_loopback {
            LoopbackPolicy::Allow
        } else {
            LoopbackPolicy::Reject
        };
        LedgerConfig::default()
            .with_difficulty(self.difficulty)
            .with_loopback(loopback)
            .with_parallel_mining(self.parallel_mining)
    }
}

fn parse_difficulty(raw: &str) -> Result<usize, String> {
    let difficulty: usize = raw.parse().map_err(|err| format!("{err}"))?;
    check_difficulty(difficulty).map_err(|err| err.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let listen: SocketAddr = args.listen.parse()?;
    let config = args.ledger_config();
    config.validate()?;
    let transport = HttpTransport::new(Duration::from_millis(args.peer_timeout_ms))?;

    // Genesis is mined here, before the node is reachable.
    let mut ledger = tokio::task::spawn_blocking(move || Ledger::new(config)).await?;

    let host = advertised_address(listen, args.advertise.as_deref());
    if !ledger.set_host(&host) {
        warn!(%host, "advertised address not registered; peers will not learn it from us");
    }
    for peer in &args.peers {
        if !ledger.register_node(peer) {
            warn!(%peer, "ignoring invalid peer");
        }
    }
    info!(account = ledger.account(), %host, difficulty = ledger.difficulty(), "ledger ready");

    let app = router(AppState::new(ledger, transport));
    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!("powledger-node listening on http://{listen}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
