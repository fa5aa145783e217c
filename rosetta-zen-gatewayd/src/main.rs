//! Gateway binary: loads configuration, wires the node RPC adapter, the
//! embedded store, and the sync orchestrator together, and runs until
//! signalled to stop. Does not implement the Rosetta HTTP surface or any
//! CLI argument parsing beyond locating a config file — those are left to
//! an external collaborator wired up against this crate's public types.

mod config;
mod version;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use config::{ConfigError, Mode, Settings};
use rosetta_zen_indexer::{Orchestrator, SyncConfig};
use rosetta_zen_rpc::{HttpNodeClient, RetryPolicy};
use rosetta_zen_state::State;

fn init_tracing() {
    let filter = EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn config_path() -> PathBuf {
    std::env::var_os("ROSETTA_ZEN_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("rosetta-zen-gateway.toml"))
}

#[tokio::main]
async fn main() {
    init_tracing();

    let settings = match Settings::load(&config_path()) {
        Ok(settings) => settings,
        Err(err) => {
            tracing::error!(error = %err, "failed to load configuration");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(settings).await {
        tracing::error!(error = %err, "gateway exited with an error");
        std::process::exit(1);
    }
}

#[derive(thiserror::Error, Debug)]
enum GatewayError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    State(#[from] rosetta_zen_state::StateError),
    #[error(transparent)]
    Indexer(#[from] rosetta_zen_indexer::IndexerError),
}

async fn run(settings: Settings) -> Result<(), GatewayError> {
    let network = settings.network()?;
    let mode = settings.mode()?;

    tracing::info!(?network, ?mode, node_rpc_url = %settings.node_rpc_url, "starting rosetta-zen-gatewayd");
    tracing::info!(
        rosetta_version = version::ROSETTA_VERSION,
        node_version = version::NODE_VERSION,
        middleware_version = version::MIDDLEWARE_VERSION,
        "version metadata"
    );

    let state_config = rosetta_zen_state::Config::new(settings.data_dir.clone());
    let state = State::new(&state_config, network)?;

    if mode == Mode::Offline {
        tracing::info!("running in offline mode: construction only, sync loop not started");
        std::future::pending::<()>().await;
        return Ok(());
    }

    let client = Arc::new(HttpNodeClient::new(
        settings.node_rpc_url.clone(),
        settings.rpc_auth(),
        settings.rpc_timeout(),
        RetryPolicy::default(),
    ));

    let orchestrator = Arc::new(Orchestrator::new(
        client,
        state,
        SyncConfig {
            window: settings.sync_window,
            idle_timeout: Duration::from_secs(30),
            reorg_search_depth: 2_000,
        },
    ));

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("received shutdown signal");
            cancel.cancel();
        }
    });

    orchestrator.run(cancel).await?;
    Ok(())
}
