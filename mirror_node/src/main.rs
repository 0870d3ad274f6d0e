//! ChainMirror node entry point.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use mirror_node::api::server::{self, AppState};
use mirror_node::config::NodeConfig;
use mirror_node::crypto::NodeKeypair;
use mirror_node::ledger::LedgerClient;
use mirror_node::storage::RecordStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = NodeConfig::load().context("failed to load configuration")?;

    let keypair = match &config.signing_seed {
        Some(seed) => NodeKeypair::from_seed(seed),
        None => {
            let (keypair, seed) = NodeKeypair::generate();
            log::warn!(
                "no signing seed configured; generated seed {seed} - pin it in configuration to keep a stable ledger identity"
            );
            keypair
        }
    };
    log::info!("ledger owner public key: {}", keypair.public_key_hex());

    let store = RecordStore::open(&config.database_path)
        .with_context(|| format!("failed to open record store at {}", config.database_path))?;
    let ledger = LedgerClient::new(
        config.ledger_api_url.clone(),
        Duration::from_secs(config.ledger_timeout_secs),
    );
    log::info!("mirroring records to ledger node at {}", config.ledger_api_url);

    let state = AppState {
        store: Arc::new(store),
        ledger: Arc::new(ledger),
        keypair: Arc::new(keypair),
        enrichment_concurrency: config.enrichment_concurrency,
    };

    server::serve(&config, state).await
}
