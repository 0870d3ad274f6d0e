//! API server wiring: shared state, router, startup.

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use super::handlers;
use crate::config::NodeConfig;
use crate::crypto::NodeKeypair;
use crate::ledger::LedgerClient;
use crate::storage::RecordStore;

/// Dependencies injected into every handler.
///
/// All members are read-only after startup; there are no process-wide
/// singletons.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub ledger: Arc<LedgerClient>,
    pub keypair: Arc<NodeKeypair>,
    /// Width of the concurrent enrichment buffer during listing.
    pub enrichment_concurrency: usize,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::status::root))
        .route("/health", get(handlers::status::health))
        .route("/create_transaction", post(handlers::records::create_transaction))
        .route("/update_transaction/:id", put(handlers::records::update_transaction))
        .route("/delete_transaction/:id", delete(handlers::records::delete_transaction))
        .route("/transactions", get(handlers::listing::list_transactions))
        .layer(cors)
        .with_state(state)
}

/// Bind the listener and serve until shutdown.
pub async fn serve(config: &NodeConfig, state: AppState) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    log::info!("API server listening on {}", config.listen_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
