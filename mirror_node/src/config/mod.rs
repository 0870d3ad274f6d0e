//! Node configuration loaded at startup from file and environment.

use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Process-wide configuration for the mirror node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Socket address the API server binds to
    pub listen_addr: String,
    /// Path to the SQLite database file holding mirrored records
    pub database_path: String,
    /// Base URL of the ledger node HTTP API
    pub ledger_api_url: String,
    /// Seed string the signing keypair is derived from. When absent, a
    /// random seed is generated at startup and logged.
    #[serde(default)]
    pub signing_seed: Option<String>,
    /// Timeout applied to every ledger HTTP call, in seconds
    pub ledger_timeout_secs: u64,
    /// Maximum number of concurrent ledger lookups while listing
    pub enrichment_concurrency: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            database_path: "data/records.db".to_string(),
            ledger_api_url: "http://localhost:9984".to_string(),
            signing_seed: None,
            ledger_timeout_secs: 30,
            enrichment_concurrency: 16,
        }
    }
}

impl NodeConfig {
    /// Load configuration from an optional `config.toml` in the working
    /// directory, overridden by `CHAINMIRROR_`-prefixed environment
    /// variables (e.g. `CHAINMIRROR_LEDGER_API_URL`).
    pub fn load() -> Result<Self> {
        let defaults = NodeConfig::default();
        let cfg = Config::builder()
            .set_default("listen_addr", defaults.listen_addr)?
            .set_default("database_path", defaults.database_path)?
            .set_default("ledger_api_url", defaults.ledger_api_url)?
            .set_default("ledger_timeout_secs", defaults.ledger_timeout_secs as i64)?
            .set_default("enrichment_concurrency", defaults.enrichment_concurrency as i64)?
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("CHAINMIRROR"))
            .build()?;
        Ok(cfg.try_deserialize()?)
    }
}
