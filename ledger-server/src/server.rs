use accounting_service::{
    Account, AccountingService, InMemoryLedgerStore, LedgerBackend, PostgresLedgerStore,
};
use anyhow::{Context, Result};
use config_engine::LedgerConfig;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Shared HTTP state
#[derive(Clone)]
pub struct LedgerServer {
    /// Effective configuration
    pub config: Arc<LedgerConfig>,
    pub service: Arc<AccountingService>,
    /// Which store backs the service ("postgres" or "memory")
    pub backend: &'static str,
    pub started_at: Instant,
}

impl LedgerServer {
    /// Wrap an already-built store
    pub fn with_store(store: Arc<dyn LedgerBackend>, config: LedgerConfig, backend: &'static str) -> Self {
        let service = Arc::new(AccountingService::new(store, &config));
        Self {
            config: Arc::new(config),
            service,
            backend,
            started_at: Instant::now(),
        }
    }

    /// Build the store the configuration asks for.
    ///
    /// With `database.url` set the Postgres store is connected, its schema
    /// bootstrapped and `seed` upserted into the chart; otherwise an in-memory
    /// store holds `seed` as its chart.
    ///
    /// # Errors
    ///
    /// Connection, schema or seeding failures against Postgres.
    pub async fn from_config(config: LedgerConfig, seed: Vec<Account>) -> Result<Self> {
        match config.database.url.clone() {
            Some(url) => {
                let store = PostgresLedgerStore::connect(&url, config.database.max_connections)
                    .await
                    .context("connecting to the ledger database")?;
                store.migrate().await.context("bootstrapping the ledger schema")?;
                if !seed.is_empty() {
                    store
                        .upsert_accounts(&seed)
                        .await
                        .context("seeding the chart of accounts")?;
                }
                info!(accounts = seed.len(), "Using PostgreSQL ledger store");
                Ok(Self::with_store(Arc::new(store), config, "postgres"))
            }
            None => {
                info!(accounts = seed.len(), "Using in-memory ledger store");
                Ok(Self::with_store(
                    Arc::new(InMemoryLedgerStore::new(seed)),
                    config,
                    "memory",
                ))
            }
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Read a chart of accounts from a JSON array of accounts
///
/// # Errors
///
/// The file is unreadable or not a JSON array of accounts.
pub fn load_chart_file(path: &Path) -> Result<Vec<Account>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading chart file {}", path.display()))?;
    let accounts: Vec<Account> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing chart file {}", path.display()))?;
    Ok(accounts)
}
