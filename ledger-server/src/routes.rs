use axum::{
    routing::{get, post},
    Router,
};

use crate::{
    handlers::{health, ledger, obligations, reports},
    server::LedgerServer,
};

/// Create health check routes
pub fn health_routes() -> Router<LedgerServer> {
    Router::new().route("/health", get(health::health_check))
}

/// Chart, postings and per-account reads
pub fn ledger_routes() -> Router<LedgerServer> {
    Router::new()
        .route("/accounts", get(ledger::list_accounts))
        .route("/accounts/:code/balance", get(ledger::account_balance))
        .route("/accounts/:code/ledger", get(ledger::ledger_detail))
        .route("/journal-entries", post(ledger::submit_entry))
}

/// Payables and receivables derived from provisions and settlements
pub fn obligation_routes() -> Router<LedgerServer> {
    Router::new()
        .route("/payables", get(obligations::payables))
        .route("/receivables", get(obligations::receivables))
        .route("/aging/:kind", get(obligations::aging))
}

pub fn report_routes() -> Router<LedgerServer> {
    Router::new()
        .route("/trial-balance", get(reports::trial_balance))
        .route("/integrity", get(reports::integrity))
}

fn api_v1_routes() -> Router<LedgerServer> {
    Router::new()
        .merge(ledger_routes())
        .merge(obligation_routes())
        .merge(report_routes())
}

/// Create all application routes
pub fn create_routes() -> Router<LedgerServer> {
    Router::new()
        .merge(health_routes())
        .nest("/api/v1", api_v1_routes())
}
