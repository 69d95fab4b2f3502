//! Ledger Server - HTTP API over the accounting engine
//!
//! Exposes balances, ledger statements, journal entry submission, derived
//! payables/receivables and the trial balance, aging and integrity reports.
//! Every route except `/health` lives under `/api/v1`.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use error::*;
pub use server::LedgerServer;

use axum::{middleware::from_fn, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the main application router with all routes and middleware
pub fn create_app(server: LedgerServer) -> Router {
    routes::create_routes()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::create_cors_layer())
                .layer(from_fn(middleware::request_id_middleware))
                .layer(from_fn(middleware::request_timing_middleware)),
        )
        .with_state(server)
}
