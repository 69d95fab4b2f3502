use axum::{extract::State, response::Json};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

use crate::server::LedgerServer;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub uptime: u64,
    pub checks: BTreeMap<String, String>,
}

/// Reports `degraded` when the chart cannot be loaded from the store
pub async fn health_check(State(server): State<LedgerServer>) -> Json<HealthResponse> {
    let mut checks = BTreeMap::new();
    checks.insert("store".to_string(), server.backend.to_string());

    let healthy = match server.service.chart().await {
        Ok(chart) => {
            checks.insert("chart".to_string(), format!("{} accounts", chart.len()));
            true
        }
        Err(err) => {
            warn!(error = %err, "Health check could not load the chart");
            checks.insert("chart".to_string(), err.to_string());
            false
        }
    };

    Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: server.uptime_seconds(),
        checks,
    })
}
