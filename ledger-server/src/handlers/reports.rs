use accounting_service::{IntegrityReport, TrialBalance};
use axum::extract::{rejection::QueryRejection, Query, State};
use chrono::NaiveDate;
use serde::Deserialize;

use super::parse_query;
use crate::error::{api_success, ApiResult};
use crate::server::LedgerServer;

#[derive(Debug, Deserialize)]
pub struct TrialBalanceQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Also list accounts without opening balance or movement
    #[serde(default)]
    pub include_empty: bool,
}

pub async fn trial_balance(
    State(server): State<LedgerServer>,
    query: Result<Query<TrialBalanceQuery>, QueryRejection>,
) -> ApiResult<TrialBalance> {
    let query = parse_query(query)?;
    let report = server
        .service
        .get_trial_balance(query.start, query.end, query.include_empty)
        .await?;
    Ok(api_success(report))
}

pub async fn integrity(State(server): State<LedgerServer>) -> ApiResult<IntegrityReport> {
    Ok(api_success(server.service.audit_integrity().await?))
}
