use accounting_service::{AgingReport, ObligationKind, ObligationReport};
use axum::extract::{rejection::QueryRejection, Path, Query, State};
use chrono::NaiveDate;
use serde::Deserialize;

use super::{parse_query, PeriodQuery};
use crate::error::{api_success, ApiError, ApiResult};
use crate::server::LedgerServer;

#[derive(Debug, Deserialize)]
pub struct AgingQuery {
    /// Defaults to today (UTC)
    pub as_of: Option<NaiveDate>,
}

pub async fn payables(
    State(server): State<LedgerServer>,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> ApiResult<ObligationReport> {
    let period = parse_query(query)?;
    let report = server.service.get_payables(period.start, period.end).await?;
    Ok(api_success(report))
}

pub async fn receivables(
    State(server): State<LedgerServer>,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> ApiResult<ObligationReport> {
    let period = parse_query(query)?;
    let report = server.service.get_receivables(period.start, period.end).await?;
    Ok(api_success(report))
}

/// `GET /aging/:kind` where kind is `payables` or `receivables`
pub async fn aging(
    State(server): State<LedgerServer>,
    Path(kind): Path<String>,
    query: Result<Query<AgingQuery>, QueryRejection>,
) -> ApiResult<AgingReport> {
    let kind: ObligationKind = kind.parse().map_err(ApiError::BadRequest)?;
    let as_of = parse_query(query)?
        .as_of
        .unwrap_or_else(|| chrono::Utc::now().date_naive());
    let report = server.service.get_aging(kind, as_of).await?;
    Ok(api_success(report))
}
