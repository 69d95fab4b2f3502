use accounting_service::{
    AccountBalanceSummary, AccountType, EntryDraft, JournalEntry, LedgerRunningEntry,
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Serialize;

use super::{parse_query, PeriodQuery};
use crate::error::{api_list, api_success, ApiError, ApiResponse, ApiResult};
use crate::server::LedgerServer;

/// One chart row in pre-order
#[derive(Debug, Serialize)]
pub struct ChartRow {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub is_synthetic: bool,
    pub is_active: bool,
    pub depth: usize,
}

pub async fn list_accounts(State(server): State<LedgerServer>) -> ApiResult<Vec<ChartRow>> {
    let chart = server.service.chart().await?;
    let rows = chart
        .walk()
        .into_iter()
        .map(|(depth, account)| ChartRow {
            code: account.code.clone(),
            name: account.name.clone(),
            account_type: account.account_type,
            is_synthetic: account.is_synthetic,
            is_active: account.is_active,
            depth,
        })
        .collect();
    Ok(api_list(rows))
}

/// `POST /journal-entries`
///
/// 201 with the stored entry. A rejected draft writes nothing.
pub async fn submit_entry(
    State(server): State<LedgerServer>,
    body: Result<Json<EntryDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<JournalEntry>>), ApiError> {
    let Json(draft) = body.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let entry = server.service.submit_journal_entry(draft).await?;
    Ok((StatusCode::CREATED, api_success(entry)))
}

pub async fn account_balance(
    State(server): State<LedgerServer>,
    Path(code): Path<String>,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> ApiResult<AccountBalanceSummary> {
    let period = parse_query(query)?;
    let summary = server
        .service
        .get_account_balance(&code, period.start, period.end)
        .await?;
    Ok(api_success(summary))
}

pub async fn ledger_detail(
    State(server): State<LedgerServer>,
    Path(code): Path<String>,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> ApiResult<Vec<LedgerRunningEntry>> {
    let period = parse_query(query)?;
    let lines = server
        .service
        .get_ledger_detail(&code, period.start, period.end)
        .await?;
    Ok(api_list(lines))
}
