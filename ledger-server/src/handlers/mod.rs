pub mod health;
pub mod ledger;
pub mod obligations;
pub mod reports;

use axum::extract::{rejection::QueryRejection, Query};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::ApiError;

/// `?start=YYYY-MM-DD&end=YYYY-MM-DD`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PeriodQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Unwrap a query extractor, turning axum's rejection into a structured 400
pub(crate) fn parse_query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(inner)| inner)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}
