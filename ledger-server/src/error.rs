use accounting_service::AccountingError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use error_common::{codes, ErrorKind, ErrorReport, ErrorReporter, Reportable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(flatten)]
    pub report: ErrorReport,
    /// Suggested actions for resolving the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

/// Standard API success response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<usize>,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Accounting(#[from] AccountingError),

    /// Query or body the handlers could not interpret
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Accounting(err) => match err {
                AccountingError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                AccountingError::Structural(_) => StatusCode::CONFLICT,
                AccountingError::NotFound { .. } => StatusCode::NOT_FOUND,
                AccountingError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
                AccountingError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn suggestions(&self) -> Option<Vec<String>> {
        let hints: &[&str] = match self {
            ApiError::Accounting(AccountingError::Validation(_)) => &[
                "Check that total debits equal total credits",
                "Post only to active analytic accounts",
            ],
            ApiError::Accounting(AccountingError::Structural(_)) => {
                &["Review the chart of accounts hierarchy"]
            }
            ApiError::Accounting(AccountingError::NotFound { .. }) => {
                &["Verify the account code exists in the chart of accounts"]
            }
            ApiError::BadRequest(_) => &["Dates use YYYY-MM-DD; amounts are integer centavos"],
            _ => return None,
        };
        Some(hints.iter().map(|h| (*h).to_string()).collect())
    }
}

impl Reportable for ApiError {
    fn report(&self) -> ErrorReport {
        match self {
            ApiError::Accounting(err) => err.report(),
            ApiError::BadRequest(_) => ErrorReport::new(
                ErrorKind::Validation,
                codes::validation::MALFORMED_REQUEST,
                self.to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let report = self.report();

        ErrorReporter::new().report_error(&report);
        tracing::debug!(
            error_id = %report.error_id,
            status_code = status_code.as_u16(),
            "API error response"
        );

        let body = ApiErrorResponse {
            report,
            suggestions: self.suggestions(),
        };
        (status_code, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Helper function to create successful API responses
pub fn api_success<T>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
        metadata: None,
    })
}

/// Successful response for list payloads, carrying the item count
pub fn api_list<T>(data: Vec<T>) -> Json<ApiResponse<Vec<T>>> {
    let total_count = Some(data.len());
    Json(ApiResponse {
        success: true,
        data,
        metadata: Some(ResponseMetadata { total_count }),
    })
}
