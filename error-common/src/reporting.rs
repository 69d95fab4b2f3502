// Error reporting utilities
// Emits reports to the tracing pipeline with their correlation id.

use crate::types::{ErrorKind, ErrorReport};

pub struct ErrorReporter;

impl ErrorReporter {
    pub fn new() -> Self {
        Self
    }

    /// Log a report. Client-side mistakes go out at `warn`, everything else at `error`.
    pub fn report_error(&self, report: &ErrorReport) {
        match report.error_type {
            ErrorKind::Validation | ErrorKind::NotFound => tracing::warn!(
                error_id = %report.error_id,
                error_type = %report.error_type,
                error_code = %report.code,
                entry_id = report.context.entry_id.as_deref(),
                account_code = report.context.account_code.as_deref(),
                delta = report.context.delta,
                "Error reported: {}",
                report.message
            ),
            _ => tracing::error!(
                error_id = %report.error_id,
                error_type = %report.error_type,
                error_code = %report.code,
                entry_id = report.context.entry_id.as_deref(),
                account_code = report.context.account_code.as_deref(),
                delta = report.context.delta,
                "Error reported: {}",
                report.message
            ),
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
