//! Logging setup for the ledger engine with redaction of counterparty identifiers
//!
//! Counterparty labels in an accounting-firm ledger routinely carry CPF/CNPJ
//! tax ids, e-mail addresses and phone numbers. The matching audit trail logs
//! those labels, so they go through [`PiiRedactor`] first.
//!
//! # Detected Data Types
//!
//! - **CNPJ**: 12.345.678/0001-90 → **.***.***/****-**
//! - **CPF**: 123.456.789-09 → ***.***.***-**
//! - **Email Addresses**: joao@example.com → j***@e***
//! - **Phone Numbers**: (62) 98765-4321 → (**) *****-****
//!
//! With `hash_for_correlation` the mask is replaced by a short SHA-256 tag
//! (`CPF[q1w2e3r4t5y6]`) so the same counterparty can be followed across lines.
//!
//! # Example
//!
//! ```rust,no_run
//! use logger_redacted::{init_logging, LoggerConfig, PiiRedactor};
//!
//! let config = LoggerConfig::default();
//! let _guard = init_logging(&config).expect("logging");
//! let redactor = PiiRedactor::from_logger_config(&config);
//! tracing::info!(counterparty = %redactor.redact("ACME 12.345.678/0001-90"), "settlement matched");
//! ```

pub mod config;
pub mod error;
pub mod redactor;

pub use config::*;
pub use error::*;
pub use redactor::*;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `config.log_level`. The returned guard flushes the
/// non-blocking writer on drop and must be held for the life of the process.
///
/// # Errors
///
/// Fails when the configured filter directive does not parse or a global
/// subscriber is already installed.
pub fn init_logging(config: &LoggerConfig) -> LoggingResult<WorkerGuard> {
    let filter = build_filter(&config.log_level)?;
    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());

    let installed = if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(JsonStorageLayer)
            .with(BunyanFormattingLayer::new(config.service_name.clone(), writer))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(writer))
            .try_init()
    };

    installed.map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;
    Ok(guard)
}

fn build_filter(default_directive: &str) -> LoggingResult<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(default_directive).map_err(|e| LoggingError::InvalidFilter {
        directive: default_directive.to_string(),
        reason: e.to_string(),
    })
}
