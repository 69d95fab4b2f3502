// Accounting error types
use chrono::NaiveDate;
use error_common::{codes, ErrorContext, ErrorKind, ErrorReport, Reportable};
use thiserror::Error;
use uuid::Uuid;

use crate::models::EntryType;
use crate::money::{Money, MoneyError};

/// Write-path rejections; nothing is persisted when one is returned
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Journal entry has no lines")]
    EmptyEntry,

    #[error("Journal entry description is required")]
    MissingDescription,

    #[error("Line {index}: {reason}")]
    InvalidLine { index: usize, reason: String },

    #[error("Line {index} references unknown account {account_code}")]
    UnknownAccount { index: usize, account_code: String },

    #[error("Line {index} references synthetic account {account_code}; post to an analytic account")]
    SyntheticAccount { index: usize, account_code: String },

    #[error("Line {index} references inactive account {account_code}")]
    InactiveAccount { index: usize, account_code: String },

    #[error(
        "Journal entry is unbalanced: debits {total_debit}, credits {total_credit}, delta {}",
        delta.minor_units()
    )]
    Unbalanced {
        total_debit: Money,
        total_credit: Money,
        delta: Money,
    },

    #[error("Entry totals exceed the supported range")]
    AmountOverflow,

    #[error("Only settlement or provision entries may name a provision (got {entry_type})")]
    UnexpectedSettlementLink { entry_type: EntryType },

    #[error("Invalid period: start {start} is after end {end}")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] MoneyError),
}

/// Chart-of-accounts inconsistencies
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("Account code {code} is declared more than once")]
    CodeCollision { code: String },

    #[error("Account code '{code}' is not a dot-segmented code")]
    InvalidCode { code: String },

    #[error("Account {code} has no parent account {parent}")]
    OrphanedAccount { code: String, parent: String },

    #[error("Account {code} sits under analytic account {parent}; parents must be synthetic")]
    ParentNotSynthetic { code: String, parent: String },

    #[error("Account {code} has type {child_type} but its parent {parent} is {parent_type}")]
    TypeMismatch {
        code: String,
        child_type: &'static str,
        parent: String,
        parent_type: &'static str,
    },

    #[error("Synthetic account {code} has no analytic descendants")]
    EmptySynthetic { code: String },
}

#[derive(Error, Debug)]
pub enum AccountingError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Chart of accounts error: {0}")]
    Structural(#[from] StructuralError),

    #[error("Account not found: {account_code}")]
    NotFound { account_code: String },

    #[error("Ledger store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AccountingError {
    pub fn not_found(account_code: impl Into<String>) -> Self {
        AccountingError::NotFound {
            account_code: account_code.into(),
        }
    }
}

impl From<MoneyError> for AccountingError {
    fn from(err: MoneyError) -> Self {
        AccountingError::Validation(ValidationError::InvalidAmount(err))
    }
}

impl From<config_engine::ConfigError> for AccountingError {
    fn from(err: config_engine::ConfigError) -> Self {
        AccountingError::Config(err.to_string())
    }
}

pub type AccountingResult<T> = Result<T, AccountingError>;

impl ValidationError {
    fn code(&self) -> &'static str {
        match self {
            ValidationError::EmptyEntry => codes::validation::EMPTY_ENTRY,
            ValidationError::MissingDescription => codes::validation::MISSING_DESCRIPTION,
            ValidationError::InvalidLine { .. } | ValidationError::UnexpectedSettlementLink { .. } => {
                codes::validation::INVALID_LINE
            }
            ValidationError::UnknownAccount { .. } => codes::validation::UNKNOWN_ACCOUNT,
            ValidationError::SyntheticAccount { .. } => codes::validation::SYNTHETIC_ACCOUNT,
            ValidationError::InactiveAccount { .. } => codes::validation::INACTIVE_ACCOUNT,
            ValidationError::Unbalanced { .. } => codes::validation::UNBALANCED_ENTRY,
            ValidationError::AmountOverflow => codes::validation::AMOUNT_OVERFLOW,
            ValidationError::InvalidPeriod { .. } => codes::validation::INVALID_PERIOD,
            ValidationError::InvalidAmount(_) => codes::validation::INVALID_AMOUNT,
        }
    }

    fn context(&self) -> ErrorContext {
        match self {
            ValidationError::InvalidLine { index, .. } => {
                ErrorContext::new().add_context("line", index.to_string())
            }
            ValidationError::UnknownAccount { index, account_code }
            | ValidationError::SyntheticAccount { index, account_code }
            | ValidationError::InactiveAccount { index, account_code } => ErrorContext::new()
                .with_account_code(account_code.clone())
                .add_context("line", index.to_string()),
            ValidationError::Unbalanced {
                total_debit,
                total_credit,
                delta,
            } => ErrorContext::new()
                .with_delta(delta.minor_units())
                .add_context("total_debit", total_debit.minor_units().to_string())
                .add_context("total_credit", total_credit.minor_units().to_string()),
            ValidationError::InvalidPeriod { start, end } => ErrorContext::new()
                .add_context("start", start.to_string())
                .add_context("end", end.to_string()),
            _ => ErrorContext::new(),
        }
    }
}

impl Reportable for ValidationError {
    fn report(&self) -> ErrorReport {
        ErrorReport::new(ErrorKind::Validation, self.code(), self.to_string())
            .with_context(self.context())
    }
}

impl Reportable for StructuralError {
    fn report(&self) -> ErrorReport {
        let (code, account) = match self {
            StructuralError::CodeCollision { code } => (codes::structural::CODE_COLLISION, code),
            StructuralError::InvalidCode { code } => (codes::structural::INVALID_CODE, code),
            StructuralError::OrphanedAccount { code, .. } => {
                (codes::structural::ORPHANED_ACCOUNT, code)
            }
            StructuralError::ParentNotSynthetic { code, .. } => {
                (codes::structural::PARENT_NOT_SYNTHETIC, code)
            }
            StructuralError::TypeMismatch { code, .. } => (codes::structural::TYPE_MISMATCH, code),
            StructuralError::EmptySynthetic { code } => (codes::structural::EMPTY_SYNTHETIC, code),
        };
        ErrorReport::new(ErrorKind::Structural, code, self.to_string())
            .with_context(ErrorContext::new().with_account_code(account.clone()))
    }
}

impl Reportable for AccountingError {
    fn report(&self) -> ErrorReport {
        match self {
            AccountingError::Validation(err) => err.report(),
            AccountingError::Structural(err) => err.report(),
            AccountingError::NotFound { account_code } => ErrorReport::new(
                ErrorKind::NotFound,
                codes::lookup::UNKNOWN_ACCOUNT_CODE,
                self.to_string(),
            )
            .with_context(ErrorContext::new().with_account_code(account_code.clone())),
            AccountingError::Store(_) => ErrorReport::new(
                ErrorKind::Storage,
                codes::storage::STORE_FAILURE,
                self.to_string(),
            ),
            AccountingError::Config(_) => ErrorReport::new(
                ErrorKind::Configuration,
                codes::configuration::INVALID_CONFIGURATION,
                self.to_string(),
            ),
        }
    }
}

/// Attach the entry id to a report about that entry
pub fn report_for_entry(err: &AccountingError, entry_id: Uuid) -> ErrorReport {
    let mut report = err.report();
    report.context.entry_id = Some(entry_id.to_string());
    report
}
