//! Double-entry general ledger for an accounting-firm back office
//!
//! Turns an append-only set of journal entries over a hierarchical chart of
//! accounts into per-account balances (with roll-ups through synthetic
//! accounts) and into payables/receivables derived from the ledger itself.
//!
//! - [`chart`]: chart-of-accounts tree built from dotted codes
//! - [`validator`]: accept-or-reject gate in front of every write
//! - [`store`]: append-only persistence (in-memory and PostgreSQL)
//! - [`ledger`]: balances and running-balance statements
//! - [`obligations`]: provisions matched against settlements
//! - [`reporting`]: trial balance and aging
//! - [`integrity`]: audit of stored history
//! - [`service`]: the facade the HTTP layer calls
//!
//! Amounts are integer centavos ([`Money`]).
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use accounting_service::{
//!     Account, AccountType, AccountingService, DraftLine, EntryDraft, EntryType,
//!     InMemoryLedgerStore, Money,
//! };
//! use chrono::NaiveDate;
//! use config_engine::LedgerConfig;
//!
//! # async fn run() -> accounting_service::AccountingResult<()> {
//! let store = Arc::new(InMemoryLedgerStore::new(vec![
//!     Account::synthetic("1", "Ativo", AccountType::Asset),
//!     Account::analytic("1.1", "Caixa", AccountType::Asset),
//!     Account::synthetic("3", "Patrimonio Liquido", AccountType::Equity),
//!     Account::analytic("3.1", "Capital Social", AccountType::Equity),
//! ]));
//! let service = AccountingService::new(store, &LedgerConfig::default());
//!
//! let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap_or_default();
//! service
//!     .submit_journal_entry(
//!         EntryDraft::new(date, "Integralizacao de capital", EntryType::OpeningBalance)
//!             .with_line(DraftLine::debit("1.1", Money::parse_brl("R$ 500,00")?))
//!             .with_line(DraftLine::credit("3.1", Money::parse_brl("R$ 500,00")?)),
//!     )
//!     .await?;
//!
//! let cash = service.get_account_balance("1", date, date).await?;
//! assert_eq!(cash.balance, Money::from_minor(50_000));
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod chart;
pub mod error;
pub mod integrity;
pub mod ledger;
pub mod models;
pub mod money;
pub mod obligations;
pub mod reporting;
pub mod service;
pub mod store;
pub mod validator;

pub use cache::BalanceCache;
pub use chart::ChartOfAccounts;
pub use error::*;
pub use integrity::IntegrityReport;
pub use ledger::GeneralLedger;
pub use models::*;
pub use money::{Money, MoneyError};
pub use obligations::ObligationsDeriver;
pub use reporting::{AgingReport, TrialBalance};
pub use service::{AccountingService, ServiceSettings};
pub use store::{
    ChartSource, EntryFilter, InMemoryLedgerStore, LedgerBackend, LedgerStore,
    PostgresLedgerStore,
};
pub use validator::JournalValidator;
