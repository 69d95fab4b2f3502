// Accounting service facade
use chrono::NaiveDate;
use config_engine::LedgerConfig;
use logger_redacted::PiiRedactor;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::BalanceCache;
use crate::chart::ChartOfAccounts;
use crate::error::{report_for_entry, AccountingResult};
use crate::integrity::{self, IntegrityReport};
use crate::ledger::GeneralLedger;
use crate::models::*;
use crate::obligations::ObligationsDeriver;
use crate::reporting::{self, AgingReport, TrialBalance};
use crate::store::{EntryFilter, LedgerBackend};
use crate::validator::JournalValidator;

/// Settings the service reads from [`LedgerConfig`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    pub payables_prefixes: Vec<String>,
    pub receivables_prefixes: Vec<String>,
    pub aging_bounds: Vec<u32>,
}

impl From<&LedgerConfig> for ServiceSettings {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            payables_prefixes: config.obligations.payables_prefixes.clone(),
            receivables_prefixes: config.obligations.receivables_prefixes.clone(),
            aging_bounds: config.aging.bucket_days.clone(),
        }
    }
}

impl ServiceSettings {
    fn prefixes(&self, kind: ObligationKind) -> &[String] {
        match kind {
            ObligationKind::Payable => &self.payables_prefixes,
            ObligationKind::Receivable => &self.receivables_prefixes,
        }
    }
}

/// Entry point for every ledger operation.
///
/// The chart is rebuilt from the [`ChartSource`](crate::store::ChartSource)
/// on each call; reads are recomputed from the store unless the optional
/// balance cache holds the exact `(scope, period)`.
pub struct AccountingService {
    store: Arc<dyn LedgerBackend>,
    settings: ServiceSettings,
    cache: Option<BalanceCache>,
    redactor: PiiRedactor,
    write_lock: Mutex<()>,
}

impl AccountingService {
    pub fn new(store: Arc<dyn LedgerBackend>, config: &LedgerConfig) -> Self {
        Self {
            store,
            settings: ServiceSettings::from(config),
            cache: BalanceCache::from_settings(&config.cache),
            redactor: PiiRedactor::from_logger_config(&config.logging),
            write_lock: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn cache(&self) -> Option<&BalanceCache> {
        self.cache.as_ref()
    }

    /// # Errors
    ///
    /// Store failures and [`StructuralError`](crate::error::StructuralError)s
    /// in the stored chart.
    pub async fn chart(&self) -> AccountingResult<ChartOfAccounts> {
        let accounts = self.store.load_accounts().await?;
        Ok(ChartOfAccounts::build(accounts)?)
    }

    /// Validate a draft and append it.
    ///
    /// A draft carrying a `reference` that was already posted with the same
    /// entry type returns the stored entry without writing.
    ///
    /// # Errors
    ///
    /// [`ValidationError`](crate::error::ValidationError) when the draft is
    /// rejected (nothing is written) or a store failure.
    pub async fn submit_journal_entry(&self, draft: EntryDraft) -> AccountingResult<JournalEntry> {
        let _guard = self.write_lock.lock().await;

        if let Some(reference) = &draft.reference {
            if let Some(existing) = self
                .store
                .find_by_reference(reference, draft.entry_type)
                .await?
            {
                info!(
                    entry_id = %existing.id,
                    reference_kind = %reference.kind,
                    reference_id = %reference.id,
                    "Entry already posted for reference; returning existing entry"
                );
                return Ok(existing);
            }
        }

        let chart = self.chart().await?;
        let entry = JournalValidator::new(&chart).validate(draft).map_err(|err| {
            warn!(error = %err, "Journal entry rejected");
            err
        })?;

        let entry_id = entry.id;
        let stored = self.store.append(entry).await.map_err(|err| {
            let report = report_for_entry(&err, entry_id);
            warn!(
                error_id = %report.error_id,
                error_code = %report.code,
                entry_id = %entry_id,
                "Ledger store rejected entry"
            );
            err
        })?;

        if let Some(cache) = &self.cache {
            cache.invalidate_for(&stored);
        }

        info!(
            entry_id = %stored.id,
            sequence = stored.sequence,
            entry_type = %stored.entry_type,
            total = stored.total_debit.minor_units(),
            "Journal entry posted"
        );
        Ok(stored)
    }

    /// # Errors
    ///
    /// Invalid period, unknown account, empty synthetic scope or store failure.
    pub async fn get_account_balance(
        &self,
        account_code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AccountingResult<AccountBalanceSummary> {
        let period = DateRange::new(start, end)?;

        if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(account_code, &period)) {
            debug!(account_code, "Balance served from cache");
            return Ok(cached);
        }
        let generation = self.cache.as_ref().map(BalanceCache::generation);

        let chart = self.chart().await?;
        chart.require(account_code)?;
        let entries = self
            .store
            .fetch_entries(&EntryFilter::new().within(period).under(account_code))
            .await?;
        let summary = GeneralLedger::new(&chart).balance(account_code, &period, &entries)?;

        if !summary.unbalanced_entries.is_empty() {
            warn!(
                account_code,
                unbalanced = summary.unbalanced_entries.len(),
                "Balance includes unbalanced legacy entries"
            );
        }
        if let (Some(cache), Some(generation)) = (&self.cache, generation) {
            cache.insert_if_current(summary.clone(), generation);
        }
        Ok(summary)
    }

    /// # Errors
    ///
    /// Invalid period, unknown account, empty synthetic scope or store failure.
    pub async fn get_ledger_detail(
        &self,
        account_code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AccountingResult<Vec<LedgerRunningEntry>> {
        let period = DateRange::new(start, end)?;
        let chart = self.chart().await?;
        chart.require(account_code)?;
        let entries = self
            .store
            .fetch_entries(&EntryFilter::new().within(period).under(account_code))
            .await?;
        GeneralLedger::new(&chart).detail(account_code, &period, &entries)
    }

    /// # Errors
    ///
    /// Invalid period or store failure.
    pub async fn get_payables(&self, start: NaiveDate, end: NaiveDate) -> AccountingResult<ObligationReport> {
        self.get_obligations(ObligationKind::Payable, DateRange::new(start, end)?)
            .await
    }

    /// # Errors
    ///
    /// Invalid period or store failure.
    pub async fn get_receivables(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AccountingResult<ObligationReport> {
        self.get_obligations(ObligationKind::Receivable, DateRange::new(start, end)?)
            .await
    }

    /// # Errors
    ///
    /// Store failure or an inconsistent chart.
    pub async fn get_obligations(
        &self,
        kind: ObligationKind,
        period: DateRange,
    ) -> AccountingResult<ObligationReport> {
        let prefixes = self.settings.prefixes(kind);
        let chart = self.chart().await?;
        let entries = self
            .store
            .fetch_entries(
                &EntryFilter::new()
                    .within(DateRange::up_to(period.end))
                    .under_any(prefixes),
            )
            .await?;

        let report = ObligationsDeriver::new(&chart, &self.redactor)
            .derive(kind, prefixes, &period, &entries);

        if !report.unmatched_settlements.is_empty() {
            warn!(
                kind = kind.as_str(),
                unmatched = report.unmatched_settlements.len(),
                "Obligation report has unmatched settlements"
            );
        }
        Ok(report)
    }

    /// # Errors
    ///
    /// Invalid period, store failure or an inconsistent chart.
    pub async fn get_trial_balance(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        include_empty: bool,
    ) -> AccountingResult<TrialBalance> {
        let period = DateRange::new(start, end)?;
        let chart = self.chart().await?;
        let entries = self
            .store
            .fetch_entries(&EntryFilter::new().within(DateRange::up_to(end)))
            .await?;
        let report = reporting::trial_balance(&chart, &period, &entries, include_empty);
        if !report.balanced {
            warn!(
                debit = report.totals.period_debit.minor_units(),
                credit = report.totals.period_credit.minor_units(),
                "Trial balance movement does not balance"
            );
        }
        Ok(report)
    }

    /// # Errors
    ///
    /// Store failure or an inconsistent chart.
    pub async fn get_aging(&self, kind: ObligationKind, as_of: NaiveDate) -> AccountingResult<AgingReport> {
        let obligations = self.get_obligations(kind, DateRange::up_to(as_of)).await?;
        Ok(reporting::aging(&obligations, as_of, &self.settings.aging_bounds))
    }

    /// # Errors
    ///
    /// Store failure or an inconsistent chart.
    pub async fn audit_integrity(&self) -> AccountingResult<IntegrityReport> {
        let chart = self.chart().await?;
        let entries = self.store.fetch_entries(&EntryFilter::new()).await?;
        Ok(integrity::audit(&chart, &entries))
    }
}
