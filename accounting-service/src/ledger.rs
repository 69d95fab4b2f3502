// General ledger aggregation
//
// Pure read-side computations over a chart and a slice of stored entries.
// Nothing here touches storage; callers fetch the entries and pass them in.
use std::collections::HashSet;
use uuid::Uuid;

use crate::chart::ChartOfAccounts;
use crate::error::AccountingResult;
use crate::models::*;
use crate::money::Money;

/// A single line together with its entry
#[derive(Debug, Clone, Copy)]
pub struct Posting<'e> {
    pub entry: &'e JournalEntry,
    pub line: &'e JournalLine,
}

pub struct GeneralLedger<'a> {
    chart: &'a ChartOfAccounts,
}

impl<'a> GeneralLedger<'a> {
    pub fn new(chart: &'a ChartOfAccounts) -> Self {
        Self { chart }
    }

    /// Lines on the analytic accounts under `scope`, dated in `period`,
    /// ordered by (date, insertion sequence, line order)
    ///
    /// # Errors
    ///
    /// Unknown scope or a synthetic scope with no analytic descendants.
    pub fn postings<'e>(
        &self,
        scope: &str,
        period: &DateRange,
        entries: &'e [JournalEntry],
    ) -> AccountingResult<Vec<Posting<'e>>> {
        let leaves: HashSet<&str> = self
            .chart
            .descendants(scope)?
            .into_iter()
            .map(|account| account.code.as_str())
            .collect();

        let mut dated: Vec<&JournalEntry> = entries
            .iter()
            .filter(|entry| period.contains(entry.date))
            .collect();
        dated.sort_by_key(|entry| (entry.date, entry.sequence));

        Ok(dated
            .into_iter()
            .flat_map(|entry| {
                entry
                    .lines
                    .iter()
                    .filter(|line| leaves.contains(line.account_code.as_str()))
                    .map(move |line| Posting { entry, line })
            })
            .collect())
    }

    /// Totals and signed balance of `scope` over `period`.
    ///
    /// A synthetic scope sums the lines of every analytic descendant once;
    /// the sign follows the scope account's type. Unbalanced legacy entries
    /// are counted and listed in `unbalanced_entries`.
    ///
    /// # Errors
    ///
    /// Unknown scope or a synthetic scope with no analytic descendants.
    pub fn balance(
        &self,
        scope: &str,
        period: &DateRange,
        entries: &[JournalEntry],
    ) -> AccountingResult<AccountBalanceSummary> {
        let account = self.chart.require(scope)?;
        let postings = self.postings(scope, period, entries)?;

        let total_debit: Money = postings.iter().map(|p| p.line.debit).sum();
        let total_credit: Money = postings.iter().map(|p| p.line.credit).sum();

        let mut seen = HashSet::new();
        let unbalanced_entries: Vec<Uuid> = postings
            .iter()
            .filter(|p| !p.entry.balanced && seen.insert(p.entry.id))
            .map(|p| p.entry.id)
            .collect();

        Ok(AccountBalanceSummary {
            account_code: account.code.clone(),
            account_name: account.name.clone(),
            account_type: account.account_type,
            is_synthetic: account.is_synthetic,
            period: *period,
            total_debit,
            total_credit,
            balance: account.account_type.signed_balance(total_debit, total_credit),
            movement_count: postings.len(),
            unbalanced_entries,
        })
    }

    /// Statement lines for `scope` with a running balance that starts at zero
    /// at the beginning of `period`.
    ///
    /// # Errors
    ///
    /// Unknown scope or a synthetic scope with no analytic descendants.
    pub fn detail(
        &self,
        scope: &str,
        period: &DateRange,
        entries: &[JournalEntry],
    ) -> AccountingResult<Vec<LedgerRunningEntry>> {
        let account_type = self.chart.require(scope)?.account_type;
        let postings = self.postings(scope, period, entries)?;

        let mut running = Money::ZERO;
        Ok(postings
            .into_iter()
            .map(|Posting { entry, line }| {
                running += account_type.signed_balance(line.debit, line.credit);
                LedgerRunningEntry {
                    entry_id: entry.id,
                    date: entry.date,
                    description: entry.description.clone(),
                    document_number: entry.document_number.clone(),
                    account_code: line.account_code.clone(),
                    counterparty: line.counterparty.clone(),
                    debit: line.debit,
                    credit: line.credit,
                    running_balance: running,
                    entry_balanced: entry.balanced,
                }
            })
            .collect())
    }
}
