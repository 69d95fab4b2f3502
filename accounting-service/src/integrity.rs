// Ledger integrity audit
//
// Checks the stored history against the double-entry rules the validator
// enforces on new writes. Legacy data may violate them; the audit reports
// every violation and never fails.
use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::chart::ChartOfAccounts;
use crate::models::JournalEntry;
use crate::money::Money;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnbalancedEntry {
    pub entry_id: Uuid,
    pub date: NaiveDate,
    pub description: String,
    pub total_debit: Money,
    pub total_credit: Money,
    pub delta: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingIssue {
    /// Posted directly to an aggregate account
    SyntheticAccount,
    /// Account code missing from the chart
    UnknownAccount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MisplacedPosting {
    pub entry_id: Uuid,
    pub date: NaiveDate,
    pub account_code: String,
    pub debit: Money,
    pub credit: Money,
    pub issue: PostingIssue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub entry_count: usize,
    pub total_debit: Money,
    pub total_credit: Money,
    /// Debits minus credits over the whole ledger
    pub difference: Money,
    pub balanced: bool,
    pub unbalanced_entries: Vec<UnbalancedEntry>,
    pub misplaced_postings: Vec<MisplacedPosting>,
    /// Unbalanced entries plus a global imbalance
    pub error_count: usize,
    /// Misplaced postings
    pub warning_count: usize,
}

pub fn audit(chart: &ChartOfAccounts, entries: &[JournalEntry]) -> IntegrityReport {
    let mut total_debit = Money::ZERO;
    let mut total_credit = Money::ZERO;
    let mut unbalanced_entries = Vec::new();
    let mut misplaced_postings = Vec::new();

    for entry in entries {
        total_debit += entry.total_debit;
        total_credit += entry.total_credit;

        if !entry.balanced {
            unbalanced_entries.push(UnbalancedEntry {
                entry_id: entry.id,
                date: entry.date,
                description: entry.description.clone(),
                total_debit: entry.total_debit,
                total_credit: entry.total_credit,
                delta: entry.delta(),
            });
        }

        for line in &entry.lines {
            let issue = match chart.get(&line.account_code) {
                None => PostingIssue::UnknownAccount,
                Some(account) if account.is_synthetic => PostingIssue::SyntheticAccount,
                Some(_) => continue,
            };
            misplaced_postings.push(MisplacedPosting {
                entry_id: entry.id,
                date: entry.date,
                account_code: line.account_code.clone(),
                debit: line.debit,
                credit: line.credit,
                issue,
            });
        }
    }

    let difference = total_debit - total_credit;
    let balanced = difference.is_zero();
    let error_count = unbalanced_entries.len() + usize::from(!balanced);

    if error_count > 0 || !misplaced_postings.is_empty() {
        tracing::warn!(
            unbalanced = unbalanced_entries.len(),
            misplaced = misplaced_postings.len(),
            difference = difference.minor_units(),
            "Ledger integrity audit found issues"
        );
    }

    IntegrityReport {
        entry_count: entries.len(),
        total_debit,
        total_credit,
        difference,
        balanced,
        warning_count: misplaced_postings.len(),
        unbalanced_entries,
        misplaced_postings,
        error_count,
    }
}
