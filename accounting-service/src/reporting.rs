// Period reports: trial balance and obligation aging
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use crate::chart::ChartOfAccounts;
use crate::models::*;
use crate::money::Money;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Totals {
    debit: Money,
    credit: Money,
}

impl Totals {
    fn add(&mut self, other: Totals) {
        self.debit += other.debit;
        self.credit += other.credit;
    }

    fn net_debit(self) -> Money {
        self.debit - self.credit
    }
}

/// One row of the trial balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialBalanceRow {
    pub account_code: String,
    pub account_name: String,
    pub account_type: AccountType,
    pub is_synthetic: bool,
    pub depth: usize,
    /// Signed balance of everything dated before the period
    pub opening_balance: Money,
    pub period_debit: Money,
    pub period_credit: Money,
    pub closing_balance: Money,
}

/// Grand totals over analytic accounts, split by side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrialBalanceTotals {
    pub opening_debit: Money,
    pub opening_credit: Money,
    pub period_debit: Money,
    pub period_credit: Money,
    pub closing_debit: Money,
    pub closing_credit: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialBalance {
    pub period: DateRange,
    pub rows: Vec<TrialBalanceRow>,
    pub totals: TrialBalanceTotals,
    /// Period debits equal period credits
    pub balanced: bool,
}

/// Balancete de verificação.
///
/// Every account of the chart in code order with opening balance, period
/// movement and closing balance; synthetic rows roll up their subtree.
/// Lines on accounts missing from the chart are left out here and reported by
/// the integrity audit instead. With `include_empty == false`, rows without
/// any balance or movement are dropped.
pub fn trial_balance(
    chart: &ChartOfAccounts,
    period: &DateRange,
    entries: &[JournalEntry],
    include_empty: bool,
) -> TrialBalance {
    let mut opening: HashMap<&str, Totals> = HashMap::new();
    let mut movement: HashMap<&str, Totals> = HashMap::new();

    for entry in entries.iter().filter(|e| e.date <= period.end) {
        let bucket = if entry.date < period.start {
            &mut opening
        } else {
            &mut movement
        };
        for line in &entry.lines {
            if !chart.is_analytic(&line.account_code) {
                continue;
            }
            let posted = Totals {
                debit: line.debit,
                credit: line.credit,
            };
            bucket.entry(line.account_code.as_str()).or_default().add(posted);
        }
    }

    let mut totals = TrialBalanceTotals::default();
    for (code, account_opening) in &opening {
        let net = account_opening.net_debit();
        if net.is_positive() {
            totals.opening_debit += net;
        } else {
            totals.opening_credit += -net;
        }
        let closing = net + movement.get(code).map_or(Money::ZERO, |m| m.net_debit());
        if closing.is_positive() {
            totals.closing_debit += closing;
        } else {
            totals.closing_credit += -closing;
        }
    }
    for (code, account_movement) in &movement {
        totals.period_debit += account_movement.debit;
        totals.period_credit += account_movement.credit;
        if !opening.contains_key(code) {
            let closing = account_movement.net_debit();
            if closing.is_positive() {
                totals.closing_debit += closing;
            } else {
                totals.closing_credit += -closing;
            }
        }
    }

    // Roll analytic totals up into every synthetic ancestor
    let mut rolled_opening: HashMap<String, Totals> = HashMap::new();
    let mut rolled_movement: HashMap<String, Totals> = HashMap::new();
    for (source, target) in [(&opening, &mut rolled_opening), (&movement, &mut rolled_movement)] {
        for (code, amounts) in source {
            target.entry((*code).to_string()).or_default().add(*amounts);
            for ancestor in chart.ancestors(code) {
                target.entry(ancestor.code.clone()).or_default().add(*amounts);
            }
        }
    }

    let rows = chart
        .walk()
        .into_iter()
        .filter_map(|(depth, account)| {
            let before = rolled_opening.get(&account.code).copied().unwrap_or_default();
            let during = rolled_movement.get(&account.code).copied().unwrap_or_default();
            let opening_balance = account.account_type.signed_balance(before.debit, before.credit);
            let movement_balance = account.account_type.signed_balance(during.debit, during.credit);
            let row = TrialBalanceRow {
                account_code: account.code.clone(),
                account_name: account.name.clone(),
                account_type: account.account_type,
                is_synthetic: account.is_synthetic,
                depth,
                opening_balance,
                period_debit: during.debit,
                period_credit: during.credit,
                closing_balance: opening_balance + movement_balance,
            };
            let empty = before == Totals::default() && during == Totals::default();
            (include_empty || !empty).then_some(row)
        })
        .collect();

    TrialBalance {
        period: *period,
        rows,
        balanced: totals.period_debit == totals.period_credit,
        totals,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgingBucket {
    pub label: String,
    pub min_days: i64,
    /// `None` for the open-ended last bucket
    pub max_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgingRow {
    pub counterparty_label: String,
    /// Open amounts aligned with [`AgingReport::buckets`]
    pub amounts: Vec<Money>,
    pub total: Money,
    pub oldest_days: i64,
    pub record_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgingReport {
    pub kind: ObligationKind,
    pub as_of: NaiveDate,
    pub buckets: Vec<AgingBucket>,
    pub rows: Vec<AgingRow>,
    pub bucket_totals: Vec<Money>,
    pub total: Money,
}

/// Bucket layout for inclusive upper bounds, e.g. `[30, 60, 90]` gives
/// 0-30, 31-60, 61-90 and 90+
pub fn aging_buckets(bounds: &[u32]) -> Vec<AgingBucket> {
    let mut buckets = Vec::with_capacity(bounds.len() + 1);
    let mut lower = 0i64;
    for &bound in bounds {
        let upper = i64::from(bound);
        buckets.push(AgingBucket {
            label: format!("{lower}-{upper}"),
            min_days: lower,
            max_days: Some(upper),
        });
        lower = upper + 1;
    }
    let last = bounds.last().map_or(0, |&b| i64::from(b));
    buckets.push(AgingBucket {
        label: format!("{last}+"),
        min_days: lower,
        max_days: None,
    });
    buckets
}

/// Open (pending or partial) obligations of `report` as of `as_of`, grouped
/// by counterparty and bucketed by days since the provision date.
/// Rows are ordered by total, largest first.
pub fn aging(report: &ObligationReport, as_of: NaiveDate, bounds: &[u32]) -> AgingReport {
    let buckets = aging_buckets(bounds);
    let slot_for = |days: i64| {
        buckets
            .iter()
            .position(|b| b.max_days.map_or(true, |max| days <= max))
            .unwrap_or(buckets.len().saturating_sub(1))
    };

    let mut by_counterparty: HashMap<&str, AgingRow> = HashMap::new();
    let mut bucket_totals = vec![Money::ZERO; buckets.len()];

    for record in report
        .records
        .iter()
        .filter(|r| r.open_amount.is_positive() && r.date <= as_of)
    {
        let days = (as_of - record.date).num_days().max(0);
        let slot = slot_for(days);

        let row = by_counterparty
            .entry(record.counterparty_label.as_str())
            .or_insert_with(|| AgingRow {
                counterparty_label: record.counterparty_label.clone(),
                amounts: vec![Money::ZERO; buckets.len()],
                total: Money::ZERO,
                oldest_days: 0,
                record_count: 0,
            });
        if let Some(cell) = row.amounts.get_mut(slot) {
            *cell += record.open_amount;
        }
        row.total += record.open_amount;
        row.oldest_days = row.oldest_days.max(days);
        row.record_count += 1;

        if let Some(cell) = bucket_totals.get_mut(slot) {
            *cell += record.open_amount;
        }
    }

    let mut rows: Vec<AgingRow> = by_counterparty.into_values().collect();
    rows.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.counterparty_label.cmp(&b.counterparty_label))
    });

    AgingReport {
        kind: report.kind,
        as_of,
        total: bucket_totals.iter().sum(),
        buckets,
        rows,
        bucket_totals,
    }
}
