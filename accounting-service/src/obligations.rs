// Derived payables and receivables
//
// Obligations are never stored. They are rebuilt from the lines on the
// configured control accounts every time a report is requested. A provision
// line on the raising side opens an obligation; a settlement line on the
// discharging side pays it; a provision line on the discharging side is a
// reversing entry and nets it off. Each discharge is matched as follows:
//
// 1. a discharge that names its provision (`settles`) on the same account is
//    applied to it; a settlement in full, so an overpayment shows up on that
//    record, a reversal up to what is still open;
// 2. otherwise it consumes open provisions on its account, oldest first
//    (FIFO): those with the same counterparty label, then those carrying no
//    label at all. A discharge without a label matches any provision on its
//    account;
// 3. whatever is left is reported as unmatched.
//
// Any other control line (a refund on a settlement entry, a transfer or
// adjustment) is reported as unmatched too, so the report never drifts from
// the ledger silently.
//
// Matching runs over all history up to the end of the period, so a provision
// raised in an earlier period still absorbs settlements made in this one.
use itertools::Itertools;
use logger_redacted::PiiRedactor;
use tracing::{info, warn};

use crate::chart::{compare_codes, is_within, ChartOfAccounts};
use crate::models::*;
use crate::money::Money;

const MATCHING_TARGET: &str = "ledger::matching";

struct OpenProvision<'e> {
    entry: &'e JournalEntry,
    line: &'e JournalLine,
    label_key: Option<String>,
    amount: Money,
    reversed: Money,
    paid: Money,
    allocations: Vec<SettlementAllocation>,
}

impl OpenProvision<'_> {
    fn effective(&self) -> Money {
        if self.reversed >= self.amount {
            Money::ZERO
        } else {
            self.amount - self.reversed
        }
    }

    fn open(&self) -> Money {
        let effective = self.effective();
        if self.paid >= effective {
            Money::ZERO
        } else {
            effective - self.paid
        }
    }

    fn apply(&mut self, discharge: &Discharge<'_>, amount: Money, method: MatchMethod) {
        match discharge.kind {
            DischargeKind::Settlement => self.paid += amount,
            DischargeKind::Reversal => self.reversed += amount,
        }
        self.allocations.push(SettlementAllocation {
            settlement_entry_id: discharge.entry.id,
            date: discharge.entry.date,
            amount,
            method,
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DischargeKind {
    Settlement,
    Reversal,
}

impl DischargeKind {
    fn linked_method(self) -> MatchMethod {
        match self {
            DischargeKind::Settlement => MatchMethod::ExplicitLink,
            DischargeKind::Reversal => MatchMethod::Reversal,
        }
    }

    fn fifo_method(self) -> MatchMethod {
        match self {
            DischargeKind::Settlement => MatchMethod::Fifo,
            DischargeKind::Reversal => MatchMethod::Reversal,
        }
    }
}

struct Discharge<'e> {
    entry: &'e JournalEntry,
    line: &'e JournalLine,
    amount: Money,
    kind: DischargeKind,
}

fn label_key(label: Option<&String>) -> Option<String> {
    label
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
}

fn unmatched(
    entry: &JournalEntry,
    line: &JournalLine,
    residual: Money,
    reason: UnmatchedReason,
) -> UnmatchedSettlement {
    UnmatchedSettlement {
        settlement_entry_id: entry.id,
        entry_type: entry.entry_type,
        date: entry.date,
        account_code: line.account_code.clone(),
        counterparty_label: line.counterparty.clone(),
        residual,
        reason,
    }
}

pub struct ObligationsDeriver<'a> {
    chart: &'a ChartOfAccounts,
    redactor: &'a PiiRedactor,
}

impl<'a> ObligationsDeriver<'a> {
    pub fn new(chart: &'a ChartOfAccounts, redactor: &'a PiiRedactor) -> Self {
        Self { chart, redactor }
    }

    /// Build the obligation report for provisions dated in `period`.
    ///
    /// `entries` should hold every entry touching `control_prefixes` up to
    /// `period.end`; anything later is ignored.
    pub fn derive(
        &self,
        kind: ObligationKind,
        control_prefixes: &[String],
        period: &DateRange,
        entries: &[JournalEntry],
    ) -> ObligationReport {
        let mut history: Vec<&JournalEntry> =
            entries.iter().filter(|e| e.date <= period.end).collect();
        history.sort_by_key(|e| (e.date, e.sequence));

        let mut provisions = Vec::new();
        let mut discharges = Vec::new();
        let mut unmatched_lines = Vec::new();
        for entry in history {
            let provisions_type = entry.entry_type.is_provision();
            let settlement_type = entry.entry_type.is_settlement();
            for line in &entry.lines {
                if !control_prefixes
                    .iter()
                    .any(|prefix| is_within(&line.account_code, prefix))
                {
                    continue;
                }
                let (raised, discharged) = match kind.provision_side() {
                    NormalSide::Credit => (line.credit, line.debit),
                    NormalSide::Debit => (line.debit, line.credit),
                };

                if raised.is_positive() {
                    if provisions_type {
                        provisions.push(OpenProvision {
                            entry,
                            line,
                            label_key: label_key(line.counterparty.as_ref()),
                            amount: raised,
                            reversed: Money::ZERO,
                            paid: Money::ZERO,
                            allocations: Vec::new(),
                        });
                    } else {
                        let reason = if settlement_type {
                            UnmatchedReason::ReopensObligation
                        } else {
                            UnmatchedReason::UnclassifiedMovement
                        };
                        unmatched_lines.push(self.stray(entry, line, raised, reason));
                    }
                }

                if discharged.is_positive() {
                    let discharge_kind = if settlement_type {
                        Some(DischargeKind::Settlement)
                    } else if provisions_type {
                        Some(DischargeKind::Reversal)
                    } else {
                        None
                    };
                    match discharge_kind {
                        Some(discharge_kind) => discharges.push(Discharge {
                            entry,
                            line,
                            amount: discharged,
                            kind: discharge_kind,
                        }),
                        None => unmatched_lines.push(self.stray(
                            entry,
                            line,
                            discharged,
                            UnmatchedReason::UnclassifiedMovement,
                        )),
                    }
                }
            }
        }

        let mut unmatched_settlements: Vec<UnmatchedSettlement> = discharges
            .iter()
            .filter_map(|discharge| self.discharge(discharge, &mut provisions))
            .chain(unmatched_lines)
            .filter(|residual| period.contains(residual.date))
            .collect();
        unmatched_settlements.sort_by_key(|residual| residual.date);

        let records: Vec<ObligationRecord> = provisions
            .into_iter()
            .filter(|p| period.contains(p.entry.date))
            .map(|p| {
                let effective = p.effective();
                ObligationRecord {
                    source_entry_id: p.entry.id,
                    date: p.entry.date,
                    counterparty_label: p
                        .line
                        .counterparty
                        .clone()
                        .unwrap_or_else(|| p.entry.description.clone()),
                    account_code: p.line.account_code.clone(),
                    description: p.entry.description.clone(),
                    document_number: p.entry.document_number.clone(),
                    amount: p.amount,
                    reversed_amount: p.reversed,
                    paid_amount: p.paid,
                    open_amount: p.open(),
                    overpaid_amount: if p.paid > effective {
                        p.paid - effective
                    } else {
                        Money::ZERO
                    },
                    status: ObligationStatus::assess(p.amount, p.reversed, p.paid),
                    allocations: p.allocations,
                }
            })
            .collect();

        self.report(kind, *period, records, unmatched_settlements)
    }

    fn stray(
        &self,
        entry: &JournalEntry,
        line: &JournalLine,
        amount: Money,
        reason: UnmatchedReason,
    ) -> UnmatchedSettlement {
        warn!(
            target: MATCHING_TARGET,
            entry_id = %entry.id,
            entry_type = %entry.entry_type,
            account_code = %line.account_code,
            counterparty = %self.redacted(line),
            amount = amount.minor_units(),
            ?reason,
            "Control-account line neither provisions nor settles"
        );
        unmatched(entry, line, amount, reason)
    }

    fn redacted(&self, line: &JournalLine) -> String {
        line.counterparty
            .as_deref()
            .map(|label| self.redactor.redact(label))
            .unwrap_or_default()
    }

    fn discharge(
        &self,
        discharge: &Discharge<'_>,
        provisions: &mut [OpenProvision<'_>],
    ) -> Option<UnmatchedSettlement> {
        let counterparty = self.redacted(discharge.line);
        let mut remaining = discharge.amount;
        let mut had_candidates = false;
        let mut linked = false;

        if let Some(target) = discharge.entry.settles {
            let provision = provisions.iter_mut().find(|p| {
                p.entry.id == target && p.line.account_code == discharge.line.account_code
            });
            match provision {
                Some(provision) => {
                    linked = true;
                    had_candidates = true;
                    let applied = match discharge.kind {
                        DischargeKind::Settlement => remaining,
                        DischargeKind::Reversal => provision.open().min(remaining),
                    };
                    if applied.is_positive() {
                        provision.apply(discharge, applied, discharge.kind.linked_method());
                        remaining -= applied;
                        info!(
                            target: MATCHING_TARGET,
                            entry_id = %discharge.entry.id,
                            provision_id = %provision.entry.id,
                            account_code = %provision.line.account_code,
                            counterparty = %counterparty,
                            amount = applied.minor_units(),
                            method = ?discharge.kind.linked_method(),
                            "Applied to linked provision"
                        );
                    }
                }
                None => warn!(
                    target: MATCHING_TARGET,
                    entry_id = %discharge.entry.id,
                    account_code = %discharge.line.account_code,
                    linked_provision = %target,
                    "Linked provision not found on this control account; falling back to FIFO"
                ),
            }
        }

        if !linked {
            let key = label_key(discharge.line.counterparty.as_ref());
            let on_account =
                |p: &OpenProvision<'_>| p.line.account_code == discharge.line.account_code;
            let same_label = provisions
                .iter()
                .enumerate()
                .filter(|&(_, p)| on_account(p) && (key.is_none() || p.label_key == key))
                .map(|(i, _)| i);
            let unlabelled = provisions
                .iter()
                .enumerate()
                .filter(|&(_, p)| key.is_some() && on_account(p) && p.label_key.is_none())
                .map(|(i, _)| i);
            let candidates: Vec<usize> = same_label.chain(unlabelled).collect();

            for index in candidates {
                let Some(provision) = provisions.get_mut(index) else {
                    continue;
                };
                had_candidates = true;
                if remaining.is_zero() {
                    break;
                }
                let open = provision.open();
                if !open.is_positive() {
                    continue;
                }
                let applied = open.min(remaining);
                provision.apply(discharge, applied, discharge.kind.fifo_method());
                remaining -= applied;
                info!(
                    target: MATCHING_TARGET,
                    entry_id = %discharge.entry.id,
                    provision_id = %provision.entry.id,
                    account_code = %provision.line.account_code,
                    counterparty = %counterparty,
                    amount = applied.minor_units(),
                    method = ?discharge.kind.fifo_method(),
                    "Applied to oldest open provision"
                );
            }
        }

        if !remaining.is_positive() {
            return None;
        }

        let reason = if had_candidates {
            UnmatchedReason::NoOpenProvision
        } else {
            UnmatchedReason::NoProvision
        };
        warn!(
            target: MATCHING_TARGET,
            entry_id = %discharge.entry.id,
            entry_type = %discharge.entry.entry_type,
            account_code = %discharge.line.account_code,
            counterparty = %counterparty,
            residual = remaining.minor_units(),
            ?reason,
            "Discharge left unmatched"
        );
        Some(unmatched(discharge.entry, discharge.line, remaining, reason))
    }

    fn report(
        &self,
        kind: ObligationKind,
        period: DateRange,
        records: Vec<ObligationRecord>,
        unmatched_settlements: Vec<UnmatchedSettlement>,
    ) -> ObligationReport {
        let effective = |r: &ObligationRecord| r.amount - r.reversed_amount;

        let mut summary_by_account: Vec<AccountRollup> = records
            .iter()
            .into_group_map_by(|record| record.account_code.as_str())
            .into_iter()
            .map(|(code, group)| AccountRollup {
                account_code: code.to_string(),
                account_name: self
                    .chart
                    .get(code)
                    .map(|account| account.name.clone())
                    .unwrap_or_default(),
                record_count: group.len(),
                total_amount: group.iter().copied().map(effective).sum(),
                total_pending: group.iter().map(|r| r.open_amount).sum(),
                total_paid: group.iter().copied().map(|r| effective(r) - r.open_amount).sum(),
            })
            .collect();
        summary_by_account.sort_by(|a, b| compare_codes(&a.account_code, &b.account_code));

        let total_amount: Money = records.iter().map(effective).sum();
        let total_reversed: Money = records.iter().map(|r| r.reversed_amount).sum();
        let total_pending: Money = records.iter().map(|r| r.open_amount).sum();
        let total_paid = total_amount - total_pending;
        let total_overpaid: Money = records.iter().map(|r| r.overpaid_amount).sum();

        ObligationReport {
            kind,
            period,
            payment_rate: total_paid.percentage_of(total_amount),
            records,
            summary_by_account,
            total_amount,
            total_pending,
            total_paid,
            total_overpaid,
            total_reversed,
            unmatched_settlements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn chart() -> ChartOfAccounts {
        ChartOfAccounts::build(vec![
            Account::synthetic("1", "Ativo", AccountType::Asset),
            Account::synthetic("1.1", "Ativo Circulante", AccountType::Asset),
            Account::analytic("1.1.2", "Bancos", AccountType::Asset),
            Account::synthetic("1.1.3", "Clientes", AccountType::Asset),
            Account::analytic("1.1.3.01", "Clientes a Receber", AccountType::Asset),
            Account::synthetic("2", "Passivo", AccountType::Liability),
            Account::synthetic("2.1", "Passivo Circulante", AccountType::Liability),
            Account::analytic("2.1.1", "Fornecedores", AccountType::Liability),
            Account::analytic("2.1.2", "Obrigacoes Fiscais", AccountType::Liability),
            Account::synthetic("4", "Receitas", AccountType::Revenue),
            Account::analytic("4.1", "Honorarios", AccountType::Revenue),
            Account::synthetic("5", "Despesas", AccountType::Expense),
            Account::analytic("5.1", "Despesas Gerais", AccountType::Expense),
        ])
        .unwrap()
    }

    struct Book {
        entries: Vec<JournalEntry>,
    }

    impl Book {
        fn new() -> Self {
            Self { entries: Vec::new() }
        }

        fn post(
            &mut self,
            date: NaiveDate,
            entry_type: EntryType,
            settles: Option<Uuid>,
            lines: Vec<(&str, i64, i64, Option<&str>)>,
        ) -> Uuid {
            let sequence = self.entries.len() as u64 + 1;
            let entry = JournalEntry::from_parts(
                EntryHeader {
                    id: Uuid::new_v4(),
                    sequence,
                    date,
                    description: format!("{entry_type} #{sequence}"),
                    document_number: None,
                    entry_type,
                    reference: None,
                    settles,
                },
                lines
                    .into_iter()
                    .map(|(code, debit, credit, label)| JournalLine {
                        account_code: code.to_string(),
                        debit: Money::from_minor(debit),
                        credit: Money::from_minor(credit),
                        counterparty: label.map(str::to_string),
                    })
                    .collect(),
            );
            let id = entry.id;
            self.entries.push(entry);
            id
        }

        fn bill(&mut self, day: u32, amount: i64, supplier: &str) -> Uuid {
            self.post(
                date(day),
                EntryType::Provision,
                None,
                vec![("5.1", amount, 0, None), ("2.1.1", 0, amount, Some(supplier))],
            )
        }

        fn pay(&mut self, day: u32, amount: i64, supplier: Option<&str>, settles: Option<Uuid>) -> Uuid {
            self.post(
                date(day),
                EntryType::Payment,
                settles,
                vec![("2.1.1", amount, 0, supplier), ("1.1.2", 0, amount, None)],
            )
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn march() -> DateRange {
        DateRange::new(date(1), date(31)).unwrap()
    }

    fn payables(book: &Book, period: &DateRange) -> ObligationReport {
        let chart = chart();
        let redactor = PiiRedactor::disabled();
        ObligationsDeriver::new(&chart, &redactor).derive(
            ObligationKind::Payable,
            &["2.1".to_string()],
            period,
            &book.entries,
        )
    }

    #[test]
    fn test_fifo_consumes_oldest_provision_first() {
        let mut book = Book::new();
        let oldest = book.bill(1, 5_000, "Papelaria Central");
        let newest = book.bill(5, 5_000, "Papelaria Central");
        book.pay(10, 3_000, Some("Papelaria Central"), None);
        book.pay(20, 7_000, Some("Papelaria Central"), None);

        let report = payables(&book, &march());
        assert_eq!(report.records.len(), 2);

        let first = &report.records[0];
        assert_eq!(first.source_entry_id, oldest);
        assert_eq!(first.paid_amount, Money::from_minor(5_000));
        assert_eq!(first.status, ObligationStatus::Paid);
        let parts: Vec<i64> = first.allocations.iter().map(|a| a.amount.minor_units()).collect();
        assert_eq!(parts, vec![3_000, 2_000]);

        let second = &report.records[1];
        assert_eq!(second.source_entry_id, newest);
        assert_eq!(second.paid_amount, Money::from_minor(5_000));
        assert_eq!(second.allocations.len(), 1);
        assert_eq!(second.allocations[0].method, MatchMethod::Fifo);

        assert!(report.unmatched_settlements.is_empty());
        assert_eq!(report.total_pending, Money::ZERO);
        assert_eq!(report.payment_rate, Decimal::from(100));
    }

    #[test]
    fn test_status_progression() {
        for (paid, status, pending) in [
            (0, ObligationStatus::Pending, 10_000),
            (4_000, ObligationStatus::Partial, 6_000),
            (10_000, ObligationStatus::Paid, 0),
        ] {
            let mut book = Book::new();
            book.bill(1, 10_000, "Contabil Servicos");
            if paid > 0 {
                book.pay(15, paid, Some("Contabil Servicos"), None);
            }
            let report = payables(&book, &march());
            assert_eq!(report.records[0].status, status);
            assert_eq!(report.total_pending, Money::from_minor(pending));
            assert_eq!(report.summary_by_account[0].total_pending, Money::from_minor(pending));
            assert_eq!(report.summary_by_account[0].total_paid, Money::from_minor(paid));
        }
    }

    #[test]
    fn test_explicit_link_shows_overpayment() {
        let mut book = Book::new();
        let bill = book.bill(1, 10_000, "Aluguel Sala");
        book.pay(12, 12_000, Some("Aluguel Sala"), Some(bill));

        let report = payables(&book, &march());
        let record = &report.records[0];
        assert_eq!(record.status, ObligationStatus::Paid);
        assert_eq!(record.paid_amount, Money::from_minor(12_000));
        assert_eq!(record.overpaid_amount, Money::from_minor(2_000));
        assert_eq!(record.allocations[0].method, MatchMethod::ExplicitLink);
        assert_eq!(report.total_overpaid, Money::from_minor(2_000));
        assert_eq!(report.total_paid, Money::from_minor(10_000));
        assert!(report.unmatched_settlements.is_empty());
    }

    #[test]
    fn test_fifo_overpayment_becomes_residual() {
        let mut book = Book::new();
        book.bill(1, 10_000, "Aluguel Sala");
        let payment = book.pay(12, 12_000, Some("Aluguel Sala"), None);

        let report = payables(&book, &march());
        assert_eq!(report.records[0].paid_amount, Money::from_minor(10_000));
        assert_eq!(report.unmatched_settlements.len(), 1);
        let residual = &report.unmatched_settlements[0];
        assert_eq!(residual.settlement_entry_id, payment);
        assert_eq!(residual.residual, Money::from_minor(2_000));
        assert_eq!(residual.reason, UnmatchedReason::NoOpenProvision);
    }

    #[test]
    fn test_settlement_without_provision_is_reported() {
        let mut book = Book::new();
        book.bill(1, 1_000, "Fornecedor A");
        book.pay(3, 800, Some("Fornecedor B"), None);

        let report = payables(&book, &march());
        assert_eq!(report.records[0].status, ObligationStatus::Pending);
        assert_eq!(report.unmatched_settlements[0].reason, UnmatchedReason::NoProvision);
        assert_eq!(report.unmatched_settlements[0].residual, Money::from_minor(800));
    }

    #[test]
    fn test_unlabelled_settlement_matches_any_provision_on_account() {
        let mut book = Book::new();
        let first = book.bill(1, 1_000, "Fornecedor A");
        book.bill(2, 1_000, "Fornecedor B");
        book.pay(3, 1_500, None, None);

        let report = payables(&book, &march());
        assert_eq!(report.records[0].source_entry_id, first);
        assert_eq!(report.records[0].status, ObligationStatus::Paid);
        assert_eq!(report.records[1].status, ObligationStatus::Partial);
    }

    #[test]
    fn test_label_matching_ignores_case_and_whitespace() {
        let mut book = Book::new();
        book.bill(1, 1_000, "Fornecedor A");
        book.pay(3, 1_000, Some("  fornecedor a "), None);
        let report = payables(&book, &march());
        assert_eq!(report.records[0].status, ObligationStatus::Paid);
    }

    #[test]
    fn test_unknown_link_falls_back_to_fifo() {
        let mut book = Book::new();
        book.bill(1, 1_000, "Fornecedor A");
        book.pay(3, 1_000, Some("Fornecedor A"), Some(Uuid::new_v4()));
        let report = payables(&book, &march());
        assert_eq!(report.records[0].allocations[0].method, MatchMethod::Fifo);
        assert_eq!(report.records[0].status, ObligationStatus::Paid);
    }

    #[test]
    fn test_earlier_provision_absorbs_settlement_in_period() {
        let mut book = Book::new();
        book.post(
            NaiveDate::from_ymd_opt(2025, 2, 20).unwrap(),
            EntryType::Provision,
            None,
            vec![("5.1", 4_000, 0, None), ("2.1.2", 0, 4_000, Some("DAS"))],
        );
        book.post(
            date(10),
            EntryType::Payment,
            None,
            vec![("2.1.2", 4_000, 0, Some("DAS")), ("1.1.2", 0, 4_000, None)],
        );

        let report = payables(&book, &march());
        assert!(report.records.is_empty());
        assert!(report.unmatched_settlements.is_empty());
        assert_eq!(report.payment_rate, Decimal::ZERO);
    }

    #[test]
    fn test_settlements_after_period_are_ignored() {
        let mut book = Book::new();
        book.bill(1, 1_000, "Fornecedor A");
        book.post(
            NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
            EntryType::Payment,
            None,
            vec![("2.1.1", 1_000, 0, Some("Fornecedor A")), ("1.1.2", 0, 1_000, None)],
        );
        let report = payables(&book, &march());
        assert_eq!(report.records[0].status, ObligationStatus::Pending);
    }

    #[test]
    fn test_receivables_mirror_payables() {
        let mut book = Book::new();
        book.post(
            date(1),
            EntryType::Provision,
            None,
            vec![("1.1.3.01", 15_000, 0, Some("Cliente X")), ("4.1", 0, 15_000, None)],
        );
        book.post(
            date(9),
            EntryType::Receipt,
            None,
            vec![("1.1.2", 6_000, 0, None), ("1.1.3.01", 0, 6_000, Some("Cliente X"))],
        );

        let chart = chart();
        let redactor = PiiRedactor::default();
        let report = ObligationsDeriver::new(&chart, &redactor).derive(
            ObligationKind::Receivable,
            &["1.1.3".to_string()],
            &march(),
            &book.entries,
        );
        assert_eq!(report.records[0].status, ObligationStatus::Partial);
        assert_eq!(report.total_pending, Money::from_minor(9_000));
        assert_eq!(report.payment_rate, Decimal::from(40));
        assert_eq!(report.summary_by_account[0].account_name, "Clientes a Receber");
    }

    #[test]
    fn test_summary_groups_in_code_order() {
        let mut book = Book::new();
        book.post(
            date(1),
            EntryType::Provision,
            None,
            vec![("5.1", 300, 0, None), ("2.1.2", 0, 300, Some("DARF"))],
        );
        book.bill(2, 700, "Fornecedor A");
        book.bill(3, 100, "Fornecedor B");

        let report = payables(&book, &march());
        let codes: Vec<&str> = report
            .summary_by_account
            .iter()
            .map(|r| r.account_code.as_str())
            .collect();
        assert_eq!(codes, vec!["2.1.1", "2.1.2"]);
        assert_eq!(report.summary_by_account[0].record_count, 2);
        assert_eq!(report.summary_by_account[0].total_amount, Money::from_minor(800));
    }

    #[test]
    fn test_reversing_entry_cancels_provision() {
        let mut book = Book::new();
        let bill = book.bill(1, 10_000, "Forn A");
        book.post(
            date(3),
            EntryType::Provision,
            None,
            vec![("2.1.1", 10_000, 0, Some("Forn A")), ("5.1", 0, 10_000, None)],
        );

        let report = payables(&book, &march());
        assert_eq!(report.records.len(), 1);
        let record = &report.records[0];
        assert_eq!(record.source_entry_id, bill);
        assert_eq!(record.status, ObligationStatus::Reversed);
        assert_eq!(record.reversed_amount, Money::from_minor(10_000));
        assert_eq!(record.open_amount, Money::ZERO);
        assert_eq!(record.allocations[0].method, MatchMethod::Reversal);
        assert_eq!(report.total_pending, Money::ZERO);
        assert_eq!(report.total_amount, Money::ZERO);
        assert_eq!(report.total_reversed, Money::from_minor(10_000));
        assert!(report.unmatched_settlements.is_empty());

        let control: i64 = book
            .entries
            .iter()
            .flat_map(|e| &e.lines)
            .filter(|l| l.account_code == "2.1.1")
            .map(|l| l.credit.minor_units() - l.debit.minor_units())
            .sum();
        assert_eq!(Money::from_minor(control), report.total_pending);
    }

    #[test]
    fn test_linked_partial_reversal_then_payment() {
        let mut book = Book::new();
        let bill = book.bill(1, 10_000, "Forn A");
        book.post(
            date(2),
            EntryType::Provision,
            Some(bill),
            vec![("2.1.1", 4_000, 0, None), ("5.1", 0, 4_000, None)],
        );
        book.pay(9, 6_000, Some("Forn A"), None);

        let report = payables(&book, &march());
        let record = &report.records[0];
        assert_eq!(record.status, ObligationStatus::Paid);
        assert_eq!(record.reversed_amount, Money::from_minor(4_000));
        assert_eq!(record.paid_amount, Money::from_minor(6_000));
        let methods: Vec<MatchMethod> = record.allocations.iter().map(|a| a.method).collect();
        assert_eq!(methods, vec![MatchMethod::Reversal, MatchMethod::Fifo]);
        assert_eq!(report.total_amount, Money::from_minor(6_000));
        assert_eq!(report.payment_rate, Decimal::from(100));
        assert!(report.unmatched_settlements.is_empty());
    }

    #[test]
    fn test_reversal_beyond_open_amount_is_reported() {
        let mut book = Book::new();
        book.bill(1, 1_000, "Forn A");
        let reversal = book.post(
            date(4),
            EntryType::Provision,
            None,
            vec![("2.1.1", 1_500, 0, Some("Forn A")), ("5.1", 0, 1_500, None)],
        );

        let report = payables(&book, &march());
        assert_eq!(report.records[0].status, ObligationStatus::Reversed);
        assert_eq!(report.unmatched_settlements.len(), 1);
        let residual = &report.unmatched_settlements[0];
        assert_eq!(residual.settlement_entry_id, reversal);
        assert_eq!(residual.entry_type, EntryType::Provision);
        assert_eq!(residual.residual, Money::from_minor(500));
        assert_eq!(residual.reason, UnmatchedReason::NoOpenProvision);
    }

    #[test]
    fn test_refunds_and_transfers_on_control_accounts_are_reported() {
        let mut book = Book::new();
        book.bill(1, 5_000, "Forn A");
        let refund = book.post(
            date(2),
            EntryType::Payment,
            None,
            vec![("1.1.2", 1_000, 0, None), ("2.1.1", 0, 1_000, Some("Forn A"))],
        );
        let transfer = book.post(
            date(3),
            EntryType::Transfer,
            None,
            vec![("2.1.1", 300, 0, None), ("2.1.2", 0, 300, None)],
        );

        let report = payables(&book, &march());
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].status, ObligationStatus::Pending);

        let seen: Vec<(Uuid, &str, i64, UnmatchedReason)> = report
            .unmatched_settlements
            .iter()
            .map(|u| (u.settlement_entry_id, u.account_code.as_str(), u.residual.minor_units(), u.reason))
            .collect();
        assert_eq!(
            seen,
            vec![
                (refund, "2.1.1", 1_000, UnmatchedReason::ReopensObligation),
                (transfer, "2.1.1", 300, UnmatchedReason::UnclassifiedMovement),
                (transfer, "2.1.2", 300, UnmatchedReason::UnclassifiedMovement),
            ]
        );
    }

    #[test]
    fn test_labelled_settlement_falls_back_to_unlabelled_provision() {
        let mut book = Book::new();
        let rent = book.post(
            date(1),
            EntryType::Provision,
            None,
            vec![("5.1", 10_000, 0, None), ("2.1.1", 0, 10_000, None)],
        );
        book.pay(6, 10_000, Some("Imobiliaria X"), None);

        let report = payables(&book, &march());
        let record = &report.records[0];
        assert_eq!(record.source_entry_id, rent);
        assert_eq!(record.counterparty_label, "provision #1");
        assert_eq!(record.status, ObligationStatus::Paid);
        assert!(report.unmatched_settlements.is_empty());
    }

    #[test]
    fn test_matching_label_wins_over_unlabelled_provision() {
        let mut book = Book::new();
        book.post(
            date(1),
            EntryType::Provision,
            None,
            vec![("5.1", 5_000, 0, None), ("2.1.1", 0, 5_000, None)],
        );
        let labelled = book.bill(2, 5_000, "Imobiliaria X");
        book.pay(6, 5_000, Some("imobiliaria x"), None);

        let report = payables(&book, &march());
        assert_eq!(report.records[0].status, ObligationStatus::Pending);
        assert_eq!(report.records[1].source_entry_id, labelled);
        assert_eq!(report.records[1].status, ObligationStatus::Paid);
    }

    #[test]
    fn test_link_to_provision_on_other_account_is_not_honoured() {
        let mut book = Book::new();
        let tax = book.post(
            date(1),
            EntryType::Provision,
            None,
            vec![("5.1", 4_000, 0, None), ("2.1.2", 0, 4_000, Some("DAS"))],
        );
        let payment = book.pay(5, 4_000, Some("DAS"), Some(tax));

        let report = payables(&book, &march());
        let record = &report.records[0];
        assert_eq!(record.account_code, "2.1.2");
        assert_eq!(record.status, ObligationStatus::Pending);
        assert!(record.allocations.is_empty());

        let residual = &report.unmatched_settlements[0];
        assert_eq!(residual.settlement_entry_id, payment);
        assert_eq!(residual.account_code, "2.1.1");
        assert_eq!(residual.reason, UnmatchedReason::NoProvision);
        assert_eq!(report.summary_by_account[0].total_paid, Money::ZERO);
    }

    #[test]
    fn test_recomputation_is_stable() {
        let mut book = Book::new();
        book.bill(1, 5_000, "Fornecedor A");
        book.pay(4, 2_500, Some("Fornecedor A"), None);
        assert_eq!(payables(&book, &march()), payables(&book, &march()));
    }
}
