// Ledger data model
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;

/// Account classification; decides the normal side and the balance sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalSide {
    Debit,
    Credit,
}

impl AccountType {
    pub fn normal_side(self) -> NormalSide {
        match self {
            AccountType::Asset | AccountType::Expense => NormalSide::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Revenue => {
                NormalSide::Credit
            }
        }
    }

    /// Balance of `debit`/`credit` totals under this type's sign convention
    pub fn signed_balance(self, debit: Money, credit: Money) -> Money {
        match self.normal_side() {
            NormalSide::Debit => debit - credit,
            NormalSide::Credit => credit - debit,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccountType::Asset => "asset",
            AccountType::Liability => "liability",
            AccountType::Equity => "equity",
            AccountType::Revenue => "revenue",
            AccountType::Expense => "expense",
        }
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asset" => Ok(AccountType::Asset),
            "liability" => Ok(AccountType::Liability),
            "equity" => Ok(AccountType::Equity),
            "revenue" => Ok(AccountType::Revenue),
            "expense" => Ok(AccountType::Expense),
            other => Err(format!("unknown account type '{other}'")),
        }
    }
}

/// Chart-of-accounts entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    #[serde(default)]
    pub is_synthetic: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Account {
    /// Postable leaf account
    pub fn analytic(code: impl Into<String>, name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            account_type,
            is_synthetic: false,
            is_active: true,
        }
    }

    /// Aggregate node that never receives postings
    pub fn synthetic(code: impl Into<String>, name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            is_synthetic: true,
            ..Self::analytic(code, name, account_type)
        }
    }

    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// What business event an entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// Obligation recognized on the accrual basis
    Provision,
    /// Balance carried in when the ledger starts; opens obligations like a provision
    OpeningBalance,
    Receipt,
    Payment,
    Settlement,
    Transfer,
    Adjustment,
}

impl EntryType {
    /// Creates obligations on control accounts
    pub fn is_provision(self) -> bool {
        matches!(self, EntryType::Provision | EntryType::OpeningBalance)
    }

    /// Discharges obligations on control accounts
    pub fn is_settlement(self) -> bool {
        matches!(
            self,
            EntryType::Settlement | EntryType::Receipt | EntryType::Payment
        )
    }

    /// May carry `settles`: settlements name what they pay, provisions name what they reverse
    pub fn may_name_provision(self) -> bool {
        self.is_settlement() || self.is_provision()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Provision => "provision",
            EntryType::OpeningBalance => "opening_balance",
            EntryType::Receipt => "receipt",
            EntryType::Payment => "payment",
            EntryType::Settlement => "settlement",
            EntryType::Transfer => "transfer",
            EntryType::Adjustment => "adjustment",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "provision" => Ok(EntryType::Provision),
            "opening_balance" => Ok(EntryType::OpeningBalance),
            "receipt" => Ok(EntryType::Receipt),
            "payment" => Ok(EntryType::Payment),
            "settlement" => Ok(EntryType::Settlement),
            "transfer" => Ok(EntryType::Transfer),
            "adjustment" => Ok(EntryType::Adjustment),
            other => Err(format!("unknown entry type '{other}'")),
        }
    }
}

/// Source record an entry was generated from (table and row)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryReference {
    pub kind: String,
    pub id: String,
}

impl EntryReference {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// # Errors
    ///
    /// [`ValidationError::InvalidPeriod`] when `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidPeriod { start, end });
        }
        Ok(Self { start, end })
    }

    /// Everything up to and including `end`
    pub fn up_to(end: NaiveDate) -> Self {
        Self {
            start: NaiveDate::MIN,
            end,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Lower bound for storage queries; `None` for ranges built by [`DateRange::up_to`]
    pub fn lower_bound(&self) -> Option<NaiveDate> {
        (self.start != NaiveDate::MIN).then_some(self.start)
    }
}

/// Proposed line; exactly one side must be non-zero
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftLine {
    pub account_code: String,
    #[serde(default)]
    pub debit: Money,
    #[serde(default)]
    pub credit: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<String>,
}

impl DraftLine {
    pub fn debit(account_code: impl Into<String>, amount: Money) -> Self {
        Self {
            account_code: account_code.into(),
            debit: amount,
            credit: Money::ZERO,
            counterparty: None,
        }
    }

    pub fn credit(account_code: impl Into<String>, amount: Money) -> Self {
        Self {
            account_code: account_code.into(),
            debit: Money::ZERO,
            credit: amount,
            counterparty: None,
        }
    }

    #[must_use]
    pub fn with_counterparty(mut self, label: impl Into<String>) -> Self {
        self.counterparty = Some(label.into());
        self
    }
}

/// Candidate entry submitted for validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub date: NaiveDate,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_number: Option<String>,
    pub entry_type: EntryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<EntryReference>,
    /// Provision entry this settlement discharges
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settles: Option<Uuid>,
    pub lines: Vec<DraftLine>,
}

impl EntryDraft {
    pub fn new(date: NaiveDate, description: impl Into<String>, entry_type: EntryType) -> Self {
        Self {
            date,
            description: description.into(),
            document_number: None,
            entry_type,
            reference: None,
            settles: None,
            lines: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_line(mut self, line: DraftLine) -> Self {
        self.lines.push(line);
        self
    }

    #[must_use]
    pub fn with_document_number(mut self, number: impl Into<String>) -> Self {
        self.document_number = Some(number.into());
        self
    }

    #[must_use]
    pub fn with_reference(mut self, reference: EntryReference) -> Self {
        self.reference = Some(reference);
        self
    }

    #[must_use]
    pub fn settling(mut self, provision_id: Uuid) -> Self {
        self.settles = Some(provision_id);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    pub account_code: String,
    pub debit: Money,
    pub credit: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<String>,
}

impl From<DraftLine> for JournalLine {
    fn from(line: DraftLine) -> Self {
        Self {
            account_code: line.account_code,
            debit: line.debit,
            credit: line.credit,
            counterparty: line.counterparty,
        }
    }
}

/// Header fields of a stored entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    pub id: Uuid,
    pub sequence: u64,
    pub date: NaiveDate,
    pub description: String,
    pub document_number: Option<String>,
    pub entry_type: EntryType,
    pub reference: Option<EntryReference>,
    pub settles: Option<Uuid>,
}

/// Immutable ledger entry.
///
/// Totals and the `balanced` flag are always derived from the lines when the
/// entry is constructed, including entries loaded back from storage, so legacy
/// unbalanced rows surface as `balanced == false` instead of being trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    pub id: Uuid,
    /// Insertion order assigned by the store; 0 until appended
    pub sequence: u64,
    pub date: NaiveDate,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_number: Option<String>,
    pub entry_type: EntryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<EntryReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settles: Option<Uuid>,
    pub lines: Vec<JournalLine>,
    pub total_debit: Money,
    pub total_credit: Money,
    pub balanced: bool,
}

impl JournalEntry {
    pub fn from_parts(header: EntryHeader, lines: Vec<JournalLine>) -> Self {
        let total_debit: Money = lines.iter().map(|line| line.debit).sum();
        let total_credit: Money = lines.iter().map(|line| line.credit).sum();
        Self {
            id: header.id,
            sequence: header.sequence,
            date: header.date,
            description: header.description,
            document_number: header.document_number,
            entry_type: header.entry_type,
            reference: header.reference,
            settles: header.settles,
            lines,
            total_debit,
            total_credit,
            balanced: total_debit == total_credit,
        }
    }

    /// Debits minus credits
    pub fn delta(&self) -> Money {
        self.total_debit - self.total_credit
    }

    #[must_use]
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }
}

/// Totals for one account or synthetic subtree over a period
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountBalanceSummary {
    pub account_code: String,
    pub account_name: String,
    pub account_type: AccountType,
    pub is_synthetic: bool,
    pub period: DateRange,
    pub total_debit: Money,
    pub total_credit: Money,
    pub balance: Money,
    pub movement_count: usize,
    /// Legacy entries contributing to the totals whose own debits and credits differ
    pub unbalanced_entries: Vec<Uuid>,
}

/// One line of an account statement with the balance after it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerRunningEntry {
    pub entry_id: Uuid,
    pub date: NaiveDate,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_number: Option<String>,
    pub account_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<String>,
    pub debit: Money,
    pub credit: Money,
    pub running_balance: Money,
    pub entry_balanced: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationKind {
    Payable,
    Receivable,
}

impl ObligationKind {
    /// Side of a control-account line that creates the obligation
    pub fn provision_side(self) -> NormalSide {
        match self {
            ObligationKind::Payable => NormalSide::Credit,
            ObligationKind::Receivable => NormalSide::Debit,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ObligationKind::Payable => "payable",
            ObligationKind::Receivable => "receivable",
        }
    }
}

impl FromStr for ObligationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "payable" | "payables" => Ok(ObligationKind::Payable),
            "receivable" | "receivables" => Ok(ObligationKind::Receivable),
            other => Err(format!("unknown obligation kind '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationStatus {
    Pending,
    Partial,
    Paid,
    /// Cancelled by reversing entries before anything was settled
    Reversed,
}

impl ObligationStatus {
    pub fn classify(amount: Money, paid: Money) -> Self {
        if paid >= amount {
            ObligationStatus::Paid
        } else if paid.is_positive() {
            ObligationStatus::Partial
        } else {
            ObligationStatus::Pending
        }
    }

    /// Status of `amount` once `reversed` has been netted off it
    pub fn assess(amount: Money, reversed: Money, paid: Money) -> Self {
        let effective = amount - reversed;
        if reversed.is_positive() && !effective.is_positive() && paid.is_zero() {
            ObligationStatus::Reversed
        } else {
            ObligationStatus::classify(effective, paid)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    ExplicitLink,
    Fifo,
    /// Discharge-side line of a provision entry, netted off the amount
    Reversal,
}

/// Portion of a settlement or reversal applied to one provision
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementAllocation {
    pub settlement_entry_id: Uuid,
    pub date: NaiveDate,
    pub amount: Money,
    pub method: MatchMethod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObligationRecord {
    pub source_entry_id: Uuid,
    pub date: NaiveDate,
    pub counterparty_label: String,
    pub account_code: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_number: Option<String>,
    /// As raised, before reversals
    pub amount: Money,
    pub reversed_amount: Money,
    pub paid_amount: Money,
    /// `amount - reversed_amount - paid_amount`, floored at zero
    pub open_amount: Money,
    /// Settled beyond `amount - reversed_amount`
    pub overpaid_amount: Money,
    pub status: ObligationStatus,
    pub allocations: Vec<SettlementAllocation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountRollup {
    pub account_code: String,
    pub account_name: String,
    pub record_count: usize,
    pub total_amount: Money,
    pub total_pending: Money,
    pub total_paid: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedReason {
    /// Provisions exist for the key but were already fully settled
    NoOpenProvision,
    /// No provision at all for the key
    NoProvision,
    /// Settlement entry moving the control account the way a provision does (refund, reopening)
    ReopensObligation,
    /// Entry type that neither provisions nor settles touched a control account
    UnclassifiedMovement,
}

/// Control-account amount the matcher could not attribute; reported, never dropped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmatchedSettlement {
    pub settlement_entry_id: Uuid,
    pub entry_type: EntryType,
    pub date: NaiveDate,
    pub account_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty_label: Option<String>,
    pub residual: Money,
    pub reason: UnmatchedReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObligationReport {
    pub kind: ObligationKind,
    pub period: DateRange,
    pub records: Vec<ObligationRecord>,
    pub summary_by_account: Vec<AccountRollup>,
    pub total_amount: Money,
    pub total_pending: Money,
    pub total_paid: Money,
    pub total_overpaid: Money,
    /// Netted off provisions by reversing entries; excluded from `total_amount`
    pub total_reversed: Money,
    /// Settled share of `total_amount`, percent with two decimals
    pub payment_rate: Decimal,
    pub unmatched_settlements: Vec<UnmatchedSettlement>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    #[test]
    fn test_sign_convention() {
        let debit = Money::from_minor(700);
        let credit = Money::from_minor(200);
        assert_eq!(AccountType::Asset.signed_balance(debit, credit), Money::from_minor(500));
        assert_eq!(AccountType::Expense.signed_balance(debit, credit), Money::from_minor(500));
        assert_eq!(AccountType::Liability.signed_balance(debit, credit), Money::from_minor(-500));
        assert_eq!(AccountType::Revenue.signed_balance(debit, credit), Money::from_minor(-500));
    }

    #[test]
    fn test_status_classification() {
        let amount = Money::from_minor(10_000);
        assert_eq!(ObligationStatus::classify(amount, Money::ZERO), ObligationStatus::Pending);
        assert_eq!(ObligationStatus::classify(amount, Money::from_minor(4_000)), ObligationStatus::Partial);
        assert_eq!(ObligationStatus::classify(amount, Money::from_minor(10_000)), ObligationStatus::Paid);
        assert_eq!(ObligationStatus::classify(amount, Money::from_minor(12_000)), ObligationStatus::Paid);
    }

    #[test]
    fn test_status_after_reversal() {
        let amount = Money::from_minor(10_000);
        assert_eq!(ObligationStatus::assess(amount, amount, Money::ZERO), ObligationStatus::Reversed);
        assert_eq!(
            ObligationStatus::assess(amount, Money::from_minor(4_000), Money::from_minor(6_000)),
            ObligationStatus::Paid
        );
        assert_eq!(
            ObligationStatus::assess(amount, Money::from_minor(4_000), Money::ZERO),
            ObligationStatus::Pending
        );
        assert_eq!(ObligationStatus::assess(amount, Money::ZERO, Money::ZERO), ObligationStatus::Pending);
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let period = DateRange::new(date(1), date(31)).unwrap();
        assert!(period.contains(date(1)));
        assert!(period.contains(date(31)));
        assert!(DateRange::new(date(2), date(1)).is_err());
    }

    #[test]
    fn test_open_range_has_no_lower_bound() {
        let open = DateRange::up_to(date(31));
        assert_eq!(open.lower_bound(), None);
        assert!(open.contains(NaiveDate::from_ymd_opt(1990, 6, 1).unwrap()));
        assert_eq!(DateRange::new(date(1), date(31)).unwrap().lower_bound(), Some(date(1)));
    }

    #[test]
    fn test_entry_totals_are_derived() {
        let header = EntryHeader {
            id: Uuid::new_v4(),
            sequence: 0,
            date: date(5),
            description: "legacy import".to_string(),
            document_number: None,
            entry_type: EntryType::Adjustment,
            reference: None,
            settles: None,
        };
        let entry = JournalEntry::from_parts(
            header,
            vec![
                DraftLine::debit("1.1.1", Money::from_minor(10_000)).into(),
                DraftLine::credit("3.1.1", Money::from_minor(9_000)).into(),
            ],
        );
        assert!(!entry.balanced);
        assert_eq!(entry.delta(), Money::from_minor(1_000));
    }

    #[test]
    fn test_draft_deserializes_with_defaults() {
        let draft: EntryDraft = serde_json::from_str(
            r#"{
                "date": "2025-01-10",
                "description": "Honorarios janeiro",
                "entry_type": "provision",
                "lines": [
                    {"account_code": "1.1.3.01", "debit": 150000, "counterparty": "Cliente A"},
                    {"account_code": "4.1.1", "credit": 150000}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(draft.entry_type, EntryType::Provision);
        assert_eq!(draft.lines[1].debit, Money::ZERO);
        assert_eq!(draft.lines[0].counterparty.as_deref(), Some("Cliente A"));
    }
}
