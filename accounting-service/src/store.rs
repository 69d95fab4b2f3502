use crate::{
    chart::is_within,
    error::{AccountingError, AccountingResult},
    models::*,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

pub mod postgres;

pub use postgres::PostgresLedgerStore;

/// Selects stored entries. Empty lists act as wildcards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub period: Option<DateRange>,
    /// Entries with at least one line on or below one of these codes
    pub account_prefixes: Vec<String>,
    pub entry_types: Vec<EntryType>,
}

impl EntryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn within(mut self, period: DateRange) -> Self {
        self.period = Some(period);
        self
    }

    #[must_use]
    pub fn under(mut self, prefix: impl Into<String>) -> Self {
        self.account_prefixes.push(prefix.into());
        self
    }

    #[must_use]
    pub fn under_any(mut self, prefixes: &[String]) -> Self {
        self.account_prefixes.extend(prefixes.iter().cloned());
        self
    }

    #[must_use]
    pub fn of_types(mut self, entry_types: &[EntryType]) -> Self {
        self.entry_types.extend_from_slice(entry_types);
        self
    }

    pub fn matches(&self, entry: &JournalEntry) -> bool {
        if let Some(period) = &self.period {
            if !period.contains(entry.date) {
                return false;
            }
        }
        if !self.entry_types.is_empty() && !self.entry_types.contains(&entry.entry_type) {
            return false;
        }
        self.account_prefixes.is_empty()
            || entry.lines.iter().any(|line| {
                self.account_prefixes
                    .iter()
                    .any(|prefix| is_within(&line.account_code, prefix))
            })
    }
}

/// Append-only persistence of accepted journal entries
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Persist an entry and its lines as one atomic write.
    /// Returns the entry with its insertion sequence assigned.
    async fn append(&self, entry: JournalEntry) -> AccountingResult<JournalEntry>;

    /// Entry previously generated from `reference` with the same type
    async fn find_by_reference(
        &self,
        reference: &EntryReference,
        entry_type: EntryType,
    ) -> AccountingResult<Option<JournalEntry>>;

    /// Matching entries ordered by (date, sequence), lines in insertion order
    async fn fetch_entries(&self, filter: &EntryFilter) -> AccountingResult<Vec<JournalEntry>>;
}

/// Source of the flat account list the chart is built from
#[async_trait]
pub trait ChartSource: Send + Sync {
    async fn load_accounts(&self) -> AccountingResult<Vec<Account>>;
}

/// A store that also serves the chart of accounts
pub trait LedgerBackend: LedgerStore + ChartSource {}

impl<T: LedgerStore + ChartSource> LedgerBackend for T {}

/// In-memory ledger for development and tests
pub struct InMemoryLedgerStore {
    accounts: RwLock<Vec<Account>>,
    entries: RwLock<Vec<JournalEntry>>,
}

impl InMemoryLedgerStore {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self {
            accounts: RwLock::new(accounts),
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn replace_accounts(&self, accounts: Vec<Account>) {
        *self.accounts.write() = accounts;
    }

    pub fn entry_count(&self) -> usize {
        self.entries.read().len()
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn append(&self, entry: JournalEntry) -> AccountingResult<JournalEntry> {
        let mut entries = self.entries.write();
        if entries.iter().any(|existing| existing.id == entry.id) {
            return Err(AccountingError::Store(format!(
                "Entry {} already exists",
                entry.id
            )));
        }
        let sequence = u64::try_from(entries.len())
            .map_err(|e| AccountingError::Store(e.to_string()))?
            + 1;
        let stored = entry.with_sequence(sequence);
        entries.push(stored.clone());
        debug!(entry_id = %stored.id, sequence, "Entry appended to in-memory ledger");
        Ok(stored)
    }

    async fn find_by_reference(
        &self,
        reference: &EntryReference,
        entry_type: EntryType,
    ) -> AccountingResult<Option<JournalEntry>> {
        Ok(self
            .entries
            .read()
            .iter()
            .find(|entry| {
                entry.entry_type == entry_type && entry.reference.as_ref() == Some(reference)
            })
            .cloned())
    }

    async fn fetch_entries(&self, filter: &EntryFilter) -> AccountingResult<Vec<JournalEntry>> {
        let mut matched: Vec<JournalEntry> = self
            .entries
            .read()
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect();
        matched.sort_by_key(|entry| (entry.date, entry.sequence));
        Ok(matched)
    }
}

#[async_trait]
impl ChartSource for InMemoryLedgerStore {
    async fn load_accounts(&self) -> AccountingResult<Vec<Account>> {
        Ok(self.accounts.read().clone())
    }
}
