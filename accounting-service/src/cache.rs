// Read-through cache for balance summaries
use config_engine::CacheSettings;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashSet;
use tracing::debug;

use crate::chart::parent_code;
use crate::models::{AccountBalanceSummary, DateRange, JournalEntry};

/// Balance summaries keyed by `(scope, period)`.
///
/// A write must call [`BalanceCache::invalidate_for`] with the stored entry:
/// every cached scope that is the line's account or one of its ancestors, and
/// whose period contains the entry date, is evicted.
///
/// Readers that compute a summary outside the write lock store it with
/// [`BalanceCache::insert_if_current`], passing the generation they saw before
/// reading the store; a summary read before an invalidation is discarded.
pub struct BalanceCache {
    entries: DashMap<(String, DateRange), AccountBalanceSummary>,
    max_entries: usize,
    generation: RwLock<u64>,
}

impl BalanceCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries,
            generation: RwLock::new(0),
        }
    }

    /// `None` when caching is disabled
    pub fn from_settings(settings: &CacheSettings) -> Option<Self> {
        settings
            .enabled
            .then(|| Self::new(settings.max_entries))
    }

    pub fn get(&self, scope: &str, period: &DateRange) -> Option<AccountBalanceSummary> {
        self.entries
            .get(&(scope.to_string(), *period))
            .map(|cached| cached.value().clone())
    }

    /// Bumped by every invalidation
    pub fn generation(&self) -> u64 {
        *self.generation.read()
    }

    /// Insert unless an invalidation ran after `observed` was read.
    /// Returns whether the summary was stored.
    pub fn insert_if_current(&self, summary: AccountBalanceSummary, observed: u64) -> bool {
        let generation = self.generation.read();
        if *generation != observed {
            debug!(
                account_code = %summary.account_code,
                observed,
                current = *generation,
                "Summary predates a write; not cached"
            );
            return false;
        }
        self.insert(summary);
        true
    }

    pub fn insert(&self, summary: AccountBalanceSummary) {
        if self.entries.len() >= self.max_entries {
            debug!(max_entries = self.max_entries, "Balance cache full; clearing");
            self.entries.clear();
        }
        self.entries
            .insert((summary.account_code.clone(), summary.period), summary);
    }

    /// Evict every summary the entry could change. Returns how many were dropped.
    pub fn invalidate_for(&self, entry: &JournalEntry) -> usize {
        let mut scopes: HashSet<&str> = HashSet::new();
        for line in &entry.lines {
            let mut current = Some(line.account_code.as_str());
            while let Some(code) = current {
                scopes.insert(code);
                current = parent_code(code);
            }
        }

        let mut generation = self.generation.write();
        *generation = generation.wrapping_add(1);

        let before = self.entries.len();
        self.entries.retain(|(scope, period), _| {
            !(scopes.contains(scope.as_str()) && period.contains(entry.date))
        });
        let evicted = before.saturating_sub(self.entries.len());
        if evicted > 0 {
            debug!(entry_id = %entry.id, evicted, "Balance cache invalidated");
        }
        evicted
    }

    pub fn clear(&self) {
        let mut generation = self.generation.write();
        *generation = generation.wrapping_add(1);
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;
    use crate::money::Money;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn day(month: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, d).unwrap()
    }

    fn summary(code: &str, period: DateRange) -> AccountBalanceSummary {
        AccountBalanceSummary {
            account_code: code.to_string(),
            account_name: code.to_string(),
            account_type: AccountType::Asset,
            is_synthetic: false,
            period,
            total_debit: Money::ZERO,
            total_credit: Money::ZERO,
            balance: Money::ZERO,
            movement_count: 0,
            unbalanced_entries: Vec::new(),
        }
    }

    fn posted(date: NaiveDate) -> JournalEntry {
        JournalEntry::from_parts(
            EntryHeader {
                id: Uuid::new_v4(),
                sequence: 1,
                date,
                description: "deposito".to_string(),
                document_number: None,
                entry_type: EntryType::Transfer,
                reference: None,
                settles: None,
            },
            vec![
                JournalLine::from(DraftLine::debit("1.1.2", Money::from_minor(10))),
                JournalLine::from(DraftLine::credit("1.1.1", Money::from_minor(10))),
            ],
        )
    }

    #[test]
    fn test_invalidation_hits_ancestors_in_period_only() {
        let cache = BalanceCache::new(100);
        let january = DateRange::new(day(1, 1), day(1, 31)).unwrap();
        let february = DateRange::new(day(2, 1), day(2, 28)).unwrap();

        cache.insert(summary("1.1.2", january));
        cache.insert(summary("1.1", january));
        cache.insert(summary("1", january));
        cache.insert(summary("1.1", february));
        cache.insert(summary("3.1.1", january));

        let evicted = cache.invalidate_for(&posted(day(1, 15)));
        assert_eq!(evicted, 3);
        assert!(cache.get("1.1", &january).is_none());
        assert!(cache.get("1.1", &february).is_some());
        assert!(cache.get("3.1.1", &january).is_some());
    }

    #[test]
    fn test_summary_read_before_a_write_is_not_cached() {
        let cache = BalanceCache::new(100);
        let january = DateRange::new(day(1, 1), day(1, 31)).unwrap();

        let observed = cache.generation();
        cache.invalidate_for(&posted(day(1, 15)));
        assert!(!cache.insert_if_current(summary("1.1.2", january), observed));
        assert!(cache.get("1.1.2", &january).is_none());

        assert!(cache.insert_if_current(summary("1.1.2", january), cache.generation()));
        assert!(cache.get("1.1.2", &january).is_some());
    }

    #[test]
    fn test_cache_is_bounded() {
        let cache = BalanceCache::new(2);
        let january = DateRange::new(day(1, 1), day(1, 31)).unwrap();
        cache.insert(summary("1", january));
        cache.insert(summary("2", january));
        cache.insert(summary("3", january));
        assert_eq!(cache.len(), 1);
        assert!(cache.get("3", &january).is_some());
    }

    #[test]
    fn test_disabled_settings_yield_no_cache() {
        let settings = CacheSettings {
            enabled: false,
            max_entries: 10,
        };
        assert!(BalanceCache::from_settings(&settings).is_none());
    }
}
