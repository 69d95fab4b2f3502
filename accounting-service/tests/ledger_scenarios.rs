use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use accounting_service::*;
use async_trait::async_trait;
use chrono::NaiveDate;
use config_engine::LedgerConfig;
use tokio::sync::Notify;
use uuid::Uuid;

fn chart() -> Vec<Account> {
    vec![
        Account::synthetic("1", "Ativo", AccountType::Asset),
        Account::synthetic("1.1", "Ativo Circulante", AccountType::Asset),
        Account::analytic("1.1.1", "Caixa", AccountType::Asset),
        Account::analytic("1.1.2", "Bancos", AccountType::Asset),
        Account::synthetic("1.1.3", "Clientes", AccountType::Asset),
        Account::analytic("1.1.3.01", "Honorarios a Receber", AccountType::Asset),
        Account::synthetic("2", "Passivo", AccountType::Liability),
        Account::synthetic("2.1", "Passivo Circulante", AccountType::Liability),
        Account::analytic("2.1.1", "Fornecedores", AccountType::Liability),
        Account::synthetic("3", "Patrimonio Liquido", AccountType::Equity),
        Account::synthetic("3.1", "Capital", AccountType::Equity),
        Account::analytic("3.1.1", "Capital Social", AccountType::Equity),
        Account::synthetic("4", "Receitas", AccountType::Revenue),
        Account::analytic("4.1", "Honorarios Contabeis", AccountType::Revenue),
        Account::synthetic("5", "Despesas", AccountType::Expense),
        Account::analytic("5.1", "Material de Escritorio", AccountType::Expense),
    ]
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
}

fn service_with(config: &LedgerConfig) -> (Arc<InMemoryLedgerStore>, AccountingService) {
    let store = Arc::new(InMemoryLedgerStore::new(chart()));
    let service = AccountingService::new(store.clone(), config);
    (store, service)
}

fn service() -> (Arc<InMemoryLedgerStore>, AccountingService) {
    service_with(&LedgerConfig::default())
}

fn capital(amount: i64) -> EntryDraft {
    EntryDraft::new(day(2), "Integralizacao de capital", EntryType::OpeningBalance)
        .with_line(DraftLine::debit("1.1.1", Money::from_minor(amount)))
        .with_line(DraftLine::credit("3.1.1", Money::from_minor(amount)))
}

#[tokio::test]
async fn balanced_entry_moves_both_balances() {
    let (_, service) = service();
    let entry = service.submit_journal_entry(capital(50_000)).await.unwrap();
    assert!(entry.balanced);
    assert_eq!(entry.sequence, 1);

    let cash = service.get_account_balance("1.1.1", day(1), day(31)).await.unwrap();
    let equity = service.get_account_balance("3.1.1", day(1), day(31)).await.unwrap();
    assert_eq!(cash.balance, Money::from_minor(50_000));
    assert_eq!(equity.balance, Money::from_minor(50_000));
}

#[tokio::test]
async fn unbalanced_entry_is_rejected_without_a_write() {
    let (store, service) = service();
    let draft = EntryDraft::new(day(3), "Lancamento errado", EntryType::Adjustment)
        .with_line(DraftLine::debit("1.1.1", Money::from_minor(10_000)))
        .with_line(DraftLine::credit("3.1.1", Money::from_minor(9_000)));

    let err = service.submit_journal_entry(draft).await.unwrap_err();
    assert!(matches!(
        err,
        AccountingError::Validation(ValidationError::Unbalanced { delta, .. })
            if delta == Money::from_minor(1_000)
    ));
    assert_eq!(store.entry_count(), 0);

    let cash = service.get_account_balance("1.1.1", day(1), day(31)).await.unwrap();
    assert_eq!(cash.balance, Money::ZERO);
}

#[tokio::test]
async fn synthetic_scope_rolls_up_children() {
    let (_, service) = service();
    service.submit_journal_entry(capital(50_000)).await.unwrap();
    service
        .submit_journal_entry(
            EntryDraft::new(day(4), "Aporte em conta", EntryType::Adjustment)
                .with_line(DraftLine::debit("1.1.2", Money::from_minor(20_000)))
                .with_line(DraftLine::credit("3.1.1", Money::from_minor(20_000))),
        )
        .await
        .unwrap();

    let current = service.get_account_balance("1.1", day(1), day(31)).await.unwrap();
    assert_eq!(current.balance, Money::from_minor(70_000));
    assert_eq!(current.movement_count, 2);
}

#[tokio::test]
async fn fifo_settles_oldest_provision_first() {
    let (_, service) = service();
    let supplier = "Papelaria Central 12.345.678/0001-90";
    for d in [1, 5] {
        service
            .submit_journal_entry(
                EntryDraft::new(day(d), "Compra de material", EntryType::Provision)
                    .with_line(DraftLine::debit("5.1", Money::from_minor(5_000)))
                    .with_line(DraftLine::credit("2.1.1", Money::from_minor(5_000)).with_counterparty(supplier)),
            )
            .await
            .unwrap();
    }
    for (d, amount) in [(10, 3_000), (20, 7_000)] {
        service
            .submit_journal_entry(
                EntryDraft::new(day(d), "Pagamento fornecedor", EntryType::Payment)
                    .with_line(DraftLine::debit("2.1.1", Money::from_minor(amount)).with_counterparty(supplier))
                    .with_line(DraftLine::credit("1.1.2", Money::from_minor(amount))),
            )
            .await
            .unwrap();
    }

    let payables = service.get_payables(day(1), day(31)).await.unwrap();
    let paid: Vec<(i64, ObligationStatus)> = payables
        .records
        .iter()
        .map(|r| (r.paid_amount.minor_units(), r.status))
        .collect();
    assert_eq!(paid, vec![(5_000, ObligationStatus::Paid), (5_000, ObligationStatus::Paid)]);
    assert!(payables.unmatched_settlements.is_empty());
    assert_eq!(payables.total_paid, Money::from_minor(10_000));
}

#[tokio::test]
async fn receivables_and_aging() {
    let (_, service) = service();
    let provision = service
        .submit_journal_entry(
            EntryDraft::new(day(1), "Honorarios maio", EntryType::Provision)
                .with_document_number("NFS-e 881")
                .with_line(DraftLine::debit("1.1.3.01", Money::from_minor(150_000)).with_counterparty("Cliente Alfa"))
                .with_line(DraftLine::credit("4.1", Money::from_minor(150_000))),
        )
        .await
        .unwrap();
    service
        .submit_journal_entry(
            EntryDraft::new(day(15), "Recebimento parcial", EntryType::Receipt)
                .settling(provision.id)
                .with_line(DraftLine::debit("1.1.2", Money::from_minor(50_000)))
                .with_line(DraftLine::credit("1.1.3.01", Money::from_minor(50_000))),
        )
        .await
        .unwrap();

    let receivables = service.get_receivables(day(1), day(31)).await.unwrap();
    assert_eq!(receivables.records[0].status, ObligationStatus::Partial);
    assert_eq!(receivables.records[0].allocations[0].method, MatchMethod::ExplicitLink);
    assert_eq!(receivables.total_pending, Money::from_minor(100_000));

    let aging = service
        .get_aging(ObligationKind::Receivable, NaiveDate::from_ymd_opt(2025, 7, 15).unwrap())
        .await
        .unwrap();
    assert_eq!(aging.rows.len(), 1);
    assert_eq!(aging.rows[0].amounts[2], Money::from_minor(100_000));
    assert_eq!(aging.total, Money::from_minor(100_000));
}

#[tokio::test]
async fn resubmitting_a_reference_is_idempotent() {
    let (store, service) = service();
    let draft = capital(1_000).with_reference(EntryReference::new("honorarios", "77"));
    let first = service.submit_journal_entry(draft.clone()).await.unwrap();
    let second = service.submit_journal_entry(draft).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(store.entry_count(), 1);
}

#[tokio::test]
async fn legacy_unbalanced_entries_are_flagged_not_fatal() {
    let (store, service) = service();
    let legacy = JournalEntry::from_parts(
        EntryHeader {
            id: Uuid::new_v4(),
            sequence: 0,
            date: day(6),
            description: "Importacao planilha 2019".to_string(),
            document_number: None,
            entry_type: EntryType::Adjustment,
            reference: None,
            settles: None,
        },
        vec![
            JournalLine::from(DraftLine::debit("1.1.1", Money::from_minor(10_000))),
            JournalLine::from(DraftLine::credit("3.1.1", Money::from_minor(9_000))),
            JournalLine::from(DraftLine::credit("1.1", Money::from_minor(500))),
        ],
    );
    store.append(legacy.clone()).await.unwrap();

    let cash = service.get_account_balance("1.1.1", day(1), day(31)).await.unwrap();
    assert_eq!(cash.balance, Money::from_minor(10_000));
    assert_eq!(cash.unbalanced_entries, vec![legacy.id]);

    let audit = service.audit_integrity().await.unwrap();
    assert!(!audit.balanced);
    assert_eq!(audit.difference, Money::from_minor(500));
    assert_eq!(audit.misplaced_postings.len(), 1);

    let trial = service.get_trial_balance(day(1), day(31), false).await.unwrap();
    assert!(!trial.balanced);
}

#[tokio::test]
async fn cache_is_invalidated_by_writes() {
    let mut config = LedgerConfig::default();
    config.cache.enabled = true;
    let (_, service) = service_with(&config);

    service.submit_journal_entry(capital(1_000)).await.unwrap();
    let before = service.get_account_balance("1", day(1), day(31)).await.unwrap();
    assert_eq!(before.balance, Money::from_minor(1_000));
    assert_eq!(service.cache().map(BalanceCache::len), Some(1));

    service.submit_journal_entry(capital(2_000)).await.unwrap();
    assert_eq!(service.cache().map(BalanceCache::len), Some(0));

    let after = service.get_account_balance("1", day(1), day(31)).await.unwrap();
    assert_eq!(after.balance, Money::from_minor(3_000));
}

#[tokio::test]
async fn lookup_and_period_errors() {
    let (_, service) = service();
    assert!(matches!(
        service.get_account_balance("9.9", day(1), day(31)).await,
        Err(AccountingError::NotFound { .. })
    ));
    assert!(matches!(
        service.get_ledger_detail("1.1.1", day(31), day(1)).await,
        Err(AccountingError::Validation(ValidationError::InvalidPeriod { .. }))
    ));
}

#[tokio::test]
async fn ledger_detail_runs_from_zero_each_period() {
    let (_, service) = service();
    service.submit_journal_entry(capital(10_000)).await.unwrap();
    service
        .submit_journal_entry(
            EntryDraft::new(day(20), "Deposito", EntryType::Transfer)
                .with_line(DraftLine::debit("1.1.2", Money::from_minor(4_000)))
                .with_line(DraftLine::credit("1.1.1", Money::from_minor(4_000))),
        )
        .await
        .unwrap();

    let month = service.get_ledger_detail("1.1.1", day(1), day(31)).await.unwrap();
    let running: Vec<i64> = month.iter().map(|l| l.running_balance.minor_units()).collect();
    assert_eq!(running, vec![10_000, 6_000]);

    let late = service.get_ledger_detail("1.1.1", day(10), day(31)).await.unwrap();
    assert_eq!(late.len(), 1);
    assert_eq!(late[0].running_balance, Money::from_minor(-4_000));
}

#[tokio::test]
async fn recomputation_without_writes_is_identical() {
    let (_, service) = service();
    service.submit_journal_entry(capital(12_345)).await.unwrap();
    service
        .submit_journal_entry(
            EntryDraft::new(day(8), "Compra a prazo", EntryType::Provision)
                .with_line(DraftLine::debit("5.1", Money::from_minor(2_000)))
                .with_line(DraftLine::credit("2.1.1", Money::from_minor(2_000)).with_counterparty("Grafica Sul")),
        )
        .await
        .unwrap();

    let first = service.get_payables(day(1), day(31)).await.unwrap();
    let second = service.get_payables(day(1), day(31)).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );

    let trial_a = service.get_trial_balance(day(1), day(31), true).await.unwrap();
    let trial_b = service.get_trial_balance(day(1), day(31), true).await.unwrap();
    assert_eq!(trial_a, trial_b);
}

/// In-memory store that can hold one read between fetching and returning
struct SlowReadStore {
    inner: InMemoryLedgerStore,
    armed: AtomicBool,
    fetched: Notify,
    release: Notify,
}

impl SlowReadStore {
    fn new(accounts: Vec<Account>) -> Self {
        Self {
            inner: InMemoryLedgerStore::new(accounts),
            armed: AtomicBool::new(false),
            fetched: Notify::new(),
            release: Notify::new(),
        }
    }

    /// The next `fetch_entries` parks after reading until `release` is notified
    fn hold_next_read(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl LedgerStore for SlowReadStore {
    async fn append(&self, entry: JournalEntry) -> AccountingResult<JournalEntry> {
        self.inner.append(entry).await
    }

    async fn find_by_reference(
        &self,
        reference: &EntryReference,
        entry_type: EntryType,
    ) -> AccountingResult<Option<JournalEntry>> {
        self.inner.find_by_reference(reference, entry_type).await
    }

    async fn fetch_entries(&self, filter: &EntryFilter) -> AccountingResult<Vec<JournalEntry>> {
        let entries = self.inner.fetch_entries(filter).await?;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.fetched.notify_one();
            self.release.notified().await;
        }
        Ok(entries)
    }
}

#[async_trait]
impl ChartSource for SlowReadStore {
    async fn load_accounts(&self) -> AccountingResult<Vec<Account>> {
        self.inner.load_accounts().await
    }
}

#[tokio::test]
async fn balance_read_overtaken_by_a_write_is_not_cached() {
    let mut config = LedgerConfig::default();
    config.cache.enabled = true;
    let store = Arc::new(SlowReadStore::new(chart()));
    let service = Arc::new(AccountingService::new(store.clone(), &config));
    service.submit_journal_entry(capital(50_000)).await.unwrap();

    store.hold_next_read();
    let reader = {
        let service = service.clone();
        tokio::spawn(async move { service.get_account_balance("1.1.1", day(1), day(31)).await })
    };
    store.fetched.notified().await;

    service
        .submit_journal_entry(
            EntryDraft::new(day(10), "Deposito bancario", EntryType::Transfer)
                .with_line(DraftLine::debit("1.1.2", Money::from_minor(20_000)))
                .with_line(DraftLine::credit("1.1.1", Money::from_minor(20_000))),
        )
        .await
        .unwrap();
    store.release.notify_one();

    let overtaken = reader.await.unwrap().unwrap();
    assert_eq!(overtaken.balance, Money::from_minor(50_000));

    let cache = service.cache().unwrap();
    let may = DateRange::new(day(1), day(31)).unwrap();
    assert!(cache.get("1.1.1", &may).is_none());

    let fresh = service.get_account_balance("1.1.1", day(1), day(31)).await.unwrap();
    assert_eq!(fresh.balance, Money::from_minor(30_000));
    assert!(cache.get("1.1.1", &may).is_some());
}
