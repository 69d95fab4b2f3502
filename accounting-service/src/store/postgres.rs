//! PostgreSQL-backed ledger store
//!
//! Entries and their lines are written in one transaction, so readers never
//! see half an entry. `journal_lines.account_code` deliberately carries no
//! foreign key to the chart: imported legacy rows may reference accounts that
//! no longer exist and the integrity audit has to be able to see them.

use crate::{
    error::{AccountingError, AccountingResult},
    models::*,
    money::Money,
    store::{ChartSource, EntryFilter, LedgerStore},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{postgres::PgPoolOptions, postgres::PgRow, PgPool, Row};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, info, warn};
use uuid::Uuid;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS chart_of_accounts (
        code TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        account_type TEXT NOT NULL,
        is_synthetic BOOLEAN NOT NULL DEFAULT FALSE,
        is_active BOOLEAN NOT NULL DEFAULT TRUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS journal_entries (
        id UUID PRIMARY KEY,
        sequence BIGSERIAL UNIQUE,
        entry_date DATE NOT NULL,
        description TEXT NOT NULL,
        document_number TEXT,
        entry_type TEXT NOT NULL,
        reference_kind TEXT,
        reference_id TEXT,
        settles UUID,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS journal_entries_reference_idx
        ON journal_entries (reference_kind, reference_id, entry_type)
        WHERE reference_kind IS NOT NULL
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS journal_entries_date_idx
        ON journal_entries (entry_date, sequence)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS journal_lines (
        entry_id UUID NOT NULL REFERENCES journal_entries(id),
        line_no INTEGER NOT NULL,
        account_code TEXT NOT NULL,
        debit BIGINT NOT NULL DEFAULT 0,
        credit BIGINT NOT NULL DEFAULT 0,
        counterparty TEXT,
        PRIMARY KEY (entry_id, line_no)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS journal_lines_account_idx
        ON journal_lines (account_code)
    "#,
];

fn storage_error(action: &str) -> impl Fn(sqlx::Error) -> AccountingError + '_ {
    move |e| AccountingError::Store(format!("Failed to {action}: {e}"))
}

/// PostgreSQL-backed ledger store
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// [`AccountingError::Store`] when the pool cannot connect.
    pub async fn connect(database_url: &str, max_connections: u32) -> AccountingResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(storage_error("connect"))?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they do not exist
    ///
    /// # Errors
    ///
    /// [`AccountingError::Store`] when a DDL statement fails.
    pub async fn migrate(&self) -> AccountingResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(storage_error("apply schema"))?;
        }
        info!("Ledger schema ready");
        Ok(())
    }

    /// Insert or update chart accounts in one transaction
    ///
    /// # Errors
    ///
    /// [`AccountingError::Store`] when the write fails.
    pub async fn upsert_accounts(&self, accounts: &[Account]) -> AccountingResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(storage_error("start transaction"))?;

        for account in accounts {
            sqlx::query(
                r#"
                INSERT INTO chart_of_accounts (code, name, account_type, is_synthetic, is_active)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (code) DO UPDATE
                SET name = EXCLUDED.name,
                    account_type = EXCLUDED.account_type,
                    is_synthetic = EXCLUDED.is_synthetic,
                    is_active = EXCLUDED.is_active
                "#,
            )
            .bind(&account.code)
            .bind(&account.name)
            .bind(account.account_type.as_str())
            .bind(account.is_synthetic)
            .bind(account.is_active)
            .execute(&mut *tx)
            .await
            .map_err(storage_error("upsert account"))?;
        }

        tx.commit().await.map_err(storage_error("commit accounts"))?;
        debug!("Upserted {} accounts", accounts.len());
        Ok(())
    }

    async fn load_lines(&self, entry_ids: &[Uuid]) -> AccountingResult<HashMap<Uuid, Vec<JournalLine>>> {
        let rows = sqlx::query(
            r#"
            SELECT entry_id, account_code, debit, credit, counterparty
            FROM journal_lines
            WHERE entry_id = ANY($1)
            ORDER BY entry_id, line_no
            "#,
        )
        .bind(entry_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error("read journal lines"))?;

        let mut lines: HashMap<Uuid, Vec<JournalLine>> = HashMap::new();
        for row in rows {
            let entry_id: Uuid = row.try_get("entry_id").map_err(storage_error("decode line"))?;
            let line = JournalLine {
                account_code: row.try_get("account_code").map_err(storage_error("decode line"))?,
                debit: Money::from_minor(row.try_get("debit").map_err(storage_error("decode line"))?),
                credit: Money::from_minor(row.try_get("credit").map_err(storage_error("decode line"))?),
                counterparty: row.try_get("counterparty").map_err(storage_error("decode line"))?,
            };
            lines.entry(entry_id).or_default().push(line);
        }
        Ok(lines)
    }

    async fn assemble(&self, rows: Vec<PgRow>) -> AccountingResult<Vec<JournalEntry>> {
        let headers = rows
            .iter()
            .map(decode_header)
            .collect::<AccountingResult<Vec<EntryHeader>>>()?;
        let ids: Vec<Uuid> = headers.iter().map(|header| header.id).collect();
        let mut lines = self.load_lines(&ids).await?;

        Ok(headers
            .into_iter()
            .map(|header| {
                let entry_lines = lines.remove(&header.id).unwrap_or_default();
                JournalEntry::from_parts(header, entry_lines)
            })
            .collect())
    }
}

fn decode_header(row: &PgRow) -> AccountingResult<EntryHeader> {
    let decode = storage_error("decode entry");
    let raw_type: String = row.try_get("entry_type").map_err(&decode)?;
    let entry_type = EntryType::from_str(&raw_type).unwrap_or_else(|reason| {
        warn!(%reason, "Unknown entry type in storage; treating as adjustment");
        EntryType::Adjustment
    });
    let sequence: i64 = row.try_get("sequence").map_err(&decode)?;
    let reference_kind: Option<String> = row.try_get("reference_kind").map_err(&decode)?;
    let reference_id: Option<String> = row.try_get("reference_id").map_err(&decode)?;

    Ok(EntryHeader {
        id: row.try_get("id").map_err(&decode)?,
        sequence: u64::try_from(sequence).map_err(|e| AccountingError::Store(e.to_string()))?,
        date: row.try_get("entry_date").map_err(&decode)?,
        description: row.try_get("description").map_err(&decode)?,
        document_number: row.try_get("document_number").map_err(&decode)?,
        entry_type,
        reference: reference_kind
            .zip(reference_id)
            .map(|(kind, id)| EntryReference { kind, id }),
        settles: row.try_get("settles").map_err(&decode)?,
    })
}

const ENTRY_COLUMNS: &str = "e.id, e.sequence, e.entry_date, e.description, e.document_number, \
     e.entry_type, e.reference_kind, e.reference_id, e.settles";

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn append(&self, entry: JournalEntry) -> AccountingResult<JournalEntry> {
        debug!(entry_id = %entry.id, "Appending journal entry to PostgreSQL");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(storage_error("start transaction"))?;

        let sequence: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO journal_entries (
                id, entry_date, description, document_number, entry_type,
                reference_kind, reference_id, settles
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING sequence
            "#,
        )
        .bind(entry.id)
        .bind(entry.date)
        .bind(&entry.description)
        .bind(&entry.document_number)
        .bind(entry.entry_type.as_str())
        .bind(entry.reference.as_ref().map(|r| r.kind.as_str()))
        .bind(entry.reference.as_ref().map(|r| r.id.as_str()))
        .bind(entry.settles)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_error("insert journal entry"))?;

        for (line_no, line) in entry.lines.iter().enumerate() {
            let line_no = i32::try_from(line_no).map_err(|e| AccountingError::Store(e.to_string()))?;
            sqlx::query(
                r#"
                INSERT INTO journal_lines (entry_id, line_no, account_code, debit, credit, counterparty)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(entry.id)
            .bind(line_no)
            .bind(&line.account_code)
            .bind(line.debit.minor_units())
            .bind(line.credit.minor_units())
            .bind(&line.counterparty)
            .execute(&mut *tx)
            .await
            .map_err(storage_error("insert journal line"))?;
        }

        tx.commit().await.map_err(storage_error("commit journal entry"))?;

        let sequence = u64::try_from(sequence).map_err(|e| AccountingError::Store(e.to_string()))?;
        info!(entry_id = %entry.id, sequence, "Journal entry stored");
        Ok(entry.with_sequence(sequence))
    }

    async fn find_by_reference(
        &self,
        reference: &EntryReference,
        entry_type: EntryType,
    ) -> AccountingResult<Option<JournalEntry>> {
        let query = format!(
            "SELECT {ENTRY_COLUMNS} FROM journal_entries e \
             WHERE e.reference_kind = $1 AND e.reference_id = $2 AND e.entry_type = $3"
        );
        let rows = sqlx::query(&query)
            .bind(&reference.kind)
            .bind(&reference.id)
            .bind(entry_type.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error("look up reference"))?;

        Ok(self.assemble(rows).await?.into_iter().next())
    }

    async fn fetch_entries(&self, filter: &EntryFilter) -> AccountingResult<Vec<JournalEntry>> {
        debug!(?filter, "Fetching journal entries");

        let query = format!(
            "SELECT {ENTRY_COLUMNS} FROM journal_entries e \
             WHERE ($1::date IS NULL OR e.entry_date >= $1) \
               AND ($2::date IS NULL OR e.entry_date <= $2) \
               AND (cardinality($3::text[]) = 0 OR e.entry_type = ANY($3)) \
               AND (cardinality($4::text[]) = 0 OR EXISTS ( \
                     SELECT 1 FROM journal_lines l, unnest($4::text[]) AS p(prefix) \
                     WHERE l.entry_id = e.id \
                       AND (l.account_code = p.prefix OR l.account_code LIKE p.prefix || '.%'))) \
             ORDER BY e.entry_date, e.sequence"
        );

        let start: Option<NaiveDate> = filter.period.and_then(|p| p.lower_bound());
        let end: Option<NaiveDate> = filter.period.map(|p| p.end);
        let types: Vec<String> = filter
            .entry_types
            .iter()
            .map(|t| t.as_str().to_string())
            .collect();

        let rows = sqlx::query(&query)
            .bind(start)
            .bind(end)
            .bind(&types)
            .bind(&filter.account_prefixes)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error("read journal entries"))?;

        let entries = self.assemble(rows).await?;
        debug!("Found {} entries", entries.len());
        Ok(entries)
    }
}

#[async_trait]
impl ChartSource for PostgresLedgerStore {
    async fn load_accounts(&self) -> AccountingResult<Vec<Account>> {
        let rows = sqlx::query(
            "SELECT code, name, account_type, is_synthetic, is_active FROM chart_of_accounts",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error("read chart of accounts"))?;

        rows.iter()
            .map(|row| {
                let decode = storage_error("decode account");
                let raw_type: String = row.try_get("account_type").map_err(&decode)?;
                Ok(Account {
                    code: row.try_get("code").map_err(&decode)?,
                    name: row.try_get("name").map_err(&decode)?,
                    account_type: AccountType::from_str(&raw_type).map_err(AccountingError::Store)?,
                    is_synthetic: row.try_get("is_synthetic").map_err(&decode)?,
                    is_active: row.try_get("is_active").map_err(&decode)?,
                })
            })
            .collect()
    }
}
