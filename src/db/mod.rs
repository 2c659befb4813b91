//! Reads and writes the SQLite database that holds the transactions.

pub(crate) mod migrations;

use crate::error::Res;
use crate::model::{
    Amount, Status, Transaction, TransactionFilter, TransactionRecord, TransactionType,
};
use crate::pagination::{Page, PageRequest};
use anyhow::{bail, Context};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, trace};

const COLUMNS: &str = "id, transaction_type, status, transaction_number, amount, year";

#[derive(Debug, Clone)]
pub(crate) struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Creates a new SQLite file at `path` and brings its schema to the current version. It is an
    /// error for a file to already exist at `path`.
    pub(crate) async fn init(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        if path.exists() {
            bail!("A database already exists at '{}'", path.display());
        }
        let pool = connect(path, true).await?;
        sqlx::query("CREATE TABLE schema_version (version INTEGER NOT NULL)")
            .execute(&pool)
            .await
            .context("Unable to create the schema_version table")?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
            .execute(&pool)
            .await
            .context("Unable to initialize the schema version")?;
        migrations::run(&pool, 0, migrations::CURRENT_VERSION).await?;
        debug!("Created database at {}", path.display());
        Ok(Self { pool })
    }

    /// Opens the existing SQLite file at `path`, migrating its schema forward if it is out of
    /// date.
    pub(crate) async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("The database file is missing '{}'", path.display());
        }
        let pool = connect(path, false).await?;
        let (version,): (i32,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
            .fetch_one(&pool)
            .await
            .context("Unable to read the schema version")?;
        if version > migrations::CURRENT_VERSION {
            bail!(
                "The database schema version {version} is newer than this program supports ({})",
                migrations::CURRENT_VERSION
            );
        }
        migrations::run(&pool, version, migrations::CURRENT_VERSION).await?;
        Ok(Self { pool })
    }

    /// Inserts `transactions` in a single SQL transaction and returns how many rows were written.
    /// When `reset` is true all existing rows are deleted first. If any `transaction_number` is
    /// already taken nothing is written.
    pub(crate) async fn insert_transactions(
        &self,
        transactions: &[Transaction],
        reset: bool,
    ) -> Res<u64> {
        let mut tx = self.pool.begin().await.context("Unable to begin transaction")?;

        if reset {
            let deleted = sqlx::query("DELETE FROM transactions")
                .execute(&mut *tx)
                .await
                .context("Unable to delete existing transactions")?
                .rows_affected();
            debug!("Deleted {deleted} existing transactions");
        }

        let mut inserted = 0;
        for t in transactions {
            let result = sqlx::query(
                "INSERT INTO transactions \
                 (transaction_type, status, transaction_number, amount, year) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(t.transaction_type.as_str())
            .bind(t.status.as_str())
            .bind(&t.transaction_number)
            .bind(t.amount.to_string())
            .bind(i64::from(t.year))
            .execute(&mut *tx)
            .await;

            match result {
                Ok(r) => inserted += r.rows_affected(),
                Err(sqlx::Error::Database(e)) if e.is_unique_violation() => bail!(
                    "Failed to insert transactions due to duplicate transaction_number '{}', \
                     already present in the database or within the file. Use --reset to start \
                     from a clean slate if appropriate.",
                    t.transaction_number
                ),
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Unable to insert transaction '{}'", t.transaction_number)
                    })
                }
            }
        }

        tx.commit().await.context("Unable to commit transaction")?;
        Ok(inserted)
    }

    /// The number of rows in the transactions table.
    pub(crate) async fn count_transactions(&self) -> Res<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await
            .context("Unable to count transactions")?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// One page of the transactions that match `filter`, ordered newest year first and then by
    /// transaction number. The count and the page are read in the same SQL transaction.
    pub(crate) async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> Res<Page<TransactionRecord>> {
        let mut tx = self.pool.begin().await.context("Unable to begin transaction")?;

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM transactions");
        push_filter(&mut count_query, filter);
        let count: i64 = count_query
            .build_query_scalar()
            .fetch_one(&mut *tx)
            .await
            .context("Unable to count transactions")?;
        let count = u64::try_from(count).unwrap_or_default();

        let window = page.resolve(count)?;

        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM transactions"));
        push_filter(&mut query, filter);
        query.push(" ORDER BY year DESC, transaction_number ASC LIMIT ");
        query.push_bind(i64::try_from(window.limit()).unwrap_or(i64::MAX));
        query.push(" OFFSET ");
        query.push_bind(i64::try_from(window.offset()).unwrap_or(i64::MAX));
        let rows = query
            .build()
            .fetch_all(&mut *tx)
            .await
            .context("Unable to query transactions")?;
        tx.commit().await.context("Unable to commit transaction")?;

        let results = rows.iter().map(record).collect::<Res<Vec<_>>>()?;
        trace!(
            "Listed page {} of {} ({} of {count} transactions)",
            window.number,
            window.num_pages,
            results.len()
        );
        Ok(Page::new(count, window, results))
    }

    /// Every transaction that matches `filter`, in no particular order.
    pub(crate) async fn fetch_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Res<Vec<Transaction>> {
        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM transactions"));
        push_filter(&mut query, filter);
        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Unable to query transactions")?;
        rows.iter()
            .map(|row| record(row).map(|r| r.transaction))
            .collect()
    }
}

/// Anything that can supply a filtered snapshot of transactions for a report.
#[async_trait]
pub(crate) trait TransactionSource {
    async fn transactions(&self, filter: &TransactionFilter) -> Res<Vec<Transaction>>;
}

#[async_trait]
impl TransactionSource for Db {
    async fn transactions(&self, filter: &TransactionFilter) -> Res<Vec<Transaction>> {
        self.fetch_transactions(filter).await
    }
}

#[async_trait]
impl TransactionSource for Vec<Transaction> {
    async fn transactions(&self, filter: &TransactionFilter) -> Res<Vec<Transaction>> {
        Ok(self.iter().filter(|t| filter.matches(t)).cloned().collect())
    }
}

async fn connect(path: &Path, create: bool) -> Res<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(create)
        .foreign_keys(true);
    SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .with_context(|| format!("Unable to open SQLite database at '{}'", path.display()))
}

fn push_filter(query: &mut QueryBuilder<'_, Sqlite>, filter: &TransactionFilter) {
    let mut separator = " WHERE ";
    if let Some(t) = &filter.transaction_type {
        query.push(separator).push("transaction_type = ").push_bind(t.clone());
        separator = " AND ";
    }
    if let Some(s) = &filter.status {
        query.push(separator).push("status = ").push_bind(s.clone());
        separator = " AND ";
    }
    if let Some(y) = filter.year {
        query.push(separator).push("year = ").push_bind(y);
    }
}

fn record(row: &SqliteRow) -> Res<TransactionRecord> {
    let id: i64 = row.try_get("id")?;
    let transaction_type: String = row.try_get("transaction_type")?;
    let status: String = row.try_get("status")?;
    let transaction_number: String = row.try_get("transaction_number")?;
    let amount: String = row.try_get("amount")?;
    let year: i64 = row.try_get("year")?;

    let transaction = Transaction::new(
        TransactionType::from_str(&transaction_type)
            .with_context(|| format!("Bad transaction_type '{transaction_type}' in row {id}"))?,
        Status::from_str(&status).with_context(|| format!("Bad status '{status}' in row {id}"))?,
        transaction_number,
        Amount::from_str(&amount).with_context(|| format!("Bad amount '{amount}' in row {id}"))?,
        u16::try_from(year).with_context(|| format!("Bad year {year} in row {id}"))?,
    );
    Ok(TransactionRecord { id, transaction })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::PageNumber;
    use crate::test::{sample_transactions, transaction_factory};
    use tempfile::TempDir;

    async fn new_db() -> (TempDir, Db) {
        let dir = TempDir::new().unwrap();
        let db = Db::init(dir.path().join("ledger.sqlite")).await.unwrap();
        (dir, db)
    }

    fn numbers(page: &Page<TransactionRecord>) -> Vec<String> {
        page.results
            .iter()
            .map(|r| r.transaction.transaction_number.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_init_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.sqlite");
        let db = Db::init(&path).await.unwrap();
        db.insert_transactions(&sample_transactions(), false)
            .await
            .unwrap();
        drop(db);

        assert!(Db::init(&path).await.is_err());
        let db = Db::load(&path).await.unwrap();
        assert_eq!(db.count_transactions().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(Db::load(dir.path().join("nope.sqlite")).await.is_err());
    }

    #[tokio::test]
    async fn test_list_order() {
        let (_dir, db) = new_db().await;
        let mut transactions = sample_transactions();
        transactions.extend(transaction_factory(2, "OLD-", 0).into_iter().map(|mut t| {
            t.year = 2020;
            t
        }));
        db.insert_transactions(&transactions, false).await.unwrap();

        let page = db
            .list_transactions(&TransactionFilter::default(), PageRequest::first(10))
            .await
            .unwrap();
        assert_eq!(page.count, 5);
        assert_eq!(
            numbers(&page),
            vec![
                "BILL-UNPAID-2024-1",
                "INV-PAID-2024-1",
                "INV-UNPAID-2024-1",
                "OLD-0",
                "OLD-1"
            ]
        );
        assert!(page.results.iter().all(|r| r.id > 0));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let (_dir, db) = new_db().await;
        db.insert_transactions(&sample_transactions(), false)
            .await
            .unwrap();

        let filter = TransactionFilter::from_params(Some("invoice"), Some("unpaid"), Some("2024"));
        let page = db
            .list_transactions(&filter, PageRequest::first(10))
            .await
            .unwrap();
        assert_eq!(numbers(&page), vec!["INV-UNPAID-2024-1"]);

        let filter = TransactionFilter::from_params(Some("receipt"), None, None);
        let page = db
            .list_transactions(&filter, PageRequest::first(10))
            .await
            .unwrap();
        assert_eq!(page.count, 0);
        assert!(page.results.is_empty());
    }

    #[tokio::test]
    async fn test_list_pages() {
        let (_dir, db) = new_db().await;
        db.insert_transactions(&transaction_factory(15, "INV-", 0), false)
            .await
            .unwrap();

        let page = db
            .list_transactions(
                &TransactionFilter::default(),
                PageRequest::new(PageNumber::Number(2), 10),
            )
            .await
            .unwrap();
        assert_eq!(page.count, 15);
        assert_eq!(page.results.len(), 5);
        assert_eq!(page.window.previous(), Some(1));
        assert_eq!(page.window.next(), None);

        let past_end = db
            .list_transactions(
                &TransactionFilter::default(),
                PageRequest::new(PageNumber::Number(3), 10),
            )
            .await;
        assert!(past_end.is_err());
    }

    #[tokio::test]
    async fn test_amounts_are_exact() {
        let (_dir, db) = new_db().await;
        let mut t = transaction_factory(1, "X-", 0).remove(0);
        t.amount = Amount::from_str("9999999999.99").unwrap();
        db.insert_transactions(&[t.clone()], false).await.unwrap();
        let fetched = db
            .fetch_transactions(&TransactionFilter::default())
            .await
            .unwrap();
        assert_eq!(fetched, vec![t]);
    }

    #[tokio::test]
    async fn test_duplicate_number_inserts_nothing() {
        let (_dir, db) = new_db().await;
        db.insert_transactions(&sample_transactions(), false)
            .await
            .unwrap();

        let mut more = transaction_factory(2, "NEW-", 0);
        more.push(sample_transactions().remove(0));
        let err = db.insert_transactions(&more, false).await.unwrap_err();
        assert!(err.to_string().contains("INV-PAID-2024-1"));
        assert_eq!(db.count_transactions().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_reset_replaces_rows() {
        let (_dir, db) = new_db().await;
        db.insert_transactions(&sample_transactions(), false)
            .await
            .unwrap();
        let inserted = db
            .insert_transactions(&sample_transactions(), true)
            .await
            .unwrap();
        assert_eq!(inserted, 3);
        assert_eq!(db.count_transactions().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_transaction_source() {
        let (_dir, db) = new_db().await;
        db.insert_transactions(&sample_transactions(), false)
            .await
            .unwrap();
        let filter = TransactionFilter::from_params(None, Some("unpaid"), None);

        let mut from_db = db.transactions(&filter).await.unwrap();
        let mut from_vec = sample_transactions().transactions(&filter).await.unwrap();
        from_db.sort_by(|a, b| a.transaction_number.cmp(&b.transaction_number));
        from_vec.sort_by(|a, b| a.transaction_number.cmp(&b.transaction_number));
        assert_eq!(from_db.len(), 2);
        assert_eq!(from_db, from_vec);
    }
}
