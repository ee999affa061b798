// services/payments-rs/src/store.rs

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::fingerprint::{mask_card, Fingerprint, PaymentPayload};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const CREATE_PAYMENTS: &str = r#"
    CREATE TABLE IF NOT EXISTS payments (
        id TEXT PRIMARY KEY,
        ccNumber TEXT NOT NULL,
        amount TEXT NOT NULL,
        createdAt TEXT NOT NULL
    )"#;

/// One row of `payments`. Written once, never updated.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentRecord {
    pub id: String,
    #[serde(rename = "ccNumber")]
    #[sqlx(rename = "ccNumber")]
    pub card_number: String,
    pub amount: String,
    #[serde(rename = "createdAt")]
    #[sqlx(rename = "createdAt")]
    pub created_at: String,
}

impl fmt::Debug for PaymentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentRecord")
            .field("id", &self.id)
            .field("card_number", &mask_card(&self.card_number))
            .field("amount", &self.amount)
            .field("created_at", &self.created_at)
            .finish()
    }
}

#[derive(Debug)]
pub enum InsertOutcome {
    Created(PaymentRecord),
    /// Row was already there; carries the stored row, not the caller's input.
    Existing(PaymentRecord),
}

impl InsertOutcome {
    pub fn created(&self) -> bool {
        matches!(self, InsertOutcome::Created(_))
    }

    pub fn into_parts(self) -> (PaymentRecord, bool) {
        match self {
            InsertOutcome::Created(r) => (r, true),
            InsertOutcome::Existing(r) => (r, false),
        }
    }
}

/// Durable store for payment records, keyed by fingerprint.
#[derive(Clone)]
pub struct PaymentStore {
    pool: SqlitePool,
}

impl PaymentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Opens (creating if missing) the database at `url` and ensures the schema.
    pub async fn connect(url: &str, max_connections: u32) -> sqlx::Result<Self> {
        let in_memory = is_memory_url(url);
        let mut opts = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .busy_timeout(BUSY_TIMEOUT);
        if !in_memory {
            opts = opts.journal_mode(SqliteJournalMode::Wal);
        }

        // every connection to `:memory:` is its own database, so pin exactly one
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(opts)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .connect_with(opts)
                .await?
        };

        let store = Self::new(pool);
        store.init_schema().await?;
        info!(in_memory, "payment store ready");
        Ok(store)
    }

    /// Safe to call repeatedly.
    pub async fn init_schema(&self) -> sqlx::Result<()> {
        sqlx::query(CREATE_PAYMENTS).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn get(&self, fingerprint: &Fingerprint) -> sqlx::Result<Option<PaymentRecord>> {
        sqlx::query_as::<_, PaymentRecord>(
            r#"SELECT id, ccNumber, amount, createdAt
               FROM payments
               WHERE id = ?1"#,
        )
        .bind(fingerprint.as_str())
        .fetch_optional(&self.pool)
        .await
    }

    /// Create-if-absent.
    ///
    /// The uniqueness decision is made by SQLite's primary key inside a single
    /// transaction, so concurrent callers with the same fingerprint all end up
    /// with the one row that won. The conflict target is `id` only: any other
    /// constraint failure is returned as an error, never as `Existing`.
    pub async fn insert_if_absent(
        &self,
        fingerprint: &Fingerprint,
        payload: &PaymentPayload,
        now: &str,
    ) -> sqlx::Result<InsertOutcome> {
        let mut tx = self.pool.begin().await?;

        // 1) insert, ignoring a duplicate key
        let inserted = sqlx::query(
            r#"INSERT INTO payments (id, ccNumber, amount, createdAt)
               VALUES (?1, ?2, ?3, ?4)
               ON CONFLICT(id) DO NOTHING"#,
        )
        .bind(fingerprint.as_str())
        .bind(&payload.card_number)
        .bind(&payload.amount)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        // 2) read back whichever row owns the key
        let row = sqlx::query_as::<_, PaymentRecord>(
            r#"SELECT id, ccNumber, amount, createdAt
               FROM payments
               WHERE id = ?1"#,
        )
        .bind(fingerprint.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        if inserted == 1 {
            Ok(InsertOutcome::Created(row))
        } else {
            Ok(InsertOutcome::Existing(row))
        }
    }

    /// All rows in insertion order.
    pub async fn list_all(&self) -> sqlx::Result<Vec<PaymentRecord>> {
        sqlx::query_as::<_, PaymentRecord>(
            r#"SELECT id, ccNumber, amount, createdAt
               FROM payments
               ORDER BY rowid"#,
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn count(&self) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM payments")
            .fetch_one(&self.pool)
            .await
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}
