//! Processed-file ledger
//!
//! Durable record of every object key the pipeline has ingested. The
//! primary key on the file key is what makes re-runs (and accidental
//! double-invocations) idempotent: a second `mark_processed` for the same
//! key yields [`LedgerError::Duplicate`], which callers treat as
//! already-processed rather than a failure.
//!
//! Records are insert-only. Nothing ever updates or deletes them; the
//! table doubles as an audit trail of what was loaded and when.

use crate::db::{qualified, quote_ident};
use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, info};

/// Ledger table name inside the bronze schema.
const LEDGER_TABLE: &str = "processed_files";

#[derive(Error, Debug)]
pub enum LedgerError {
    /// The key is already recorded; callers treat this as already-processed.
    #[error("file '{0}' is already recorded as processed")]
    Duplicate(String),

    #[error("ledger query failed: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Durable record of which file keys have been ingested.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// True iff a record with this key exists.
    async fn has_processed(&self, key: &str) -> Result<bool, LedgerError>;

    /// Insert a record for `key`. Fails with [`LedgerError::Duplicate`]
    /// when the key already exists.
    async fn mark_processed(&self, key: &str) -> Result<(), LedgerError>;
}

/// Postgres-backed ledger, one row per ingested object key.
#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
    schema: String,
}

impl PgLedger {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        Self {
            pool,
            schema: schema.into(),
        }
    }

    /// Create the schema and ledger table if they do not exist.
    /// Safe to call on every startup.
    pub async fn init(&self) -> Result<(), LedgerError> {
        sqlx::query(&format!(
            "CREATE SCHEMA IF NOT EXISTS {}",
            quote_ident(&self.schema)
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                file_key TEXT PRIMARY KEY,
                processed_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
            qualified(&self.schema, LEDGER_TABLE)
        ))
        .execute(&self.pool)
        .await?;

        info!("Ledger table {}.{} ready", self.schema, LEDGER_TABLE);

        Ok(())
    }
}

#[async_trait]
impl Ledger for PgLedger {
    async fn has_processed(&self, key: &str) -> Result<bool, LedgerError> {
        let exists: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE file_key = $1)",
            qualified(&self.schema, LEDGER_TABLE)
        ))
        .bind(key)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn mark_processed(&self, key: &str) -> Result<(), LedgerError> {
        let result = sqlx::query(&format!(
            "INSERT INTO {} (file_key) VALUES ($1)",
            qualified(&self.schema, LEDGER_TABLE)
        ))
        .bind(key)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!("Recorded {} in ledger", key);
                Ok(())
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(LedgerError::Duplicate(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
