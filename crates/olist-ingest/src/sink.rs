//! Relational bronze sink
//!
//! Loads parsed CSV rows into `<schema>.<table>` with every column as
//! TEXT. [`PgBronzeSink`] runs each load inside a single transaction, so a
//! failed insert leaves no partial table behind and the worker can retry
//! the whole file on the next run.

use crate::config::WriteMode;
use crate::csv_read::CsvFile;
use crate::db::{qualified, quote_ident};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use thiserror::Error;
use tracing::{debug, info};

/// Postgres caps bind parameters per statement at 65535; chunk inserts so
/// rows_per_chunk * columns stays safely below it.
const MAX_BIND_PARAMS: usize = 60_000;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("load failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("CSV has no columns")]
    NoColumns,
}

/// Destination for parsed rows, one table per category.
#[async_trait]
pub trait BronzeSink: Send + Sync {
    /// Load `file` into `table`, returning the number of rows written.
    async fn write_rows(
        &self,
        table: &str,
        file: &CsvFile,
        mode: WriteMode,
    ) -> Result<u64, SinkError>;
}

/// Postgres bronze sink.
#[derive(Clone)]
pub struct PgBronzeSink {
    pool: PgPool,
    schema: String,
}

impl PgBronzeSink {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        Self {
            pool,
            schema: schema.into(),
        }
    }

    /// Run a raw DDL statement.
    pub async fn execute_ddl(&self, statement: &str) -> Result<(), SinkError> {
        sqlx::query(statement).execute(&self.pool).await?;
        Ok(())
    }

    /// Create the bronze schema if it does not exist. Idempotent.
    pub async fn ensure_schema(&self) -> Result<(), SinkError> {
        self.execute_ddl(&format!(
            "CREATE SCHEMA IF NOT EXISTS {}",
            quote_ident(&self.schema)
        ))
        .await?;

        debug!("Schema {} ready", self.schema);

        Ok(())
    }

    fn create_table_sql(&self, table: &str, columns: &[String]) -> String {
        let column_defs: Vec<String> = columns
            .iter()
            .map(|c| format!("{} TEXT", quote_ident(c)))
            .collect();

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            qualified(&self.schema, table),
            column_defs.join(", ")
        )
    }
}

#[async_trait]
impl BronzeSink for PgBronzeSink {
    async fn write_rows(
        &self,
        table: &str,
        file: &CsvFile,
        mode: WriteMode,
    ) -> Result<u64, SinkError> {
        if file.columns.is_empty() {
            return Err(SinkError::NoColumns);
        }

        let target = qualified(&self.schema, table);
        let mut tx = self.pool.begin().await?;

        if mode == WriteMode::Replace {
            sqlx::query(&format!("DROP TABLE IF EXISTS {}", target))
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(&self.create_table_sql(table, &file.columns))
            .execute(&mut *tx)
            .await?;

        let column_list: Vec<String> =
            file.columns.iter().map(|c| quote_ident(c)).collect();
        let insert_prefix = format!("INSERT INTO {} ({}) ", target, column_list.join(", "));

        let rows_per_chunk = (MAX_BIND_PARAMS / file.columns.len()).max(1);
        let mut written = 0u64;

        for chunk in file.rows.chunks(rows_per_chunk) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(&insert_prefix);
            builder.push_values(chunk, |mut b, row| {
                for value in row {
                    b.push_bind(value.as_str());
                }
            });

            let result = builder.build().execute(&mut *tx).await?;
            written += result.rows_affected();
        }

        tx.commit().await?;

        info!(
            "Loaded {} rows into {} ({:?} mode)",
            written, target, mode
        );

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_table_sql_quotes_identifiers() {
        let sink = PgBronzeSink {
            pool: PgPool::connect_lazy("postgresql://localhost/olist").unwrap(),
            schema: "bronze".to_string(),
        };

        let sql = sink.create_table_sql(
            "orders",
            &["order_id".to_string(), "customer_id".to_string()],
        );
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS \"bronze\".\"orders\" (\"order_id\" TEXT, \"customer_id\" TEXT)"
        );
    }
}
