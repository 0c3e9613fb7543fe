//! Postgres connection pool and SQL identifier helpers

use crate::config::DbConfig;
use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Create a connection pool from configuration.
pub async fn connect(config: &DbConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect(&config.url)
        .await
        .context("Failed to connect to database")?;

    Ok(pool)
}

/// Quote a SQL identifier. Table and schema names cannot be bound as
/// parameters, so everything interpolated into DDL goes through here.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Fully qualified, quoted `schema.table` reference.
pub fn qualified(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_plain_identifiers() {
        assert_eq!(quote_ident("orders"), "\"orders\"");
    }

    #[test]
    fn escapes_embedded_quotes() {
        assert_eq!(quote_ident("bad\"name"), "\"bad\"\"name\"");
    }

    #[test]
    fn qualified_reference() {
        assert_eq!(qualified("bronze", "order_items"), "\"bronze\".\"order_items\"");
    }
}
