//! Olist bronze-layer ingestion
//!
//! Batch ETL pipeline for the Olist Brazilian e-commerce dataset: pull the
//! archive from Kaggle, upload the raw CSVs to object storage under
//! category prefixes, and load recognized files into Postgres bronze
//! tables. A durable processed-file ledger makes re-runs idempotent.
//!
//! # Example
//!
//! ```no_run
//! use olist_ingest::config::Config;
//! use olist_ingest::ledger::PgLedger;
//! use olist_ingest::sink::PgBronzeSink;
//! use olist_ingest::store::S3Store;
//! use olist_ingest::{db, pipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::connect(&config.database).await?;
//!     let store = S3Store::new(&config.storage).await?;
//!     let ledger = PgLedger::new(pool.clone(), config.pipeline.schema.clone());
//!     let sink = PgBronzeSink::new(pool, config.pipeline.schema.clone());
//!
//!     ledger.init().await?;
//!     pipeline::ingest(&config.pipeline, &store, &ledger, &sink).await?;
//!     Ok(())
//! }
//! ```

pub mod classifier;
pub mod config;
pub mod csv_read;
pub mod db;
pub mod kaggle;
pub mod ledger;
pub mod pipeline;
pub mod sink;
pub mod store;
pub mod transfer;
pub mod worker;

pub use classifier::Category;
pub use config::{Config, WriteMode};
pub use worker::{BatchSummary, FileOutcome, IngestWorker, SkipReason};
