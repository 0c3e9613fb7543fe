//! End-to-end pipeline orchestration
//!
//! Glues the stages together: pull the dataset, upload the files into
//! category prefixes, drain the source prefix into bronze tables, then
//! reclaim local scratch space. Collaborators are injected; this module
//! builds nothing itself.

use crate::config::PipelineConfig;
use crate::kaggle::DatasetSource;
use crate::ledger::Ledger;
use crate::sink::BronzeSink;
use crate::store::ObjectStore;
use crate::transfer::{clear_scratch, list_local_files, upload_files};
use crate::worker::{BatchSummary, IngestWorker};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Run the full ingestion pipeline once.
///
/// Cleanup reclaims the whole scratch directory at the end, including the
/// dataset archive and extracted files the source left behind.
pub async fn run(
    config: &PipelineConfig,
    source: &dyn DatasetSource,
    store: &dyn ObjectStore,
    ledger: &dyn Ledger,
    sink: &dyn BronzeSink,
) -> Result<BatchSummary> {
    info!("Starting ingestion pipeline");

    let dataset_dir = source.pull_dataset().await.context("Dataset pull failed")?;

    let files = list_local_files(&dataset_dir)?;
    info!("Dataset contains {} files", files.len());

    upload_files(store, &files, &config.source_prefix).await?;

    let summary = ingest(config, store, ledger, sink).await?;

    clear_scratch(Path::new(&config.scratch_dir))?;

    info!("Pipeline finished: {}", summary);

    Ok(summary)
}

/// Run only the load stage: drain the source prefix into bronze tables.
pub async fn ingest(
    config: &PipelineConfig,
    store: &dyn ObjectStore,
    ledger: &dyn Ledger,
    sink: &dyn BronzeSink,
) -> Result<BatchSummary> {
    let worker = IngestWorker::new(store, ledger, sink, config);
    worker.ingest_all(&config.source_prefix).await
}
