//! Ingestion worker
//!
//! Drains a remote prefix: every listed object is skipped (empty, already
//! recorded, or unrecognized) or fetched, loaded into its bronze table,
//! recorded in the ledger, and relocated to the processed prefix.
//!
//! Ordering is the idempotence contract: the ledger record is written only
//! after the load succeeds, so any earlier failure leaves the file
//! unrecorded and the next run retries it. A crash between load and mark
//! can duplicate rows (at-least-once, not exactly-once); a duplicate mark
//! is treated as already-processed, never as a failure.
//!
//! Per-file errors are logged with the offending key and never abort the
//! batch; the caller gets a summary of outcomes instead.

use crate::classifier::Category;
use crate::config::PipelineConfig;
use crate::csv_read::CsvFile;
use crate::ledger::{Ledger, LedgerError};
use crate::sink::{BronzeSink, SinkError};
use crate::store::{ObjectStore, RemoteEntry};
use anyhow::Result;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Why a listed entry was skipped without being fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Size-0 folder placeholder
    Empty,
    /// Ledger already has a record for this key
    AlreadyProcessed,
    /// No classifier pattern matched
    Unrecognized,
}

/// Terminal outcome for one listed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Ingested { rows: u64 },
    Skipped(SkipReason),
}

/// Per-file failure, isolated from the rest of the batch.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("transfer failed for '{key}': {source}")]
    Transfer {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("load failed for '{key}': {source}")]
    Load {
        key: String,
        #[source]
        source: SinkError,
    },

    #[error("ledger failed for '{key}': {source}")]
    Ledger {
        key: String,
        #[source]
        source: LedgerError,
    },
}

/// Outcome counts for one `ingest_all` batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub ingested: usize,
    pub skipped_empty: usize,
    pub skipped_already_processed: usize,
    pub skipped_unrecognized: usize,
    pub failed: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Ingested { .. } => self.ingested += 1,
            FileOutcome::Skipped(SkipReason::Empty) => self.skipped_empty += 1,
            FileOutcome::Skipped(SkipReason::AlreadyProcessed) => {
                self.skipped_already_processed += 1
            }
            FileOutcome::Skipped(SkipReason::Unrecognized) => self.skipped_unrecognized += 1,
        }
    }

    pub fn skipped(&self) -> usize {
        self.skipped_empty + self.skipped_already_processed + self.skipped_unrecognized
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ingested, {} skipped ({} empty, {} already processed, {} unrecognized), {} failed",
            self.ingested,
            self.skipped(),
            self.skipped_empty,
            self.skipped_already_processed,
            self.skipped_unrecognized,
            self.failed
        )
    }
}

/// Orchestrates the classify-load-mark-move workflow over injected
/// collaborators. Constructed once by the entry point and passed down;
/// nothing here builds its own clients.
pub struct IngestWorker<'a> {
    store: &'a dyn ObjectStore,
    ledger: &'a dyn Ledger,
    sink: &'a dyn BronzeSink,
    config: &'a PipelineConfig,
}

impl<'a> IngestWorker<'a> {
    pub fn new(
        store: &'a dyn ObjectStore,
        ledger: &'a dyn Ledger,
        sink: &'a dyn BronzeSink,
        config: &'a PipelineConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            sink,
            config,
        }
    }

    /// Process every entry under `source_prefix`, in listing order.
    ///
    /// Listing failures abort (nothing to iterate); everything after that
    /// is isolated per file.
    pub async fn ingest_all(&self, source_prefix: &str) -> Result<BatchSummary> {
        info!("Draining prefix '{}'", source_prefix);

        let entries = self
            .store
            .list(source_prefix)
            .await
            .map_err(|e| e.context(format!("failed to list prefix '{}'", source_prefix)))?;

        let mut summary = BatchSummary::default();

        for entry in &entries {
            match self.process_entry(entry).await {
                Ok(outcome) => {
                    summary.record(&outcome);
                    match outcome {
                        FileOutcome::Ingested { rows } => {
                            info!("Ingested {} ({} rows)", entry.key, rows)
                        }
                        FileOutcome::Skipped(reason) => {
                            debug!("Skipped {} ({:?})", entry.key, reason)
                        }
                    }
                }
                Err(e) => {
                    summary.failed += 1;
                    error!("Failed to process {}: {:#}", entry.key, anyhow::Error::from(e));
                }
            }
        }

        info!("Batch complete: {}", summary);

        Ok(summary)
    }

    async fn process_entry(&self, entry: &RemoteEntry) -> Result<FileOutcome, IngestError> {
        let key = &entry.key;

        if entry.size == 0 {
            return Ok(FileOutcome::Skipped(SkipReason::Empty));
        }

        if self
            .ledger
            .has_processed(key)
            .await
            .map_err(|source| IngestError::Ledger {
                key: key.clone(),
                source,
            })?
        {
            return Ok(FileOutcome::Skipped(SkipReason::AlreadyProcessed));
        }

        // Only CSV objects are loadable. A dump whose key contains a
        // category pattern but has another extension must never reach the
        // CSV parser, or it would fail (or load garbage) on every run.
        if !key.to_lowercase().ends_with(".csv") {
            return Ok(FileOutcome::Skipped(SkipReason::Unrecognized));
        }

        let Some(category) = Category::classify(key) else {
            return Ok(FileOutcome::Skipped(SkipReason::Unrecognized));
        };

        let scratch_path = self.scratch_path(entry);
        self.store
            .get(key, &scratch_path)
            .await
            .map_err(|source| IngestError::Transfer {
                key: key.clone(),
                source,
            })?;

        let rows = self.load(key, category, &scratch_path).await?;

        // Load succeeded; record it. A duplicate here means another run
        // already recorded the key, which counts as success.
        match self.ledger.mark_processed(key).await {
            Ok(()) => {}
            Err(LedgerError::Duplicate(_)) => {
                warn!("{} was already recorded in the ledger", key);
            }
            Err(source) => {
                return Err(IngestError::Ledger {
                    key: key.clone(),
                    source,
                })
            }
        }

        self.relocate(entry).await?;
        self.remove_scratch(&scratch_path).await;

        Ok(FileOutcome::Ingested { rows })
    }

    async fn load(
        &self,
        key: &str,
        category: Category,
        scratch_path: &std::path::Path,
    ) -> Result<u64, IngestError> {
        let file = CsvFile::read(scratch_path).map_err(|e| IngestError::Load {
            key: key.to_string(),
            source: SinkError::Csv(e),
        })?;

        self.sink
            .write_rows(category.table_name(), &file, self.config.write_mode)
            .await
            .map_err(|source| IngestError::Load {
                key: key.to_string(),
                source,
            })
    }

    /// Copy the object under the processed prefix, then delete the source.
    async fn relocate(&self, entry: &RemoteEntry) -> Result<(), IngestError> {
        let destination = join_prefix(&self.config.processed_prefix, entry.base_name());

        self.store
            .copy(&entry.key, &destination)
            .await
            .map_err(|source| IngestError::Transfer {
                key: entry.key.clone(),
                source,
            })?;

        self.store
            .delete(&entry.key)
            .await
            .map_err(|source| IngestError::Transfer {
                key: entry.key.clone(),
                source,
            })?;

        debug!("Relocated {} to {}", entry.key, destination);

        Ok(())
    }

    /// Scratch removal is best-effort; a leftover file is reclaimed by the
    /// cleanup stage at the end of the pipeline.
    async fn remove_scratch(&self, path: &std::path::Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!("Failed to remove scratch file {}: {}", path.display(), e);
        }
    }

    fn scratch_path(&self, entry: &RemoteEntry) -> PathBuf {
        PathBuf::from(&self.config.scratch_dir).join(entry.base_name())
    }
}

/// Join a remote prefix and a base name without doubling separators.
pub(crate) fn join_prefix(prefix: &str, name: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('/') {
        format!("{}{}", prefix, name)
    } else {
        format!("{}/{}", prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_prefix_handles_separators() {
        assert_eq!(join_prefix("processed/", "a.csv"), "processed/a.csv");
        assert_eq!(join_prefix("processed", "a.csv"), "processed/a.csv");
        assert_eq!(join_prefix("", "a.csv"), "a.csv");
    }

    #[test]
    fn summary_totals() {
        let mut summary = BatchSummary::default();
        summary.record(&FileOutcome::Ingested { rows: 10 });
        summary.record(&FileOutcome::Skipped(SkipReason::Empty));
        summary.record(&FileOutcome::Skipped(SkipReason::AlreadyProcessed));
        summary.record(&FileOutcome::Skipped(SkipReason::Unrecognized));

        assert_eq!(summary.ingested, 1);
        assert_eq!(summary.skipped(), 3);
        assert_eq!(
            summary.to_string(),
            "1 ingested, 3 skipped (1 empty, 1 already processed, 1 unrecognized), 0 failed"
        );
    }
}
