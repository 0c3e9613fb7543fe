//! In-memory collaborators shared by the integration tests.
#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use olist_ingest::config::{PipelineConfig, WriteMode};
use olist_ingest::csv_read::CsvFile;
use olist_ingest::ledger::{Ledger, LedgerError};
use olist_ingest::sink::{BronzeSink, SinkError};
use olist_ingest::store::{ObjectStore, RemoteEntry};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

pub const ORDERS_CSV: &[u8] = b"order_id,customer_id\no1,c1\no2,c2\n";

/// In-memory object store keyed by object name.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    fetches: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn insert(&self, key: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list(&self, prefix: &str) -> Result<Vec<RemoteEntry>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, data)| RemoteEntry::new(key.clone(), data.len() as i64))
            .collect())
    }

    async fn get(&self, key: &str, local_path: &Path) -> Result<()> {
        self.fetches.lock().unwrap().push(key.to_string());

        let data = self
            .objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such object: {}", key))?;

        if let Some(parent) = local_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(local_path, data)?;

        Ok(())
    }

    async fn put(&self, local_path: &Path, key: &str) -> Result<()> {
        let data = std::fs::read(local_path)?;
        self.insert(key, &data);
        Ok(())
    }

    async fn copy(&self, src_key: &str, dst_key: &str) -> Result<()> {
        let mut objects = self.objects.lock().unwrap();
        let data = objects
            .get(src_key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such object: {}", src_key))?;
        objects.insert(dst_key.to_string(), data);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryLedger {
    keys: Mutex<HashSet<String>>,
}

impl MemoryLedger {
    pub fn records(&self) -> usize {
        self.keys.lock().unwrap().len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.lock().unwrap().contains(key)
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn has_processed(&self, key: &str) -> Result<bool, LedgerError> {
        Ok(self.keys.lock().unwrap().contains(key))
    }

    async fn mark_processed(&self, key: &str) -> Result<(), LedgerError> {
        if !self.keys.lock().unwrap().insert(key.to_string()) {
            return Err(LedgerError::Duplicate(key.to_string()));
        }
        Ok(())
    }
}

/// Sink that records loads and can be told to fail for specific tables.
#[derive(Default)]
pub struct MemorySink {
    loads: Mutex<Vec<(String, usize)>>,
    failing_tables: Mutex<HashSet<String>>,
}

impl MemorySink {
    pub fn fail_table(&self, table: &str) {
        self.failing_tables.lock().unwrap().insert(table.to_string());
    }

    pub fn heal_table(&self, table: &str) {
        self.failing_tables.lock().unwrap().remove(table);
    }

    pub fn loads(&self) -> Vec<(String, usize)> {
        self.loads.lock().unwrap().clone()
    }
}

#[async_trait]
impl BronzeSink for MemorySink {
    async fn write_rows(
        &self,
        table: &str,
        file: &CsvFile,
        _mode: WriteMode,
    ) -> Result<u64, SinkError> {
        if self.failing_tables.lock().unwrap().contains(table) {
            return Err(SinkError::Database(sqlx::Error::Protocol(
                "simulated load failure".to_string(),
            )));
        }

        self.loads
            .lock()
            .unwrap()
            .push((table.to_string(), file.rows.len()));

        Ok(file.rows.len() as u64)
    }
}

pub fn test_config(scratch: &tempfile::TempDir) -> PipelineConfig {
    PipelineConfig {
        source_prefix: "raw/".to_string(),
        processed_prefix: "processed/".to_string(),
        scratch_dir: scratch.path().to_string_lossy().into_owned(),
        write_mode: WriteMode::Append,
        schema: "bronze".to_string(),
    }
}
