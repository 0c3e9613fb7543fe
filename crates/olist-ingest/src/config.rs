//! Pipeline configuration
//!
//! All configuration comes from the environment (a `.env` file is honored
//! via dotenvy). `Config::load` validates everything up front so a missing
//! bucket or credential aborts before any file is touched.

use olist_common::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Write mode for bronze table loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Append rows to the existing table (create it if missing)
    #[default]
    Append,
    /// Drop and recreate the table before loading
    Replace,
}

impl std::str::FromStr for WriteMode {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "append" => Ok(WriteMode::Append),
            "replace" => Ok(WriteMode::Replace),
            _ => Err(EtlError::config(format!(
                "Invalid write mode '{}', expected 'append' or 'replace'",
                s
            ))),
        }
    }
}

/// Top-level configuration for the pipeline binaries.
#[derive(Debug, Clone)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub storage: StorageConfig,
    pub database: DbConfig,
    pub kaggle: KaggleConfig,
}

/// Ingestion workflow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Remote prefix the worker drains
    pub source_prefix: String,
    /// Remote prefix ingested files are relocated to
    pub processed_prefix: String,
    /// Local scratch directory between fetch and load
    pub scratch_dir: String,
    /// Write mode for bronze table loads
    pub write_mode: WriteMode,
    /// Destination schema in the relational sink
    pub schema: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_prefix: "raw/".to_string(),
            processed_prefix: "processed/".to_string(),
            scratch_dir: "tmp/raw".to_string(),
            write_mode: WriteMode::Append,
            schema: "bronze".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(prefix) = env::var("SOURCE_PREFIX") {
            config.source_prefix = prefix;
        }
        if let Ok(prefix) = env::var("PROCESSED_PREFIX") {
            config.processed_prefix = prefix;
        }
        if let Ok(dir) = env::var("SCRATCH_DIR") {
            config.scratch_dir = dir;
        }
        if let Ok(mode) = env::var("WRITE_MODE") {
            config.write_mode = mode.parse()?;
        }
        if let Ok(schema) = env::var("BRONZE_SCHEMA") {
            config.schema = schema;
        }

        Ok(config)
    }
}

/// Object storage settings. `endpoint` + `path_style` cover MinIO setups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub path_style: bool,
}

impl StorageConfig {
    pub fn from_env() -> Result<Self> {
        let bucket = env::var("BUCKET_NAME")
            .map_err(|_| EtlError::config("BUCKET_NAME not set"))?;

        Ok(Self {
            endpoint: env::var("S3_ENDPOINT").ok(),
            region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            bucket,
            access_key: env::var("AWS_ACCESS_KEY_ID")
                .map_err(|_| EtlError::config("AWS_ACCESS_KEY_ID not set"))?,
            secret_key: env::var("AWS_SECRET_ACCESS_KEY")
                .map_err(|_| EtlError::config("AWS_SECRET_ACCESS_KEY not set"))?,
            path_style: env::var("S3_PATH_STYLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        })
    }

    pub fn for_minio(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            region: "us-east-1".to_string(),
            bucket: bucket.into(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            path_style: true,
        }
    }
}

/// Relational sink connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl DbConfig {
    pub fn from_env() -> Result<Self> {
        let url = env::var("DATABASE_URL")
            .map_err(|_| EtlError::config("DATABASE_URL not set"))?;

        Ok(Self {
            url,
            max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            connect_timeout_secs: env::var("DB_CONNECT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        })
    }
}

/// Kaggle dataset source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KaggleConfig {
    pub username: String,
    pub key: String,
    /// Dataset slug, `owner/dataset`
    pub dataset: String,
}

/// Default dataset slug (Olist Brazilian e-commerce public dataset).
pub const DEFAULT_DATASET: &str = "olistbr/brazilian-ecommerce";

impl KaggleConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            username: env::var("KAGGLE_USERNAME")
                .map_err(|_| EtlError::config("KAGGLE_USERNAME not set"))?,
            key: env::var("KAGGLE_KEY").map_err(|_| EtlError::config("KAGGLE_KEY not set"))?,
            dataset: env::var("KAGGLE_DATASET").unwrap_or_else(|_| DEFAULT_DATASET.to_string()),
        })
    }
}

impl Config {
    /// Load and validate configuration from the environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            pipeline: PipelineConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            database: DbConfig::from_env()?,
            kaggle: KaggleConfig::from_env()?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration. Runs before any stage touches a file.
    pub fn validate(&self) -> Result<()> {
        if self.storage.bucket.is_empty() {
            return Err(EtlError::config("Bucket name cannot be empty"));
        }
        if self.database.url.is_empty() {
            return Err(EtlError::config("Database URL cannot be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(EtlError::config("DB_MAX_CONNECTIONS must be greater than 0"));
        }
        if self.pipeline.source_prefix.is_empty() {
            return Err(EtlError::config("Source prefix cannot be empty"));
        }
        if self.pipeline.source_prefix == self.pipeline.processed_prefix {
            return Err(EtlError::config(
                "Source and processed prefixes must differ, or relocation would loop",
            ));
        }
        if self.pipeline.schema.is_empty() {
            return Err(EtlError::config("Bronze schema name cannot be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_mode_from_str() {
        assert_eq!("append".parse::<WriteMode>().unwrap(), WriteMode::Append);
        assert_eq!("Replace".parse::<WriteMode>().unwrap(), WriteMode::Replace);
        assert!("upsert".parse::<WriteMode>().is_err());
    }

    #[test]
    fn pipeline_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.source_prefix, "raw/");
        assert_eq!(config.processed_prefix, "processed/");
        assert_eq!(config.schema, "bronze");
        assert_eq!(config.write_mode, WriteMode::Append);
    }

    #[test]
    fn matching_prefixes_rejected() {
        let config = Config {
            pipeline: PipelineConfig {
                processed_prefix: "raw/".to_string(),
                ..PipelineConfig::default()
            },
            storage: StorageConfig::for_minio("http://localhost:9000", "test-bucket"),
            database: DbConfig {
                url: "postgresql://localhost/olist".to_string(),
                max_connections: 5,
                connect_timeout_secs: 30,
            },
            kaggle: KaggleConfig {
                username: "user".to_string(),
                key: "key".to_string(),
                dataset: DEFAULT_DATASET.to_string(),
            },
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn for_minio_uses_path_style() {
        let config = StorageConfig::for_minio("http://localhost:9000", "test-bucket");
        assert_eq!(config.endpoint, Some("http://localhost:9000".to_string()));
        assert!(config.path_style);
    }
}
