//! Kaggle dataset source
//!
//! Pulls the configured dataset archive over the Kaggle HTTP API and
//! extracts it into a local directory. The rest of the pipeline only sees
//! [`DatasetSource`]: a blocking "pull dataset, get a directory" call.

use crate::config::KaggleConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::info;

const KAGGLE_API_URL: &str = "https://www.kaggle.com/api/v1/datasets/download";

/// Upstream dataset host.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Download the dataset and return the directory its files landed in.
    async fn pull_dataset(&self) -> Result<PathBuf>;
}

/// Kaggle API client.
pub struct KaggleClient {
    config: KaggleConfig,
    http: reqwest::Client,
    download_dir: PathBuf,
}

impl KaggleClient {
    pub fn new(config: KaggleConfig, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            download_dir: download_dir.into(),
        }
    }

    async fn download_archive(&self, archive_path: &Path) -> Result<()> {
        let url = format!("{}/{}", KAGGLE_API_URL, self.config.dataset);
        info!("Downloading dataset {}", self.config.dataset);

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.config.username, Some(&self.config.key))
            .send()
            .await
            .context("Failed to reach Kaggle")?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to download dataset {}: {}",
                self.config.dataset,
                response.status()
            );
        }

        let total_size = response.content_length().unwrap_or(0);

        let pb = ProgressBar::new(total_size);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})")?
                .progress_chars("#>-"),
        );
        pb.set_message(format!("Downloading {}", self.config.dataset));

        let mut file = std::fs::File::create(archive_path)
            .with_context(|| format!("Failed to create {}", archive_path.display()))?;
        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Failed while streaming dataset archive")?;
            std::io::Write::write_all(&mut file, &chunk)?;
            downloaded += chunk.len() as u64;
            pb.set_position(downloaded);
        }

        pb.finish_with_message(format!("Downloaded {}", self.config.dataset));

        Ok(())
    }
}

#[async_trait]
impl DatasetSource for KaggleClient {
    async fn pull_dataset(&self) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.download_dir)
            .with_context(|| format!("Failed to create {}", self.download_dir.display()))?;

        let archive_path = self.download_dir.join("dataset.zip");
        self.download_archive(&archive_path).await?;

        let extract_dir = self.download_dir.join("extracted");
        let archive = archive_path.clone();
        let target = extract_dir.clone();

        // zip extraction is blocking I/O
        tokio::task::spawn_blocking(move || extract_zip(&archive, &target))
            .await
            .context("Archive extraction task panicked")??;

        info!("Dataset extracted to {}", extract_dir.display());

        Ok(extract_dir)
    }
}

/// Extract every file in the archive into `target`, flattening nothing.
fn extract_zip(archive_path: &Path, target: &Path) -> Result<()> {
    let file = std::fs::File::open(archive_path)
        .with_context(|| format!("Failed to open {}", archive_path.display()))?;
    let mut archive =
        zip::ZipArchive::new(file).context("Failed to read dataset archive")?;

    std::fs::create_dir_all(target)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(relative) = entry.enclosed_name() else {
            // Entry escapes the target directory; refuse it.
            anyhow::bail!("Archive entry has an unsafe path: {}", entry.name());
        };

        let out_path = target.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut out_file = std::fs::File::create(&out_path)
            .with_context(|| format!("Failed to create {}", out_path.display()))?;
        std::io::copy(&mut entry, &mut out_file)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    #[test]
    fn extracts_archive_contents() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("dataset.zip");

        let file = std::fs::File::create(&archive_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("olist_orders_dataset.csv", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"order_id\no1\n").unwrap();
        writer.finish().unwrap();

        let target = dir.path().join("extracted");
        extract_zip(&archive_path, &target).unwrap();

        let extracted = std::fs::read_to_string(target.join("olist_orders_dataset.csv")).unwrap();
        assert_eq!(extracted, "order_id\no1\n");
    }
}
