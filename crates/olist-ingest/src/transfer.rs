//! Transfer and cleanup stages
//!
//! Upload moves extracted dataset files into category-named prefixes under
//! the source prefix (`raw/orders/...`, `raw/sellers/...`); files no
//! pattern matches go under `others` so nothing is lost, even though the
//! load stage will skip them. Cleanup reclaims the local scratch space.

use crate::classifier::Category;
use crate::store::ObjectStore;
use crate::worker::join_prefix;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// List regular files directly under `dir`, in directory order.
pub fn list_local_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list directory {}", dir.display()))?
    {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }

    Ok(files)
}

/// Upload `files` under `bucket_path`, one category folder per file.
///
/// Per-file failures are logged and skipped; the return value is how many
/// uploads succeeded.
pub async fn upload_files(
    store: &dyn ObjectStore,
    files: &[PathBuf],
    bucket_path: &str,
) -> Result<usize> {
    let mut uploaded = 0;

    for file in files {
        let Some(file_name) = file.file_name().and_then(|n| n.to_str()) else {
            error!("Skipping file with non-UTF-8 name: {}", file.display());
            continue;
        };

        let folder = Category::folder_for(file_name);
        let key = join_prefix(&join_prefix(bucket_path, folder), file_name);

        match store.put(file, &key).await {
            Ok(()) => {
                debug!("Uploaded {} to {}", file_name, key);
                uploaded += 1;
            }
            Err(e) => error!("Failed to upload {}: {:#}", file_name, e),
        }
    }

    info!("Uploaded {}/{} files under '{}'", uploaded, files.len(), bucket_path);

    Ok(uploaded)
}

/// Remove everything under `dir`: leftover fetches directly in the
/// scratch directory plus nested download directories (the dataset
/// archive and its extracted files). A missing directory is a no-op, not
/// an error.
pub fn clear_scratch(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list directory {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if entry.file_type()?.is_dir() {
            std::fs::remove_dir_all(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        } else {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        removed += 1;
    }

    info!("Removed {} scratch entries from {}", removed, dir.display());

    Ok(removed)
}
