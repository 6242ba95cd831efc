use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, error, info};
use tokio::fs;

/// Creates `path` and its parents unless it already exists.
pub async fn ensure_directory_exists<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        if let Err(e) = fs::create_dir_all(path).await {
            error!("Failed to create directory at {:?}: {}", path, e);
            return Err(e.into());
        }
        info!("Created directory at: {:?}", path);
    }
    Ok(())
}

/// Writes `contents` next to `path` and renames it into place, so readers
/// never see a half-written file.
pub async fn write_file_replacing(path: &Path, contents: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        ensure_directory_exists(dir).await?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents)
        .await
        .with_context(|| format!("writing {:?}", tmp_path))?;
    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("moving {:?} into place", tmp_path))?;
    debug!("Wrote {:?}", path);
    Ok(())
}
