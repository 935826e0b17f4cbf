//! Atomic file writes using the write-rename pattern
//!
//! Artifacts are written to `{path}.tmp`, synced, then renamed over the final
//! path, so an interrupted export never leaves a half-written file behind.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Sibling path with `suffix` appended to the file name
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Create the parent directory of `path` if it is missing
pub async fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

/// Atomically write `data` to `path`, creating parent directories as needed
pub async fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    ensure_parent_dir(path).await?;

    let tmp_path = with_suffix(path, ".tmp");
    let mut file = fs::File::create(&tmp_path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&tmp_path, path).await
}
