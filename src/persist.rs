// src/persist.rs
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::WatchError;

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out".to_string());
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

/// Write `bytes` next to `path`, then rename over it.
/// A crash mid-write leaves the previous file intact.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), WatchError> {
    let wrap = |source: std::io::Error| WatchError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).await.map_err(wrap)?;
    }

    let tmp = temp_path_for(path);
    if let Err(e) = fs::write(&tmp, bytes).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(wrap(e));
    }
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(wrap(e));
    }
    Ok(())
}
