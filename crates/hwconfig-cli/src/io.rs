//! Atomic output writes

use crate::error::{CliError, Result};
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Write `content` to `path` via a locked temp file and a rename, so
/// readers never see a partial file.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)?;

    temp_file.lock_exclusive().map_err(|_| CliError::LockFailed {
        path: path.to_path_buf(),
    })?;
    temp_file.write_all(content)?;
    temp_file.sync_all()?;
    FileExt::unlock(&temp_file).map_err(|_| CliError::LockFailed {
        path: path.to_path_buf(),
    })?;

    fs::rename(&temp_path, path)?;
    tracing::info!(path = %path.display(), bytes = content.len(), "Wrote output");
    Ok(())
}
