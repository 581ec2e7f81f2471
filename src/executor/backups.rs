//! Backups directory reset
//!
//! Each backup starts from an empty directory. The previous contents are
//! either deleted or, with `keep_previous`, moved to a timestamped sibling
//! `<name>.<YYYY-MM-DD_HHMMSS>`.

use crate::types::CopierError;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

/// Empty the backups directory, creating it if needed.
///
/// Returns where the previous backup was moved, if it was retained.
pub fn reset_backups(path: &Path, keep_previous: bool) -> Result<Option<PathBuf>, CopierError> {
    let mut retained = None;

    if fs::symlink_metadata(path).is_ok() {
        if keep_previous {
            let destination = retained_path(path, Local::now())?;
            fs::rename(path, &destination)?;
            tracing::info!(
                "moved previous backup {} to {}",
                path.display(),
                destination.display()
            );
            retained = Some(destination);
        } else {
            remove_path_any(path)?;
            tracing::info!("removed previous backup {}", path.display());
        }
    }

    fs::create_dir_all(path)?;
    Ok(retained)
}

/// Sibling path used to retain `path`, unique even within the same second.
fn retained_path(path: &Path, now: DateTime<Local>) -> Result<PathBuf, CopierError> {
    let name = path.file_name().ok_or_else(|| {
        CopierError::Config(format!(
            "cannot retain backups directory {}: it has no file name",
            path.display()
        ))
    })?;
    let stamp = now.format("%Y-%m-%d_%H%M%S").to_string();
    let base = format!("{}.{}", name.to_string_lossy(), stamp);

    let mut candidate = path.with_file_name(&base);
    let mut counter = 1;
    while fs::symlink_metadata(&candidate).is_ok() {
        candidate = path.with_file_name(format!("{}-{}", base, counter));
        counter += 1;
    }
    Ok(candidate)
}

/// Remove any filesystem entry at `path`.
///
/// Directories are removed recursively; files and symlinks are removed as files.
fn remove_path_any(path: &Path) -> Result<(), CopierError> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.file_type().is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(())
}
