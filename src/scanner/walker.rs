//! Sequential directory walker

use crate::config::Config;
use crate::path::relative_to;
use crate::types::{CopierError, FileEntry};
use std::fs;
use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};

/// Filters applied while enumerating a local root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Exclude patterns (gitignore globs)
    pub exclude: Vec<String>,

    /// Directory never descended into (the backups directory)
    pub skip_dir: Option<PathBuf>,

    /// Directory exclude patterns are anchored to; the walked root when unset
    pub pattern_root: Option<PathBuf>,
}

impl ScanOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            exclude: config.exclude.clone(),
            skip_dir: Some(config.backups_path.clone()),
            pattern_root: None,
        }
    }

    /// Same filters, with patterns anchored at `root` when walking below it
    pub fn anchored_at(&self, root: &Path) -> Self {
        Self {
            pattern_root: Some(root.to_path_buf()),
            ..self.clone()
        }
    }
}

/// Recursively collect every file under `root`.
///
/// Relative paths are '/'-separated. Directories are not returned.
///
/// # Errors
/// * `root` is not a directory
/// * Invalid exclude patterns return CopierError::Config
/// * Unreadable entries are logged and skipped
pub fn scan_files(root: &Path, options: &ScanOptions) -> Result<Vec<FileEntry>, CopierError> {
    walk(root, options, None, false)
}

/// Collect the immediate children of `root` (files and directories).
pub fn list_entries(root: &Path, options: &ScanOptions) -> Result<Vec<FileEntry>, CopierError> {
    walk(root, options, Some(1), true)
}

/// Recursively collect files and directories under `root`, parents first.
pub fn scan_tree(root: &Path, options: &ScanOptions) -> Result<Vec<FileEntry>, CopierError> {
    walk(root, options, None, true)
}

fn walk(
    root: &Path,
    options: &ScanOptions,
    max_depth: Option<usize>,
    include_dirs: bool,
) -> Result<Vec<FileEntry>, CopierError> {
    if !root.is_dir() {
        return Err(CopierError::Io(Error::new(
            ErrorKind::NotFound,
            format!("{} is not a directory", root.display()),
        )));
    }

    let pattern_root = options.pattern_root.as_deref().unwrap_or(root);
    let mut override_builder = ignore::overrides::OverrideBuilder::new(pattern_root);
    for pattern in &options.exclude {
        // The ignore crate uses ! for exclusion
        let exclude_pattern = format!("!{}", pattern);
        override_builder.add(&exclude_pattern).map_err(|e| {
            CopierError::Config(format!("Invalid exclude pattern '{}': {}", pattern, e))
        })?;
    }
    let overrides = override_builder
        .build()
        .map_err(|e| CopierError::Config(format!("Failed to build exclude overrides: {}", e)))?;

    let skip = options
        .skip_dir
        .as_deref()
        .and_then(|dir| nested_skip_path(root, dir));

    let mut builder = ignore::WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .overrides(overrides)
        .max_depth(max_depth)
        .sort_by_file_name(|a, b| a.cmp(b));
    if let Some(skip) = skip {
        builder.filter_entry(move |entry| entry.path() != skip.as_path());
    }

    let mut entries = Vec::new();
    for result in builder.build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("error during directory traversal: {}", e);
                continue;
            }
        };

        if entry.depth() == 0 {
            continue;
        }

        let file_type = match entry.file_type() {
            Some(ft) => ft,
            None => continue,
        };

        // Symlinks count as whatever they point to; dangling ones are dropped
        let is_dir = if file_type.is_symlink() {
            match fs::metadata(entry.path()) {
                Ok(meta) if meta.is_dir() => true,
                Ok(meta) if meta.is_file() => false,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!("skipping broken symlink {}: {}", entry.path().display(), e);
                    continue;
                }
            }
        } else if file_type.is_dir() {
            true
        } else if file_type.is_file() {
            false
        } else {
            // pipes, sockets, devices
            continue;
        };

        if is_dir && !include_dirs {
            continue;
        }

        let relative_path = match relative_to(root, entry.path()) {
            Some(rel) => rel,
            None => {
                tracing::warn!(
                    "cannot compute a relative path for {}, skipping",
                    entry.path().display()
                );
                continue;
            }
        };

        let file_entry = if is_dir {
            FileEntry::directory(relative_path, entry.path())
        } else {
            FileEntry::new(relative_path, entry.path())
        };
        entries.push(file_entry);
    }

    tracing::debug!("scanned {}: {} entries", root.display(), entries.len());
    Ok(entries)
}

/// `dir` expressed under `root`'s own prefix, if it lives inside `root`.
fn nested_skip_path(root: &Path, dir: &Path) -> Option<PathBuf> {
    let root_canonical = root.canonicalize().ok()?;
    let dir_canonical = dir.canonicalize().ok()?;
    let rest = dir_canonical.strip_prefix(&root_canonical).ok()?;
    if rest.as_os_str().is_empty() {
        return None;
    }
    Some(root.join(rest))
}
