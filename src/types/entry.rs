//! FileEntry - A local file or directory found during enumeration

use std::path::PathBuf;

/// Represents one enumerated local entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path relative to the enumeration root, always '/'-separated
    pub relative_path: String,

    /// Full local path
    pub absolute_path: PathBuf,

    /// Directory rather than file
    pub is_dir: bool,
}

impl FileEntry {
    /// Create a new FileEntry
    pub fn new(relative_path: impl Into<String>, absolute_path: impl Into<PathBuf>) -> Self {
        Self {
            relative_path: relative_path.into(),
            absolute_path: absolute_path.into(),
            is_dir: false,
        }
    }

    /// Create a FileEntry for a directory
    pub fn directory(relative_path: impl Into<String>, absolute_path: impl Into<PathBuf>) -> Self {
        Self {
            is_dir: true,
            ..Self::new(relative_path, absolute_path)
        }
    }

    /// Parent portion of the relative path ("" for top-level entries)
    pub fn relative_parent(&self) -> &str {
        crate::path::remote_parent(&self.relative_path)
    }
}
