//! TransferAction - Steps of a planned run

use super::FileEntry;
use std::path::PathBuf;

/// One file-level step of a transfer plan, executed in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferAction {
    /// Remove (or move aside) the backups directory and recreate it empty
    ResetBackups { path: PathBuf, keep_previous: bool },

    /// Download a remote file into a local directory; a missing remote file is a skip
    Download {
        entry: FileEntry,
        remote_path: String,
        local_dir: PathBuf,
    },

    /// Upload a local entry (recursively) into a remote directory; any failure aborts the run
    Upload { entry: FileEntry, remote_dir: String },
}

impl TransferAction {
    /// Human-readable action name
    pub fn action_name(&self) -> &'static str {
        match self {
            TransferAction::ResetBackups { .. } => "Reset",
            TransferAction::Download { .. } => "Download",
            TransferAction::Upload { .. } => "Upload",
        }
    }

    /// Check if this action moves file data
    pub fn is_transfer(&self) -> bool {
        !matches!(self, TransferAction::ResetBackups { .. })
    }
}
