//! Error types for copier

use std::path::PathBuf;
use thiserror::Error;

/// Error types for copier operations
#[derive(Debug, Error)]
pub enum CopierError {
    /// Standard IO error (automatically converted via #[from])
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid invocation (unknown mode, bad arguments)
    #[error("Usage error: {0}")]
    Usage(String),

    /// Authentication or network failure while establishing the session
    #[error("Failed to connect to host '{target}': {reason}")]
    Connection { target: String, reason: String },

    /// A remote hook command wrote to its error stream
    #[error("Command '{command}' failed: {stderr}")]
    Command { command: String, stderr: String },

    /// An upload failed in copy or revert mode
    #[error("Copy of {} to {destination} failed: {reason}", source_path.display())]
    Transfer {
        source_path: PathBuf,
        destination: String,
        reason: String,
    },

    /// Backup walk finished but some downloads failed for reasons other than a missing file
    #[error("Backup incomplete: {failed} file(s) could not be downloaded")]
    BackupIncomplete { failed: usize },

    /// Remote channel failure outside of a file transfer
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl CopierError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Check if this error happened before any remote action was attempted
    pub fn is_config_error(&self) -> bool {
        matches!(self, CopierError::Config(_) | CopierError::Usage(_))
    }

    /// Check if the usage text should accompany this error
    pub fn is_usage_error(&self) -> bool {
        matches!(self, CopierError::Usage(_))
    }
}

/// Failure of a single file transfer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// The source path does not exist
    #[error("{path}: no such file")]
    NotFound { path: String },

    /// Any other transfer failure
    #[error("{path}: {reason}")]
    Failed { path: String, reason: String },
}

impl TransferError {
    /// Check if this error only means the source file is absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, TransferError::NotFound { .. })
    }

    /// Path the failed transfer was reading from
    pub fn path(&self) -> &str {
        match self {
            TransferError::NotFound { path } | TransferError::Failed { path, .. } => path,
        }
    }
}

/// Failure of the remote session itself (channel setup, command execution)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Could not run a command on the remote host
    #[error("Failed to execute '{command}': {reason}")]
    Execution { command: String, reason: String },

    /// Session teardown failed
    #[error("Failed to close session: {0}")]
    Close(String),
}
