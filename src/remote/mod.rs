//! Remote session capability
//!
//! The engine only talks to [`RemoteSession`]; [`SshSession`] is the
//! production transport.

mod receive;
mod ssh;

pub use ssh::SshSession;

use crate::scanner::ScanOptions;
use crate::types::{RemoteError, TransferError};
use std::path::Path;

/// Captured result of one remote command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,

    /// Exit status, when the server reported one
    pub exit_status: Option<i32>,
}

impl CommandOutput {
    pub fn new(stdout: impl Into<Vec<u8>>, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_status: None,
        }
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Anything on stderr counts as a failed command
    pub fn has_error_output(&self) -> bool {
        !self.stderr.is_empty()
    }
}

/// An authenticated connection with command execution and file transfer.
///
/// All calls block until the operation completes.
pub trait RemoteSession {
    /// Run a shell command and capture both output streams.
    fn execute(&self, command: &str) -> Result<CommandOutput, RemoteError>;

    /// Upload `local_path` into `remote_dir`, keeping its file name.
    ///
    /// Directories require `recursive`; their subtree is carried over, minus
    /// whatever `filter` excludes. Returns the number of bytes sent.
    fn upload(
        &self,
        local_path: &Path,
        remote_dir: &str,
        recursive: bool,
        filter: &ScanOptions,
    ) -> Result<u64, TransferError>;

    /// Download the file at `remote_path` into `local_dir`, keeping its file name.
    ///
    /// A missing remote file is reported as [`TransferError::NotFound`].
    fn download(&self, remote_path: &str, local_dir: &Path) -> Result<u64, TransferError>;

    /// Release the session. Later calls are no-ops.
    fn close(&mut self) -> Result<(), RemoteError>;
}

/// Quote a string for a POSIX shell
pub fn shell_escape(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}
