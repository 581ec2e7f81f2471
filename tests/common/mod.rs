//! Fake remote target backed by a temp directory.

#![allow(dead_code)]

use copier::path::local_join;
use copier::remote::{CommandOutput, RemoteSession};
use copier::scanner::{scan_tree, ScanOptions};
use copier::types::{RemoteError, TransferError};
use copier::{Config, CopierError};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const REMOTE_ROOT: &str = "/srv/app";

/// Remote paths map onto `root`: "/srv/app/a.txt" lives at `root/srv/app/a.txt`.
pub struct FakeRemote {
    pub root: TempDir,
    executed: RefCell<Vec<String>>,
    stdout: HashMap<String, String>,
    stderr: HashMap<String, String>,
    failing_uploads: HashSet<String>,
    failing_downloads: HashSet<String>,
    uploads: RefCell<Vec<PathBuf>>,
    pub close_calls: usize,
}

impl FakeRemote {
    pub fn new() -> Self {
        let root = TempDir::new().expect("create remote tempdir");
        fs::create_dir_all(root.path().join(REMOTE_ROOT.trim_start_matches('/')))
            .expect("create remote root");
        Self {
            root,
            executed: RefCell::new(Vec::new()),
            stdout: HashMap::new(),
            stderr: HashMap::new(),
            failing_uploads: HashSet::new(),
            failing_downloads: HashSet::new(),
            uploads: RefCell::new(Vec::new()),
            close_calls: 0,
        }
    }

    /// Local location of a remote path
    pub fn local(&self, remote_path: &str) -> PathBuf {
        self.root.path().join(remote_path.trim_start_matches('/'))
    }

    /// Put a file on the fake target, relative to REMOTE_ROOT
    pub fn put(&self, relative: &str, content: &[u8]) {
        let path = self.local(&format!("{}/{}", REMOTE_ROOT, relative));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create remote parent");
        }
        fs::write(path, content).expect("write remote file");
    }

    pub fn read(&self, relative: &str) -> Option<Vec<u8>> {
        fs::read(self.local(&format!("{}/{}", REMOTE_ROOT, relative))).ok()
    }

    pub fn with_stdout(mut self, command: &str, text: &str) -> Self {
        self.stdout.insert(command.to_string(), text.to_string());
        self
    }

    pub fn with_stderr(mut self, command: &str, text: &str) -> Self {
        self.stderr.insert(command.to_string(), text.to_string());
        self
    }

    /// Uploads of entries with this file name fail
    pub fn failing_upload(mut self, name: &str) -> Self {
        self.failing_uploads.insert(name.to_string());
        self
    }

    /// Downloads of this remote path fail with something other than NotFound
    pub fn failing_download(mut self, remote_path: &str) -> Self {
        self.failing_downloads.insert(remote_path.to_string());
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.borrow().clone()
    }

    pub fn uploaded(&self) -> Vec<PathBuf> {
        self.uploads.borrow().clone()
    }
}

impl RemoteSession for FakeRemote {
    fn execute(&self, command: &str) -> Result<CommandOutput, RemoteError> {
        self.executed.borrow_mut().push(command.to_string());
        let stdout = self.stdout.get(command).cloned().unwrap_or_default();
        let stderr = self.stderr.get(command).cloned().unwrap_or_default();
        Ok(CommandOutput::new(stdout, stderr))
    }

    fn upload(
        &self,
        local: &Path,
        remote_dir: &str,
        recursive: bool,
        filter: &ScanOptions,
    ) -> Result<u64, TransferError> {
        self.uploads.borrow_mut().push(local.to_path_buf());
        let failed = |reason: String| TransferError::Failed {
            path: local.display().to_string(),
            reason,
        };

        let name = local
            .file_name()
            .ok_or_else(|| failed("no file name".to_string()))?;
        if self.failing_uploads.contains(name.to_string_lossy().as_ref()) {
            return Err(failed("permission denied".to_string()));
        }

        let destination = self.local(remote_dir).join(name);
        if local.is_dir() {
            if !recursive {
                return Err(failed("is a directory".to_string()));
            }
            copy_tree(local, &destination, filter).map_err(|e| failed(e.to_string()))
        } else {
            fs::copy(local, &destination).map_err(|e| failed(e.to_string()))
        }
    }

    fn download(&self, remote_path: &str, local_dir: &Path) -> Result<u64, TransferError> {
        if self.failing_downloads.contains(remote_path) {
            return Err(TransferError::Failed {
                path: remote_path.to_string(),
                reason: "connection reset".to_string(),
            });
        }

        let source = self.local(remote_path);
        if !source.is_file() {
            return Err(TransferError::NotFound {
                path: remote_path.to_string(),
            });
        }

        let name = source.file_name().expect("remote file has a name");
        fs::copy(&source, local_dir.join(name)).map_err(|e| TransferError::Failed {
            path: remote_path.to_string(),
            reason: e.to_string(),
        })
    }

    fn close(&mut self) -> Result<(), RemoteError> {
        self.close_calls += 1;
        Ok(())
    }
}

fn copy_tree(
    source: &Path,
    destination: &Path,
    filter: &ScanOptions,
) -> Result<u64, CopierError> {
    fs::create_dir_all(destination)?;
    let mut total = 0;
    for entry in scan_tree(source, filter)? {
        let target = local_join(destination, &entry.relative_path);
        if entry.is_dir {
            fs::create_dir_all(&target)?;
        } else {
            total += fs::copy(&entry.absolute_path, &target)?;
        }
    }
    Ok(total)
}

/// Config pointing at `roots`, with backups under `workspace`
pub fn config_for(roots: &[&Path], workspace: &Path) -> Config {
    Config {
        local_paths: roots.iter().map(|r| r.to_path_buf()).collect(),
        backups_path: workspace.join("backups"),
        remote_root: REMOTE_ROOT.to_string(),
        ..Config::default()
    }
}
