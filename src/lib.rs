//! # copier - back up, copy and revert files on an SSH target
//!
//! Mirrors one or more local directories onto a remote directory over SCP,
//! with remote hook commands before and after the transfer, and keeps a
//! local backup of the remote files it is about to overwrite.

pub mod commands;
pub mod config;
pub mod executor;
pub mod path;
pub mod plan;
pub mod remote;
pub mod scanner;
pub mod types;
pub mod ui;

// Re-export commonly used types
pub use config::Config;
pub use types::{CopierError, FileEntry, OperationMode, TransferAction, TransferOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
