//! OperationMode - Which way files flow for one invocation

use clap::ValueEnum;
use std::fmt;
use std::str::FromStr;

/// Operation mode, chosen once from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum OperationMode {
    /// Download the remote counterpart of every local file into the backups directory
    #[value(name = "b")]
    Backup,

    /// Upload the configured local directories to the remote root
    #[value(name = "c")]
    Copy,

    /// Upload the backups directory to the remote root
    #[value(name = "r")]
    Revert,
}

impl OperationMode {
    /// Short flag used on the command line
    pub fn flag(&self) -> &'static str {
        match self {
            OperationMode::Backup => "b",
            OperationMode::Copy => "c",
            OperationMode::Revert => "r",
        }
    }

    /// Whether pre/post hook commands run around the transfer
    pub fn runs_hooks(&self) -> bool {
        !matches!(self, OperationMode::Backup)
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationMode::Backup => "backup",
            OperationMode::Copy => "copy",
            OperationMode::Revert => "revert",
        };
        f.write_str(name)
    }
}

impl FromStr for OperationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "b" => Ok(OperationMode::Backup),
            "c" => Ok(OperationMode::Copy),
            "r" => Ok(OperationMode::Revert),
            other => Err(format!("unknown mode '{}'", other)),
        }
    }
}
