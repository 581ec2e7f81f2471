//! Command-line interface

use crate::types::OperationMode;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Config file used when none is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "./copier.toml";

/// Backup, copy and revert files on an SSH target
#[derive(Parser, Debug, Clone)]
#[command(name = "copier", version, about)]
pub struct Cli {
    /// One of: b, c, r (Backup, Copy, Revert)
    #[arg(value_enum)]
    pub mode: OperationMode,

    /// Path to a config file (allows for multiple targets/operations)
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Print the planned actions without connecting or changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Log filter directive for the requested verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Usage text printed for a missing or unknown mode
pub fn usage() -> String {
    [
        "Usage:",
        "copier [mode] [config] [--dry-run] [-v]",
        "[mode]\t\tone of: b, c, r (Backup, Copy, Revert)",
        "[config]\toptional path to a config file (allows for multiple targets/operations)",
    ]
    .join("\n")
}
