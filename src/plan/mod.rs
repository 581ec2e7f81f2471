//! Transfer plans - what a mode will do, computed from local state only

mod builder;

pub use builder::build_plan;

use crate::scanner::ScanOptions;
use crate::types::{OperationMode, TransferAction};

/// Ordered work for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    pub mode: OperationMode,

    /// Hook commands run before the file actions
    pub pre_commands: Vec<String>,

    /// File-level actions, in execution order
    pub actions: Vec<TransferAction>,

    /// Hook commands run after the file actions
    pub post_commands: Vec<String>,

    /// Aggregate statistics about the plan
    pub stats: PlanStats,

    /// Filters for recursive uploads, matching the ones used to plan them
    pub scan_options: ScanOptions,
}

/// Counts of planned work
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanStats {
    pub download_count: usize,
    pub upload_count: usize,
    pub command_count: usize,
}

impl TransferPlan {
    /// Create a new empty plan
    pub fn new(mode: OperationMode) -> Self {
        Self {
            mode,
            pre_commands: Vec::new(),
            actions: Vec::new(),
            post_commands: Vec::new(),
            stats: PlanStats::default(),
            scan_options: ScanOptions::default(),
        }
    }

    /// Add an action to the plan and update statistics
    pub fn add_action(&mut self, action: TransferAction) {
        match &action {
            TransferAction::Download { .. } => self.stats.download_count += 1,
            TransferAction::Upload { .. } => self.stats.upload_count += 1,
            TransferAction::ResetBackups { .. } => {}
        }
        self.actions.push(action);
    }

    pub fn set_hooks(&mut self, pre: Vec<String>, post: Vec<String>) {
        self.stats.command_count = pre.len() + post.len();
        self.pre_commands = pre;
        self.post_commands = post;
    }

    /// Number of file transfers planned
    pub fn transfer_count(&self) -> usize {
        self.stats.download_count + self.stats.upload_count
    }
}
