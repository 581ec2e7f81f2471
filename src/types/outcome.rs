//! TransferOutcome - Per-invocation success/skip/failure counters

/// Aggregate result of one engine run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferOutcome {
    /// Files (or top-level entries) transferred successfully
    pub success_count: usize,

    /// Backup downloads whose remote file did not exist
    pub skip_count: usize,

    /// Backup downloads that failed for any other reason
    pub failed_count: usize,

    /// Hook commands executed
    pub command_count: usize,

    /// Bytes moved in either direction
    pub bytes_transferred: u64,
}

impl TransferOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, bytes: u64) {
        self.success_count += 1;
        self.bytes_transferred = self.bytes_transferred.saturating_add(bytes);
    }

    pub fn record_skip(&mut self) {
        self.skip_count += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed_count += 1;
    }

    /// True when nothing failed (skips are not failures)
    pub fn is_clean(&self) -> bool {
        self.failed_count == 0
    }

    /// Backup summary line
    pub fn backup_summary(&self) -> String {
        format!(
            "Backed up {} file(s), skipped {} file(s).",
            self.success_count, self.skip_count
        )
    }
}
