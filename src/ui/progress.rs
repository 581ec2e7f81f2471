//! Progress reporting

use crate::executor::TransferEvent;
use crate::plan::TransferPlan;
use crate::types::{OperationMode, TransferAction};
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use std::time::Duration;

/// Prints per-file and per-command progress lines.
///
/// A spinner shows the transfer in flight; lines are printed with the
/// spinner suspended so they never interleave with it.
pub struct ProgressReporter {
    spinner: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.enable_steady_tick(Duration::from_millis(120));
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
        }
        Self { spinner }
    }

    /// Reporter that prints lines but never draws a spinner
    pub fn without_spinner() -> Self {
        Self {
            spinner: ProgressBar::hidden(),
        }
    }

    /// Print one line to stdout
    pub fn println(&self, text: &str) {
        self.spinner.suspend(|| println!("{}", text));
    }

    /// React to an engine event.
    pub fn handle(&self, event: &TransferEvent) {
        match event {
            TransferEvent::DownloadStart {
                index,
                total,
                remote_path,
                ..
            } => self
                .spinner
                .set_message(format!("[{}/{}] Download {}", index, total, remote_path)),
            TransferEvent::UploadStart {
                index,
                total,
                local_path,
                ..
            } => self.spinner.set_message(format!(
                "[{}/{}] Upload {}",
                index,
                total,
                local_path.display()
            )),
            TransferEvent::CommandStart { command } => {
                self.spinner.set_message(format!("Run {}", command))
            }
            _ => {}
        }

        if let Some(text) = format_event(event) {
            self.println(&text);
        }

        if let TransferEvent::Complete { outcome } = event {
            self.spinner.finish_and_clear();
            tracing::info!(
                "{} transferred, {} file(s) ok, {} skipped, {} failed, {} command(s)",
                HumanBytes(outcome.bytes_transferred),
                outcome.success_count,
                outcome.skip_count,
                outcome.failed_count,
                outcome.command_count
            );
        }
    }

    /// Stop the spinner without waiting for a Complete event
    pub fn finish(&self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Console line for an engine event, if it prints one
pub fn format_event(event: &TransferEvent) -> Option<String> {
    let text = match event {
        TransferEvent::BackupsReset { path, retained } => match retained {
            Some(old) => format!(
                "Moved previous backups from {} to {}",
                path.display(),
                old.display()
            ),
            None => format!("Cleared backups directory {}", path.display()),
        },
        TransferEvent::CommandStart { command } => format!("Run target command: {}", command),
        TransferEvent::CommandOutput { stdout, .. } => {
            format!("output:\n{}", stdout.trim_end())
        }
        TransferEvent::CommandFailed { stderr, .. } => {
            format!("\t error: {}", stderr.trim_end())
        }
        TransferEvent::UploadPhase { mode } => match mode {
            OperationMode::Copy => "Copying local files to target".to_string(),
            OperationMode::Revert => "Copying backed up files to target".to_string(),
            OperationMode::Backup => return None,
        },
        TransferEvent::DownloadStart {
            remote_path,
            local_dir,
            ..
        } => format!(
            "Back up target file {} to local path {}",
            remote_path,
            local_dir.display()
        ),
        TransferEvent::UploadStart {
            local_path,
            remote_dir,
            ..
        } => format!(
            "Copy file from source {} to target directory {}",
            local_path.display(),
            remote_dir
        ),
        TransferEvent::TransferSuccess { .. } => "\tSuccess!".to_string(),
        TransferEvent::TransferSkipped { .. } => {
            "\tFile not already on target, ignoring".to_string()
        }
        TransferEvent::TransferFailed { error, fatal } => {
            if *fatal {
                format!("\tCopy failed, bailing! ({})", error)
            } else {
                format!("\tBackup failed: {}", error)
            }
        }
        TransferEvent::Complete { .. } => return None,
    };
    Some(text)
}

/// Listing of everything a plan would do
pub fn format_dry_run(plan: &TransferPlan) -> String {
    let mut lines = Vec::with_capacity(plan.actions.len() + 4);
    lines.push(format!("Dry-run plan ({}):", plan.mode));

    for command in &plan.pre_commands {
        lines.push(format!("  RUN       {}", command));
    }
    for action in &plan.actions {
        match action {
            TransferAction::ResetBackups {
                path,
                keep_previous,
            } => {
                let verb = if *keep_previous { "RETAIN" } else { "RESET" };
                lines.push(format!("  {:<9} {}", verb, path.display()));
            }
            TransferAction::Download {
                remote_path,
                local_dir,
                ..
            } => lines.push(format!(
                "  DOWNLOAD  {} -> {}",
                remote_path,
                local_dir.display()
            )),
            TransferAction::Upload { entry, remote_dir } => lines.push(format!(
                "  UPLOAD    {} -> {}",
                entry.absolute_path.display(),
                remote_dir
            )),
        }
    }
    for command in &plan.post_commands {
        lines.push(format!("  RUN       {}", command));
    }

    if plan.actions.is_empty() && plan.stats.command_count == 0 {
        lines.push("  (no planned actions)".to_string());
    }
    lines.push(format!(
        "  {} transfer(s), {} command(s)",
        plan.transfer_count(),
        plan.stats.command_count
    ));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FileEntry, TransferError, TransferOutcome};
    use std::path::PathBuf;

    #[test]
    fn test_download_lines() {
        let start = TransferEvent::DownloadStart {
            index: 1,
            total: 2,
            remote_path: "/srv/sub/b.txt".to_string(),
            local_dir: PathBuf::from("backups/sub"),
        };
        assert_eq!(
            format_event(&start).as_deref(),
            Some("Back up target file /srv/sub/b.txt to local path backups/sub")
        );
        assert_eq!(
            format_event(&TransferEvent::TransferSkipped {
                path: "/srv/sub/b.txt".to_string()
            })
            .as_deref(),
            Some("\tFile not already on target, ignoring")
        );
        assert_eq!(
            format_event(&TransferEvent::TransferSuccess { bytes: 4 }).as_deref(),
            Some("\tSuccess!")
        );
    }

    #[test]
    fn test_upload_failure_line() {
        let event = TransferEvent::TransferFailed {
            error: TransferError::Failed {
                path: "site/a.txt".to_string(),
                reason: "permission denied".to_string(),
            },
            fatal: true,
        };
        let line = format_event(&event).expect("prints a line");
        assert!(line.starts_with("\tCopy failed, bailing!"));
        assert!(line.contains("permission denied"));
    }

    #[test]
    fn test_command_lines() {
        let start = TransferEvent::CommandStart {
            command: "uptime".to_string(),
        };
        assert_eq!(
            format_event(&start).as_deref(),
            Some("Run target command: uptime")
        );

        let output = TransferEvent::CommandOutput {
            command: "uptime".to_string(),
            stdout: "up 2 days\n".to_string(),
        };
        assert_eq!(format_event(&output).as_deref(), Some("output:\nup 2 days"));

        let failed = TransferEvent::CommandFailed {
            command: "bad".to_string(),
            stderr: "bad: not found\n".to_string(),
        };
        assert_eq!(
            format_event(&failed).as_deref(),
            Some("\t error: bad: not found")
        );
    }

    #[test]
    fn test_phase_lines() {
        assert_eq!(
            format_event(&TransferEvent::UploadPhase {
                mode: OperationMode::Copy
            })
            .as_deref(),
            Some("Copying local files to target")
        );
        assert_eq!(
            format_event(&TransferEvent::UploadPhase {
                mode: OperationMode::Revert
            })
            .as_deref(),
            Some("Copying backed up files to target")
        );
        assert!(format_event(&TransferEvent::Complete {
            outcome: TransferOutcome::default()
        })
        .is_none());
    }

    #[test]
    fn test_format_dry_run_lists_everything_in_order() {
        let mut plan = TransferPlan::new(OperationMode::Copy);
        plan.set_hooks(vec!["stop".to_string()], vec!["start".to_string()]);
        plan.add_action(TransferAction::Upload {
            entry: FileEntry::new("a.txt", "/l/a.txt"),
            remote_dir: "/srv".to_string(),
        });

        let text = format_dry_run(&plan);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Dry-run plan (copy):");
        assert_eq!(lines[1], "  RUN       stop");
        assert_eq!(lines[2], "  UPLOAD    /l/a.txt -> /srv");
        assert_eq!(lines[3], "  RUN       start");
        assert_eq!(lines[4], "  1 transfer(s), 2 command(s)");
    }

    #[test]
    fn test_format_dry_run_handles_empty_plan() {
        let plan = TransferPlan::new(OperationMode::Revert);
        assert!(format_dry_run(&plan).contains("(no planned actions)"));
    }

    #[test]
    fn test_reporter_handles_events_without_panicking() {
        let reporter = ProgressReporter::without_spinner();
        reporter.handle(&TransferEvent::UploadStart {
            index: 1,
            total: 1,
            local_path: PathBuf::from("/l/a.txt"),
            remote_dir: "/srv".to_string(),
        });
        reporter.handle(&TransferEvent::TransferSuccess { bytes: 1 });
        reporter.handle(&TransferEvent::Complete {
            outcome: TransferOutcome::default(),
        });
        reporter.finish();
    }
}
