//! Backup / copy / revert command

use crate::config::Config;
use crate::executor::{execute_plan, TransferEvent};
use crate::plan::{build_plan, TransferPlan};
use crate::remote::{RemoteSession, SshSession};
use crate::types::{CopierError, OperationMode, TransferOutcome};
use crate::ui::{format_dry_run, ProgressReporter};

/// Run one invocation: plan locally, then connect and execute.
///
/// The plan is built before connecting, so a missing source directory or a
/// bad exclude pattern fails before any remote side effect. With `dry_run`
/// the plan is printed and nothing else happens.
pub fn run(config: &Config, mode: OperationMode) -> Result<TransferOutcome, CopierError> {
    let plan = build_plan(config, mode)?;

    if config.dry_run {
        println!("{}", format_dry_run(&plan));
        println!("Dry-run mode: no changes were made.");
        return Ok(TransferOutcome::default());
    }

    let mut session = SshSession::connect(&config.remote_host)?;
    run_with_session(&plan, &mut session)
}

/// Execute `plan` over an already-open session and print the results.
///
/// The session is closed on every path, including errors. A backup with
/// downloads that failed for reasons other than a missing file prints its
/// summary and then returns `BackupIncomplete`.
pub fn run_with_session<S: RemoteSession + ?Sized>(
    plan: &TransferPlan,
    session: &mut S,
) -> Result<TransferOutcome, CopierError> {
    let reporter = ProgressReporter::new();
    let on_event = |event: &TransferEvent| reporter.handle(event);

    let result = execute_plan(plan, &*session, Some(&on_event));
    reporter.finish();

    if let Err(e) = session.close() {
        tracing::warn!("{}", e);
    }

    let outcome = result?;
    if plan.mode == OperationMode::Backup {
        println!("{}", outcome.backup_summary());
        if !outcome.is_clean() {
            println!("Failed to back up {} file(s).", outcome.failed_count);
            return Err(CopierError::BackupIncomplete {
                failed: outcome.failed_count,
            });
        }
    }

    Ok(outcome)
}

/// Follow-up advice printed after a fatal error
pub fn hint(error: &CopierError) -> Option<&'static str> {
    match error {
        CopierError::Connection { .. } => Some("Please check your connection and config is ok"),
        CopierError::Config(_) => Some("Check the config file path and its [local]/[target] keys."),
        CopierError::BackupIncomplete { .. } => {
            Some("Files that failed are missing from the backups directory; rerun the backup.")
        }
        CopierError::Command { .. } | CopierError::Transfer { .. } => Some("Exiting!"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::CommandOutput;
    use crate::scanner::ScanOptions;
    use crate::types::{FileEntry, RemoteError, TransferAction, TransferError};
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Session whose downloads fail with a configurable error
    struct BrokenDownloads {
        error: TransferError,
        closed: usize,
    }

    impl RemoteSession for BrokenDownloads {
        fn execute(&self, _command: &str) -> Result<CommandOutput, RemoteError> {
            Ok(CommandOutput::new(Vec::new(), Vec::new()))
        }

        fn upload(
            &self,
            local: &Path,
            _remote_dir: &str,
            _recursive: bool,
            _filter: &ScanOptions,
        ) -> Result<u64, TransferError> {
            Err(TransferError::Failed {
                path: local.display().to_string(),
                reason: "read-only target".to_string(),
            })
        }

        fn download(&self, _remote: &str, _local_dir: &Path) -> Result<u64, TransferError> {
            Err(self.error.clone())
        }

        fn close(&mut self) -> Result<(), RemoteError> {
            self.closed += 1;
            Ok(())
        }
    }

    fn backup_plan(backups: &Path) -> TransferPlan {
        let mut plan = TransferPlan::new(OperationMode::Backup);
        plan.add_action(TransferAction::ResetBackups {
            path: backups.to_path_buf(),
            keep_previous: false,
        });
        plan.add_action(TransferAction::Download {
            entry: FileEntry::new("a.txt", "/l/a.txt"),
            remote_path: "/srv/a.txt".to_string(),
            local_dir: backups.to_path_buf(),
        });
        plan
    }

    #[test]
    fn test_missing_remote_file_is_not_an_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let plan = backup_plan(&temp_dir.path().join("backups"));
        let mut session = BrokenDownloads {
            error: TransferError::NotFound {
                path: "/srv/a.txt".to_string(),
            },
            closed: 0,
        };

        let outcome = run_with_session(&plan, &mut session).expect("backup succeeds");
        assert_eq!(outcome.skip_count, 1);
        assert_eq!(outcome.success_count, 0);
        assert_eq!(session.closed, 1);
    }

    #[test]
    fn test_failed_download_makes_backup_incomplete() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let plan = backup_plan(&temp_dir.path().join("backups"));
        let mut session = BrokenDownloads {
            error: TransferError::Failed {
                path: "/srv/a.txt".to_string(),
                reason: "channel closed".to_string(),
            },
            closed: 0,
        };

        let err = run_with_session(&plan, &mut session).unwrap_err();
        assert!(matches!(err, CopierError::BackupIncomplete { failed: 1 }));
        assert_eq!(session.closed, 1);
    }

    #[test]
    fn test_session_closed_after_fatal_upload() {
        let mut plan = TransferPlan::new(OperationMode::Copy);
        plan.add_action(TransferAction::Upload {
            entry: FileEntry::new("a.txt", "/l/a.txt"),
            remote_dir: "/srv".to_string(),
        });
        let mut session = BrokenDownloads {
            error: TransferError::NotFound {
                path: String::new(),
            },
            closed: 0,
        };

        let err = run_with_session(&plan, &mut session).unwrap_err();
        match err {
            CopierError::Transfer { source_path, .. } => {
                assert_eq!(source_path, PathBuf::from("/l/a.txt"))
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(session.closed, 1);
    }

    #[test]
    fn test_dry_run_does_not_connect() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let site = temp_dir.path().join("site");
        std::fs::create_dir(&site).expect("Failed to create dir");
        std::fs::write(site.join("a.txt"), "a").expect("Failed to write");

        let config = Config {
            local_paths: vec![site],
            backups_path: temp_dir.path().join("backups"),
            remote_root: "/srv".to_string(),
            dry_run: true,
            ..Config::default()
        };
        // No host configured: reaching connect() would fail
        let outcome = run(&config, OperationMode::Backup).expect("dry run succeeds");
        assert_eq!(outcome, TransferOutcome::default());
        assert!(!temp_dir.path().join("backups").exists());
    }

    #[test]
    fn test_hints() {
        let connection = CopierError::Connection {
            target: "pi@host:22".to_string(),
            reason: "refused".to_string(),
        };
        assert_eq!(
            hint(&connection),
            Some("Please check your connection and config is ok")
        );
        let command = CopierError::Command {
            command: "x".to_string(),
            stderr: "y".to_string(),
        };
        assert_eq!(hint(&command), Some("Exiting!"));
        assert_eq!(hint(&CopierError::Usage("x".to_string())), None);
    }
}
