//! Transfer engine - executes a plan against a remote session

pub mod backups;
pub mod hooks;

use crate::plan::TransferPlan;
use crate::remote::RemoteSession;
use crate::types::{CopierError, OperationMode, TransferAction, TransferError, TransferOutcome};
use std::fs;
use std::path::PathBuf;

pub use backups::reset_backups;
pub use hooks::run_sequence;

/// Events emitted while executing a plan.
#[derive(Debug)]
pub enum TransferEvent {
    /// Backups directory emptied; `retained` is where the old one went.
    BackupsReset {
        path: PathBuf,
        retained: Option<PathBuf>,
    },
    /// Hook command about to run.
    CommandStart { command: String },
    /// Hook command printed to stdout.
    CommandOutput { command: String, stdout: String },
    /// Hook command printed to stderr; the run stops.
    CommandFailed { command: String, stderr: String },
    /// Upload phase of copy/revert begins (after pre hooks).
    UploadPhase { mode: OperationMode },
    /// Download of one remote file started.
    DownloadStart {
        index: usize,
        total: usize,
        remote_path: String,
        local_dir: PathBuf,
    },
    /// Upload of one local entry started.
    UploadStart {
        index: usize,
        total: usize,
        local_path: PathBuf,
        remote_dir: String,
    },
    /// Transfer finished.
    TransferSuccess { bytes: u64 },
    /// Remote file absent; counted as a skip.
    TransferSkipped { path: String },
    /// Transfer failed. `fatal` transfers stop the run.
    TransferFailed { error: TransferError, fatal: bool },
    /// Plan execution completed.
    Complete { outcome: TransferOutcome },
}

/// Optional callback used to receive execution events.
pub type TransferCallback<'a> = dyn Fn(&TransferEvent) + Send + Sync + 'a;

/// Execute a transfer plan
///
/// Order: pre hooks, file actions, post hooks. Backup downloads tolerate
/// per-file failures (missing files are skips, other failures are counted);
/// an upload failure or a hook writing to stderr aborts the run at once.
pub fn execute_plan<S: RemoteSession + ?Sized>(
    plan: &TransferPlan,
    session: &S,
    on_event: Option<&TransferCallback<'_>>,
) -> Result<TransferOutcome, CopierError> {
    let mut outcome = TransferOutcome::new();

    outcome.command_count += run_sequence(session, &plan.pre_commands, on_event)?;

    if plan.mode.runs_hooks() {
        emit_event(on_event, TransferEvent::UploadPhase { mode: plan.mode });
    }

    let total = plan.transfer_count();
    let mut index = 0;
    for action in &plan.actions {
        if action.is_transfer() {
            index += 1;
        }
        tracing::trace!("{} action ({}/{})", action.action_name(), index, total);

        match action {
            TransferAction::ResetBackups {
                path,
                keep_previous,
            } => {
                let retained = reset_backups(path, *keep_previous)?;
                emit_event(
                    on_event,
                    TransferEvent::BackupsReset {
                        path: path.clone(),
                        retained,
                    },
                );
            }
            TransferAction::Download {
                remote_path,
                local_dir,
                ..
            } => {
                emit_event(
                    on_event,
                    TransferEvent::DownloadStart {
                        index,
                        total,
                        remote_path: remote_path.clone(),
                        local_dir: local_dir.clone(),
                    },
                );

                fs::create_dir_all(local_dir)?;

                match session.download(remote_path, local_dir) {
                    Ok(bytes) => {
                        outcome.record_success(bytes);
                        emit_event(on_event, TransferEvent::TransferSuccess { bytes });
                    }
                    Err(error) if error.is_not_found() => {
                        let path = error.path().to_string();
                        tracing::debug!("{} not on target, skipped", path);
                        outcome.record_skip();
                        emit_event(on_event, TransferEvent::TransferSkipped { path });
                    }
                    Err(error) => {
                        tracing::warn!("backup of {} failed: {}", remote_path, error);
                        outcome.record_failure();
                        emit_event(
                            on_event,
                            TransferEvent::TransferFailed {
                                error,
                                fatal: false,
                            },
                        );
                    }
                }
            }
            TransferAction::Upload { entry, remote_dir } => {
                emit_event(
                    on_event,
                    TransferEvent::UploadStart {
                        index,
                        total,
                        local_path: entry.absolute_path.clone(),
                        remote_dir: remote_dir.clone(),
                    },
                );

                // Exclude patterns stay anchored at the local root the entry came from
                let filter = match entry.absolute_path.parent() {
                    Some(root) => plan.scan_options.anchored_at(root),
                    None => plan.scan_options.clone(),
                };
                match session.upload(&entry.absolute_path, remote_dir, true, &filter) {
                    Ok(bytes) => {
                        outcome.record_success(bytes);
                        emit_event(on_event, TransferEvent::TransferSuccess { bytes });
                    }
                    Err(error) => {
                        let reason = error.to_string();
                        emit_event(
                            on_event,
                            TransferEvent::TransferFailed { error, fatal: true },
                        );
                        return Err(CopierError::Transfer {
                            source_path: entry.absolute_path.clone(),
                            destination: remote_dir.clone(),
                            reason,
                        });
                    }
                }
            }
        }
    }

    outcome.command_count += run_sequence(session, &plan.post_commands, on_event)?;

    emit_event(on_event, TransferEvent::Complete { outcome });
    Ok(outcome)
}

pub(crate) fn emit_event(on_event: Option<&TransferCallback<'_>>, event: TransferEvent) {
    if let Some(callback) = on_event {
        callback(&event);
    }
}
