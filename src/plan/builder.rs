//! Plan generation per operation mode

use crate::config::Config;
use crate::path::{join_remote, local_join};
use crate::plan::TransferPlan;
use crate::scanner::{list_entries, scan_files, ScanOptions};
use crate::types::{CopierError, OperationMode, TransferAction};
use std::path::Path;

/// Build the plan for `mode` from the local filesystem.
///
/// Nothing is modified and nothing remote is contacted.
///
/// * Backup: reset the backups directory, then one download per local file,
///   mirroring each local root's layout under the backups directory.
/// * Copy: pre hooks, one recursive upload per immediate entry of every local
///   root, post hooks.
/// * Revert: same as copy, with the backups directory as the only source.
///
/// # Example
/// ```
/// use copier::plan::build_plan;
/// use copier::types::OperationMode;
/// use copier::Config;
///
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
///
/// let config = Config {
///     local_paths: vec![dir.path().to_path_buf()],
///     backups_path: dir.path().join("backups"),
///     remote_root: "/srv".to_string(),
///     ..Config::default()
/// };
/// let plan = build_plan(&config, OperationMode::Copy).unwrap();
/// assert_eq!(plan.stats.upload_count, 1);
/// ```
pub fn build_plan(config: &Config, mode: OperationMode) -> Result<TransferPlan, CopierError> {
    let mut plan = TransferPlan::new(mode);

    match mode {
        OperationMode::Backup => plan_backup(config, &mut plan)?,
        OperationMode::Copy => {
            let options = ScanOptions::from_config(config);
            for root in &config.local_paths {
                plan_uploads(root, &config.remote_root, &options, &mut plan)?;
            }
            plan.set_hooks(config.pre_commands.clone(), config.post_commands.clone());
            plan.scan_options = options;
        }
        OperationMode::Revert => {
            let options = ScanOptions {
                exclude: config.exclude.clone(),
                ..ScanOptions::default()
            };
            plan_uploads(&config.backups_path, &config.remote_root, &options, &mut plan)?;
            plan.set_hooks(config.pre_commands.clone(), config.post_commands.clone());
            plan.scan_options = options;
        }
    }

    tracing::info!(
        "{} plan: {} download(s), {} upload(s), {} hook command(s)",
        mode,
        plan.stats.download_count,
        plan.stats.upload_count,
        plan.stats.command_count
    );
    Ok(plan)
}

fn plan_backup(config: &Config, plan: &mut TransferPlan) -> Result<(), CopierError> {
    plan.add_action(TransferAction::ResetBackups {
        path: config.backups_path.clone(),
        keep_previous: config.keep_previous,
    });

    let options = ScanOptions::from_config(config);
    for root in &config.local_paths {
        if !root.is_dir() {
            tracing::warn!("local path {} is not a directory, skipping", root.display());
            continue;
        }

        for entry in scan_files(root, &options)? {
            let remote_path = join_remote(&config.remote_root, &entry.relative_path);
            let local_dir = local_join(&config.backups_path, entry.relative_parent());
            plan.add_action(TransferAction::Download {
                entry,
                remote_path,
                local_dir,
            });
        }
    }

    Ok(())
}

fn plan_uploads(
    source: &Path,
    remote_root: &str,
    options: &ScanOptions,
    plan: &mut TransferPlan,
) -> Result<(), CopierError> {
    let entries = list_entries(source, options).map_err(|e| match e {
        CopierError::Io(io) => CopierError::Io(std::io::Error::new(
            io.kind(),
            format!("cannot list source directory {}: {}", source.display(), io),
        )),
        other => other,
    })?;

    for entry in entries {
        plan.add_action(TransferAction::Upload {
            entry,
            remote_dir: remote_root.to_string(),
        });
    }

    Ok(())
}
