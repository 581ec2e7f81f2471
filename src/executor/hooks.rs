//! Remote hook commands with fail-fast semantics

use super::{emit_event, TransferCallback, TransferEvent};
use crate::remote::RemoteSession;
use crate::types::CopierError;

/// Run `commands` on the remote host, in order.
///
/// Output on stderr from any command stops the sequence immediately; the
/// remaining commands never run. Returns the number of commands executed.
pub fn run_sequence<S: RemoteSession + ?Sized>(
    session: &S,
    commands: &[String],
    on_event: Option<&TransferCallback<'_>>,
) -> Result<usize, CopierError> {
    for (idx, command) in commands.iter().enumerate() {
        emit_event(
            on_event,
            TransferEvent::CommandStart {
                command: command.clone(),
            },
        );
        tracing::info!("running remote command: {}", command);

        let output = session.execute(command)?;

        let stdout = output.stdout_text();
        if !stdout.is_empty() {
            emit_event(
                on_event,
                TransferEvent::CommandOutput {
                    command: command.clone(),
                    stdout,
                },
            );
        }

        if output.has_error_output() {
            let stderr = output.stderr_text();
            tracing::warn!(
                "remote command '{}' wrote to stderr, skipping {} remaining command(s)",
                command,
                commands.len() - idx - 1
            );
            emit_event(
                on_event,
                TransferEvent::CommandFailed {
                    command: command.clone(),
                    stderr: stderr.clone(),
                },
            );
            return Err(CopierError::Command {
                command: command.clone(),
                stderr,
            });
        }
    }

    Ok(commands.len())
}
