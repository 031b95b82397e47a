//! Subprocess execution shared by the command adapters

use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::context::BootstrapContext;
use crate::error::CommandError;

/// Run `command` to completion, killing it if `ctx` is cancelled first.
///
/// Returns stdout on success; a non-zero exit carries the trimmed stderr.
pub(crate) async fn run(
    ctx: &BootstrapContext,
    program: &str,
    mut command: Command,
) -> Result<Vec<u8>, CommandError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(program, command = ?command.as_std(), "Running command");

    let child = command.spawn().map_err(|source| CommandError::Spawn {
        program: program.to_string(),
        source,
    })?;

    // Dropping the wait future drops the child, which kills it.
    let output = tokio::select! {
        output = child.wait_with_output() => output.map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?,
        _ = ctx.done() => {
            return Err(CommandError::Interrupted {
                program: program.to_string(),
            });
        }
    };

    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(CommandError::Failed {
            program: program.to_string(),
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
