//! Server process spawner.
//!
//! Launches the MCPL server with piped stdio and, on unix, as the leader of
//! its own process group. Any further descendants the server spawns (game
//! engines, AI bridges) join that group and can be signalled together at
//! teardown. The caller's environment is inherited.

use std::process::Stdio;

use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tracing::info;

use crate::config::ClientConfig;
use crate::{ClientError, Result};

/// Active stdio connection to a spawned MCPL server process.
///
/// The caller is responsible for:
/// - Keeping `child` alive (it has `kill_on_drop(true)` as a last resort).
/// - Writing requests to `stdin` through a serialized writer.
/// - Draining `stdout` and `stderr`; the peer blocks once the pipes fill.
#[derive(Debug)]
pub struct Connection {
    /// Child process handle.
    pub child: Child,
    /// Process id captured at spawn time, used to resolve the process group
    /// during teardown.
    pub pid: Option<u32>,
    /// Child's stdin for outbound JSON lines.
    pub stdin: ChildStdin,
    /// Child's stdout carrying inbound JSON lines.
    pub stdout: ChildStdout,
    /// Child's stderr carrying unstructured diagnostic text.
    pub stderr: ChildStderr,
}

/// Spawn the server process described by `config`.
///
/// # Errors
///
/// Returns [`ClientError::Launch`] when the OS spawn fails or any stdio
/// handle cannot be captured.
pub fn spawn_process(config: &ClientConfig) -> Result<Connection> {
    let mut cmd = Command::new(&config.command);
    cmd.args(&config.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = &config.working_dir {
        cmd.current_dir(dir);
    }

    // New process group, led by the child: descendants it spawns stay
    // signalable as one unit even after the direct child exits.
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd
        .spawn()
        .map_err(|err| ClientError::Launch(format!("failed to spawn {}: {err}", config.command)))?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| ClientError::Launch("failed to capture child stdin".into()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ClientError::Launch("failed to capture child stdout".into()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ClientError::Launch("failed to capture child stderr".into()))?;

    let pid = child.id();
    info!(
        command = config.command,
        pid = pid.unwrap_or(0),
        "server process spawned"
    );

    Ok(Connection {
        child,
        pid,
        stdin,
        stdout,
        stderr,
    })
}
