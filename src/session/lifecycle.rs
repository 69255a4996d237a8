//! Process-group teardown.
//!
//! Graceful-then-forceful termination of the spawned server and every
//! descendant in its process group. Lookup failures mean the processes are
//! already gone and count as success.

use std::time::Duration;

use tokio::process::Child;
use tracing::{debug, warn};

/// Terminate the child's process group: TERM, bounded wait, then KILL and a
/// second bounded wait. `pid` is the process id captured at spawn time; the
/// group id is resolved from it.
#[cfg(unix)]
pub(crate) async fn terminate_group(child: &mut Child, pid: Option<u32>, grace: Duration) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::{getpgid, Pid};

    let Some(raw) = pid.and_then(|p| i32::try_from(p).ok()) else {
        // Never spawned or pid out of range; nothing to signal.
        reap(child, grace).await;
        return;
    };
    let pid = Pid::from_raw(raw);

    // The child was spawned as its own group leader, so its pgid normally
    // equals its pid. getpgid fails once the process is fully gone.
    let group = getpgid(Some(pid)).unwrap_or(pid);

    match killpg(group, Signal::SIGTERM) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(err) => warn!(%err, "failed to TERM process group"),
    }

    if reap(child, grace).await {
        return;
    }

    debug!("process group survived TERM, escalating to KILL");
    match killpg(group, Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(err) => warn!(%err, "failed to KILL process group"),
    }

    if !reap(child, grace).await {
        warn!("process group did not exit after KILL");
    }
}

/// Non-unix fallback: kill the direct child only.
#[cfg(not(unix))]
pub(crate) async fn terminate_group(child: &mut Child, _pid: Option<u32>, grace: Duration) {
    if let Err(err) = child.start_kill() {
        debug!(%err, "start_kill failed, process likely already exited");
    }
    if !reap(child, grace).await {
        warn!("child did not exit after kill");
    }
}

/// Wait up to `grace` for the child to exit. Returns whether it did.
async fn reap(child: &mut Child, grace: Duration) -> bool {
    match tokio::time::timeout(grace, child.wait()).await {
        Ok(Ok(status)) => {
            debug!(?status, "child process reaped");
            true
        }
        Ok(Err(err)) => {
            // wait() failing means the handle is already consumed.
            debug!(%err, "child wait failed, treating as exited");
            true
        }
        Err(_elapsed) => false,
    }
}
