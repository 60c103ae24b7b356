// src/exec/terminate.rs

//! Forced termination of a supervised child and its descendants.

use std::time::Duration;

use tokio::process::Child;
use tracing::{info, warn};

/// What happened when we tried to stop a child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Termination {
    /// The child was reaped within the grace period.
    pub reaped: bool,
    pub exit_code: Option<i32>,
}

/// Kill the child (and, on Unix, its whole process group), then wait up to
/// `grace` for it to be reaped.
pub async fn terminate(child: &mut Child, grace: Duration) -> Termination {
    let pid = child.id();
    if let Err(e) = kill_tree(child) {
        warn!(pid, error = %e, "failed to signal child process");
    }

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(Ok(status)) => {
            info!(pid, exit_code = status.code(), "terminated child process");
            Termination {
                reaped: true,
                exit_code: status.code(),
            }
        }
        Ok(Err(e)) => {
            warn!(pid, error = %e, "waiting for terminated child failed");
            Termination {
                reaped: false,
                exit_code: None,
            }
        }
        Err(_) => {
            warn!(pid, grace_ms = grace.as_millis() as u64, "child still running after kill");
            Termination {
                reaped: false,
                exit_code: None,
            }
        }
    }
}

#[cfg(unix)]
fn kill_tree(child: &mut Child) -> std::io::Result<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    if let Some(pid) = child.id() {
        // The child was spawned as a process-group leader, so its pid is the
        // group id.
        match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            Ok(()) => return Ok(()),
            Err(Errno::ESRCH) => {}
            Err(e) => warn!(pid, error = %e, "killpg failed; falling back to killing the child only"),
        }
    }
    child.start_kill()
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) -> std::io::Result<()> {
    child.start_kill()
}
