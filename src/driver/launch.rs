//! Session subprocess composition and deadline enforcement

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Child;

use crate::common::{LaunchConfig, Result};

/// Arguments for the hidden `session` subcommand, carrying the resolved
/// launch parameters to the session process
pub fn session_args(cfg: &LaunchConfig, scenario: &str) -> Vec<String> {
    vec![
        "session".to_string(),
        "--lldb".to_string(),
        cfg.lldb.display().to_string(),
        "--corerun".to_string(),
        cfg.corerun.display().to_string(),
        "--plugin".to_string(),
        cfg.plugin.display().to_string(),
        "--assembly".to_string(),
        cfg.assembly.display().to_string(),
        "--work-dir".to_string(),
        cfg.work_dir.display().to_string(),
        "--scenario".to_string(),
        scenario.to_string(),
    ]
}

/// Compose the session invocation: this same binary, hidden subcommand,
/// its own process group. The caller attaches the per-scenario log
/// files before spawning.
pub fn session_command(cfg: &LaunchConfig, scenario: &str) -> Result<std::process::Command> {
    let exe = std::env::current_exe()?;
    let mut cmd = std::process::Command::new(exe);
    cmd.args(session_args(cfg, scenario));
    cmd.stdin(Stdio::null());

    // Own process group, so the deadline kill takes the debugger and
    // debuggee down together with the session.
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    Ok(cmd)
}

/// How a session process left the driver's custody
#[derive(Debug)]
pub enum SessionExit {
    /// Reaped before the deadline
    Completed(ExitStatus),
    /// Deadline expired; the process group was force-killed
    Killed,
}

/// Wait for the session to finish, or kill its whole process group at
/// the deadline. No graceful shutdown is attempted: the sentinel store,
/// not the exit path, carries the outcome.
pub async fn wait_or_kill(mut child: Child, deadline: Duration) -> Result<SessionExit> {
    match tokio::time::timeout(deadline, child.wait()).await {
        Ok(status) => Ok(SessionExit::Completed(status?)),
        Err(_elapsed) => {
            kill_tree(&mut child).await;
            Ok(SessionExit::Killed)
        }
    }
}

async fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        // The session leads its own process group; negative pid reaches
        // every process in it.
        unsafe {
            libc::kill(-(pid as i32), libc::SIGKILL);
        }
    }
    if let Err(e) = child.kill().await {
        tracing::warn!(error = %e, "failed to kill session process");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config() -> LaunchConfig {
        LaunchConfig {
            lldb: PathBuf::from("/usr/bin/lldb"),
            corerun: PathBuf::from("/runtime/corerun"),
            plugin: PathBuf::from("/runtime/libplugin.so"),
            assembly: PathBuf::from("/tests/test.exe"),
            timeout: Duration::from_secs(120),
            work_dir: PathBuf::from("/tmp/work"),
        }
    }

    #[test]
    fn test_session_args_round_trip() {
        let args = session_args(&config(), "cmd_bpmd");
        assert_eq!(args[0], "session");
        assert!(args.windows(2).any(|w| w == ["--lldb", "/usr/bin/lldb"]));
        assert!(args.windows(2).any(|w| w == ["--scenario", "cmd_bpmd"]));
        assert!(args.windows(2).any(|w| w == ["--work-dir", "/tmp/work"]));
    }
}
