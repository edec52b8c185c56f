//! Interactive lldb engine
//!
//! Drives one lldb child over stdin/stdout with fully synchronous
//! command execution. Commands are delimited with a scripting-engine
//! echo marker: after every command the engine is asked to print a
//! marker line, and everything read up to that marker is the command's
//! output. A marker that never comes back means the scripting engine is
//! wedged — the session then hangs until the driver's deadline kill,
//! and the engine-variant fail flag reports it.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::common::{Error, Result};

use super::backend::{CommandOutput, Debugger, ProcessState};

const PROMPT: &str = "(lldb) ";
const SYNC_MARKER: &str = "---harness-command-done---";

/// One lldb child process, target already bound to `corerun <assembly>`
pub struct LldbEngine {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl LldbEngine {
    /// Spawn lldb against the runtime host and debuggee assembly. The
    /// debuggee is not launched yet; `process launch` is a separate
    /// command.
    ///
    /// stderr is inherited so engine noise lands in the session's
    /// stderr log.
    pub async fn spawn(lldb: &Path, corerun: &Path, assembly: &Path) -> Result<Self> {
        let mut cmd = Command::new(lldb);
        cmd.arg("--no-use-colors")
            .arg("--")
            .arg(corerun)
            .arg(assembly)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            Error::EngineStartFailed(format!("failed to start {}: {}", lldb.display(), e))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::EngineStartFailed("no stdin handle".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::EngineStartFailed("no stdout handle".to_string()))?;

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    /// Ask the engine to quit; the child is killed on drop regardless
    pub async fn shutdown(mut self) -> Result<()> {
        let _ = self.stdin.write_all(b"quit\n").await;
        let _ = self.stdin.flush().await;
        let _ = self.child.wait().await;
        Ok(())
    }

    async fn read_until_marker(&mut self, command: &str) -> Result<String> {
        let mut out = String::new();
        let mut line = String::new();
        loop {
            line.clear();
            let n = self.stdout.read_line(&mut line).await?;
            if n == 0 {
                return Err(Error::EngineClosed);
            }
            let stripped = strip_prompt(line.trim_end());
            if stripped == SYNC_MARKER {
                break;
            }
            // Drop the engine's echo of the command and of the marker
            // request so captured output is the command's output alone.
            if stripped == command || stripped.contains(SYNC_MARKER) {
                continue;
            }
            out.push_str(stripped);
            out.push('\n');
        }
        Ok(out)
    }
}

#[async_trait]
impl Debugger for LldbEngine {
    async fn execute(&mut self, command: &str) -> Result<CommandOutput> {
        tracing::debug!(command, "engine command");

        self.stdin.write_all(command.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin
            .write_all(format!("script print(\"{SYNC_MARKER}\")\n").as_bytes())
            .await?;
        self.stdin.flush().await?;

        let text = self.read_until_marker(command).await?;
        let success = command_succeeded(&text);

        // Transcript goes to stdout, which the driver redirects into the
        // per-scenario log.
        println!("{PROMPT}{command}");
        print!("{text}");

        tracing::debug!(success, bytes = text.len(), "engine answered");
        Ok(CommandOutput { text, success })
    }

    async fn process_state(&mut self) -> Result<ProcessState> {
        let out = self.execute("process status").await?;
        Ok(parse_process_state(&out.text))
    }
}

fn strip_prompt(line: &str) -> &str {
    let mut s = line;
    while let Some(rest) = s.strip_prefix(PROMPT) {
        s = rest;
    }
    s
}

fn command_succeeded(output: &str) -> bool {
    !output
        .lines()
        .any(|l| l.trim_start().starts_with("error:"))
}

/// Interpret `process status` output
fn parse_process_state(text: &str) -> ProcessState {
    for line in text.lines() {
        if let Some(idx) = line.find("exited with status = ") {
            let rest = &line[idx + "exited with status = ".len()..];
            let code = rest
                .split_whitespace()
                .next()
                .and_then(|t| t.parse().ok())
                .unwrap_or(-1);
            return ProcessState::Exited(code);
        }
        if line.contains(" stopped") {
            return ProcessState::Stopped;
        }
        if line.contains(" is running") || line.contains(" launched:") {
            return ProcessState::Running;
        }
    }
    ProcessState::Unknown
}

/// Extract the breakpoint id from `breakpoint set` output, falling back
/// to the first breakpoint of the session
pub(super) fn parse_breakpoint_id(output: &str) -> u32 {
    for line in output.lines() {
        if let Some(rest) = line.trim_start().strip_prefix("Breakpoint ") {
            if let Some(id) = rest.split(':').next().and_then(|t| t.parse().ok()) {
                return id;
            }
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_state_stopped() {
        let text = "Process 2210 stopped\n* thread #1, name = 'corerun', stop reason = breakpoint 1.1\n";
        assert_eq!(parse_process_state(text), ProcessState::Stopped);
    }

    #[test]
    fn test_parse_state_exited() {
        let text = "Process 2210 exited with status = 0 (0x00000000)\n";
        assert_eq!(parse_process_state(text), ProcessState::Exited(0));

        let text = "Process 998 exited with status = 139 (0x0000008b)\n";
        assert_eq!(parse_process_state(text), ProcessState::Exited(139));
    }

    #[test]
    fn test_parse_state_running() {
        let text = "Process 41 is running.\n";
        assert_eq!(parse_process_state(text), ProcessState::Running);
    }

    #[test]
    fn test_parse_state_unknown() {
        assert_eq!(parse_process_state(""), ProcessState::Unknown);
        assert_eq!(
            parse_process_state("no process currently selected\n"),
            ProcessState::Unknown
        );
    }

    #[test]
    fn test_exited_beats_stopped_wording() {
        // status output mentioning both forms must resolve to the exit
        let text = "Process 7 exited with status = 1 (0x00000001)\nlast stop reason = breakpoint\n";
        assert_eq!(parse_process_state(text), ProcessState::Exited(1));
    }

    #[test]
    fn test_command_succeeded() {
        assert!(command_succeeded("Breakpoint 1: no locations (pending).\n"));
        assert!(!command_succeeded("error: unknown command 'bogus'\n"));
        assert!(!command_succeeded("some output\n  error: deeper failure\n"));
    }

    #[test]
    fn test_strip_prompt_handles_stacked_prompts() {
        assert_eq!(strip_prompt("(lldb) (lldb) version"), "version");
        assert_eq!(strip_prompt("plain output"), "plain output");
    }

    #[test]
    fn test_parse_breakpoint_id() {
        let out = "Breakpoint 3: where = libcoreclr.so`LoadLibraryExW, address = 0x00007f\n";
        assert_eq!(parse_breakpoint_id(out), 3);
        assert_eq!(parse_breakpoint_id("nothing matching"), 1);
    }
}
