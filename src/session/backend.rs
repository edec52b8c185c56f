//! Opaque command backend contract
//!
//! The harness does not implement a debugger. All it needs from one is
//! the ability to issue a command string and get back output text, a
//! success bit, and the debuggee's structured process state.

use async_trait::async_trait;
use std::fmt;

use crate::common::{Error, Result};

/// Debuggee process state as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Launched and executing
    Running,
    /// Stopped at a breakpoint or signal
    Stopped,
    /// Terminated with the given exit status
    Exited(i64),
    /// The engine's report did not match any known form
    Unknown,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Exited(code) => write!(f, "exited({code})"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Result of one engine command round trip
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Everything the command printed
    pub text: String,
    /// Whether the engine accepted the command
    pub success: bool,
}

/// The command surface scenarios and the controller drive the engine
/// through. Strictly one outstanding command at a time; every method
/// blocks until the engine has answered.
#[async_trait]
pub trait Debugger: Send {
    /// Issue one command and wait for its complete output
    async fn execute(&mut self, command: &str) -> Result<CommandOutput>;

    /// Probe the debuggee's process state
    async fn process_state(&mut self) -> Result<ProcessState>;

    /// Issue a command, treating an engine-reported failure as an
    /// unrecoverable harness error
    async fn execute_checked(&mut self, command: &str) -> Result<CommandOutput> {
        let out = self.execute(command).await?;
        if !out.success {
            return Err(Error::command_failed(command, &out.text));
        }
        Ok(out)
    }
}
