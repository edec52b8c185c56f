//! Error types for the harness
//!
//! Every in-session failure ultimately funnels into sentinel-flag
//! persistence; these errors exist to surface *why* a session gave up.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Unknown scenario '{0}'. Run 'harness run --list' to see registered scenarios")]
    UnknownScenario(String),

    #[error("Binary '{name}' not found. Searched: {searched}")]
    BinaryNotFound { name: String, searched: String },

    // === Engine Errors ===
    #[error("Debugger engine failed to start: {0}")]
    EngineStartFailed(String),

    #[error("Debugger engine closed its command stream unexpectedly")]
    EngineClosed,

    /// Any command the engine reports as failed is unrecoverable: the
    /// controller cannot reason about debuggee state afterwards.
    #[error("Command '{command}' failed:\n{output}")]
    CommandFailed { command: String, output: String },

    // === Session Errors ===
    #[error("Cannot {action} while session is {state}")]
    InvalidState { action: String, state: String },

    // === Driver Errors ===
    #[error("Failed to launch session for scenario '{scenario}': {error}")]
    SessionLaunchFailed { scenario: String, error: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a command failed error, keeping the engine's output for
    /// the postmortem log
    pub fn command_failed(command: &str, output: &str) -> Self {
        Self::CommandFailed {
            command: command.to_string(),
            output: output.trim_end().to_string(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(action: &str, state: impl std::fmt::Display) -> Self {
        Self::InvalidState {
            action: action.to_string(),
            state: state.to_string(),
        }
    }

    /// Create a session launch failure error
    pub fn session_launch_failed(scenario: &str, error: impl std::fmt::Display) -> Self {
        Self::SessionLaunchFailed {
            scenario: scenario.to_string(),
            error: error.to_string(),
        }
    }
}
