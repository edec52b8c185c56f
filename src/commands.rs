//! CLI command definitions
//!
//! Defines the clap commands for the harness binary.

use clap::Subcommand;
use std::path::PathBuf;

use crate::sentinel::SUMMARY_FILE;

#[derive(Subcommand)]
pub enum Commands {
    /// Run scenarios, one debugger session per scenario
    Run {
        /// Scenario names to run (default: every registered scenario)
        scenarios: Vec<String>,

        /// Path to the debugger binary (bare names resolved through PATH)
        #[arg(long)]
        lldb: Option<PathBuf>,

        /// Path to the managed-runtime host that runs the debuggee
        #[arg(long)]
        corerun: Option<PathBuf>,

        /// Path to the debugger-extension plugin to load
        #[arg(long)]
        plugin: Option<PathBuf>,

        /// Path to the debuggee assembly
        #[arg(long)]
        assembly: Option<PathBuf>,

        /// Per-scenario deadline in seconds (default: 120)
        #[arg(long)]
        timeout: Option<u64>,

        /// Directory for flags, the summary log and per-scenario logs
        #[arg(long)]
        work_dir: Option<PathBuf>,

        /// List registered scenarios and exit
        #[arg(long)]
        list: bool,
    },

    /// Render a report from an existing summary log
    Report {
        /// Path to the summary log
        #[arg(default_value = SUMMARY_FILE)]
        summary: PathBuf,

        /// Emit JSON instead of the table
        #[arg(long)]
        json: bool,
    },

    /// In-session controller; launched by `run`, one process per scenario
    #[command(hide = true)]
    Session {
        #[arg(long)]
        lldb: PathBuf,

        #[arg(long)]
        corerun: PathBuf,

        #[arg(long)]
        plugin: PathBuf,

        #[arg(long)]
        assembly: PathBuf,

        #[arg(long)]
        work_dir: PathBuf,

        #[arg(long)]
        scenario: String,
    },
}
