//! Outer harness driver
//!
//! One debugger session process per scenario, launched and awaited
//! sequentially with a wall-clock deadline. The outcome of a scenario
//! is decided entirely from the sentinel store after the session process
//! is gone; the session's own exit status is informational only, since
//! a crashed or killed session can report anything or nothing.

mod launch;

pub use launch::{session_args, session_command, wait_or_kill, SessionExit};

use std::fs::File;
use std::process::Stdio;

use colored::Colorize;

use crate::common::{Error, LaunchConfig, Result};
use crate::report::Report;
use crate::scenario::Registry;
use crate::sentinel::SentinelStore;

/// Per-run tally; the caller decides the process exit status from it
#[derive(Debug, Default)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
}

enum Outcome {
    Passed,
    Failed(String),
}

/// Run the named scenarios (all registered ones if empty), then print
/// the aggregate report parsed from the summary log
pub async fn run(cfg: LaunchConfig, scenarios: Vec<String>) -> Result<RunSummary> {
    let registry = Registry::builtin();
    let names: Vec<String> = if scenarios.is_empty() {
        registry.names().iter().map(|n| n.to_string()).collect()
    } else {
        // validate every name before launching anything
        for name in &scenarios {
            registry.get(name)?;
        }
        scenarios
    };

    std::fs::create_dir_all(&cfg.work_dir)?;
    let store = SentinelStore::new(&cfg.work_dir);
    store.truncate_summary()?;

    tracing::info!(
        lldb = %cfg.lldb.display(),
        corerun = %cfg.corerun.display(),
        plugin = %cfg.plugin.display(),
        assembly = %cfg.assembly.display(),
        timeout_secs = cfg.timeout.as_secs(),
        scenarios = names.len(),
        "starting run"
    );

    let mut summary = RunSummary::default();
    for name in &names {
        match run_scenario(&cfg, &store, name).await {
            Outcome::Passed => {
                summary.passed += 1;
                println!("{} {}", "✓".green(), name);
            }
            Outcome::Failed(reason) => {
                summary.failed += 1;
                println!("{} {} ({})", "✗".red(), name, reason);
            }
        }
        // leftover flags never leak into the next scenario
        if let Err(e) = store.clear_flags() {
            tracing::warn!(error = %e, "failed to clear sentinel flags");
        }
    }

    let text = std::fs::read_to_string(store.summary_path()).unwrap_or_default();
    print!("{}", Report::parse(&text).render());

    Ok(summary)
}

async fn run_scenario(cfg: &LaunchConfig, store: &SentinelStore, name: &str) -> Outcome {
    if let Err(e) = store.clear_flags() {
        return Outcome::Failed(format!("clearing stale flags: {e}"));
    }

    let child = match spawn_session(cfg, store, name) {
        Ok(child) => child,
        // never started: immediate failure, no deadline timer
        Err(e) => return Outcome::Failed(e.to_string()),
    };

    let mut killed = false;
    match launch::wait_or_kill(child, cfg.timeout).await {
        Ok(SessionExit::Completed(status)) => {
            tracing::debug!(%name, ?status, "session finished");
        }
        Ok(SessionExit::Killed) => {
            killed = true;
            tracing::warn!(
                %name,
                timeout_secs = cfg.timeout.as_secs(),
                "deadline exceeded, session process group killed"
            );
        }
        Err(e) => {
            tracing::warn!(%name, error = %e, "failed to reap session");
        }
    }

    // The sentinel store is the only authority on the outcome.
    let mut reasons = Vec::new();
    if killed {
        reasons.push("deadline exceeded".to_string());
    }
    if store.flag_present() {
        reasons.push("fail flag present".to_string());
    }
    if store.engine_flag_present() {
        reasons.push("engine fail flag present".to_string());
    }

    if store.flag_present() || store.engine_flag_present() {
        Outcome::Failed(reasons.join(", "))
    } else {
        // a kill that raced an already-confirmed clean completion is a
        // pass: the flags were removed before the deadline fired
        Outcome::Passed
    }
}

fn spawn_session(
    cfg: &LaunchConfig,
    store: &SentinelStore,
    name: &str,
) -> Result<tokio::process::Child> {
    let stdout = File::create(store.work_dir().join(format!("{name}.log")))
        .map_err(|e| Error::session_launch_failed(name, e))?;
    let stderr = File::create(store.work_dir().join(format!("{name}.log.2")))
        .map_err(|e| Error::session_launch_failed(name, e))?;

    let mut cmd = launch::session_command(cfg, name)?;
    cmd.stdout(Stdio::from(stdout)).stderr(Stdio::from(stderr));

    tokio::process::Command::from(cmd)
        .spawn()
        .map_err(|e| Error::session_launch_failed(name, e))
}
