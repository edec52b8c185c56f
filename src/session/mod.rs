//! In-session controller
//!
//! Runs inside the per-scenario session process. Owns the debuggee
//! lifecycle state machine: launch suspended, synchronize with managed
//! runtime bootstrap, hand control to the scenario, verify the exit.
//! Everything that matters for the outcome is persisted through the
//! sentinel store before and during the run, so a crash or deadline
//! kill at any point still leaves the driver a trustworthy signal.

mod backend;
mod lldb;

pub use backend::{CommandOutput, Debugger, ProcessState};
pub use lldb::LldbEngine;

use std::fmt;

use crate::assertions::{AssertionContext, NonFatal};
use crate::common::{Error, LaunchConfig, Result};
use crate::scenario::{Registry, Scenario};
use crate::sentinel::{SentinelStore, SummaryWriter};

/// Symbol the managed runtime's library loader funnels through while
/// bringing up the core libraries; stopping here proves bootstrap has
/// finished. Optimized runtime builds may strip it, which surfaces as a
/// plain assertion failure rather than a harness error.
pub const BOOTSTRAP_SYMBOL: &str = "LoadLibraryExW";

/// Debuggee lifecycle within one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Target bound, debuggee process not created yet
    NotLaunched,
    /// Debuggee created, suspended at its entry
    Launched,
    /// Stopped at the bootstrap breakpoint; runtime is loaded
    StoppedAtBootstrap,
    /// Control handed to scenario code
    RunningScenario,
    /// Debuggee terminated and exit status observed
    Exited,
    /// Session process terminated from outside by the driver's deadline;
    /// never observed from within a session
    Killed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotLaunched => write!(f, "not-launched"),
            Self::Launched => write!(f, "launched"),
            Self::StoppedAtBootstrap => write!(f, "stopped-at-bootstrap"),
            Self::RunningScenario => write!(f, "running-scenario"),
            Self::Exited => write!(f, "exited"),
            Self::Killed => write!(f, "killed"),
        }
    }
}

/// Parameters of one session, composed by the driver
#[derive(Debug)]
pub struct SessionConfig {
    pub launch: LaunchConfig,
    pub scenario: String,
}

/// Drives one debuggee under one engine through the lifecycle states
pub struct SessionController<'a> {
    engine: &'a mut dyn Debugger,
    state: SessionState,
}

impl<'a> SessionController<'a> {
    pub fn new(engine: &'a mut dyn Debugger) -> Self {
        Self {
            engine,
            state: SessionState::NotLaunched,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// NotLaunched → Launched: create the debuggee suspended at start
    pub async fn launch_suspended(&mut self) -> Result<()> {
        if self.state != SessionState::NotLaunched {
            return Err(Error::invalid_state("launch debuggee", self.state));
        }
        self.engine
            .execute_checked("process launch --stop-at-entry")
            .await?;
        self.state = SessionState::Launched;
        Ok(())
    }

    /// Launched → StoppedAtBootstrap: breakpoint on the runtime-loader
    /// symbol, continue, require a stop (not an exit) there
    ///
    /// A missed stop is recorded as a non-fatal assertion failure and
    /// the controller proceeds with whatever state the debuggee is in,
    /// so the reported symptom stays the missed bootstrap stop.
    pub async fn stop_at_bootstrap(&mut self, ctx: &mut AssertionContext) -> Result<()> {
        if self.state != SessionState::Launched {
            return Err(Error::invalid_state("synchronize with bootstrap", self.state));
        }

        let out = self
            .engine
            .execute_checked(&format!("breakpoint set -n {BOOTSTRAP_SYMBOL}"))
            .await?;
        let bp_id = lldb::parse_breakpoint_id(&out.text);

        self.engine.execute_checked("process continue").await?;
        let state = self.engine.process_state().await?;
        ctx.check_eq(
            state,
            ProcessState::Stopped,
            "debuggee stopped at the runtime bootstrap symbol",
            NonFatal,
        );
        if state == ProcessState::Stopped {
            self.state = SessionState::StoppedAtBootstrap;
        }

        // The bootstrap breakpoint must not interfere with breakpoints
        // the scenario installs.
        self.engine
            .execute_checked(&format!("breakpoint delete {bp_id}"))
            .await?;
        Ok(())
    }

    /// StoppedAtBootstrap → RunningScenario: hand control to the named
    /// scenario until it returns or aborts the session
    pub async fn run_scenario(
        &mut self,
        scenario: &dyn Scenario,
        debuggee: &str,
        ctx: &mut AssertionContext,
    ) -> Result<()> {
        match self.state {
            SessionState::Launched | SessionState::StoppedAtBootstrap => {}
            other => return Err(Error::invalid_state("run scenario", other)),
        }
        self.state = SessionState::RunningScenario;
        scenario.run(debuggee, &mut *self.engine, ctx).await
    }

    /// RunningScenario → Exited: observe the debuggee's exit status.
    /// The scenario was responsible for driving the debuggee to its
    /// terminal state; the controller does not resume it.
    pub async fn verify_exit(&mut self) -> Result<bool> {
        let state = self.engine.process_state().await?;
        if let ProcessState::Exited(code) = state {
            self.state = SessionState::Exited;
            tracing::info!(code, "debuggee exited");
            return Ok(code == 0);
        }
        tracing::warn!(%state, "debuggee did not exit");
        Ok(false)
    }
}

/// Run one scenario inside this process. Entry point of the hidden
/// `session` subcommand, one invocation per scenario.
pub async fn run(cfg: SessionConfig) -> Result<()> {
    let store = SentinelStore::new(&cfg.launch.work_dir);

    // Armed before the engine exists; disarmed once the engine answers.
    // An engine that wedges before the controller can do anything still
    // leaves this flag for the driver.
    store.arm_engine()?;
    store.arm()?;

    let registry = Registry::builtin();
    let scenario = registry.get(&cfg.scenario)?;

    let mut writer = SummaryWriter::open(store.summary_path())?;
    writer.new_suite(&Registry::qualified_name(&cfg.scenario))?;
    let mut ctx = AssertionContext::new(writer);

    let mut engine = LldbEngine::spawn(
        &cfg.launch.lldb,
        &cfg.launch.corerun,
        &cfg.launch.assembly,
    )
    .await?;
    engine.execute_checked("version").await?;
    store.disarm_engine()?;

    engine
        .execute_checked(&format!("plugin load {}", cfg.launch.plugin.display()))
        .await?;

    let debuggee = cfg.launch.debuggee_name();
    let mut controller = SessionController::new(&mut engine);
    controller.launch_suspended().await?;
    controller.stop_at_bootstrap(&mut ctx).await?;

    tracing::info!(scenario = %cfg.scenario, "starting scenario");
    controller
        .run_scenario(scenario.as_ref(), &debuggee, &mut ctx)
        .await?;
    let clean_exit = controller.verify_exit().await?;

    if clean_exit && !ctx.failed() {
        store.disarm()?;
    }
    ctx.writer_mut().complete()?;

    engine.shutdown().await?;
    Ok(())
}
