//! Assertion primitives recording outcomes against the sentinel store
//!
//! Each check appends one `True`/`False` line to the summary log; a
//! failure also appends a context block carrying the call-site location
//! captured through `#[track_caller]` and a description of what was
//! checked. A fatal failure terminates the whole session process at
//! once: after one, the debuggee and engine state can no longer be
//! trusted, and continuing only risks a hang the driver's deadline would
//! have to absorb.

use std::fmt::Debug;
use std::panic::Location;
use std::process;

use crate::sentinel::SummaryWriter;

pub use Fatality::{Fatal, NonFatal};

/// Whether a failed check aborts the session or returns control to the
/// scenario so it may continue probing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fatality {
    Fatal,
    NonFatal,
}

/// Exit status of a session aborted by a fatal assertion
const FATAL_EXIT_CODE: i32 = 1;

/// Records assertion outcomes for one suite
///
/// Passed by reference through the controller and into scenario code;
/// there is no process-wide mutable state.
pub struct AssertionContext {
    writer: SummaryWriter,
    failed: bool,
}

impl AssertionContext {
    pub fn new(writer: SummaryWriter) -> Self {
        Self {
            writer,
            failed: false,
        }
    }

    /// Whether any check has failed so far in this suite
    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn writer_mut(&mut self) -> &mut SummaryWriter {
        &mut self.writer
    }

    /// Check that `cond` holds. Returns the outcome for non-fatal use;
    /// a fatal failure does not return.
    #[track_caller]
    pub fn check_true(&mut self, cond: bool, what: &str, fatality: Fatality) -> bool {
        self.record(cond, what, fatality, Location::caller())
    }

    /// Check that `cond` does not hold
    #[track_caller]
    pub fn check_false(&mut self, cond: bool, what: &str, fatality: Fatality) -> bool {
        self.record(!cond, what, fatality, Location::caller())
    }

    /// Check that two values compare equal; the failure context records
    /// both sides
    #[track_caller]
    pub fn check_eq<T: PartialEq + Debug>(
        &mut self,
        actual: T,
        expected: T,
        what: &str,
        fatality: Fatality,
    ) -> bool {
        let passed = actual == expected;
        let description = if passed {
            what.to_string()
        } else {
            format!("{what}: got {actual:?}, expected {expected:?}")
        };
        self.record(passed, &description, fatality, Location::caller())
    }

    /// Check that two values compare unequal
    #[track_caller]
    pub fn check_ne<T: PartialEq + Debug>(
        &mut self,
        actual: T,
        unexpected: T,
        what: &str,
        fatality: Fatality,
    ) -> bool {
        let passed = actual != unexpected;
        let description = if passed {
            what.to_string()
        } else {
            format!("{what}: got {actual:?}, expected anything else")
        };
        self.record(passed, &description, fatality, Location::caller())
    }

    fn record(
        &mut self,
        passed: bool,
        description: &str,
        fatality: Fatality,
        location: &Location<'_>,
    ) -> bool {
        // A summary write that fails cannot be reported anywhere better
        // than the session's stderr log; the armed fail flag still
        // carries the outcome to the driver.
        if let Err(e) = self.writer.outcome(passed) {
            tracing::error!(error = %e, "failed to append assertion outcome");
        }

        if passed {
            return true;
        }

        self.failed = true;
        let location = format!("{}:{}", location.file(), location.line());
        tracing::warn!(%location, description, "assertion failed");
        if let Err(e) = self.writer.failure_context(&location, description) {
            tracing::error!(error = %e, "failed to append failure context");
        }

        if fatality == Fatal {
            tracing::error!(%location, description, "fatal assertion, aborting session");
            process::exit(FATAL_EXIT_CODE);
        }
        false
    }
}
