//! Scenario registry and contract
//!
//! A scenario is one named, independently pluggable test unit driving
//! the debuggee through the session handles. The registry is built once
//! at startup and queried by name; unknown names fail closed as a
//! configuration error.

mod commands;
mod helpers;

pub use helpers::{exec_and_find, expect_clean_exit, is_hex_token, stop_at_entry, ENTRY_METHOD};

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::assertions::AssertionContext;
use crate::common::{Error, Result};
use crate::session::Debugger;

/// One test scenario against a live debuggee
///
/// Outcomes are side-effected through the assertion context; an `Err`
/// means a command the harness cannot recover from. The scenario must
/// drive the debuggee to its expected terminal state itself — the
/// controller does not resume the process after `run` returns.
#[async_trait]
pub trait Scenario: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(
        &self,
        debuggee: &str,
        dbg: &mut dyn Debugger,
        ctx: &mut AssertionContext,
    ) -> Result<()>;
}

/// Name-to-handler mapping, built once at startup
pub struct Registry {
    scenarios: BTreeMap<&'static str, Arc<dyn Scenario>>,
}

impl Registry {
    pub fn builtin() -> Self {
        let mut registry = Self {
            scenarios: BTreeMap::new(),
        };
        commands::register(&mut registry);
        registry
    }

    fn insert(&mut self, scenario: Arc<dyn Scenario>) {
        self.scenarios.insert(scenario.name(), scenario);
    }

    /// Look up a handler by name, failing closed on unknown names
    pub fn get(&self, name: &str) -> Result<Arc<dyn Scenario>> {
        self.scenarios
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownScenario(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scenarios.contains_key(name)
    }

    /// Registered names in stable (sorted) order
    pub fn names(&self) -> Vec<&'static str> {
        self.scenarios.keys().copied().collect()
    }

    /// The name a suite is recorded under in the summary log
    pub fn qualified_name(name: &str) -> String {
        format!("scenarios::{name}")
    }
}
