//! Builtin extension-command scenarios
//!
//! Each scenario brings the debuggee to the managed entry method,
//! exercises one extension command, and drives the debuggee to a clean
//! exit, recording every expectation through the assertion context.

use std::sync::Arc;

use async_trait::async_trait;

use crate::assertions::{AssertionContext, Fatal, NonFatal};
use crate::common::Result;
use crate::session::Debugger;

use super::helpers::{exec_and_find, expect_clean_exit, is_hex_token, stop_at_entry, ENTRY_METHOD};
use super::{Registry, Scenario};

/// Commands checked by the generic smoke scenario: accepted, with
/// non-empty output, against a debuggee stopped at the entry method
const SMOKE_COMMANDS: &[(&str, &str)] = &[
    ("cmd_clrstack", "clrstack"),
    ("cmd_clrthreads", "clrthreads"),
    ("cmd_dso", "dso"),
    ("cmd_dumpheap", "dumpheap -stat"),
    ("cmd_eeheap", "eeheap"),
    ("cmd_soshelp", "soshelp"),
];

pub(super) fn register(registry: &mut Registry) {
    registry.insert(Arc::new(EntryBreakpoint));
    registry.insert(Arc::new(ModuleDump));
    for (name, command) in SMOKE_COMMANDS {
        registry.insert(Arc::new(CommandSmoke { name, command }));
    }
}

/// The managed-method breakpoint command itself is the subject: the
/// entry breakpoint resolving and hitting is the whole check
struct EntryBreakpoint;

#[async_trait]
impl Scenario for EntryBreakpoint {
    fn name(&self) -> &'static str {
        "cmd_bpmd"
    }

    async fn run(
        &self,
        debuggee: &str,
        dbg: &mut dyn Debugger,
        ctx: &mut AssertionContext,
    ) -> Result<()> {
        stop_at_entry(dbg, ctx, debuggee).await?;
        expect_clean_exit(dbg, ctx).await
    }
}

/// Chases the module address out of `name2ee` and dumps it
struct ModuleDump;

#[async_trait]
impl Scenario for ModuleDump {
    fn name(&self) -> &'static str {
        "cmd_dumpmodule"
    }

    async fn run(
        &self,
        debuggee: &str,
        dbg: &mut dyn Debugger,
        ctx: &mut AssertionContext,
    ) -> Result<()> {
        stop_at_entry(dbg, ctx, debuggee).await?;

        let address = exec_and_find(
            dbg,
            &format!("name2ee {debuggee} {ENTRY_METHOD}"),
            extract_module_address,
        )
        .await?;
        ctx.check_true(address.is_some(), "name2ee reported a module address", Fatal);
        let address = match address {
            Some(a) => a,
            // unreachable past the fatal check; keeps the scenario total
            None => return expect_clean_exit(dbg, ctx).await,
        };
        ctx.check_true(
            is_hex_token(&address),
            "module address is hexadecimal",
            NonFatal,
        );

        let out = dbg.execute(&format!("dumpmodule {address}")).await?;
        ctx.check_true(out.success, "dumpmodule accepted the address", Fatal);
        ctx.check_true(!out.text.trim().is_empty(), "dumpmodule produced output", NonFatal);

        expect_clean_exit(dbg, ctx).await
    }
}

fn extract_module_address(line: &str) -> Option<String> {
    line.trim()
        .strip_prefix("Module:")
        .and_then(|rest| rest.split_whitespace().next())
        .map(str::to_string)
}

/// Stops at the entry method, issues one extension command, checks it is
/// accepted with non-empty output, then runs the debuggee to exit
struct CommandSmoke {
    name: &'static str,
    command: &'static str,
}

#[async_trait]
impl Scenario for CommandSmoke {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn run(
        &self,
        debuggee: &str,
        dbg: &mut dyn Debugger,
        ctx: &mut AssertionContext,
    ) -> Result<()> {
        stop_at_entry(dbg, ctx, debuggee).await?;

        let out = dbg.execute(self.command).await?;
        ctx.check_true(
            out.success,
            &format!("'{}' accepted", self.command),
            Fatal,
        );
        ctx.check_true(
            !out.text.trim().is_empty(),
            &format!("'{}' produced output", self.command),
            NonFatal,
        );

        expect_clean_exit(dbg, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_module_address() {
        assert_eq!(
            extract_module_address("Module:      00007f7f2c1f4000"),
            Some("00007f7f2c1f4000".to_string())
        );
        assert_eq!(extract_module_address("Token:       0x0600000"), None);
        assert_eq!(extract_module_address(""), None);
    }

    #[test]
    fn test_smoke_names_are_unique() {
        let mut names: Vec<&str> = SMOKE_COMMANDS.iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SMOKE_COMMANDS.len());
    }
}
