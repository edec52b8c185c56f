//! Shared building blocks scenarios use to move the debuggee between
//! its well-known states

use crate::assertions::{AssertionContext, Fatal};
use crate::common::Result;
use crate::session::{Debugger, ProcessState};

/// Entry method every debuggee assembly exposes
pub const ENTRY_METHOD: &str = "Test.Main";

/// Bring the debuggee from the bootstrap stop to the managed entry
/// method through the extension's managed-method breakpoint command
///
/// Requires the debuggee to still be stopped from the bootstrap
/// breakpoint; the extension command must be accepted and must say
/// something (at minimum its pending-breakpoint notice).
pub async fn stop_at_entry(
    dbg: &mut dyn Debugger,
    ctx: &mut AssertionContext,
    debuggee: &str,
) -> Result<()> {
    let state = dbg.process_state().await?;
    ctx.check_eq(
        state,
        ProcessState::Stopped,
        "debuggee stopped before setting the entry breakpoint",
        Fatal,
    );

    let out = dbg
        .execute(&format!("bpmd {debuggee} {ENTRY_METHOD}"))
        .await?;
    ctx.check_true(out.success, "bpmd accepted the entry-method breakpoint", Fatal);
    ctx.check_true(!out.text.trim().is_empty(), "bpmd produced output", Fatal);

    dbg.execute_checked("process continue").await?;
    let state = dbg.process_state().await?;
    ctx.check_eq(
        state,
        ProcessState::Stopped,
        "debuggee stopped at the entry method",
        Fatal,
    );
    Ok(())
}

/// Resume the debuggee and require it to exit with status zero
pub async fn expect_clean_exit(dbg: &mut dyn Debugger, ctx: &mut AssertionContext) -> Result<()> {
    dbg.execute_checked("process continue").await?;
    let state = dbg.process_state().await?;
    ctx.check_true(
        matches!(state, ProcessState::Exited(_)),
        "debuggee exited",
        Fatal,
    );
    ctx.check_eq(state, ProcessState::Exited(0), "debuggee exit status", Fatal);
    Ok(())
}

/// Issue a command and scan its output line by line with `extract`,
/// returning the first extracted token
pub async fn exec_and_find<F>(
    dbg: &mut dyn Debugger,
    command: &str,
    mut extract: F,
) -> Result<Option<String>>
where
    F: FnMut(&str) -> Option<String> + Send,
{
    let out = dbg.execute_checked(command).await?;
    for line in out.text.lines() {
        if let Some(token) = extract(line) {
            tracing::debug!(command, %token, "exec_and_find matched");
            return Ok(Some(token));
        }
    }
    Ok(None)
}

/// Whether a token parses as a (possibly 0x-prefixed) hexadecimal number
pub fn is_hex_token(token: &str) -> bool {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    !digits.is_empty() && u64::from_str_radix(digits, 16).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_hex_token() {
        assert!(is_hex_token("7f1b2c00"));
        assert!(is_hex_token("0x7f1b2c00"));
        assert!(is_hex_token("0X00DEAD"));
        assert!(!is_hex_token(""));
        assert!(!is_hex_token("0x"));
        assert!(!is_hex_token("module"));
        assert!(!is_hex_token("0x7g"));
    }
}
