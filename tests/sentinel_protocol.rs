//! Sentinel-store invariants across a simulated session lifetime
//!
//! Replays the controller's end-of-suite logic against a scratch work
//! directory and checks that the on-disk state the driver reads afterward
//! matches what the summary log says happened.

use harness::assertions::{AssertionContext, NonFatal};
use harness::report::Report;
use harness::sentinel::{SentinelStore, SummaryWriter};

fn begin_suite(store: &SentinelStore, name: &str) -> AssertionContext {
    store.arm_engine().unwrap();
    store.arm().unwrap();
    let mut writer = SummaryWriter::open(store.summary_path()).unwrap();
    writer.new_suite(name).unwrap();
    AssertionContext::new(writer)
}

fn finish_suite(store: &SentinelStore, mut ctx: AssertionContext, clean_exit: bool) {
    if clean_exit && !ctx.failed() {
        store.disarm().unwrap();
    }
    ctx.writer_mut().complete().unwrap();
}

#[test]
fn clean_completion_disarms_flags_and_completes_suite() {
    let dir = tempfile::tempdir().unwrap();
    let store = SentinelStore::new(dir.path());

    let mut ctx = begin_suite(&store, "scenarios::cmd_bpmd");
    store.disarm_engine().unwrap();
    ctx.check_true(true, "entry breakpoint hit", NonFatal);
    ctx.check_true(true, "debuggee exited cleanly", NonFatal);
    finish_suite(&store, ctx, true);

    assert!(!store.flag_present());
    assert!(!store.engine_flag_present());

    let report = Report::parse(&std::fs::read_to_string(store.summary_path()).unwrap());
    let suite = &report.suites[0];
    assert_eq!(suite.name, "cmd_bpmd");
    assert_eq!((suite.passed, suite.failed), (2, 0));
    assert!(suite.complete);
}

#[test]
fn failed_assertion_keeps_flag_even_on_clean_exit() {
    let dir = tempfile::tempdir().unwrap();
    let store = SentinelStore::new(dir.path());

    let mut ctx = begin_suite(&store, "scenarios::cmd_clrstack");
    store.disarm_engine().unwrap();
    ctx.check_eq(1, 2, "stack frame count", NonFatal);
    finish_suite(&store, ctx, true);

    // flag present after termination means FAIL, whatever else happened
    assert!(store.flag_present());

    let report = Report::parse(&std::fs::read_to_string(store.summary_path()).unwrap());
    assert_eq!(report.suites[0].failed, 1);
    assert!(report.suites[0].complete);
    assert!(!report.failures.is_empty());
}

#[test]
fn dirty_exit_keeps_flag_despite_passing_assertions() {
    let dir = tempfile::tempdir().unwrap();
    let store = SentinelStore::new(dir.path());

    let mut ctx = begin_suite(&store, "scenarios::cmd_eeheap");
    store.disarm_engine().unwrap();
    ctx.check_true(true, "heap walked", NonFatal);
    finish_suite(&store, ctx, false);

    assert!(store.flag_present());
}

#[test]
fn killed_session_leaves_flag_and_incomplete_suite() {
    let dir = tempfile::tempdir().unwrap();
    let store = SentinelStore::new(dir.path());

    // a session killed mid-suite never reaches the completion logic
    let mut ctx = begin_suite(&store, "scenarios::cmd_dumpheap");
    store.disarm_engine().unwrap();
    ctx.check_true(true, "first probe", NonFatal);
    drop(ctx);

    assert!(store.flag_present());
    let report = Report::parse(&std::fs::read_to_string(store.summary_path()).unwrap());
    assert!(!report.suites[0].complete);
    assert!(!report.total().complete);
}

#[test]
fn wedged_engine_leaves_engine_flag() {
    let dir = tempfile::tempdir().unwrap();
    let store = SentinelStore::new(dir.path());

    // the engine never answered, so the engine flag was never disarmed
    let ctx = begin_suite(&store, "scenarios::cmd_soshelp");
    drop(ctx);

    assert!(store.engine_flag_present());
    assert!(store.flag_present());
}

#[test]
fn successive_suites_share_one_summary_log() {
    let dir = tempfile::tempdir().unwrap();
    let store = SentinelStore::new(dir.path());

    for (name, pass) in [("scenarios::a", true), ("scenarios::b", false)] {
        store.clear_flags().unwrap();
        let mut ctx = begin_suite(&store, name);
        store.disarm_engine().unwrap();
        ctx.check_true(pass, "probe", NonFatal);
        finish_suite(&store, ctx, true);
    }

    let report = Report::parse(&std::fs::read_to_string(store.summary_path()).unwrap());
    assert_eq!(report.suites.len(), 2);

    let total = report.total();
    assert_eq!((total.passed, total.failed), (1, 1));
    assert!(total.complete);
}
