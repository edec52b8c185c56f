//! Filesystem-backed pass/fail signalling shared between the driver and
//! the in-session controller
//!
//! The fail flags and the summary log are the only state that survives a
//! crashed, hung or killed session process. The driver never reads them
//! until the session has terminated, and the session only appends, so no
//! locking is needed. A flag still present after the session is gone
//! means FAIL, whatever the session's own exit status claimed.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::common::Result;

/// Generic fail flag, owned by the controller for the suite's lifetime
pub const FAIL_FLAG: &str = "fail_flag";

/// Engine-variant fail flag: armed before the debugger engine is brought
/// up and disarmed once the engine answers, so an engine that wedges
/// before the controller can act still leaves a flag behind
pub const ENGINE_FAIL_FLAG: &str = "fail_flag.lldb";

/// Append-only summary log shared by all suites of a run
pub const SUMMARY_FILE: &str = "summary";

/// Handle on the sentinel files of one work directory
#[derive(Debug, Clone)]
pub struct SentinelStore {
    work_dir: PathBuf,
}

impl SentinelStore {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn flag_path(&self) -> PathBuf {
        self.work_dir.join(FAIL_FLAG)
    }

    pub fn engine_flag_path(&self) -> PathBuf {
        self.work_dir.join(ENGINE_FAIL_FLAG)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.work_dir.join(SUMMARY_FILE)
    }

    /// Create the generic fail flag. Existence is the signal; content is
    /// irrelevant.
    pub fn arm(&self) -> Result<()> {
        File::create(self.flag_path())?;
        Ok(())
    }

    /// Create the engine-variant fail flag
    pub fn arm_engine(&self) -> Result<()> {
        File::create(self.engine_flag_path())?;
        Ok(())
    }

    /// Remove the generic fail flag — only called on confirmed clean
    /// completion (zero failed assertions, clean debuggee exit)
    pub fn disarm(&self) -> Result<()> {
        remove_if_present(&self.flag_path())
    }

    /// Remove the engine-variant flag once the engine has answered
    pub fn disarm_engine(&self) -> Result<()> {
        remove_if_present(&self.engine_flag_path())
    }

    pub fn flag_present(&self) -> bool {
        self.flag_path().exists()
    }

    pub fn engine_flag_present(&self) -> bool {
        self.engine_flag_path().exists()
    }

    /// Remove both flags so the next scenario starts clean
    pub fn clear_flags(&self) -> Result<()> {
        remove_if_present(&self.flag_path())?;
        remove_if_present(&self.engine_flag_path())
    }

    /// Start the summary log over; the driver does this once per run
    pub fn truncate_summary(&self) -> Result<()> {
        remove_if_present(&self.summary_path())
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Append-only writer for the summary log line protocol
///
/// Every record is flushed immediately: a session killed mid-suite must
/// leave everything written so far on disk.
pub struct SummaryWriter {
    file: File,
}

impl SummaryWriter {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new().append(true).create(true).open(path)?;
        Ok(Self { file })
    }

    /// `new_suite: <qualified-scenario-name>` — suite boundary
    pub fn new_suite(&mut self, qualified_name: &str) -> Result<()> {
        self.line(&format!("new_suite: {qualified_name}"))
    }

    /// `True` or `False` — one line per assertion outcome
    pub fn outcome(&mut self, passed: bool) -> Result<()> {
        self.line(if passed { "True" } else { "False" })
    }

    /// The three-line failure-context block recorded after a `False`
    pub fn failure_context(&mut self, location: &str, description: &str) -> Result<()> {
        self.line("!!! test failed:")?;
        self.line(&format!("!!!  {location}"))?;
        self.line(&format!("!!! {description}"))
    }

    /// `Complete!` — the suite ran to its end without a fatal abort
    pub fn complete(&mut self) -> Result<()> {
        self.line("Complete!")
    }

    fn line(&mut self, s: &str) -> Result<()> {
        writeln!(self.file, "{s}")?;
        self.file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SentinelStore::new(dir.path());

        assert!(!store.flag_present());
        store.arm().unwrap();
        store.arm_engine().unwrap();
        assert!(store.flag_present());
        assert!(store.engine_flag_present());

        store.disarm_engine().unwrap();
        assert!(store.flag_present());
        assert!(!store.engine_flag_present());

        store.disarm().unwrap();
        assert!(!store.flag_present());
    }

    #[test]
    fn test_clear_flags_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SentinelStore::new(dir.path());

        store.clear_flags().unwrap();
        store.arm().unwrap();
        store.clear_flags().unwrap();
        store.clear_flags().unwrap();
        assert!(!store.flag_present());
        assert!(!store.engine_flag_present());
    }

    #[test]
    fn test_summary_line_protocol() {
        let dir = tempfile::tempdir().unwrap();
        let store = SentinelStore::new(dir.path());

        let mut writer = SummaryWriter::open(store.summary_path()).unwrap();
        writer.new_suite("scenarios::cmd_bpmd").unwrap();
        writer.outcome(true).unwrap();
        writer.outcome(false).unwrap();
        writer
            .failure_context("src/scenario/helpers.rs:17", "debuggee stopped at entry method")
            .unwrap();
        writer.complete().unwrap();

        let text = std::fs::read_to_string(store.summary_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "new_suite: scenarios::cmd_bpmd",
                "True",
                "False",
                "!!! test failed:",
                "!!!  src/scenario/helpers.rs:17",
                "!!! debuggee stopped at entry method",
                "Complete!",
            ]
        );
    }

    #[test]
    fn test_summary_appends_across_writers() {
        let dir = tempfile::tempdir().unwrap();
        let store = SentinelStore::new(dir.path());

        {
            let mut w = SummaryWriter::open(store.summary_path()).unwrap();
            w.new_suite("a").unwrap();
        }
        {
            let mut w = SummaryWriter::open(store.summary_path()).unwrap();
            w.new_suite("b").unwrap();
        }

        let text = std::fs::read_to_string(store.summary_path()).unwrap();
        assert_eq!(text, "new_suite: a\nnew_suite: b\n");
    }
}
