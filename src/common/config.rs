//! Configuration file handling
//!
//! Launch parameters come from CLI flags with an optional TOML file
//! supplying defaults; flags win. Bare binary names are resolved
//! through `PATH`.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::paths::config_path;
use super::{Error, Result};

/// Per-scenario deadline when neither the CLI nor the config file set one
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Optional defaults read from `config.toml`
#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    /// Path to the debugger binary
    pub lldb: Option<PathBuf>,

    /// Path to the managed-runtime host that runs the debuggee
    pub corerun: Option<PathBuf>,

    /// Path to the debugger-extension plugin artifact
    pub plugin: Option<PathBuf>,

    /// Path to the debuggee assembly
    pub assembly: Option<PathBuf>,

    /// Per-scenario deadline in seconds
    pub timeout_secs: Option<u64>,

    /// Directory holding flags, the summary log and per-scenario logs
    pub work_dir: Option<PathBuf>,
}

impl FileConfig {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if the file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                let content =
                    std::fs::read_to_string(&path).map_err(|e| Error::FileRead {
                        path: path.display().to_string(),
                        error: e.to_string(),
                    })?;
                return toml::from_str(&content)
                    .map_err(|e| Error::ConfigParse(e.to_string()));
            }
        }
        Ok(Self::default())
    }
}

/// CLI-provided values layered over [`FileConfig`]
#[derive(Debug, Default)]
pub struct LaunchOverrides {
    pub lldb: Option<PathBuf>,
    pub corerun: Option<PathBuf>,
    pub plugin: Option<PathBuf>,
    pub assembly: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub work_dir: Option<PathBuf>,
}

/// Fully resolved launch parameters shared by the driver and the
/// in-session controller
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    pub lldb: PathBuf,
    pub corerun: PathBuf,
    pub plugin: PathBuf,
    pub assembly: PathBuf,
    pub timeout: Duration,
    pub work_dir: PathBuf,
}

impl LaunchConfig {
    /// Merge CLI overrides with file defaults into a complete
    /// configuration; missing required fields are a configuration error
    pub fn resolve(cli: LaunchOverrides, file: FileConfig) -> Result<Self> {
        let lldb = cli
            .lldb
            .or(file.lldb)
            .unwrap_or_else(|| PathBuf::from("lldb"));

        Ok(Self {
            lldb: resolve_binary(lldb)?,
            corerun: resolve_binary(require("corerun", cli.corerun.or(file.corerun))?)?,
            plugin: require("plugin", cli.plugin.or(file.plugin))?,
            assembly: require("assembly", cli.assembly.or(file.assembly))?,
            timeout: Duration::from_secs(
                cli.timeout_secs
                    .or(file.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            work_dir: cli
                .work_dir
                .or(file.work_dir)
                .unwrap_or_else(|| PathBuf::from(".")),
        })
    }

    /// Construct from already-resolved values (the `session` subcommand,
    /// whose arguments were composed by the driver)
    pub fn from_resolved(
        lldb: PathBuf,
        corerun: PathBuf,
        plugin: PathBuf,
        assembly: PathBuf,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            lldb,
            corerun,
            plugin,
            assembly,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            work_dir,
        }
    }

    /// File name of the debuggee assembly, as scenarios refer to it
    pub fn debuggee_name(&self) -> String {
        self.assembly
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.assembly.display().to_string())
    }
}

fn require(field: &str, value: Option<PathBuf>) -> Result<PathBuf> {
    value.ok_or_else(|| {
        Error::Config(format!(
            "missing required parameter '--{field}' (not on the command line or in config.toml)"
        ))
    })
}

/// Resolve a bare binary name through `PATH`; explicit paths pass through
fn resolve_binary(path: PathBuf) -> Result<PathBuf> {
    if path.components().count() > 1 || path.is_file() {
        return Ok(path);
    }
    which::which(&path).map_err(|_| Error::BinaryNotFound {
        name: path.display().to_string(),
        searched: "PATH".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_config() -> FileConfig {
        FileConfig {
            lldb: Some(PathBuf::from("/opt/llvm/bin/lldb")),
            corerun: Some(PathBuf::from("/runtime/corerun")),
            plugin: Some(PathBuf::from("/runtime/libplugin.so")),
            assembly: Some(PathBuf::from("/tests/test.exe")),
            timeout_secs: Some(30),
            work_dir: None,
        }
    }

    #[test]
    fn test_cli_overrides_file() {
        let cli = LaunchOverrides {
            timeout_secs: Some(5),
            assembly: Some(PathBuf::from("/tests/other.exe")),
            ..Default::default()
        };
        let cfg = LaunchConfig::resolve(cli, file_config()).unwrap();
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(cfg.assembly, PathBuf::from("/tests/other.exe"));
        assert_eq!(cfg.corerun, PathBuf::from("/runtime/corerun"));
    }

    #[test]
    fn test_missing_required_field() {
        let mut file = file_config();
        file.plugin = None;
        let err = LaunchConfig::resolve(LaunchOverrides::default(), file).unwrap_err();
        assert!(err.to_string().contains("--plugin"));
    }

    #[test]
    fn test_default_timeout_applied() {
        let mut file = file_config();
        file.timeout_secs = None;
        let cfg = LaunchConfig::resolve(LaunchOverrides::default(), file).unwrap();
        assert_eq!(cfg.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_explicit_paths_not_searched() {
        // Multi-component paths bypass the PATH lookup even when absent
        let resolved = resolve_binary(PathBuf::from("/no/such/dir/lldb")).unwrap();
        assert_eq!(resolved, PathBuf::from("/no/such/dir/lldb"));
    }

    #[test]
    fn test_debuggee_name_is_file_name() {
        let cfg = LaunchConfig::resolve(LaunchOverrides::default(), file_config()).unwrap();
        assert_eq!(cfg.debuggee_name(), "test.exe");
    }
}
