//! Configuration module
//!
//! Run configuration, loaded from defaults, an optional file and
//! `SUITE_RUNNER_*` environment variables. A run reads it when it starts,
//! so changes made after the suite tree is built still apply.

mod env;
mod file;

pub use env::{print_env_help, EnvBuilder, EnvConfig, EnvGuard};
pub use file::{expand_path, CONFIG_LOCATIONS};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::RunError;
use crate::output::ReporterMode;

/// Default number of tests in flight per suite batch
pub const DEFAULT_CONCURRENCY: usize = 50;

/// Default snapshot directory, relative to the working directory
pub const DEFAULT_SNAPSHOT_DIR: &str = "__snapshots__";

/// Run configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Maximum concurrent tests within one suite batch
    pub concurrency: usize,

    /// Directory holding snapshot files
    pub snapshot_dir: PathBuf,

    /// Reporter output mode
    pub reporter: ReporterMode,

    /// Only run tests whose title matches this pattern
    pub filter: Option<String>,

    /// Per-attempt timeout for tests without their own, in milliseconds
    pub timeout_ms: Option<u64>,

    /// Re-run on file changes; consumed by the outer process
    pub watch: bool,

    /// Make snapshot matchers pass without touching disk
    pub disable_snapshots: bool,

    /// Overwrite mismatching snapshots instead of failing
    pub update_snapshots: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            snapshot_dir: PathBuf::from(DEFAULT_SNAPSHOT_DIR),
            reporter: ReporterMode::Default,
            filter: None,
            timeout_ms: None,
            watch: false,
            disable_snapshots: false,
            update_snapshots: false,
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_filter(mut self, pattern: impl Into<String>) -> Self {
        self.filter = Some(pattern.into());
        self
    }

    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }

    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = dir.into();
        self
    }

    pub fn with_reporter(mut self, reporter: ReporterMode) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn without_snapshots(mut self) -> Self {
        self.disable_snapshots = true;
        self
    }

    /// Concurrency actually used; zero means one
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }

    pub fn default_timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Compile the title filter, if any
    pub fn compile_filter(&self) -> Result<Option<Regex>, RunError> {
        self.filter
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(RunError::from)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), RunError> {
        if self.timeout_ms == Some(0) {
            return Err(RunError::Config(
                "timeout_ms must be positive when set".to_string(),
            ));
        }
        if self.disable_snapshots && self.update_snapshots {
            return Err(RunError::Config(
                "disable_snapshots and update_snapshots are mutually exclusive".to_string(),
            ));
        }
        self.compile_filter()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();
        assert_eq!(config.concurrency, 50);
        assert_eq!(config.snapshot_dir, PathBuf::from("__snapshots__"));
        assert_eq!(config.reporter, ReporterMode::Default);
        assert!(config.default_timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_treated_as_one() {
        let config = RunConfig::new().with_concurrency(0);
        assert_eq!(config.effective_concurrency(), 1);
    }

    #[test]
    fn test_validate_rejects_bad_filter() {
        let config = RunConfig::new().with_filter("(unclosed");
        assert!(matches!(config.validate(), Err(RunError::Filter(_))));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = RunConfig::new().with_timeout_ms(0);
        assert!(matches!(config.validate(), Err(RunError::Config(_))));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: RunConfig = serde_yaml::from_str("concurrency: 4\nfilter: ^Math\n").unwrap();
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.filter.as_deref(), Some("^Math"));
        assert_eq!(config.snapshot_dir, PathBuf::from(DEFAULT_SNAPSHOT_DIR));
    }
}
