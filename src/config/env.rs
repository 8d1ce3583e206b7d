//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;
use std::path::PathBuf;

use super::RunConfig;
use crate::output::ReporterMode;

/// Environment variable prefix
const ENV_PREFIX: &str = "SUITE_RUNNER";

/// Configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Concurrency from SUITE_RUNNER_CONCURRENCY
    pub concurrency: Option<usize>,
    /// Title filter from SUITE_RUNNER_FILTER
    pub filter: Option<String>,
    /// Default timeout (ms) from SUITE_RUNNER_TIMEOUT
    pub timeout_ms: Option<u64>,
    /// Reporter from SUITE_RUNNER_REPORTER
    pub reporter: Option<String>,
    /// Snapshot directory from SUITE_RUNNER_SNAPSHOT_DIR
    pub snapshot_dir: Option<String>,
    /// Disable snapshots from SUITE_RUNNER_NO_SNAPSHOTS
    pub disable_snapshots: Option<bool>,
    /// Update snapshots from SUITE_RUNNER_UPDATE_SNAPSHOTS
    pub update_snapshots: Option<bool>,
    /// Watch flag from SUITE_RUNNER_WATCH
    pub watch: Option<bool>,
    /// Config file from SUITE_RUNNER_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            concurrency: get_env_parse("CONCURRENCY"),
            filter: get_env("FILTER"),
            timeout_ms: get_env_parse("TIMEOUT"),
            reporter: get_env("REPORTER"),
            snapshot_dir: get_env("SNAPSHOT_DIR"),
            disable_snapshots: get_env_bool("NO_SNAPSHOTS"),
            update_snapshots: get_env_bool("UPDATE_SNAPSHOTS"),
            watch: get_env_bool("WATCH"),
            config_file: get_env("CONFIG"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.concurrency.is_some()
            || self.filter.is_some()
            || self.timeout_ms.is_some()
            || self.reporter.is_some()
            || self.snapshot_dir.is_some()
            || self.disable_snapshots.is_some()
            || self.update_snapshots.is_some()
            || self.watch.is_some()
            || self.config_file.is_some()
    }

    /// Overwrite the fields of `config` that are set in the environment
    pub fn apply_to(&self, config: &mut RunConfig) {
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(filter) = &self.filter {
            config.filter = Some(filter.clone());
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = Some(timeout_ms);
        }
        if let Some(mode) = self.reporter.as_deref().and_then(ReporterMode::parse) {
            config.reporter = mode;
        }
        if let Some(dir) = &self.snapshot_dir {
            config.snapshot_dir = PathBuf::from(dir);
        }
        if let Some(disable) = self.disable_snapshots {
            config.disable_snapshots = disable;
        }
        if let Some(update) = self.update_snapshots {
            config.update_snapshots = update;
        }
        if let Some(watch) = self.watch {
            config.watch = watch;
        }
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {ENV_PREFIX}_CONCURRENCY:      {:?}", self.concurrency);
        println!("  {ENV_PREFIX}_FILTER:           {:?}", self.filter);
        println!("  {ENV_PREFIX}_TIMEOUT:          {:?}", self.timeout_ms);
        println!("  {ENV_PREFIX}_REPORTER:         {:?}", self.reporter);
        println!("  {ENV_PREFIX}_SNAPSHOT_DIR:     {:?}", self.snapshot_dir);
        println!("  {ENV_PREFIX}_NO_SNAPSHOTS:     {:?}", self.disable_snapshots);
        println!("  {ENV_PREFIX}_UPDATE_SNAPSHOTS: {:?}", self.update_snapshots);
        println!("  {ENV_PREFIX}_WATCH:            {:?}", self.watch);
        println!("  {ENV_PREFIX}_CONFIG:           {:?}", self.config_file);
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Builder for setting environment variables (useful for testing)
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

impl EnvBuilder {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    fn var(mut self, name: &str, value: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_{name}"), value.into()));
        self
    }

    pub fn concurrency(self, concurrency: usize) -> Self {
        self.var("CONCURRENCY", concurrency.to_string())
    }

    pub fn filter(self, pattern: impl Into<String>) -> Self {
        self.var("FILTER", pattern)
    }

    pub fn timeout_ms(self, ms: u64) -> Self {
        self.var("TIMEOUT", ms.to_string())
    }

    pub fn reporter(self, reporter: impl Into<String>) -> Self {
        self.var("REPORTER", reporter)
    }

    pub fn snapshot_dir(self, dir: impl Into<String>) -> Self {
        self.var("SNAPSHOT_DIR", dir)
    }

    pub fn update_snapshots(self, update: bool) -> Self {
        self.var("UPDATE_SNAPSHOTS", update.to_string())
    }

    /// Apply environment variables
    pub fn apply(self) {
        for (key, value) in self.vars {
            env::set_var(key, value);
        }
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        self.apply();

        EnvGuard { previous }
    }
}

impl Default for EnvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that restores environment variables on drop
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

/// Print all SUITE_RUNNER environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_CONCURRENCY       Maximum concurrent tests per suite");
    println!("  {ENV_PREFIX}_FILTER            Regex matched against test titles");
    println!("  {ENV_PREFIX}_TIMEOUT           Default per-attempt timeout in milliseconds");
    println!("  {ENV_PREFIX}_REPORTER          Reporter (default, summary, json, silent)");
    println!("  {ENV_PREFIX}_SNAPSHOT_DIR      Snapshot directory");
    println!("  {ENV_PREFIX}_NO_SNAPSHOTS      Disable snapshot matching (true/false)");
    println!("  {ENV_PREFIX}_UPDATE_SNAPSHOTS  Overwrite mismatching snapshots (true/false)");
    println!("  {ENV_PREFIX}_WATCH             Watch flag for the outer process (true/false)");
    println!("  {ENV_PREFIX}_CONFIG            Path to configuration file");
    println!("  {ENV_PREFIX}_LOG               Log filter (e.g. suite_runner=debug)");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_config_default() {
        let config = EnvConfig::default();
        assert!(config.concurrency.is_none());
        assert!(!config.has_any());
    }

    #[test]
    fn test_env_builder() {
        let _guard = EnvBuilder::new()
            .concurrency(7)
            .filter("^Net")
            .timeout_ms(1500)
            .apply_scoped();

        let config = EnvConfig::load();
        assert_eq!(config.concurrency, Some(7));
        assert_eq!(config.filter.as_deref(), Some("^Net"));
        assert_eq!(config.timeout_ms, Some(1500));
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = EnvBuilder::new().update_snapshots(true).apply_scoped();

        let config = EnvConfig::load();
        assert_eq!(config.update_snapshots, Some(true));
    }

    #[test]
    fn test_apply_to_overrides_only_set_fields() {
        let env = EnvConfig {
            concurrency: Some(3),
            reporter: Some("json".to_string()),
            ..Default::default()
        };
        let mut config = RunConfig::new().with_filter("^Math");
        env.apply_to(&mut config);

        assert_eq!(config.concurrency, 3);
        assert_eq!(config.reporter, ReporterMode::Json);
        assert_eq!(config.filter.as_deref(), Some("^Math"));
    }
}
