//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::RunConfig;
use crate::output::ReporterMode;

/// Concurrent suite runner with lifecycle hooks, retries and snapshots
#[derive(Parser, Debug)]
#[command(name = "suite-runner")]
#[command(version)]
#[command(about = "Run test suites with hooks, retries, timeouts and snapshots")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the bundled suites
    Run(RunArgs),

    /// List suites and tests
    List(ListArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for run command
#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Maximum concurrent tests per suite
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Only run tests whose title matches this regex
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Default per-attempt timeout in milliseconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Reporter (default, summary, json, silent)
    #[arg(short, long)]
    pub reporter: Option<String>,

    /// Snapshot directory
    #[arg(long)]
    pub snapshot_dir: Option<PathBuf>,

    /// Make snapshot matchers pass without touching disk
    #[arg(long)]
    pub no_snapshots: bool,

    /// Overwrite mismatching snapshots
    #[arg(short, long)]
    pub update_snapshots: bool,

    /// Number of runs over the same suite tree
    #[arg(long, default_value = "1")]
    pub rounds: u32,

    /// Write the last run summary as JSON
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl RunArgs {
    /// Apply command-line overrides on top of `config`
    pub fn apply_to(&self, config: &mut RunConfig) -> anyhow::Result<()> {
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(filter) = &self.filter {
            config.filter = Some(filter.clone());
        }
        if let Some(timeout) = self.timeout {
            config.timeout_ms = Some(timeout);
        }
        if let Some(reporter) = &self.reporter {
            config.reporter = ReporterMode::parse(reporter)
                .ok_or_else(|| anyhow::anyhow!("Unknown reporter: {reporter}"))?;
        }
        if let Some(dir) = &self.snapshot_dir {
            config.snapshot_dir = dir.clone();
        }
        if self.no_snapshots {
            config.disable_snapshots = true;
        }
        if self.update_snapshots {
            config.update_snapshots = true;
        }
        Ok(())
    }
}

/// Arguments for list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Show options and tags of each test
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a configuration file with default values
    Init {
        /// Output path
        #[arg(short, long, default_value = "./suite-runner.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Show environment variables instead
        #[arg(short, long)]
        env: bool,

        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Validate a configuration file
    Validate {
        /// File to validate; defaults to the discovered one
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["suite-runner", "list", "--detailed"]);
        match args.command {
            Command::List(list_args) => {
                assert!(list_args.detailed);
            }
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_run_args() {
        let args = Args::parse_from([
            "suite-runner",
            "run",
            "--filter",
            "^Math",
            "-j",
            "4",
            "--rounds",
            "3",
            "--reporter",
            "json",
        ]);
        match args.command {
            Command::Run(run_args) => {
                assert_eq!(run_args.filter.as_deref(), Some("^Math"));
                assert_eq!(run_args.concurrency, Some(4));
                assert_eq!(run_args.rounds, 3);

                let mut config = RunConfig::default();
                run_args.apply_to(&mut config).unwrap();
                assert_eq!(config.concurrency, 4);
                assert_eq!(config.reporter, ReporterMode::Json);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_unknown_reporter_rejected() {
        let run_args = RunArgs {
            reporter: Some("fancy".to_string()),
            ..Default::default()
        };
        assert!(run_args.apply_to(&mut RunConfig::default()).is_err());
    }

    #[test]
    fn test_global_config_flag() {
        let args = Args::parse_from(["suite-runner", "config", "show", "-c", "x.yaml"]);
        assert_eq!(args.config, Some(PathBuf::from("x.yaml")));
    }
}
