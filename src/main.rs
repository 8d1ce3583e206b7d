//! Suite Runner - concurrent test-suite orchestration
//!
//! Runs the bundled suites with lifecycle hooks, bounded per-suite
//! concurrency, per-attempt timeouts, retries and snapshot matching.
//!
//! ## Usage
//!
//! ```bash
//! # Run every bundled suite
//! suite-runner run
//!
//! # Only tests whose title matches, four at a time
//! suite-runner run --filter '^adds' -j 4
//!
//! # Repeat the run to spot flaky tests
//! suite-runner run --rounds 20 --reporter summary
//!
//! # List suites and tests
//! suite-runner list --detailed
//!
//! # Configuration
//! suite-runner config init
//! suite-runner config show --env
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::info;

use suite_runner::cli::{self, Args, Command, ConfigAction};
use suite_runner::config::{print_env_help, EnvConfig, RunConfig};
use suite_runner::events::EventBus;
use suite_runner::executor::Engine;
use suite_runner::models::{SuiteId, SuiteTree};
use suite_runner::output::{write_summary_to_file, Reporter, ReporterMode, ResultFormatter};
use suite_runner::suites::demo_tree;
use suite_runner::utils::{init_logger, LogLevel, Stopwatch};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(LogLevel::from_verbose(args.verbose));

    match args.command {
        Command::Run(run_args) => {
            let passed = run_suites(args.config.as_deref(), run_args).await?;
            if !passed {
                std::process::exit(1);
            }
        }
        Command::List(list_args) => {
            list_suites(list_args);
        }
        Command::Config(config_args) => {
            manage_config(args.config.as_deref(), config_args)?;
        }
    }

    Ok(())
}

/// Run the bundled suites; returns whether every round passed
async fn run_suites(config_path: Option<&Path>, args: cli::RunArgs) -> Result<bool> {
    let mut config = RunConfig::resolve(config_path)?;
    args.apply_to(&mut config)?;
    config.validate().context("Invalid run configuration")?;

    let tree = demo_tree();
    let bus = EventBus::new();
    let reporter = Reporter::new(config.reporter);
    reporter.attach(&bus);
    let engine = Engine::new(config.clone()).with_bus(bus);

    let rounds = args.rounds.max(1);
    info!(
        "Running {} suites ({} tests), {} round(s)",
        tree.suite_count(),
        tree.test_count(),
        rounds
    );

    let mut stopwatch = Stopwatch::new();
    let mut summaries = Vec::new();
    for round in 1..=rounds {
        if rounds > 1 {
            info!("=== Round {}/{} ===", round, rounds);
        }
        let summary = engine.run(&tree).await.context("Run aborted")?;
        stopwatch.lap(format!("Round {round}"));
        summaries.push(summary);
    }

    if rounds > 1 {
        let aggregate = ResultFormatter::new(config.reporter).format_rounds(&summaries);
        if !aggregate.is_empty() {
            println!("{aggregate}");
        }
        info!("Round timings:\n{}", stopwatch.format());
    }

    if let (Some(path), Some(last)) = (&args.output, summaries.last()) {
        write_summary_to_file(path, last)
            .with_context(|| format!("Failed to write results: {}", path.display()))?;
        if config.reporter != ReporterMode::Silent {
            println!("Results saved to {}", path.display());
        }
    }

    Ok(summaries.iter().all(|summary| !summary.has_failures()))
}

fn list_suites(args: cli::ListArgs) {
    let tree = demo_tree();
    println!(
        "\nBundled suites ({} suites, {} tests)\n",
        tree.suite_count() - 1,
        tree.test_count()
    );
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    print_suite(&tree, tree.root(), args.detailed);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
}

fn flags(only: bool, skip: bool) -> &'static str {
    match (only, skip) {
        (true, true) => " [only, skip]",
        (true, false) => " [only]",
        (false, true) => " [skip]",
        (false, false) => "",
    }
}

fn print_suite(tree: &SuiteTree, id: SuiteId, detailed: bool) {
    let suite = tree.suite(id);
    let indent = "  ".repeat(tree.depth(id));
    if !suite.name.is_empty() {
        println!("{indent}{}{}", suite.name, flags(suite.only, suite.skip));
    }

    for &test_id in &suite.tests {
        let test = tree.test(test_id);
        let mut line = format!("{indent}  - {}{}", test.title, flags(test.only, test.skip));
        if detailed {
            if let Some(timeout) = test.options.timeout {
                line.push_str(&format!(" timeout={}ms", timeout.as_millis()));
            }
            if test.options.retry > 0 {
                line.push_str(&format!(" retry={}", test.options.retry));
            }
            if !test.options.tags.is_empty() {
                line.push_str(&format!(" tags={}", test.options.tags.join(",")));
            }
        }
        println!("{line}");
    }

    for &child in &suite.children {
        print_suite(tree, child, detailed);
    }
}

fn manage_config(config_path: Option<&Path>, args: cli::ConfigArgs) -> Result<()> {
    match args.action {
        ConfigAction::Init { output, force } => {
            if output.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {}. Use --force to overwrite.",
                    output.display()
                );
            }

            RunConfig::default().save(&output)?;
            println!("✓ Configuration file created: {}", output.display());
            println!("\nEdit the file to customize your settings.");
        }

        ConfigAction::Show { env, format } => {
            if env {
                EnvConfig::load().print_summary();
                println!();
                print_env_help();
            } else {
                let config = RunConfig::resolve(config_path)?;
                let output = if format == "json" {
                    serde_json::to_string_pretty(&config)?
                } else {
                    serde_yaml::to_string(&config)?
                };
                println!("{output}");
            }
        }

        ConfigAction::Validate { file } => {
            let path = file
                .or_else(|| config_path.map(Path::to_path_buf))
                .or_else(RunConfig::find)
                .context("No configuration file found")?;

            match RunConfig::load(&path) {
                Ok(_) => {
                    println!("✓ Configuration file is valid: {}", path.display());
                }
                Err(e) => {
                    println!("✗ Configuration file is invalid: {}", path.display());
                    println!("  Error: {e:#}");
                    return Err(e);
                }
            }
        }
    }

    Ok(())
}
