//! Output formatters for test results
//!
//! Provides table, one-line summary and JSON renderings of a run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use crate::models::{RunSummary, TestResult, TestStatus};

/// Reporter output mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReporterMode {
    /// Per-test table with colored status symbols
    #[default]
    Default,
    /// One line per run
    Summary,
    /// Run summary as JSON
    Json,
    /// No output
    Silent,
}

impl ReporterMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "default" | "table" => Some(ReporterMode::Default),
            "summary" => Some(ReporterMode::Summary),
            "json" => Some(ReporterMode::Json),
            "silent" | "none" => Some(ReporterMode::Silent),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReporterMode::Default => "default",
            ReporterMode::Summary => "summary",
            ReporterMode::Json => "json",
            ReporterMode::Silent => "silent",
        }
    }
}

/// Result formatter
pub struct ResultFormatter {
    mode: ReporterMode,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(mode: ReporterMode) -> Self {
        Self {
            mode,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    pub fn mode(&self) -> ReporterMode {
        self.mode
    }

    /// Format a single test result
    pub fn format_result(&self, result: &TestResult) -> String {
        match self.mode {
            ReporterMode::Default => self.format_result_table(result),
            ReporterMode::Json => serde_json::to_string(result).unwrap_or_default(),
            ReporterMode::Summary => format!(
                "{} {} ({}ms)",
                result.status.symbol(),
                result.full_title(),
                result.duration_ms
            ),
            ReporterMode::Silent => String::new(),
        }
    }

    fn status_label(&self, status: TestStatus) -> &'static str {
        if self.colorize {
            match status {
                TestStatus::Pass => "\x1b[32m✓ PASS\x1b[0m",
                TestStatus::Fail => "\x1b[31m✗ FAIL\x1b[0m",
                TestStatus::Skip => "\x1b[33m○ SKIP\x1b[0m",
            }
        } else {
            match status {
                TestStatus::Pass => "✓ PASS",
                TestStatus::Fail => "✗ FAIL",
                TestStatus::Skip => "○ SKIP",
            }
        }
    }

    fn format_result_table(&self, result: &TestResult) -> String {
        let mut line = format!(
            "{} {:40} [{:>6}ms]",
            self.status_label(result.status),
            result.full_title(),
            result.duration_ms
        );
        if result.attempts > 1 {
            line.push_str(&format!(" ({} attempts)", result.attempts));
        }
        if let Some(message) = &result.message {
            line.push_str(&format!("\n      {message}"));
        }
        line
    }

    /// Format a run summary
    pub fn format_summary(&self, summary: &RunSummary) -> String {
        match self.mode {
            ReporterMode::Default => self.format_summary_table(summary),
            ReporterMode::Json => serde_json::to_string_pretty(summary).unwrap_or_default(),
            ReporterMode::Summary => self.format_summary_brief(summary),
            ReporterMode::Silent => String::new(),
        }
    }

    fn format_summary_table(&self, summary: &RunSummary) -> String {
        let mut output = String::new();

        output.push_str("\n══════════════════════════════════════════════════════════════\n");
        output.push_str(&format!(
            " Test Run - {}\n",
            summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        output.push_str("══════════════════════════════════════════════════════════════\n");

        for result in &summary.results {
            output.push_str(&format!("  {}\n", self.format_result_table(result)));
        }

        output.push_str("──────────────────────────────────────────────────────────────\n");

        let pass_str = if self.colorize {
            format!("\x1b[32m{}\x1b[0m", summary.passed)
        } else {
            summary.passed.to_string()
        };
        let fail_str = if self.colorize && summary.failed > 0 {
            format!("\x1b[31m{}\x1b[0m", summary.failed)
        } else {
            summary.failed.to_string()
        };

        output.push_str(&format!(
            " Total: {} | Pass: {} | Fail: {} | Skip: {}\n",
            summary.total, pass_str, fail_str, summary.skipped
        ));
        output.push_str(&format!(
            " Pass Rate: {:.1}% | Duration: {}ms\n",
            summary.pass_rate(),
            summary.total_duration_ms
        ));

        output
    }

    fn format_summary_brief(&self, summary: &RunSummary) -> String {
        format!(
            "{}/{} passed, {} failed, {} skipped ({:.1}%) in {}ms",
            summary.passed,
            summary.total - summary.skipped,
            summary.failed,
            summary.skipped,
            summary.pass_rate(),
            summary.total_duration_ms
        )
    }

    /// Format results of several rounds over the same tree
    pub fn format_rounds(&self, rounds: &[RunSummary]) -> String {
        if rounds.is_empty() || self.mode == ReporterMode::Silent {
            return String::new();
        }

        let mut per_test: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        for summary in rounds {
            for result in &summary.results {
                let entry = per_test.entry(result.full_title()).or_default();
                match result.status {
                    TestStatus::Pass => entry.0 += 1,
                    TestStatus::Fail => entry.1 += 1,
                    TestStatus::Skip => {}
                }
            }
        }
        let flaky: Vec<_> = per_test
            .iter()
            .filter(|(_, (passed, failed))| *passed > 0 && *failed > 0)
            .collect();

        if self.mode == ReporterMode::Json {
            #[derive(Serialize)]
            struct RoundsJson<'a> {
                rounds: usize,
                pass_rates: Vec<f64>,
                flaky: Vec<&'a str>,
            }

            let json = RoundsJson {
                rounds: rounds.len(),
                pass_rates: rounds.iter().map(RunSummary::pass_rate).collect(),
                flaky: flaky.iter().map(|(title, _)| title.as_str()).collect(),
            };
            return serde_json::to_string_pretty(&json).unwrap_or_default();
        }

        let mut output = String::new();
        output.push_str(&format!("\n Aggregate Results ({} rounds)\n", rounds.len()));
        output.push_str(" ───────────────────────────────────────────────────────────\n");
        for (index, summary) in rounds.iter().enumerate() {
            output.push_str(&format!(
                "  Round {:3}: {}/{} passed ({:.1}%) in {}ms\n",
                index + 1,
                summary.passed,
                summary.total - summary.skipped,
                summary.pass_rate(),
                summary.total_duration_ms
            ));
        }

        if !flaky.is_empty() {
            output.push_str("\n Flaky Tests:\n");
            for (title, (passed, failed)) in flaky {
                output.push_str(&format!("   - {title} ({passed} passed, {failed} failed)\n"));
            }
        }

        output
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(ReporterMode::Default)
    }
}

/// Write a run summary to a file as JSON
pub fn write_summary_to_file(path: &Path, summary: &RunSummary) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(summary)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(())
}
