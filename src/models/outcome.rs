//! Test outcome models
//!
//! Defines attempt outcomes, per-test results and run summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::TestError;

/// Test execution status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Pass,
    Fail,
    Skip,
}

impl TestStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            TestStatus::Pass => "✓",
            TestStatus::Fail => "✗",
            TestStatus::Skip => "○",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TestStatus::Pass)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Pass => write!(f, "PASS"),
            TestStatus::Fail => write!(f, "FAIL"),
            TestStatus::Skip => write!(f, "SKIP"),
        }
    }
}

/// Terminal outcome of the attempt runner for one test
#[derive(Clone, Debug, PartialEq)]
pub struct TestOutcome {
    pub passed: bool,
    /// Wall-clock time from the first attempt's start to the last one's end
    pub duration: Duration,
    /// Error of the last attempt, set only when failed
    pub error: Option<TestError>,
    pub attempts: u32,
}

impl TestOutcome {
    pub fn passed(duration: Duration, attempts: u32) -> Self {
        Self {
            passed: true,
            duration,
            error: None,
            attempts,
        }
    }

    pub fn failed(duration: Duration, attempts: u32, error: TestError) -> Self {
        Self {
            passed: false,
            duration,
            error: Some(error),
            attempts,
        }
    }

    /// Turn a passing outcome into a failure, keeping timing
    pub fn into_failure(self, error: TestError) -> Self {
        Self::failed(self.duration, self.attempts, error)
    }

    pub fn status(&self) -> TestStatus {
        if self.passed {
            TestStatus::Pass
        } else {
            TestStatus::Fail
        }
    }
}

/// Result of a single test as seen by reporters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestResult {
    pub suite: String,
    pub title: String,
    pub status: TestStatus,
    pub duration_ms: u64,
    pub attempts: u32,
    pub message: Option<String>,
}

impl TestResult {
    pub fn pass(
        suite: impl Into<String>,
        title: impl Into<String>,
        duration_ms: u64,
        attempts: u32,
    ) -> Self {
        Self {
            suite: suite.into(),
            title: title.into(),
            status: TestStatus::Pass,
            duration_ms,
            attempts,
            message: None,
        }
    }

    pub fn fail(
        suite: impl Into<String>,
        title: impl Into<String>,
        duration_ms: u64,
        attempts: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            suite: suite.into(),
            title: title.into(),
            status: TestStatus::Fail,
            duration_ms,
            attempts,
            message: Some(message.into()),
        }
    }

    pub fn skip(suite: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            title: title.into(),
            status: TestStatus::Skip,
            duration_ms: 0,
            attempts: 0,
            message: None,
        }
    }

    pub fn from_outcome(suite: &str, title: &str, outcome: &TestOutcome) -> Self {
        let duration_ms = outcome.duration.as_millis() as u64;
        match &outcome.error {
            Some(error) if !outcome.passed => {
                Self::fail(suite, title, duration_ms, outcome.attempts, error.to_string())
            }
            _ => Self::pass(suite, title, duration_ms, outcome.attempts),
        }
    }

    /// Suite path and title joined for display
    pub fn full_title(&self) -> String {
        if self.suite.is_empty() {
            self.title.clone()
        } else {
            format!("{} > {}", self.suite, self.title)
        }
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}ms]",
            self.status.symbol(),
            self.full_title(),
            self.duration_ms
        )?;
        if self.attempts > 1 {
            write!(f, " ({} attempts)", self.attempts)?;
        }
        if let Some(msg) = &self.message {
            write!(f, " - {msg}")?;
        }
        Ok(())
    }
}

/// Summary of one run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total_duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl RunSummary {
    pub fn new(started_at: DateTime<Utc>, duration: Duration, results: Vec<TestResult>) -> Self {
        let count = |status: TestStatus| results.iter().filter(|r| r.status == status).count();
        Self {
            started_at,
            total: results.len(),
            passed: count(TestStatus::Pass),
            failed: count(TestStatus::Fail),
            skipped: count(TestStatus::Skip),
            total_duration_ms: duration.as_millis() as u64,
            results,
        }
    }

    /// Pass rate over executed (non-skipped) tests
    pub fn pass_rate(&self) -> f64 {
        let executed = self.passed + self.failed;
        if executed == 0 {
            0.0
        } else {
            (self.passed as f64 / executed as f64) * 100.0
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &TestResult> {
        self.results.iter().filter(|r| r.status == TestStatus::Fail)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        for result in &self.results {
            writeln!(f, "  {result}")?;
        }
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "Total: {} | Pass: {} | Fail: {} | Skip: {}",
            self.total, self.passed, self.failed, self.skipped
        )?;
        writeln!(
            f,
            "Pass Rate: {:.1}% | Duration: {}ms",
            self.pass_rate(),
            self.total_duration_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_status() {
        let ok = TestOutcome::passed(Duration::from_millis(5), 1);
        assert_eq!(ok.status(), TestStatus::Pass);

        let failed = ok.into_failure(TestError::assertion("nope"));
        assert_eq!(failed.status(), TestStatus::Fail);
        assert_eq!(failed.duration, Duration::from_millis(5));
    }

    #[test]
    fn test_result_from_outcome() {
        let outcome = TestOutcome::failed(
            Duration::from_millis(40),
            3,
            TestError::Timeout(Duration::from_millis(10)),
        );
        let result = TestResult::from_outcome("Net", "fetches", &outcome);
        assert_eq!(result.status, TestStatus::Fail);
        assert_eq!(result.attempts, 3);
        assert_eq!(result.message.as_deref(), Some("Timeout after 10ms"));
        assert_eq!(result.full_title(), "Net > fetches");
    }

    #[test]
    fn test_run_summary() {
        let results = vec![
            TestResult::pass("Math", "add", 10, 1),
            TestResult::fail("Math", "div", 5, 1, "division by zero"),
            TestResult::skip("Math", "pow"),
        ];

        let summary = RunSummary::new(Utc::now(), Duration::from_millis(30), results);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.pass_rate(), 50.0);
        assert!(summary.has_failures());
        assert_eq!(summary.failures().count(), 1);
    }
}
