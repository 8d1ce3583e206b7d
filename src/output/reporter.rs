//! Event-driven reporter
//!
//! Listens for outcome events on a bus, accumulates results and renders a
//! summary when the run ends.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use super::formatter::{ReporterMode, ResultFormatter};
use crate::events::{EventBus, EventKind, RunEvent};
use crate::models::{RunSummary, TestResult};

/// Where rendered output goes
#[derive(Clone, Debug)]
pub enum ReportSink {
    Stdout,
    /// In-memory buffer, mostly for tests
    Buffer(Arc<Mutex<String>>),
}

impl ReportSink {
    fn write(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self {
            ReportSink::Stdout => {
                let mut stdout = std::io::stdout().lock();
                let _ = writeln!(stdout, "{text}");
            }
            ReportSink::Buffer(buffer) => {
                let mut buffer = buffer.lock().unwrap_or_else(PoisonError::into_inner);
                buffer.push_str(text);
                buffer.push('\n');
            }
        }
    }
}

#[derive(Default)]
struct ReporterState {
    results: Vec<TestResult>,
    last: Option<RunSummary>,
}

/// Accumulates outcomes from the bus and prints a summary at `runEnd`
#[derive(Clone)]
pub struct Reporter {
    mode: ReporterMode,
    colorize: bool,
    sink: ReportSink,
    state: Arc<Mutex<ReporterState>>,
}

impl Reporter {
    pub fn new(mode: ReporterMode) -> Self {
        Self {
            mode,
            colorize: true,
            sink: ReportSink::Stdout,
            state: Arc::new(Mutex::new(ReporterState::default())),
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    pub fn with_sink(mut self, sink: ReportSink) -> Self {
        self.sink = sink;
        self
    }

    fn formatter(&self) -> ResultFormatter {
        let formatter = ResultFormatter::new(self.mode);
        if self.colorize {
            formatter
        } else {
            formatter.no_color()
        }
    }

    /// Subscribe to outcome and run-end events on `bus`
    pub fn attach(&self, bus: &EventBus) {
        for kind in [EventKind::TestPass, EventKind::TestFail, EventKind::TestSkip] {
            let reporter = self.clone();
            bus.subscribe(kind, move |event| reporter.on_outcome(event));
        }
        let reporter = self.clone();
        bus.subscribe(EventKind::RunEnd, move |event| reporter.on_run_end(event));
    }

    fn on_outcome(&self, event: &RunEvent) {
        let result = match event {
            RunEvent::TestPass {
                suite,
                title,
                duration,
                attempts,
            } => TestResult::pass(suite, title, duration.as_millis() as u64, *attempts),
            RunEvent::TestFail {
                suite,
                title,
                duration,
                attempts,
                error,
            } => TestResult::fail(
                suite,
                title,
                duration.as_millis() as u64,
                *attempts,
                error.to_string(),
            ),
            RunEvent::TestSkip { suite, title } => TestResult::skip(suite, title),
            _ => return,
        };
        self.lock().results.push(result);
    }

    fn on_run_end(&self, event: &RunEvent) {
        let RunEvent::RunEnd { duration } = event else {
            return;
        };
        let summary = {
            let mut state = self.lock();
            let results = std::mem::take(&mut state.results);
            let elapsed = chrono::Duration::from_std(*duration)
                .unwrap_or_else(|_| chrono::Duration::zero());
            let summary = RunSummary::new(chrono::Utc::now() - elapsed, *duration, results);
            state.last = Some(summary.clone());
            summary
        };
        self.sink.write(&self.formatter().format_summary(&summary));
    }

    /// Pass, fail and skip counts accumulated since the last `runEnd`
    pub fn counts(&self) -> (usize, usize, usize) {
        let state = self.lock();
        let count = |status| state.results.iter().filter(|r| r.status == status).count();
        (
            count(crate::models::TestStatus::Pass),
            count(crate::models::TestStatus::Fail),
            count(crate::models::TestStatus::Skip),
        )
    }

    /// Summary rendered at the most recent `runEnd`
    pub fn last_summary(&self) -> Option<RunSummary> {
        self.lock().last.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ReporterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
