//! Run entry point
//!
//! Builds the run-scoped environment from the configuration, walks the
//! tree from its root and collects the results into a summary.

use chrono::Utc;
use regex::Regex;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

use super::hooks::MergedHooks;
use super::walker::SuiteWalker;
use crate::assert::{MatcherRegistry, SnapshotStore};
use crate::config::RunConfig;
use crate::error::RunError;
use crate::events::{EventBus, RunEvent};
use crate::models::{RunContext, RunSummary, SuiteTree, TestResult};
use crate::utils::Timer;

/// State shared by every suite and test of one run
pub struct RunEnv {
    config: RunConfig,
    bus: EventBus,
    matchers: Arc<MatcherRegistry>,
    snapshots: Option<Arc<SnapshotStore>>,
    filter: Option<Regex>,
    results: Mutex<Vec<TestResult>>,
}

impl RunEnv {
    /// Validate `config` and capture it for the run
    pub fn new(
        config: RunConfig,
        bus: EventBus,
        matchers: Arc<MatcherRegistry>,
    ) -> Result<Self, RunError> {
        config.validate()?;
        let filter = config.compile_filter()?;
        let snapshots = (!config.disable_snapshots).then(|| {
            Arc::new(
                SnapshotStore::new(config.snapshot_dir.clone())
                    .with_update(config.update_snapshots),
            )
        });

        Ok(Self {
            config,
            bus,
            matchers,
            snapshots,
            filter,
            results: Mutex::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn matchers(&self) -> &Arc<MatcherRegistry> {
        &self.matchers
    }

    pub fn snapshots(&self) -> Option<&Arc<SnapshotStore>> {
        self.snapshots.as_ref()
    }

    /// Whether `title` passes the configured title filter
    pub fn matches_filter(&self, title: &str) -> bool {
        self.filter.as_ref().map_or(true, |re| re.is_match(title))
    }

    pub(crate) fn emit(&self, event: RunEvent) {
        self.bus.emit(&event);
    }

    pub(crate) fn record(&self, result: TestResult) {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(result);
    }

    /// Drain the results recorded so far
    pub fn take_results(&self) -> Vec<TestResult> {
        std::mem::take(&mut *self.results.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Runs suite trees against a configuration and an event bus
pub struct Engine {
    config: RunConfig,
    bus: EventBus,
    matchers: Arc<MatcherRegistry>,
}

impl Engine {
    /// Engine with a private bus and the built-in matchers
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            bus: EventBus::new(),
            matchers: Arc::new(MatcherRegistry::with_builtins()),
        }
    }

    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }

    pub fn with_matchers(mut self, matchers: MatcherRegistry) -> Self {
        self.matchers = Arc::new(matchers);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut RunConfig {
        &mut self.config
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Run every suite of `tree`
    ///
    /// Emits `runEnd` and returns the summary when the walk completes. A
    /// failing `beforeAll`/`afterAll` hook aborts the walk and is returned
    /// as an error without a `runEnd`.
    pub async fn run(&self, tree: &SuiteTree) -> Result<RunSummary, RunError> {
        let env = RunEnv::new(self.config.clone(), self.bus.clone(), self.matchers.clone())?;
        let started_at = Utc::now();
        let timer = Timer::start("run");

        info!(
            "Running {} tests in {} suites (concurrency {})",
            tree.test_count(),
            tree.suite_count(),
            env.config().effective_concurrency()
        );

        SuiteWalker::new(tree, &env)
            .run_suite(tree.root(), RunContext::new(), Arc::new(MergedHooks::default()))
            .await?;

        let duration = timer.stop();
        env.emit(RunEvent::RunEnd { duration });

        let summary = RunSummary::new(started_at, duration, env.take_results());
        info!(
            "Run completed in {}ms - Pass: {}/{} ({:.1}%)",
            summary.total_duration_ms,
            summary.passed,
            summary.total,
            summary.pass_rate()
        );
        Ok(summary)
    }
}

/// Run `tree` with `config`, publishing lifecycle events on `bus`
pub async fn run_tests(
    tree: &SuiteTree,
    config: &RunConfig,
    bus: &EventBus,
) -> Result<RunSummary, RunError> {
    Engine::new(config.clone())
        .with_bus(bus.clone())
        .run(tree)
        .await
}
