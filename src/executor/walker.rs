//! Suite tree walker
//!
//! Depth-first traversal of a suite tree. Each suite runs its `beforeAll`
//! hooks, dispatches its eligible tests as one concurrent batch, then runs
//! its child suites one after another and finally its `afterAll` hooks.

use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::engine::RunEnv;
use super::hooks::{merge_hooks, run_chain, MergedHooks};
use super::parallel::{run_concurrent, TaskError};
use super::runner::run_test;
use super::scope::TestScope;
use crate::error::{HookPhase, RunError, TestError};
use crate::events::RunEvent;
use crate::models::{RunContext, Suite, SuiteId, SuiteTree, TestId, TestOutcome, TestResult};
use crate::utils::Timer;

/// Tests of one suite split by what happens to them
#[derive(Debug, Default, PartialEq)]
struct Selection {
    run: Vec<TestId>,
    skipped: Vec<TestId>,
}

/// Walks a suite tree within one run
#[derive(Clone, Copy)]
pub struct SuiteWalker<'a> {
    tree: &'a SuiteTree,
    env: &'a RunEnv,
}

impl<'a> SuiteWalker<'a> {
    pub fn new(tree: &'a SuiteTree, env: &'a RunEnv) -> Self {
        Self { tree, env }
    }

    /// Run suite `id` and everything below it
    pub fn run_suite(
        self,
        id: SuiteId,
        parent_ctx: RunContext,
        inherited: Arc<MergedHooks>,
    ) -> BoxFuture<'a, Result<(), RunError>> {
        async move {
            let suite = self.tree.suite(id);
            if suite.skip {
                debug!("Skipping suite '{}'", suite.name);
                return Ok(());
            }

            let path = self.tree.suite_path(id);
            self.env.emit(RunEvent::SuiteStart {
                suite: path.clone(),
            });
            let ctx = RunContext::merged(&parent_ctx, &suite.context);

            self.run_suite_hooks(suite, &path, &ctx, HookPhase::BeforeAll)
                .await?;

            let merged = merge_hooks(suite, &inherited.before, &inherited.after);
            let selection = self.select_tests(suite);

            for &test_id in &selection.skipped {
                let title = &self.tree.test(test_id).title;
                self.env.emit(RunEvent::TestSkip {
                    suite: path.clone(),
                    title: title.clone(),
                });
                self.env.record(TestResult::skip(path.as_str(), title.as_str()));
            }

            if !selection.run.is_empty() {
                self.run_batch(&selection.run, &path, &ctx, &merged).await;
            }

            for child in self.runnable_children(suite) {
                self.run_suite(child, ctx.clone(), merged.clone()).await?;
            }

            self.run_suite_hooks(suite, &path, &ctx, HookPhase::AfterAll)
                .await
        }
        .boxed()
    }

    async fn run_suite_hooks(
        self,
        suite: &Suite,
        path: &str,
        ctx: &RunContext,
        phase: HookPhase,
    ) -> Result<(), RunError> {
        run_chain(suite.hooks.list(phase), ctx, phase)
            .await
            .map_err(|source| {
                error!("{} hook failed in '{}': {}", phase, path, source);
                RunError::SuiteHook {
                    suite: path.to_string(),
                    phase,
                    source,
                }
            })
    }

    /// Split a suite's tests into those to run and those to report skipped
    ///
    /// When any test carries `only`, the others are invisible. Otherwise the
    /// title filter decides visibility.
    fn select_tests(self, suite: &Suite) -> Selection {
        let any_only = suite.tests.iter().any(|&id| self.tree.test(id).only);

        let mut selection = Selection::default();
        for &id in &suite.tests {
            let test = self.tree.test(id);
            let visible = if any_only {
                test.only
            } else {
                self.env.matches_filter(&test.title)
            };
            if !visible {
                continue;
            }
            if test.skip {
                selection.skipped.push(id);
            } else {
                selection.run.push(id);
            }
        }
        selection
    }

    /// Child suites to descend into, honouring `only` among siblings
    fn runnable_children(self, suite: &Suite) -> Vec<SuiteId> {
        let any_only = suite.children.iter().any(|&id| self.tree.suite(id).only);
        suite
            .children
            .iter()
            .copied()
            .filter(|&id| !any_only || self.tree.suite(id).only)
            .collect()
    }

    async fn run_batch(
        self,
        tests: &[TestId],
        path: &str,
        ctx: &RunContext,
        hooks: &Arc<MergedHooks>,
    ) {
        let timer = Timer::start(if path.is_empty() { "<root>" } else { path });
        let tasks: Vec<_> = tests
            .iter()
            .map(|&test_id| {
                let ctx = ctx.clone();
                let hooks = hooks.clone();
                move || self.run_one(test_id, path, ctx, hooks)
            })
            .collect();

        let results = run_concurrent(tasks, self.env.config().effective_concurrency()).await;

        let mut passed = 0;
        for (test_id, result) in tests.iter().zip(&results) {
            match result {
                Ok(()) => passed += 1,
                Err(TaskError::Failed(_)) => {}
                Err(TaskError::Panicked(message)) => {
                    error!(
                        "Test '{}' aborted outside its body: {}",
                        self.tree.test(*test_id).title,
                        message
                    );
                }
            }
        }

        info!(
            "Suite '{}': {}/{} passed in {}ms",
            timer.label(),
            passed,
            results.len(),
            timer.elapsed_ms()
        );
    }

    /// Full lifecycle of one test; the error is the test's terminal failure
    async fn run_one(
        self,
        id: TestId,
        path: &str,
        ctx: RunContext,
        hooks: Arc<MergedHooks>,
    ) -> Result<(), TestError> {
        let test = self.tree.test(id);
        debug!("Dispatching '{}'", test.title);
        self.env.emit(RunEvent::TestStart {
            suite: path.to_string(),
            title: test.title.clone(),
        });

        let timer = Timer::start(test.title.as_str());
        let outcome = match run_chain(&hooks.before, &ctx, HookPhase::BeforeEach).await {
            Err(err) => TestOutcome::failed(timer.elapsed(), 0, err),
            Ok(()) => {
                let scope = TestScope::new(
                    ctx.clone(),
                    path,
                    &test.title,
                    self.env.matchers().clone(),
                    self.env.snapshots().cloned(),
                );
                let outcome = run_test(test, scope, self.env.config().default_timeout()).await;

                match run_chain(&hooks.after, &ctx, HookPhase::AfterEach).await {
                    Ok(()) => outcome,
                    Err(err) if outcome.passed => outcome.into_failure(err),
                    Err(err) => {
                        warn!("'{}' after hook also failed: {}", test.title, err);
                        outcome
                    }
                }
            }
        };

        self.env
            .record(TestResult::from_outcome(path, &test.title, &outcome));

        match outcome.error {
            Some(error) if !outcome.passed => {
                self.env.emit(RunEvent::TestFail {
                    suite: path.to_string(),
                    title: test.title.clone(),
                    duration: outcome.duration,
                    attempts: outcome.attempts,
                    error: error.clone(),
                });
                Err(error)
            }
            _ => {
                self.env.emit(RunEvent::TestPass {
                    suite: path.to_string(),
                    title: test.title.clone(),
                    duration: outcome.duration,
                    attempts: outcome.attempts,
                });
                Ok(())
            }
        }
    }
}
