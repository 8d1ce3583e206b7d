//! Suite tree data model
//!
//! Suites and tests live in a `SuiteTree` arena and are addressed by
//! `SuiteId` / `TestId` handles, so a tree can be run repeatedly without
//! chasing live references.

use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use super::context::RunContext;
use crate::error::{HookPhase, TestError};
use crate::executor::{MergedHooks, TestScope};

/// Lifecycle hook: receives the active run context
pub type HookFn = Arc<dyn Fn(RunContext) -> BoxFuture<'static, Result<(), TestError>> + Send + Sync>;

/// Test body: receives the per-attempt test scope
pub type TestFn = Arc<dyn Fn(TestScope) -> BoxFuture<'static, Result<(), TestError>> + Send + Sync>;

/// Wrap an async closure as a hook
pub fn hook_fn<F, Fut>(f: F) -> HookFn
where
    F: Fn(RunContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TestError>> + Send + 'static,
{
    Arc::new(move |ctx| f(ctx).boxed())
}

/// Wrap an async closure as a test body
pub fn test_fn<F, Fut>(f: F) -> TestFn
where
    F: Fn(TestScope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TestError>> + Send + 'static,
{
    Arc::new(move |scope| f(scope).boxed())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SuiteId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestId(usize);

impl SuiteId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl TestId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Per-test execution options
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TestOptions {
    /// Time budget per attempt; `None` falls back to the run default
    pub timeout: Option<Duration>,
    /// Additional attempts after the first failure
    pub retry: u32,
    pub tags: Vec<String>,
}

impl TestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-attempt budget; a zero duration leaves it unset
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    pub fn timeout_ms(self, ms: u64) -> Self {
        self.timeout(Duration::from_millis(ms))
    }

    pub fn retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Budget for one attempt: the test's own positive timeout, else `default`
    pub fn effective_timeout(&self, default: Option<Duration>) -> Option<Duration> {
        self.timeout
            .filter(|timeout| !timeout.is_zero())
            .or(default)
            .filter(|timeout| !timeout.is_zero())
    }

    /// Total attempts allowed, first one included
    pub fn max_attempts(&self) -> u32 {
        self.retry.saturating_add(1)
    }
}

/// A single test
pub struct Test {
    pub title: String,
    pub body: TestFn,
    pub options: TestOptions,
    pub only: bool,
    pub skip: bool,
    pub suite: SuiteId,
}

impl fmt::Debug for Test {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Test")
            .field("title", &self.title)
            .field("options", &self.options)
            .field("only", &self.only)
            .field("skip", &self.skip)
            .finish_non_exhaustive()
    }
}

/// Hook lists of a suite, each in declaration order
#[derive(Clone, Default)]
pub struct SuiteHooks {
    pub before_all: Vec<HookFn>,
    pub after_all: Vec<HookFn>,
    pub before_each: Vec<HookFn>,
    pub after_each: Vec<HookFn>,
}

impl SuiteHooks {
    pub fn list(&self, phase: HookPhase) -> &[HookFn] {
        match phase {
            HookPhase::BeforeAll => &self.before_all,
            HookPhase::AfterAll => &self.after_all,
            HookPhase::BeforeEach => &self.before_each,
            HookPhase::AfterEach => &self.after_each,
        }
    }

    pub fn push(&mut self, phase: HookPhase, hook: HookFn) {
        match phase {
            HookPhase::BeforeAll => self.before_all.push(hook),
            HookPhase::AfterAll => self.after_all.push(hook),
            HookPhase::BeforeEach => self.before_each.push(hook),
            HookPhase::AfterEach => self.after_each.push(hook),
        }
    }
}

/// A named group of tests and nested suites
pub struct Suite {
    pub name: String,
    pub parent: Option<SuiteId>,
    pub tests: Vec<TestId>,
    pub children: Vec<SuiteId>,
    pub hooks: SuiteHooks,
    pub only: bool,
    pub skip: bool,
    /// Own context keys, merged over the inherited context at run time
    pub context: Map<String, Value>,
    merged_hooks: OnceLock<Arc<MergedHooks>>,
}

impl Suite {
    fn new(name: impl Into<String>, parent: Option<SuiteId>) -> Self {
        Self {
            name: name.into(),
            parent,
            tests: Vec::new(),
            children: Vec::new(),
            hooks: SuiteHooks::default(),
            only: false,
            skip: false,
            context: Map::new(),
            merged_hooks: OnceLock::new(),
        }
    }

    /// Merged per-test hook chains, filled on first use and kept for the
    /// lifetime of the tree
    pub(crate) fn merged_hooks_cell(&self) -> &OnceLock<Arc<MergedHooks>> {
        &self.merged_hooks
    }

    pub fn has_cached_hooks(&self) -> bool {
        self.merged_hooks.get().is_some()
    }
}

impl fmt::Debug for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("name", &self.name)
            .field("tests", &self.tests.len())
            .field("children", &self.children.len())
            .field("only", &self.only)
            .field("skip", &self.skip)
            .finish_non_exhaustive()
    }
}

/// Arena holding a whole suite tree
#[derive(Debug)]
pub struct SuiteTree {
    suites: Vec<Suite>,
    tests: Vec<Test>,
}

impl SuiteTree {
    /// Create a tree with an empty root suite
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            suites: vec![Suite::new(root_name, None)],
            tests: Vec::new(),
        }
    }

    pub fn root(&self) -> SuiteId {
        SuiteId(0)
    }

    pub fn suite(&self, id: SuiteId) -> &Suite {
        &self.suites[id.0]
    }

    pub fn suite_mut(&mut self, id: SuiteId) -> &mut Suite {
        &mut self.suites[id.0]
    }

    pub fn test(&self, id: TestId) -> &Test {
        &self.tests[id.0]
    }

    pub fn test_mut(&mut self, id: TestId) -> &mut Test {
        &mut self.tests[id.0]
    }

    pub fn add_suite(&mut self, parent: SuiteId, name: impl Into<String>) -> SuiteId {
        let id = SuiteId(self.suites.len());
        self.suites.push(Suite::new(name, Some(parent)));
        self.suites[parent.0].children.push(id);
        id
    }

    pub fn add_test(
        &mut self,
        suite: SuiteId,
        title: impl Into<String>,
        body: TestFn,
        options: TestOptions,
    ) -> TestId {
        let id = TestId(self.tests.len());
        self.tests.push(Test {
            title: title.into(),
            body,
            options,
            only: false,
            skip: false,
            suite,
        });
        self.suites[suite.0].tests.push(id);
        id
    }

    /// Register a hook after construction. Suites whose merged chains were
    /// already computed keep their cached chains.
    pub fn add_hook(&mut self, suite: SuiteId, phase: HookPhase, hook: HookFn) {
        self.suites[suite.0].hooks.push(phase, hook);
    }

    pub fn suite_count(&self) -> usize {
        self.suites.len()
    }

    pub fn test_count(&self) -> usize {
        self.tests.len()
    }

    pub fn test_ids(&self) -> impl Iterator<Item = TestId> {
        (0..self.tests.len()).map(TestId)
    }

    /// Names from the root down to `id`, skipping empty names
    pub fn suite_path(&self, id: SuiteId) -> String {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(suite_id) = current {
            let suite = self.suite(suite_id);
            if !suite.name.is_empty() {
                names.push(suite.name.as_str());
            }
            current = suite.parent;
        }
        names.reverse();
        names.join(" > ")
    }

    /// Depth of `id` below the root
    pub fn depth(&self, id: SuiteId) -> usize {
        let mut depth = 0;
        let mut current = self.suite(id).parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.suite(parent).parent;
        }
        depth
    }

    /// Find a test by exact title
    pub fn find_test(&self, title: &str) -> Option<TestId> {
        self.tests
            .iter()
            .position(|t| t.title == title)
            .map(TestId)
    }
}
