//! Suite-building API
//!
//! Closures passed to `describe` populate a [`SuiteTree`] in declaration
//! order:
//!
//! ```ignore
//! let tree = SuiteTree::build("", |s| {
//!     s.describe("Math", |s| {
//!         s.before_each(|ctx| async move {
//!             ctx.set("base", 40);
//!             Ok(())
//!         });
//!         s.it("adds", |t| async move {
//!             let base: i64 = t.ctx().get_as("base").unwrap_or_default();
//!             t.expect(base + 2).to_be(42)
//!         });
//!     });
//! });
//! ```

use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use crate::error::{HookPhase, TestError};
use crate::executor::TestScope;
use crate::models::{hook_fn, test_fn, RunContext, SuiteId, SuiteTree, TestId, TestOptions};

impl SuiteTree {
    /// Build a tree by running `f` against its root suite
    pub fn build<F>(root_name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(&mut SuiteBuilder<'_>),
    {
        let mut tree = SuiteTree::new(root_name);
        let root = tree.root();
        f(&mut SuiteBuilder::new(&mut tree, root));
        tree
    }
}

/// Adds tests, hooks and child suites to one suite of a tree
pub struct SuiteBuilder<'t> {
    tree: &'t mut SuiteTree,
    suite: SuiteId,
}

impl<'t> SuiteBuilder<'t> {
    pub fn new(tree: &'t mut SuiteTree, suite: SuiteId) -> Self {
        Self { tree, suite }
    }

    /// Id of the suite being built
    pub fn id(&self) -> SuiteId {
        self.suite
    }

    /// Add a child suite
    pub fn describe<F>(&mut self, name: impl Into<String>, f: F) -> SuiteId
    where
        F: FnOnce(&mut SuiteBuilder<'_>),
    {
        let child = self.tree.add_suite(self.suite, name);
        f(&mut SuiteBuilder::new(self.tree, child));
        child
    }

    /// Add a child suite that excludes its non-`only` siblings
    pub fn describe_only<F>(&mut self, name: impl Into<String>, f: F) -> SuiteId
    where
        F: FnOnce(&mut SuiteBuilder<'_>),
    {
        let child = self.describe(name, f);
        self.tree.suite_mut(child).only = true;
        child
    }

    /// Add a child suite that never runs
    pub fn describe_skip<F>(&mut self, name: impl Into<String>, f: F) -> SuiteId
    where
        F: FnOnce(&mut SuiteBuilder<'_>),
    {
        let child = self.describe(name, f);
        self.tree.suite_mut(child).skip = true;
        child
    }

    pub fn it<F, Fut>(&mut self, title: impl Into<String>, f: F) -> TestId
    where
        F: Fn(TestScope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TestError>> + Send + 'static,
    {
        self.it_with(title, TestOptions::default(), f)
    }

    /// Add a test with explicit timeout, retry or tags
    pub fn it_with<F, Fut>(&mut self, title: impl Into<String>, options: TestOptions, f: F) -> TestId
    where
        F: Fn(TestScope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TestError>> + Send + 'static,
    {
        self.tree.add_test(self.suite, title, test_fn(f), options)
    }

    pub fn it_only<F, Fut>(&mut self, title: impl Into<String>, f: F) -> TestId
    where
        F: Fn(TestScope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TestError>> + Send + 'static,
    {
        let id = self.it(title, f);
        self.tree.test_mut(id).only = true;
        id
    }

    pub fn it_skip<F, Fut>(&mut self, title: impl Into<String>, f: F) -> TestId
    where
        F: Fn(TestScope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TestError>> + Send + 'static,
    {
        let id = self.it(title, f);
        self.tree.test_mut(id).skip = true;
        id
    }

    /// Register one test per case, titled `"{title} [{index}]"`
    pub fn each<T, F, Fut>(&mut self, cases: Vec<T>, title: &str, f: F) -> Vec<TestId>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(TestScope, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TestError>> + Send + 'static,
    {
        let f = Arc::new(f);
        cases
            .into_iter()
            .enumerate()
            .map(|(index, case)| {
                let f = f.clone();
                self.it(format!("{title} [{index}]"), move |scope| f(scope, case.clone()))
            })
            .collect()
    }

    pub fn before_all<F, Fut>(&mut self, f: F) -> &mut Self
    where
        F: Fn(RunContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TestError>> + Send + 'static,
    {
        self.hook(HookPhase::BeforeAll, f)
    }

    pub fn after_all<F, Fut>(&mut self, f: F) -> &mut Self
    where
        F: Fn(RunContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TestError>> + Send + 'static,
    {
        self.hook(HookPhase::AfterAll, f)
    }

    pub fn before_each<F, Fut>(&mut self, f: F) -> &mut Self
    where
        F: Fn(RunContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TestError>> + Send + 'static,
    {
        self.hook(HookPhase::BeforeEach, f)
    }

    pub fn after_each<F, Fut>(&mut self, f: F) -> &mut Self
    where
        F: Fn(RunContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TestError>> + Send + 'static,
    {
        self.hook(HookPhase::AfterEach, f)
    }

    fn hook<F, Fut>(&mut self, phase: HookPhase, f: F) -> &mut Self
    where
        F: Fn(RunContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TestError>> + Send + 'static,
    {
        self.tree.add_hook(self.suite, phase, hook_fn(f));
        self
    }

    /// Set a key of this suite's own context
    pub fn context(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.tree
            .suite_mut(self.suite)
            .context
            .insert(key.into(), value.into());
        self
    }
}
