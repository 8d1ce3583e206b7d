//! Data models for suite execution
//!
//! This module contains the suite tree, the shared run context and the
//! outcome types produced by a run.

mod context;
mod outcome;
mod suite;

pub use context::RunContext;
pub use outcome::{RunSummary, TestOutcome, TestResult, TestStatus};
pub use suite::{
    hook_fn, test_fn, HookFn, Suite, SuiteHooks, SuiteId, SuiteTree, Test, TestFn, TestId,
    TestOptions,
};
