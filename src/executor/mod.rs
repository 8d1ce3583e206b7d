//! Test execution engine
//!
//! Hook composition, bounded concurrent scheduling, the per-test attempt
//! runner and the suite tree walker that drives them.

mod engine;
mod hooks;
mod parallel;
mod runner;
mod scope;
mod walker;

pub use engine::{run_tests, Engine, RunEnv};
pub use hooks::{merge_hooks, run_chain, MergedHooks};
pub use parallel::{run_concurrent, TaskError, TaskResult};
pub use runner::run_test;
pub use scope::TestScope;
pub use walker::SuiteWalker;
