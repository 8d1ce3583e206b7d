//! Suite Runner - concurrent test-suite orchestration
//!
//! Suites and tests are declared with a `describe`/`it` style builder into
//! an arena-backed tree. A run walks the tree depth-first:
//!
//! - `beforeAll` hooks of a suite, then its tests as one bounded concurrent
//!   batch, then its child suites in order, then `afterAll` hooks
//! - per-test `beforeEach`/`afterEach` chains composed from all ancestors
//! - per-attempt timeouts and retries
//! - lifecycle events (`suiteStart`, `testStart`, `testPass`, `testFail`,
//!   `testSkip`, `runEnd`) published on a synchronous bus
//!
//! ## Usage
//!
//! ```ignore
//! use suite_runner::{run_tests, EventBus, RunConfig, SuiteTree};
//!
//! let tree = SuiteTree::build("", |s| {
//!     s.describe("Math", |s| {
//!         s.it("adds", |t| async move { t.expect(1 + 1).to_be(2) });
//!     });
//! });
//! let summary = run_tests(&tree, &RunConfig::default(), &EventBus::new()).await?;
//! ```

pub mod assert;
pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod executor;
pub mod models;
pub mod output;
pub mod suites;
pub mod utils;

pub use assert::{Expectation, MatcherRegistry, SnapshotStore};
pub use builder::SuiteBuilder;
pub use config::RunConfig;
pub use error::{HookPhase, RunError, TestError};
pub use events::{EventBus, EventKind, RunEvent};
pub use executor::{run_tests, Engine, TestScope};
pub use models::{RunContext, RunSummary, SuiteTree, TestOptions, TestResult, TestStatus};
pub use output::{Reporter, ReporterMode};
