//! Error types for test execution
//!
//! `TestError` covers everything that can fail a single test. `RunError`
//! covers failures that abort a whole run.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Per-test hook phase
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookPhase {
    BeforeAll,
    AfterAll,
    BeforeEach,
    AfterEach,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::BeforeAll => write!(f, "beforeAll"),
            HookPhase::AfterAll => write!(f, "afterAll"),
            HookPhase::BeforeEach => write!(f, "beforeEach"),
            HookPhase::AfterEach => write!(f, "afterEach"),
        }
    }
}

/// Failure of a single test, hook or matcher
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TestError {
    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error("Timeout after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("{phase} hook failed: {message}")]
    Hook { phase: HookPhase, message: String },

    #[error("Unknown matcher: {0}")]
    UnknownMatcher(String),

    #[error("{0}")]
    Body(String),
}

impl TestError {
    pub fn assertion(message: impl Into<String>) -> Self {
        TestError::Assertion(message.into())
    }

    pub fn body(message: impl Into<String>) -> Self {
        TestError::Body(message.into())
    }

    /// Wrap any error raised inside a hook
    pub fn hook(phase: HookPhase, source: &TestError) -> Self {
        let message = match source {
            TestError::Hook { message, .. } => message.clone(),
            other => other.to_string(),
        };
        TestError::Hook { phase, message }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TestError::Timeout(_))
    }

    /// Short category name used by reporters
    pub fn kind(&self) -> &'static str {
        match self {
            TestError::Assertion(_) => "assertion",
            TestError::Timeout(_) => "timeout",
            TestError::Hook { .. } => "hook",
            TestError::UnknownMatcher(_) => "unknown-matcher",
            TestError::Body(_) => "error",
        }
    }
}

impl From<anyhow::Error> for TestError {
    fn from(err: anyhow::Error) -> Self {
        TestError::Body(format!("{err:#}"))
    }
}

impl From<std::io::Error> for TestError {
    fn from(err: std::io::Error) -> Self {
        TestError::Body(err.to_string())
    }
}

/// Errors that abort a whole run
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Suite '{suite}' aborted: {source}")]
    SuiteHook {
        suite: String,
        phase: HookPhase,
        #[source]
        source: TestError,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid filter pattern: {0}")]
    Filter(#[from] regex::Error),
}
