//! Per-attempt test scope
//!
//! Everything a test body can see: the shared context, its own title and
//! the run's assertion machinery.

use serde_json::Value;
use std::sync::Arc;

use crate::assert::{Expectation, MatcherRegistry, SnapshotStore};
use crate::models::RunContext;

/// Handle passed to a test body for one attempt
#[derive(Clone)]
pub struct TestScope {
    ctx: RunContext,
    suite: Arc<str>,
    title: Arc<str>,
    attempt: u32,
    matchers: Arc<MatcherRegistry>,
    snapshots: Option<Arc<SnapshotStore>>,
}

impl TestScope {
    pub fn new(
        ctx: RunContext,
        suite: &str,
        title: &str,
        matchers: Arc<MatcherRegistry>,
        snapshots: Option<Arc<SnapshotStore>>,
    ) -> Self {
        Self {
            ctx,
            suite: Arc::from(suite),
            title: Arc::from(title),
            attempt: 1,
            matchers,
            snapshots,
        }
    }

    /// Same scope, numbered for the given attempt
    pub fn for_attempt(&self, attempt: u32) -> Self {
        Self {
            attempt,
            ..self.clone()
        }
    }

    pub fn ctx(&self) -> &RunContext {
        &self.ctx
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn suite(&self) -> &str {
        &self.suite
    }

    /// One-based attempt number
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn matchers(&self) -> &MatcherRegistry {
        &self.matchers
    }

    /// Start an assertion on `received`
    pub fn expect(&self, received: impl Into<Value>) -> Expectation<'_> {
        Expectation::new(
            received.into(),
            &self.matchers,
            &self.title,
            self.snapshots.as_deref(),
        )
    }
}
