//! Expectation API used by test bodies

use serde_json::Value;

use super::registry::{MatcherContext, MatcherRegistry};
use super::snapshot::SnapshotStore;
use crate::error::TestError;

/// A received value waiting to be checked by a named matcher
pub struct Expectation<'a> {
    received: Value,
    matchers: &'a MatcherRegistry,
    context: MatcherContext<'a>,
    negated: bool,
}

impl<'a> Expectation<'a> {
    pub fn new(
        received: Value,
        matchers: &'a MatcherRegistry,
        test_title: &'a str,
        snapshots: Option<&'a SnapshotStore>,
    ) -> Self {
        Self {
            received,
            matchers,
            context: MatcherContext {
                test_title,
                snapshots,
            },
            negated: false,
        }
    }

    /// Invert the next matcher
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn received(&self) -> &Value {
        &self.received
    }

    /// Run matcher `name` with `args`, the received value prepended
    pub fn to(&self, name: &str, args: &[Value]) -> Result<(), TestError> {
        let matcher = self.matchers.get(name)?;
        match (matcher(&self.context, &self.received, args), self.negated) {
            (Ok(()), false) | (Err(_), true) => Ok(()),
            (Err(message), false) => Err(TestError::Assertion(message)),
            (Ok(()), true) => Err(TestError::Assertion(format!(
                "expected {} not to satisfy {name}{}",
                self.received,
                format_args(args)
            ))),
        }
    }

    pub fn to_be(&self, expected: impl Into<Value>) -> Result<(), TestError> {
        self.to("toBe", &[expected.into()])
    }

    pub fn to_equal(&self, expected: impl Into<Value>) -> Result<(), TestError> {
        self.to("toEqual", &[expected.into()])
    }

    pub fn to_be_truthy(&self) -> Result<(), TestError> {
        self.to("toBeTruthy", &[])
    }

    pub fn to_be_falsy(&self) -> Result<(), TestError> {
        self.to("toBeFalsy", &[])
    }

    pub fn to_be_null(&self) -> Result<(), TestError> {
        self.to("toBeNull", &[])
    }

    pub fn to_contain(&self, item: impl Into<Value>) -> Result<(), TestError> {
        self.to("toContain", &[item.into()])
    }

    pub fn to_have_length(&self, len: usize) -> Result<(), TestError> {
        self.to("toHaveLength", &[Value::from(len)])
    }

    pub fn to_be_greater_than(&self, bound: impl Into<Value>) -> Result<(), TestError> {
        self.to("toBeGreaterThan", &[bound.into()])
    }

    pub fn to_be_less_than(&self, bound: impl Into<Value>) -> Result<(), TestError> {
        self.to("toBeLessThan", &[bound.into()])
    }

    pub fn to_match(&self, pattern: &str) -> Result<(), TestError> {
        self.to("toMatch", &[Value::from(pattern)])
    }

    pub fn to_match_snapshot(&self) -> Result<(), TestError> {
        self.to("toMatchSnapshot", &[])
    }
}

fn format_args(args: &[Value]) -> String {
    if args.is_empty() {
        String::new()
    } else {
        let parts: Vec<String> = args.iter().map(Value::to_string).collect();
        format!("({})", parts.join(", "))
    }
}
