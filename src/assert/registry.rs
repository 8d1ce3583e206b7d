//! Matcher registry
//!
//! Matchers are registered by name into a lookup table before a run and
//! looked up by the expectation API. Unknown names are a test failure, not
//! a panic.

use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::snapshot::SnapshotStore;
use crate::error::TestError;

/// Ambient information a matcher may need
#[derive(Clone, Copy)]
pub struct MatcherContext<'a> {
    /// Title of the currently executing test
    pub test_title: &'a str,
    /// `None` when snapshots are disabled
    pub snapshots: Option<&'a SnapshotStore>,
}

/// Matcher function: `Ok` on match, `Err(message)` otherwise
pub type MatcherFn =
    Arc<dyn Fn(&MatcherContext<'_>, &Value, &[Value]) -> Result<(), String> + Send + Sync>;

/// Named matcher lookup table
#[derive(Clone, Default)]
pub struct MatcherRegistry {
    matchers: BTreeMap<String, MatcherFn>,
}

impl MatcherRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in matchers
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("toBe", |_, received, args| {
            let expected = arg(args, 0, "toBe")?;
            if received == expected {
                Ok(())
            } else {
                Err(format!("expected {received} to be {expected}"))
            }
        });
        registry.register("toEqual", |_, received, args| {
            let expected = arg(args, 0, "toEqual")?;
            if deep_equal(received, expected) {
                Ok(())
            } else {
                Err(format!("expected {received} to equal {expected}"))
            }
        });
        registry.register("toBeTruthy", |_, received, _| {
            if is_truthy(received) {
                Ok(())
            } else {
                Err(format!("expected {received} to be truthy"))
            }
        });
        registry.register("toBeFalsy", |_, received, _| {
            if is_truthy(received) {
                Err(format!("expected {received} to be falsy"))
            } else {
                Ok(())
            }
        });
        registry.register("toBeNull", |_, received, _| {
            if received.is_null() {
                Ok(())
            } else {
                Err(format!("expected {received} to be null"))
            }
        });
        registry.register("toContain", |_, received, args| {
            let item = arg(args, 0, "toContain")?;
            let found = match (received, item) {
                (Value::Array(items), _) => items.iter().any(|v| deep_equal(v, item)),
                (Value::String(s), Value::String(sub)) => s.contains(sub.as_str()),
                _ => return Err(format!("toContain cannot search in {received}")),
            };
            if found {
                Ok(())
            } else {
                Err(format!("expected {received} to contain {item}"))
            }
        });
        registry.register("toHaveLength", |_, received, args| {
            let expected = arg(args, 0, "toHaveLength")?
                .as_u64()
                .ok_or_else(|| "toHaveLength expects a non-negative integer".to_string())?;
            let actual = match received {
                Value::Array(items) => items.len(),
                Value::String(s) => s.chars().count(),
                Value::Object(map) => map.len(),
                _ => return Err(format!("{received} has no length")),
            };
            if actual as u64 == expected {
                Ok(())
            } else {
                Err(format!("expected length {expected}, received length {actual}"))
            }
        });
        registry.register("toBeGreaterThan", |_, received, args| {
            let (actual, bound) = numbers(received, arg(args, 0, "toBeGreaterThan")?)?;
            if actual > bound {
                Ok(())
            } else {
                Err(format!("expected {actual} to be greater than {bound}"))
            }
        });
        registry.register("toBeLessThan", |_, received, args| {
            let (actual, bound) = numbers(received, arg(args, 0, "toBeLessThan")?)?;
            if actual < bound {
                Ok(())
            } else {
                Err(format!("expected {actual} to be less than {bound}"))
            }
        });
        registry.register("toMatch", |_, received, args| {
            let pattern = arg(args, 0, "toMatch")?
                .as_str()
                .ok_or_else(|| "toMatch expects a pattern string".to_string())?;
            let text = received
                .as_str()
                .ok_or_else(|| format!("toMatch expects a string, received {received}"))?;
            let re = Regex::new(pattern).map_err(|e| format!("invalid pattern: {e}"))?;
            if re.is_match(text) {
                Ok(())
            } else {
                Err(format!("expected {text:?} to match /{pattern}/"))
            }
        });
        registry.register("toMatchSnapshot", |ctx, received, _| match ctx.snapshots {
            Some(store) => store
                .check(ctx.test_title, received)
                .map(|_| ())
                .map_err(|e| format!("{e:#}")),
            None => Ok(()),
        });
        registry
    }

    /// Register or replace a matcher
    pub fn register<F>(&mut self, name: impl Into<String>, matcher: F) -> &mut Self
    where
        F: Fn(&MatcherContext<'_>, &Value, &[Value]) -> Result<(), String>
            + Send
            + Sync
            + 'static,
    {
        self.matchers.insert(name.into(), Arc::new(matcher));
        self
    }

    pub fn get(&self, name: &str) -> Result<&MatcherFn, TestError> {
        self.matchers
            .get(name)
            .ok_or_else(|| TestError::UnknownMatcher(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.matchers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.matchers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

impl fmt::Debug for MatcherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.matchers.keys()).finish()
    }
}

fn arg<'a>(args: &'a [Value], index: usize, matcher: &str) -> Result<&'a Value, String> {
    args.get(index)
        .ok_or_else(|| format!("{matcher} expects argument {}", index + 1))
}

fn numbers(received: &Value, bound: &Value) -> Result<(f64, f64), String> {
    match (received.as_f64(), bound.as_f64()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(format!("expected numbers, received {received} and {bound}")),
    }
}

/// JavaScript-style truthiness
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Structural equality with numbers compared by value (`1 == 1.0`)
fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| deep_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| deep_equal(x, y)))
        }
        _ => a == b,
    }
}
