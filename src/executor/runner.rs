//! Test attempt runner
//!
//! Runs one test body under its time budget, retrying failed attempts
//! until the retry budget is spent.

use std::time::Duration;
use tracing::{debug, warn};

use super::scope::TestScope;
use crate::error::TestError;
use crate::models::{Test, TestFn, TestOutcome};
use crate::utils::{panic_message, Timer};

/// Run `test` to a terminal outcome
///
/// The test's own timeout wins over `default_timeout`; zero budgets count
/// as unset. The reported duration covers every attempt.
pub async fn run_test(test: &Test, scope: TestScope, default_timeout: Option<Duration>) -> TestOutcome {
    let limit = test.options.effective_timeout(default_timeout);
    let max_attempts = test.options.max_attempts();
    let timer = Timer::start(test.title.as_str());

    let mut last_error = None;
    for attempt in 1..=max_attempts {
        match run_attempt(&test.body, scope.for_attempt(attempt), limit).await {
            Ok(()) => {
                if attempt > 1 {
                    debug!("'{}' passed on attempt {}/{}", test.title, attempt, max_attempts);
                }
                return TestOutcome::passed(timer.elapsed(), attempt);
            }
            Err(err) => {
                if attempt < max_attempts {
                    warn!(
                        "'{}' attempt {}/{} failed, retrying: {}",
                        test.title, attempt, max_attempts, err
                    );
                } else {
                    debug!("'{}' failed after {} attempts: {}", test.title, attempt, err);
                }
                last_error = Some(err);
            }
        }
    }

    let error = last_error.unwrap_or_else(|| TestError::body("test made no attempts"));
    TestOutcome::failed(timer.elapsed(), max_attempts, error)
}

/// One attempt of `body`, raced against `limit` when set
///
/// The body runs as its own task. When the timer wins the task is left
/// running detached and its result is never observed.
async fn run_attempt(body: &TestFn, scope: TestScope, limit: Option<Duration>) -> Result<(), TestError> {
    let handle = tokio::spawn(body(scope));

    let joined = match limit {
        Some(limit) => match tokio::time::timeout(limit, handle).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!("Attempt timed out after {}ms", limit.as_millis());
                return Err(TestError::Timeout(limit));
            }
        },
        None => handle.await,
    };

    match joined {
        Ok(result) => result,
        Err(err) if err.is_panic() => Err(TestError::Body(format!(
            "panicked: {}",
            panic_message(err.into_panic().as_ref())
        ))),
        Err(err) => Err(TestError::body(err.to_string())),
    }
}
