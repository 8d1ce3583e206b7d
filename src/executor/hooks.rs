//! Hook composition and execution

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::error::{HookPhase, TestError};
use crate::models::{HookFn, RunContext, Suite};
use crate::utils::panic_message;

/// Per-test hook chains of a suite, ancestors included
#[derive(Clone, Default)]
pub struct MergedHooks {
    /// Outermost ancestor first, the suite's own hooks last
    pub before: Vec<HookFn>,
    /// The suite's own hooks first, outermost ancestor last
    pub after: Vec<HookFn>,
}

impl MergedHooks {
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }
}

/// Compose the chains for `suite`, computing them at most once per suite
///
/// The first result is cached on the suite and returned as-is by every
/// later call, whatever the inherited chains passed then.
pub fn merge_hooks(
    suite: &Suite,
    inherited_before: &[HookFn],
    inherited_after: &[HookFn],
) -> Arc<MergedHooks> {
    suite
        .merged_hooks_cell()
        .get_or_init(|| {
            debug!(
                "Composing hooks for '{}': {} inherited before, {} own before",
                suite.name,
                inherited_before.len(),
                suite.hooks.before_each.len()
            );
            let before = inherited_before
                .iter()
                .chain(&suite.hooks.before_each)
                .cloned()
                .collect();
            let after = suite
                .hooks
                .after_each
                .iter()
                .chain(inherited_after)
                .cloned()
                .collect();
            Arc::new(MergedHooks { before, after })
        })
        .clone()
}

/// Run `hooks` one after another, stopping at the first failure
pub async fn run_chain(
    hooks: &[HookFn],
    ctx: &RunContext,
    phase: HookPhase,
) -> Result<(), TestError> {
    for (index, hook) in hooks.iter().enumerate() {
        trace!("Running {} hook #{}", phase, index);
        let result = AssertUnwindSafe(hook(ctx.clone())).catch_unwind().await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(TestError::hook(phase, &err)),
            Err(payload) => {
                let message = format!("panicked: {}", panic_message(payload.as_ref()));
                return Err(TestError::hook(phase, &TestError::Body(message)));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{hook_fn, SuiteTree};
    use std::sync::Mutex;

    fn logging_hook(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> HookFn {
        let log = log.clone();
        hook_fn(move |_ctx| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(name);
                Ok(())
            }
        })
    }

    #[tokio::test]
    async fn test_chain_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut tree = SuiteTree::new("root");
        let child = tree.add_suite(tree.root(), "child");
        tree.add_hook(child, HookPhase::BeforeEach, logging_hook(&log, "own-before"));
        tree.add_hook(child, HookPhase::AfterEach, logging_hook(&log, "own-after"));

        let inherited_before = vec![logging_hook(&log, "root-before")];
        let inherited_after = vec![logging_hook(&log, "root-after")];
        let merged = merge_hooks(tree.suite(child), &inherited_before, &inherited_after);

        let ctx = RunContext::new();
        run_chain(&merged.before, &ctx, HookPhase::BeforeEach)
            .await
            .unwrap();
        run_chain(&merged.after, &ctx, HookPhase::AfterEach)
            .await
            .unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["root-before", "own-before", "own-after", "root-after"]
        );
    }

    #[test]
    fn test_empty_chain_passes() {
        let ctx = RunContext::new();
        let result = tokio_test::block_on(run_chain(&[], &ctx, HookPhase::BeforeAll));
        assert!(result.is_ok());
    }

    #[test]
    fn test_merge_is_cached() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut tree = SuiteTree::new("root");
        let root = tree.root();
        tree.add_hook(root, HookPhase::BeforeEach, logging_hook(&log, "a"));

        let first = merge_hooks(tree.suite(root), &[], &[]);
        let second = merge_hooks(tree.suite(root), &[logging_hook(&log, "x")], &[]);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.before.len(), 1);

        // Hooks added after the first composition are not picked up
        tree.add_hook(root, HookPhase::BeforeEach, logging_hook(&log, "b"));
        let third = merge_hooks(tree.suite(root), &[], &[]);
        assert!(Arc::ptr_eq(&first, &third));
        assert_eq!(third.before.len(), 1);
    }

    #[tokio::test]
    async fn test_chain_stops_at_failure() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let failing = hook_fn(|_ctx| async { Err(TestError::body("no database")) });
        let hooks = vec![
            logging_hook(&log, "first"),
            failing,
            logging_hook(&log, "never"),
        ];

        let err = run_chain(&hooks, &RunContext::new(), HookPhase::BeforeEach)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TestError::Hook {
                phase: HookPhase::BeforeEach,
                message: "no database".to_string()
            }
        );
        assert_eq!(*log.lock().unwrap(), vec!["first"]);
    }

    #[tokio::test]
    async fn test_panicking_hook_becomes_error() {
        fn explode() -> Result<(), TestError> {
            panic!("bad fixture")
        }
        let hooks = vec![hook_fn(|_ctx| async { explode() })];
        let err = run_chain(&hooks, &RunContext::new(), HookPhase::AfterEach)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "afterEach hook failed: panicked: bad fixture");
    }
}
