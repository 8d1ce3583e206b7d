//! Bundled demo suites
//!
//! The suites run by the `run` command:
//!
//! ### Math
//! - arithmetic, table-driven cases, a flaky test that passes on retry
//!
//! ### Strings
//! - containment, regex and snapshot matchers
//!
//! ### Lifecycle
//! - hook ordering, context inheritance between nested suites

mod lifecycle;
mod math;
mod strings;

use crate::models::SuiteTree;

/// Tree holding every bundled suite under an unnamed root
pub fn demo_tree() -> SuiteTree {
    SuiteTree::build("", |s| {
        s.describe("Math", math::register);
        s.describe("Strings", strings::register);
        s.describe("Lifecycle", lifecycle::register);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::events::EventBus;
    use crate::executor::run_tests;

    #[test]
    fn test_demo_tree_shape() {
        let tree = demo_tree();
        let root = tree.suite(tree.root());
        let names: Vec<_> = root
            .children
            .iter()
            .map(|&id| tree.suite(id).name.as_str())
            .collect();
        assert_eq!(names, vec!["Math", "Strings", "Lifecycle"]);
        assert!(tree.test_count() >= 10);
    }

    #[tokio::test]
    async fn test_demo_tree_passes() {
        let tree = demo_tree();
        let config = RunConfig::new().without_snapshots();
        let summary = run_tests(&tree, &config, &EventBus::new()).await.unwrap();

        assert!(!summary.has_failures(), "{summary}");
        assert!(summary.skipped >= 1);
    }
}
