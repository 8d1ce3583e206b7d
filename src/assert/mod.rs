//! Assertions
//!
//! The matcher registry, the snapshot store and the expectation API that
//! test bodies call through their `TestScope`.

mod expect;
mod registry;
mod snapshot;

pub use expect::Expectation;
pub use registry::{MatcherContext, MatcherFn, MatcherRegistry};
pub use snapshot::{SnapshotStatus, SnapshotStore};
