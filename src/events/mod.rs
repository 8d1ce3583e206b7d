//! Lifecycle events
//!
//! Events are emitted by the suite walker and delivered synchronously to
//! every subscriber of the matching kind.

mod bus;

pub use bus::{EventBus, Listener};

use std::fmt;
use std::time::Duration;

use crate::error::TestError;

/// Event discriminant used for subscriptions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    SuiteStart,
    TestStart,
    TestPass,
    TestFail,
    TestSkip,
    RunEnd,
}

impl EventKind {
    pub fn all() -> [EventKind; 6] {
        [
            EventKind::SuiteStart,
            EventKind::TestStart,
            EventKind::TestPass,
            EventKind::TestFail,
            EventKind::TestSkip,
            EventKind::RunEnd,
        ]
    }

    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::SuiteStart => "suiteStart",
            EventKind::TestStart => "testStart",
            EventKind::TestPass => "testPass",
            EventKind::TestFail => "testFail",
            EventKind::TestSkip => "testSkip",
            EventKind::RunEnd => "runEnd",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle event with payload
#[derive(Clone, Debug, PartialEq)]
pub enum RunEvent {
    SuiteStart {
        suite: String,
    },
    TestStart {
        suite: String,
        title: String,
    },
    TestPass {
        suite: String,
        title: String,
        duration: Duration,
        attempts: u32,
    },
    TestFail {
        suite: String,
        title: String,
        duration: Duration,
        attempts: u32,
        error: TestError,
    },
    TestSkip {
        suite: String,
        title: String,
    },
    RunEnd {
        duration: Duration,
    },
}

impl RunEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            RunEvent::SuiteStart { .. } => EventKind::SuiteStart,
            RunEvent::TestStart { .. } => EventKind::TestStart,
            RunEvent::TestPass { .. } => EventKind::TestPass,
            RunEvent::TestFail { .. } => EventKind::TestFail,
            RunEvent::TestSkip { .. } => EventKind::TestSkip,
            RunEvent::RunEnd { .. } => EventKind::RunEnd,
        }
    }

    /// Test title, for test-scoped events
    pub fn title(&self) -> Option<&str> {
        match self {
            RunEvent::TestStart { title, .. }
            | RunEvent::TestPass { title, .. }
            | RunEvent::TestFail { title, .. }
            | RunEvent::TestSkip { title, .. } => Some(title),
            RunEvent::SuiteStart { .. } | RunEvent::RunEnd { .. } => None,
        }
    }

    pub fn suite(&self) -> Option<&str> {
        match self {
            RunEvent::SuiteStart { suite }
            | RunEvent::TestStart { suite, .. }
            | RunEvent::TestPass { suite, .. }
            | RunEvent::TestFail { suite, .. }
            | RunEvent::TestSkip { suite, .. } => Some(suite),
            RunEvent::RunEnd { .. } => None,
        }
    }
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunEvent::SuiteStart { suite } => write!(f, "{} {suite}", self.kind()),
            RunEvent::TestStart { title, .. } | RunEvent::TestSkip { title, .. } => {
                write!(f, "{} {title}", self.kind())
            }
            RunEvent::TestPass {
                title, duration, ..
            } => write!(f, "{} {title} [{}ms]", self.kind(), duration.as_millis()),
            RunEvent::TestFail {
                title,
                duration,
                error,
                ..
            } => write!(
                f,
                "{} {title} [{}ms]: {error}",
                self.kind(),
                duration.as_millis()
            ),
            RunEvent::RunEnd { duration } => {
                write!(f, "{} [{}ms]", self.kind(), duration.as_millis())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kinds() {
        let event = RunEvent::TestSkip {
            suite: "Math".to_string(),
            title: "pow".to_string(),
        };
        assert_eq!(event.kind(), EventKind::TestSkip);
        assert_eq!(event.title(), Some("pow"));
        assert_eq!(event.suite(), Some("Math"));
        assert_eq!(event.to_string(), "testSkip pow");

        let end = RunEvent::RunEnd {
            duration: Duration::from_millis(12),
        };
        assert_eq!(end.title(), None);
        assert_eq!(end.to_string(), "runEnd [12ms]");
    }

    #[test]
    fn test_kind_names_unique() {
        let names: std::collections::HashSet<_> =
            EventKind::all().iter().map(EventKind::name).collect();
        assert_eq!(names.len(), 6);
    }
}
