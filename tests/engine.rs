//! End-to-end runs of small suite trees

use std::sync::atomic::{AtomicI64, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use suite_runner::models::SuiteTree;
use suite_runner::{
    run_tests, EventBus, EventKind, HookPhase, RunConfig, RunContext, RunError, RunEvent,
    TestError, TestOptions,
};

type Log = Arc<Mutex<Vec<String>>>;

fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn push(log: &Log, entry: impl Into<String>) {
    log.lock().unwrap().push(entry.into());
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Bus recording every event it sees
fn recording_bus() -> (EventBus, Arc<Mutex<Vec<RunEvent>>>) {
    let bus = EventBus::new();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    bus.subscribe_all(move |event| sink.lock().unwrap().push(event.clone()));
    (bus, events)
}

fn config() -> RunConfig {
    RunConfig::new().without_snapshots()
}

fn titles_of(events: &[RunEvent], kind: EventKind) -> Vec<String> {
    events
        .iter()
        .filter(|e| e.kind() == kind)
        .filter_map(|e| e.title().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn hooks_wrap_each_test_body() {
    let log = new_log();
    let (a, b, c) = (log.clone(), log.clone(), log.clone());
    let tree = SuiteTree::build("", move |s| {
        s.describe("suite", move |s| {
            s.before_each(move |_ctx| {
                let a = a.clone();
                async move {
                    push(&a, "A");
                    Ok(())
                }
            });
            s.after_each(move |_ctx| {
                let c = c.clone();
                async move {
                    push(&c, "C");
                    Ok(())
                }
            });
            s.it("logs", move |_t| {
                let b = b.clone();
                async move {
                    push(&b, "B");
                    Ok(())
                }
            });
        });
    });

    let summary = run_tests(&tree, &config(), &EventBus::new()).await.unwrap();
    assert_eq!(summary.passed, 1);
    assert_eq!(entries(&log), vec!["A", "B", "C"]);
}

#[tokio::test]
async fn nested_hooks_run_outermost_first_and_unwind_in_reverse() {
    let log = new_log();
    let hook = |log: &Log, name: &'static str| {
        let log = log.clone();
        move |_ctx: RunContext| {
            let log = log.clone();
            async move {
                push(&log, name);
                Ok(())
            }
        }
    };

    let (outer_before, outer_after) = (hook(&log, "outer-before"), hook(&log, "outer-after"));
    let (inner_before, inner_after) = (hook(&log, "inner-before"), hook(&log, "inner-after"));
    let body_log = log.clone();
    let tree = SuiteTree::build("", move |s| {
        s.before_each(outer_before).after_each(outer_after);
        s.describe("inner", move |s| {
            s.before_each(inner_before).after_each(inner_after);
            s.it("body", move |_t| {
                let log = body_log.clone();
                async move {
                    push(&log, "body");
                    Ok(())
                }
            });
        });
    });

    run_tests(&tree, &config(), &EventBus::new()).await.unwrap();
    assert_eq!(
        entries(&log),
        vec!["outer-before", "inner-before", "body", "inner-after", "outer-after"]
    );
}

#[tokio::test]
async fn parent_batch_completes_before_next_sibling_suite() {
    let tree = SuiteTree::build("", |s| {
        s.describe("S1", |s| {
            for (i, delay) in [30_u64, 10, 20].into_iter().enumerate() {
                s.it(format!("s1-{i}"), move |_t| async move {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    Ok(())
                });
            }
        });
        s.describe("S2", |s| {
            s.it("s2-0", |_t| async { Ok(()) });
            s.it("s2-1", |_t| async { Ok(()) });
        });
    });

    let (bus, events) = recording_bus();
    run_tests(&tree, &config(), &bus).await.unwrap();
    let events = events.lock().unwrap().clone();

    let first_s2_start = events
        .iter()
        .position(|e| e.kind() == EventKind::TestStart && e.suite() == Some("S2"))
        .unwrap();
    let s1_outcomes: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| e.kind() == EventKind::TestPass && e.suite() == Some("S1"))
        .map(|(i, _)| i)
        .collect();

    assert_eq!(s1_outcomes.len(), 3);
    assert!(s1_outcomes.iter().all(|&i| i < first_s2_start));
}

#[tokio::test]
async fn each_registers_one_test_per_case() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let tree = SuiteTree::build("", move |s| {
        s.each(vec![2, 3, 4], "is positive", move |t, n: i64| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(n);
                t.expect(n).to_be_greater_than(0)
            }
        });
    });

    let (bus, events) = recording_bus();
    let summary = run_tests(&tree, &config(), &bus).await.unwrap();
    assert_eq!(summary.passed, 3);

    let mut titles = titles_of(&events.lock().unwrap(), EventKind::TestPass);
    titles.sort();
    assert_eq!(
        titles,
        vec!["is positive [0]", "is positive [1]", "is positive [2]"]
    );

    let mut values = seen.lock().unwrap().clone();
    values.sort();
    assert_eq!(values, vec![2, 3, 4]);
}

#[tokio::test]
async fn snapshot_mismatch_fails_with_both_values() {
    let dir = tempfile::tempdir().unwrap();
    let value = Arc::new(AtomicI64::new(42));
    let current = value.clone();
    let tree = SuiteTree::build("", move |s| {
        s.it("X", move |t| {
            let current = current.clone();
            async move { t.expect(current.load(Ordering::SeqCst)).to_match_snapshot() }
        });
    });
    let config = RunConfig::new().with_snapshot_dir(dir.path());

    let first = run_tests(&tree, &config, &EventBus::new()).await.unwrap();
    assert_eq!(first.passed, 1);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("X.snap")).unwrap(),
        "42"
    );

    value.store(43, Ordering::SeqCst);
    let (bus, events) = recording_bus();
    let second = run_tests(&tree, &config, &bus).await.unwrap();
    assert_eq!(second.failed, 1);

    let events = events.lock().unwrap();
    let message = events
        .iter()
        .find_map(|e| match e {
            RunEvent::TestFail { error, .. } => Some(error.to_string()),
            _ => None,
        })
        .unwrap();
    assert!(message.contains("42"), "{message}");
    assert!(message.contains("43"), "{message}");
}

#[tokio::test]
async fn title_filter_selects_matching_tests() {
    let tree = SuiteTree::build("", |s| {
        s.it("Math add", |t| async move { t.expect(1 + 1).to_be(2) });
        s.it("String concat", |_t| async { Ok(()) });
    });

    let (bus, events) = recording_bus();
    let summary = run_tests(&tree, &config().with_filter("^Math"), &bus)
        .await
        .unwrap();

    assert_eq!(summary.total, 1);
    let events = events.lock().unwrap();
    assert_eq!(titles_of(&events, EventKind::TestStart), vec!["Math add"]);
    assert!(events.iter().all(|e| e.title() != Some("String concat")));
}

#[tokio::test]
async fn retries_until_the_body_passes() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let tree = SuiteTree::build("", move |s| {
        s.it_with("flaky", TestOptions::new().retry(3), move |_t| {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(TestError::assertion("not yet"))
                } else {
                    Ok(())
                }
            }
        });
    });

    let (bus, events) = recording_bus();
    let summary = run_tests(&tree, &config(), &bus).await.unwrap();

    assert_eq!(summary.passed, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    let events = events.lock().unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e, RunEvent::TestPass { attempts: 3, .. })));
    assert_eq!(titles_of(&events, EventKind::TestStart).len(), 1);
}

#[tokio::test]
async fn timeout_dominates_a_body_that_never_settles() {
    let tree = SuiteTree::build("", |s| {
        s.it_with("hangs", TestOptions::new().timeout_ms(50), |_t| {
            futures::future::pending::<Result<(), TestError>>()
        });
    });

    let (bus, events) = recording_bus();
    let start = Instant::now();
    let summary = run_tests(&tree, &config(), &bus).await.unwrap();

    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(summary.failed, 1);
    let events = events.lock().unwrap();
    let (duration, error) = events
        .iter()
        .find_map(|e| match e {
            RunEvent::TestFail {
                duration, error, ..
            } => Some((*duration, error.clone())),
            _ => None,
        })
        .unwrap();
    assert!(error.is_timeout());
    assert!(duration >= Duration::from_millis(50));
    assert_eq!(
        events.iter().filter(|e| e.kind() == EventKind::TestFail).count(),
        1
    );
}

#[tokio::test]
async fn only_tests_silence_their_siblings() {
    let tree = SuiteTree::build("", |s| {
        s.it("plain", |_t| async { Ok(()) });
        s.it_only("focused", |_t| async { Ok(()) });
        s.it_skip("skipped", |_t| async { Ok(()) });
    });

    let (bus, events) = recording_bus();
    let summary = run_tests(&tree, &config(), &bus).await.unwrap();

    assert_eq!(summary.total, 1);
    let events = events.lock().unwrap();
    let titled: Vec<_> = events.iter().filter_map(|e| e.title()).collect();
    assert_eq!(titled, vec!["focused", "focused"]);
}

#[tokio::test]
async fn skipped_tests_and_suites() {
    let ran = Arc::new(AtomicUsize::new(0));
    let (r1, r2) = (ran.clone(), ran.clone());
    let tree = SuiteTree::build("", move |s| {
        s.it_skip("later", move |_t| {
            let r = r1.clone();
            async move {
                r.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        s.describe_skip("Disabled", move |s| {
            s.it("never", move |_t| {
                let r = r2.clone();
                async move {
                    r.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            });
        });
    });

    let (bus, events) = recording_bus();
    let summary = run_tests(&tree, &config(), &bus).await.unwrap();

    assert_eq!(ran.load(Ordering::SeqCst), 0);
    assert_eq!(summary.skipped, 1);
    let events = events.lock().unwrap();
    assert_eq!(titles_of(&events, EventKind::TestSkip), vec!["later"]);
    assert!(events.iter().all(|e| e.suite() != Some("Disabled")));
}

#[tokio::test]
async fn child_context_overrides_and_inherits() {
    let tree = SuiteTree::build("", |s| {
        s.context("region", "eu").context("tier", "free");
        s.before_all(|ctx| async move {
            ctx.set("token", "abc");
            Ok(())
        });
        s.describe("child", |s| {
            s.context("tier", "pro");
            s.it("reads context", |t| async move {
                t.expect(t.ctx().get("region")).to_be("eu")?;
                t.expect(t.ctx().get("tier")).to_be("pro")?;
                t.expect(t.ctx().get("token")).to_be("abc")
            });
        });
    });

    let summary = run_tests(&tree, &config(), &EventBus::new()).await.unwrap();
    assert_eq!(summary.passed, 1, "{summary}");
}

#[tokio::test]
async fn before_all_failure_aborts_the_run() {
    let tree = SuiteTree::build("", |s| {
        s.describe("Database", |s| {
            s.before_all(|_ctx| async { Err(TestError::body("connection refused")) });
            s.it("query", |_t| async { Ok(()) });
        });
    });

    let (bus, events) = recording_bus();
    let err = run_tests(&tree, &config(), &bus).await.unwrap_err();

    match err {
        RunError::SuiteHook { suite, source, .. } => {
            assert_eq!(suite, "Database");
            assert!(source.to_string().contains("connection refused"));
        }
        other => panic!("unexpected error: {other}"),
    }
    let events = events.lock().unwrap();
    assert!(events.iter().all(|e| e.kind() != EventKind::TestStart));
    assert!(events.iter().all(|e| e.kind() != EventKind::RunEnd));
}

#[tokio::test]
async fn before_each_failure_skips_body_and_after_chain() {
    let log = new_log();
    let (body_log, after_log) = (log.clone(), log.clone());
    let tree = SuiteTree::build("", move |s| {
        s.before_each(|_ctx| async { Err(TestError::body("fixture missing")) });
        s.after_each(move |_ctx| {
            let log = after_log.clone();
            async move {
                push(&log, "after");
                Ok(())
            }
        });
        s.it("guarded", move |_t| {
            let log = body_log.clone();
            async move {
                push(&log, "body");
                Ok(())
            }
        });
        s.it("sibling", |_t| async { Ok(()) });
    });

    let summary = run_tests(&tree, &config(), &EventBus::new()).await.unwrap();
    assert_eq!(summary.failed, 2);
    assert!(entries(&log).is_empty());
    assert!(summary.results[0]
        .message
        .as_deref()
        .unwrap()
        .contains("beforeEach hook failed: fixture missing"));
}

#[tokio::test]
async fn after_each_failure_fails_a_passing_test() {
    let tree = SuiteTree::build("", |s| {
        s.after_each(|_ctx| async { Err(TestError::body("cleanup failed")) });
        s.it("passes", |_t| async { Ok(()) });
    });

    let summary = run_tests(&tree, &config(), &EventBus::new()).await.unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(
        summary.results[0].message.as_deref(),
        Some("afterEach hook failed: cleanup failed")
    );
}

#[tokio::test]
async fn failing_test_does_not_cancel_siblings() {
    let tree = SuiteTree::build("", |s| {
        s.it("fails", |t| async move { t.expect(1).to_be(2) });
        s.it("passes", |_t| async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(())
        });
        s.it("errors", |_t| async { Err(anyhow::anyhow!("io broke").into()) });
    });

    let summary = run_tests(&tree, &config(), &EventBus::new()).await.unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.failed, 2);
}

#[tokio::test]
async fn concurrency_limit_bounds_a_batch() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let (flight, top) = (in_flight.clone(), peak.clone());
    let tree = SuiteTree::build("", move |s| {
        for i in 0..8 {
            let flight = flight.clone();
            let top = top.clone();
            s.it(format!("t{i}"), move |_t| {
                let flight = flight.clone();
                let top = top.clone();
                async move {
                    let now = flight.fetch_add(1, Ordering::SeqCst) + 1;
                    top.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            });
        }
    });

    let summary = run_tests(&tree, &config().with_concurrency(2), &EventBus::new())
        .await
        .unwrap();
    assert_eq!(summary.passed, 8);
    assert!(peak.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn panicking_listener_does_not_abort_the_run() {
    let tree = SuiteTree::build("", |s| {
        s.it("a", |_t| async { Ok(()) });
        s.it("b", |_t| async { Ok(()) });
    });

    let bus = EventBus::new();
    bus.subscribe(EventKind::TestPass, |_| panic!("bad plugin"));
    let passes = Arc::new(AtomicUsize::new(0));
    let counter = passes.clone();
    bus.subscribe(EventKind::TestPass, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let summary = run_tests(&tree, &config(), &bus).await.unwrap();
    assert_eq!(summary.passed, 2);
    assert_eq!(passes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn repeated_runs_reuse_cached_hook_chains() {
    let log = new_log();
    let hook_log = log.clone();
    let mut tree = SuiteTree::build("", move |s| {
        s.before_each(move |_ctx| {
            let log = hook_log.clone();
            async move {
                push(&log, "first");
                Ok(())
            }
        });
        s.it("t", |_t| async { Ok(()) });
    });

    run_tests(&tree, &config(), &EventBus::new()).await.unwrap();
    assert!(tree.suite(tree.root()).has_cached_hooks());

    // Registered after the first run: not part of the cached chain
    let late_log = log.clone();
    let root = tree.root();
    tree.add_hook(
        root,
        HookPhase::BeforeEach,
        suite_runner::models::hook_fn(move |_ctx| {
            let log = late_log.clone();
            async move {
                push(&log, "late");
                Ok(())
            }
        }),
    );

    run_tests(&tree, &config(), &EventBus::new()).await.unwrap();
    assert_eq!(entries(&log), vec!["first", "first"]);
}

#[tokio::test]
async fn late_settling_bodies_are_reported_once() {
    let settled = Arc::new(AtomicUsize::new(0));
    let (first, second) = (settled.clone(), settled.clone());
    let tree = SuiteTree::build("", move |s| {
        s.it_with("late", TestOptions::new().timeout_ms(20), move |_t| {
            let settled = first.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(80)).await;
                settled.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        s.it_with(
            "late-fail",
            TestOptions::new().timeout_ms(20).retry(1),
            move |_t| {
                let settled = second.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(60)).await;
                    settled.fetch_add(1, Ordering::SeqCst);
                    Err(TestError::assertion("too late to matter"))
                }
            },
        );
    });

    let (bus, events) = recording_bus();
    let summary = run_tests(&tree, &config(), &bus).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(settled.load(Ordering::SeqCst), 3);
    assert_eq!(summary.failed, 2);
    assert!(summary.failures().all(|r| r.message.as_deref().unwrap_or("").contains("Timeout")));

    let events = events.lock().unwrap();
    for title in ["late", "late-fail"] {
        let outcomes = events
            .iter()
            .filter(|e| matches!(e.kind(), EventKind::TestPass | EventKind::TestFail))
            .filter(|e| e.title() == Some(title))
            .count();
        assert_eq!(outcomes, 1, "{title}");
    }
    assert!(events.iter().all(|e| e.kind() != EventKind::TestPass));
}

#[tokio::test]
async fn after_all_runs_after_children_in_declaration_order() {
    let log = new_log();
    let entry = |log: &Log, name: &'static str| {
        let log = log.clone();
        move |_ctx: RunContext| {
            let log = log.clone();
            async move {
                push(&log, name);
                Ok(())
            }
        }
    };

    let before = entry(&log, "root-before-all");
    let (after_1, after_2) = (entry(&log, "root-after-all-1"), entry(&log, "root-after-all-2"));
    let body_log = log.clone();
    let tree = SuiteTree::build("", move |s| {
        s.before_all(before).after_all(after_1).after_all(after_2);
        s.describe("child", move |s| {
            s.it("test", move |_t| {
                let log = body_log.clone();
                async move {
                    push(&log, "child-test");
                    Ok(())
                }
            });
        });
    });

    let (bus, events) = recording_bus();
    run_tests(&tree, &config(), &bus).await.unwrap();

    assert_eq!(
        entries(&log),
        vec!["root-before-all", "child-test", "root-after-all-1", "root-after-all-2"]
    );
    let events = events.lock().unwrap();
    assert_eq!(events.last().map(RunEvent::kind), Some(EventKind::RunEnd));
}

#[tokio::test]
async fn after_all_failure_aborts_the_run() {
    let tree = SuiteTree::build("", |s| {
        s.describe("S1", |s| {
            s.after_all(|_ctx| async { Err(TestError::body("teardown")) });
            s.it("x", |_t| async { Ok(()) });
        });
        s.describe("S2", |s| {
            s.it("y", |_t| async { Ok(()) });
        });
    });

    let (bus, events) = recording_bus();
    let err = run_tests(&tree, &config(), &bus).await.unwrap_err();

    match &err {
        RunError::SuiteHook { suite, phase, .. } => {
            assert_eq!(suite, "S1");
            assert_eq!(*phase, HookPhase::AfterAll);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        err.to_string(),
        "Suite 'S1' aborted: afterAll hook failed: teardown"
    );

    let events = events.lock().unwrap();
    assert_eq!(titles_of(&events, EventKind::TestPass), vec!["x"]);
    assert!(events
        .iter()
        .all(|e| !(e.kind() == EventKind::SuiteStart && e.suite() == Some("S2"))));
    assert!(events.iter().all(|e| e.kind() != EventKind::RunEnd));
}

#[tokio::test]
async fn body_error_wins_when_after_chain_also_fails() {
    let tree = SuiteTree::build("", |s| {
        s.after_each(|_ctx| async { Err(TestError::body("cleanup failed")) });
        s.it("broken", |_t| async { Err(TestError::assertion("expected 2, got 3")) });
    });

    let (bus, events) = recording_bus();
    let summary = run_tests(&tree, &config(), &bus).await.unwrap();

    assert_eq!(summary.failed, 1);
    let events = events.lock().unwrap();
    let error = events
        .iter()
        .find_map(|e| match e {
            RunEvent::TestFail { error, .. } => Some(error.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(error, TestError::assertion("expected 2, got 3"));
}
