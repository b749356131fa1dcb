//! End-to-end properties of the coordinator's state machine.
//!
//! Tests run with a paused Tokio clock so that scripted per-query delays in
//! [`MockSearch`] decide completion order deterministically.

use std::sync::Arc;
use std::time::Duration;

use factcheck_core::search::{MockResponse, MockSearch};
use factcheck_core::store::{MemoryStore, SqliteStore, StateStore};
use factcheck_core::{
    AccumulatedState, Badge, Coordinator, CoordinatorEvent, RecordingSink, ViewModel,
};
use tokio::sync::broadcast::error::TryRecvError;

fn ms(n: u64) -> Option<Duration> {
    Some(Duration::from_millis(n))
}

fn build(store: Arc<dyn StateStore>, backend: MockSearch) -> (Coordinator, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let coordinator = Coordinator::new(store, Arc::new(backend), sink.clone(), sink.clone(), 5);
    (coordinator, sink)
}

fn statements(state: &AccumulatedState) -> Vec<&str> {
    state.results.iter().map(|r| r.statement.as_str()).collect()
}

#[tokio::test(start_paused = true)]
async fn completion_order_decides_result_order() {
    let backend = MockSearch::new(MockResponse::Records(vec![]))
        .respond("A", MockResponse::statements(&["a1", "a2"]), ms(10))
        .respond("B", MockResponse::statements(&["b1"]), ms(20));
    let (coordinator, sink) = build(Arc::new(MemoryStore::default()), backend);

    let a = coordinator.submit_query("A").unwrap();
    let b = coordinator.submit_query("B").unwrap();
    assert_eq!(coordinator.state().unwrap().pending_checks, 2);

    a.await.unwrap();
    let mid = coordinator.state().unwrap();
    assert_eq!(mid.pending_checks, 1);
    assert_eq!(statements(&mid), vec!["a1", "a2"]);
    assert_eq!(sink.last_badge(), Some(Badge::Pending));

    b.await.unwrap();
    let state = coordinator.state().unwrap();
    assert_eq!(state.pending_checks, 0);
    assert_eq!(statements(&state), vec!["b1", "a1", "a2"]);
    assert_eq!(sink.last_badge(), Some(Badge::Count(3)));
}

#[tokio::test(start_paused = true)]
async fn later_submission_completing_first_lands_behind() {
    let backend = MockSearch::new(MockResponse::Records(vec![]))
        .respond("A", MockResponse::statements(&["a1", "a2"]), ms(30))
        .respond("B", MockResponse::statements(&["b1"]), ms(5));
    let (coordinator, _) = build(Arc::new(MemoryStore::default()), backend);

    let a = coordinator.submit_query("A").unwrap();
    let b = coordinator.submit_query("B").unwrap();
    b.await.unwrap();
    a.await.unwrap();

    let state = coordinator.state().unwrap();
    assert_eq!(state.pending_checks, 0);
    assert_eq!(statements(&state), vec!["a1", "a2", "b1"]);
}

#[tokio::test(start_paused = true)]
async fn interleaved_mixed_outcomes_drain_pending_to_zero() {
    let plan: [(&str, u64, bool); 6] = [
        ("q0", 30, true),
        ("q1", 10, false),
        ("q2", 50, true),
        ("q3", 20, true),
        ("q4", 40, false),
        ("q5", 0, true),
    ];
    let mut backend = MockSearch::new(MockResponse::Records(vec![]));
    for (query, delay, ok) in plan {
        let response = if ok {
            MockResponse::statements(&[query])
        } else {
            MockResponse::Failed("HTTP 502".into())
        };
        backend = backend.respond(query, response, ms(delay));
    }
    let (coordinator, sink) = build(Arc::new(MemoryStore::default()), backend);

    let handles: Vec<_> = plan
        .iter()
        .map(|(query, _, _)| coordinator.submit_query(query).unwrap())
        .collect();
    assert_eq!(coordinator.state().unwrap().pending_checks, 6);

    for handle in handles {
        handle.await.unwrap();
    }

    let state = coordinator.state().unwrap();
    assert_eq!(state.pending_checks, 0);
    // Successful queries, most recently completed first.
    assert_eq!(statements(&state), vec!["q2", "q0", "q3", "q5"]);
    assert_eq!(sink.notifications().len(), 6);
    assert_eq!(sink.last_badge(), Some(Badge::Count(4)));
}

#[tokio::test]
async fn failure_leaves_existing_results_untouched() {
    let backend = MockSearch::new(MockResponse::Failed("connection refused".into()))
        .respond("good", MockResponse::statements(&["kept"]), None);
    let (coordinator, sink) = build(Arc::new(MemoryStore::default()), backend);

    coordinator.submit_query("good").unwrap().await.unwrap();
    let before = coordinator.state().unwrap();

    coordinator.submit_query("bad").unwrap().await.unwrap();
    let after = coordinator.state().unwrap();
    assert_eq!(after.results, before.results);
    assert_eq!(after.pending_checks, 0);
    assert_eq!(sink.last_badge(), Some(Badge::Error));
}

#[tokio::test(start_paused = true)]
async fn failure_while_others_pending_keeps_pending_badge() {
    let backend = MockSearch::new(MockResponse::Records(vec![]))
        .respond("slow", MockResponse::statements(&["s"]), ms(100))
        .respond("broken", MockResponse::Malformed("expected array".into()), ms(1));
    let (coordinator, sink) = build(Arc::new(MemoryStore::default()), backend);

    let slow = coordinator.submit_query("slow").unwrap();
    coordinator.submit_query("broken").unwrap().await.unwrap();
    assert_eq!(coordinator.state().unwrap().pending_checks, 1);
    assert_eq!(sink.last_badge(), Some(Badge::Pending));

    slow.await.unwrap();
    assert_eq!(sink.last_badge(), Some(Badge::Count(1)));
}

#[tokio::test]
async fn decrement_is_floored_at_zero_after_clear() {
    let backend = MockSearch::new(MockResponse::Failed("timeout".into()));
    let (coordinator, _) = build(Arc::new(MemoryStore::default()), backend);

    let handle = coordinator.submit_query("claim").unwrap();
    coordinator.clear_all().unwrap();
    handle.await.unwrap();
    assert_eq!(coordinator.state().unwrap(), AccumulatedState::default());
}

#[tokio::test]
async fn clear_all_resets_regardless_of_prior_state() {
    let store = Arc::new(MemoryStore::new(AccumulatedState {
        results: vec![],
        pending_checks: 7,
    }));
    let backend = MockSearch::new(MockResponse::statements(&["x", "y"]));
    let (coordinator, sink) = build(store, backend);
    coordinator.submit_query("claim").unwrap().await.unwrap();

    let mut events = coordinator.subscribe();
    coordinator.clear_all().unwrap();
    assert_eq!(coordinator.state().unwrap(), AccumulatedState::default());
    assert_eq!(sink.last_badge(), Some(Badge::Empty));
    assert_eq!(events.try_recv().unwrap(), CoordinatorEvent::ResultsCleared);
}

#[tokio::test(start_paused = true)]
async fn reopened_view_matches_live_view() {
    let backend = MockSearch::new(MockResponse::Records(vec![]))
        .respond("A", MockResponse::statements(&["a1", "a2"]), ms(10))
        .respond("B", MockResponse::statements(&["b1"]), ms(20))
        .respond("C", MockResponse::Failed("HTTP 500".into()), ms(15));
    let (coordinator, _) = build(Arc::new(MemoryStore::default()), backend);

    let mut live = ViewModel::open(coordinator.state().unwrap());
    let mut events = coordinator.subscribe();

    let handles = vec![
        coordinator.submit_query("A").unwrap(),
        coordinator.submit_query("B").unwrap(),
        coordinator.submit_query("C").unwrap(),
    ];
    for handle in handles {
        handle.await.unwrap();
    }

    loop {
        match events.try_recv() {
            Ok(event) => live.apply(&event),
            Err(TryRecvError::Empty) => break,
            Err(e) => panic!("unexpected receive error: {e:?}"),
        }
    }
    assert!(live.has_update());

    let reopened = ViewModel::open(coordinator.state().unwrap());
    assert_eq!(reopened.results(), live.results());
    assert_eq!(reopened.pending_checks(), live.pending_checks());
    assert_eq!(reopened.pending_checks(), 0);
    assert_eq!(reopened.results().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn submit_broadcasts_pending_state() {
    let backend = MockSearch::new(MockResponse::statements(&["r"]));
    let (coordinator, _) = build(Arc::new(MemoryStore::default()), backend);
    let mut events = coordinator.subscribe();

    let handle = coordinator.submit_query("claim").unwrap();
    match events.recv().await.unwrap() {
        CoordinatorEvent::ResultsUpdated { pending_checks, .. } => assert_eq!(pending_checks, 1),
        other => panic!("expected update, got {other:?}"),
    }
    handle.await.unwrap();
    match events.recv().await.unwrap() {
        CoordinatorEvent::ResultsUpdated {
            results,
            pending_checks,
        } => {
            assert_eq!(pending_checks, 0);
            assert_eq!(results.len(), 1);
            assert_eq!(results[0].original_query, "claim");
        }
        other => panic!("expected update, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn sqlite_store_accumulates_concurrent_completions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.db");
    let backend = MockSearch::new(MockResponse::Records(vec![]))
        .respond("A", MockResponse::statements(&["a1", "a2"]), ms(10))
        .respond("B", MockResponse::statements(&["b1"]), ms(20));
    let (coordinator, _) = build(Arc::new(SqliteStore::open(&path).unwrap()), backend);

    let a = coordinator.submit_query("A").unwrap();
    let b = coordinator.submit_query("B").unwrap();
    a.await.unwrap();
    b.await.unwrap();

    // A fresh process sees the same state.
    let reopened = SqliteStore::open(&path).unwrap().load().unwrap();
    assert_eq!(reopened.pending_checks, 0);
    assert_eq!(statements(&reopened), vec!["b1", "a1", "a2"]);
}

#[tokio::test(start_paused = true)]
async fn two_coordinators_sharing_a_file_do_not_lose_updates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.db");

    let first = MockSearch::new(MockResponse::Records(vec![]))
        .respond("A", MockResponse::statements(&["a"]), ms(10));
    let second = MockSearch::new(MockResponse::Records(vec![]))
        .respond("B", MockResponse::statements(&["b"]), ms(5));
    let (c1, _) = build(Arc::new(SqliteStore::open(&path).unwrap()), first);
    let (c2, _) = build(Arc::new(SqliteStore::open(&path).unwrap()), second);

    let a = c1.submit_query("A").unwrap();
    let b = c2.submit_query("B").unwrap();
    assert_eq!(c1.state().unwrap().pending_checks, 2);
    b.await.unwrap();
    a.await.unwrap();

    let state = c2.state().unwrap();
    assert_eq!(state.pending_checks, 0);
    assert_eq!(statements(&state), vec!["a", "b"]);
}

#[test]
fn runtime_dropped_mid_flight_leaves_no_stale_pending_count() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.db");
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    let backend = MockSearch::new(MockResponse::Records(vec![])).respond(
        "slow",
        MockResponse::statements(&["never"]),
        Some(Duration::from_secs(60)),
    );
    let (coordinator, _) = build(Arc::new(SqliteStore::open(&path).unwrap()), backend);

    rt.block_on(async {
        coordinator.submit_query("slow").unwrap();
        tokio::task::yield_now().await;
    });
    assert_eq!(coordinator.state().unwrap().pending_checks, 1);

    // What the binaries do on quit or Ctrl+C, before the runtime goes away.
    assert_eq!(coordinator.shutdown().unwrap(), 1);
    rt.shutdown_timeout(Duration::from_millis(100));
    drop(coordinator);

    let reopened = SqliteStore::open(&path).unwrap();
    let state = reopened.load().unwrap();
    assert_eq!(state.pending_checks, 0);
    assert!(state.results.is_empty());
}

#[tokio::test(start_paused = true)]
async fn shutdown_only_releases_its_own_checks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.db");

    let backend_a = MockSearch::new(MockResponse::Records(vec![]))
        .respond("A", MockResponse::statements(&["a1"]), ms(30));
    let backend_b = MockSearch::new(MockResponse::Records(vec![]))
        .respond("B", MockResponse::statements(&["b1"]), ms(50));
    let (first, _) = build(Arc::new(SqliteStore::open(&path).unwrap()), backend_a);
    let (second, _) = build(Arc::new(SqliteStore::open(&path).unwrap()), backend_b);

    let a = first.submit_query("A").unwrap();
    let b = second.submit_query("B").unwrap();
    assert_eq!(first.state().unwrap().pending_checks, 2);

    assert_eq!(first.shutdown().unwrap(), 1);
    assert_eq!(first.in_flight(), 0);
    assert_eq!(second.in_flight(), 1);
    assert_eq!(second.state().unwrap().pending_checks, 1);

    // A finishes after its release: results kept, no second decrement.
    a.await.unwrap();
    let mid = second.state().unwrap();
    assert_eq!(mid.pending_checks, 1);
    assert_eq!(statements(&mid), vec!["a1"]);

    b.await.unwrap();
    let state = second.state().unwrap();
    assert_eq!(state.pending_checks, 0);
    assert_eq!(statements(&state), vec!["b1", "a1"]);
}
