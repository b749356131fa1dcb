//! The coordinator: sole writer of the accumulated state, sole issuer of
//! fact-check requests and sole owner of the badge projection.
//!
//! `submit_query` bumps the pending count and returns as soon as the request
//! task is spawned. Each completion then performs its own read-modify-write
//! against the store, so completions may land in any order without losing
//! each other's updates. Results are prepended in completion order.
//!
//! Every increment is matched by exactly one decrement: the request task
//! converts both success and failure into a completion, and failures never
//! propagate past it. A coordinator that stops with requests still running
//! releases them through [`Coordinator::shutdown`]; a completion that lands
//! afterwards keeps its results but does not decrement a second time.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::badge::{Badge, BadgeSink};
use crate::message::{Command, CommandAck, CoordinatorEvent};
use crate::notify::{Notification, Notifier};
use crate::search::{SearchBackend, SearchError, WireRecord};
use crate::store::StateStore;
use crate::{AccumulatedState, CoreError, FactCheckRecord};

/// Capacity of the event channel. Slow views that lag behind re-read state.
const EVENT_CAPACITY: usize = 64;

struct Inner {
    store: Arc<dyn StateStore>,
    backend: Arc<dyn SearchBackend>,
    badge: Arc<dyn BadgeSink>,
    notifier: Arc<dyn Notifier>,
    events: broadcast::Sender<CoordinatorEvent>,
    result_limit: u32,
    /// Checks this coordinator has counted into `pending_checks` and not yet
    /// released. Other processes sharing the store keep their own count.
    in_flight: AtomicU32,
}

/// Cheap to clone; clones share the same state and event channel.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("backend", &self.inner.backend.name())
            .field("result_limit", &self.inner.result_limit)
            .field("in_flight", &self.in_flight())
            .field("subscribers", &self.inner.events.receiver_count())
            .finish()
    }
}

impl Coordinator {
    pub fn new(
        store: Arc<dyn StateStore>,
        backend: Arc<dyn SearchBackend>,
        badge: Arc<dyn BadgeSink>,
        notifier: Arc<dyn Notifier>,
        result_limit: u32,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                store,
                backend,
                badge,
                notifier,
                events,
                result_limit,
                in_flight: AtomicU32::new(0),
            }),
        }
    }

    pub fn backend_name(&self) -> &str {
        self.inner.backend.name()
    }

    /// Current state, for views that were not listening to earlier broadcasts.
    pub fn state(&self) -> Result<AccumulatedState, CoreError> {
        Ok(self.inner.store.load()?)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.inner.events.subscribe()
    }

    /// Requests submitted through this coordinator that have not completed.
    pub fn in_flight(&self) -> u32 {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Start checking `query`.
    ///
    /// Must be called inside a Tokio runtime. The returned handle resolves
    /// once the request has completed and state has been written; dropping
    /// it does not cancel the request.
    pub fn submit_query(&self, query: &str) -> Result<JoinHandle<()>, CoreError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CoreError::EmptyQuery);
        }

        let state = self.inner.store.read_modify_write(&mut |s| s.begin_check())?;
        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(query, pending = state.pending_checks, "fact check submitted");
        self.inner.badge.set_badge(Badge::Pending);
        self.inner.publish(CoordinatorEvent::updated(&state));

        let inner = Arc::clone(&self.inner);
        let query = query.to_string();
        Ok(tokio::spawn(async move {
            inner.run_check(query).await;
        }))
    }

    /// Drop all results and reset the pending count.
    pub fn clear_all(&self) -> Result<(), CoreError> {
        self.inner.store.read_modify_write(&mut |s| s.clear())?;
        tracing::debug!("results cleared");
        self.inner.badge.set_badge(Badge::Empty);
        self.inner.publish(CoordinatorEvent::ResultsCleared);
        Ok(())
    }

    /// Release every check this coordinator still has in flight.
    ///
    /// Call before the process exits: requests that never complete would
    /// otherwise leave `pending_checks` stuck above zero in a persistent
    /// store. Returns how many checks were released. Requests still running
    /// are not cancelled; if one completes later its results are kept.
    pub fn shutdown(&self) -> Result<u32, CoreError> {
        let released = self.inner.in_flight.swap(0, Ordering::SeqCst);
        if released == 0 {
            return Ok(0);
        }

        let written = self.inner.store.read_modify_write(&mut |s| {
            for _ in 0..released {
                s.finish_check();
            }
        });
        let state = match written {
            Ok(state) => state,
            Err(e) => {
                // Put the count back so a retry still has something to release.
                self.inner.in_flight.fetch_add(released, Ordering::SeqCst);
                return Err(e.into());
            }
        };

        tracing::info!(
            released,
            pending = state.pending_checks,
            "released unfinished checks"
        );
        self.inner.badge.set_badge(Badge::project(&state));
        self.inner.publish(CoordinatorEvent::updated(&state));
        Ok(released)
    }

    /// Command interface used by views. The acknowledgement only reports
    /// whether the command was accepted; its effect is asynchronous.
    pub fn handle_command(&self, command: Command) -> CommandAck {
        let result = match command {
            Command::CheckFact { query } => self.submit_query(&query).map(|_| ()),
            Command::ClearResults => self.clear_all(),
        };
        if let Err(e) = &result {
            tracing::warn!(error = %e, "command rejected");
        }
        CommandAck {
            success: result.is_ok(),
        }
    }
}

impl Inner {
    fn publish(&self, event: CoordinatorEvent) {
        // No subscribers is fine: views re-read state when they open.
        let _ = self.events.send(event);
    }

    /// Claim one of this coordinator's in-flight checks. False once
    /// `shutdown` has already released it.
    fn claim_completion(&self) -> bool {
        self.in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    async fn run_check(&self, query: String) {
        let outcome = self
            .backend
            .fetch_results(&query, self.result_limit)
            .await;
        match outcome {
            Ok(records) => self.complete_success(&query, records),
            Err(e) => self.complete_failure(&query, e),
        }
    }

    fn complete_success(&self, query: &str, wire: Vec<WireRecord>) {
        let checked_at = Utc::now();
        let records: Vec<FactCheckRecord> = wire
            .into_iter()
            .map(|w| FactCheckRecord::from_wire(w, query, checked_at))
            .collect();
        let count = records.len();

        let release = self.claim_completion();
        let mut batch = Some(records);
        let written = self.store.read_modify_write(&mut |s| {
            if let Some(batch) = batch.take() {
                s.prepend_batch(batch);
            }
            if release {
                s.finish_check();
            }
        });

        let state = match written {
            Ok(state) => state,
            Err(e) => {
                tracing::error!(query, error = %e, "failed to store fact check results");
                self.notifier.notify(Notification::failed(query));
                return;
            }
        };

        tracing::info!(
            query,
            count,
            pending = state.pending_checks,
            backend = self.backend.name(),
            "fact check complete"
        );
        self.badge.set_badge(Badge::project(&state));
        self.publish(CoordinatorEvent::updated(&state));
        self.notifier.notify(Notification::completed(count));
    }

    fn complete_failure(&self, query: &str, error: SearchError) {
        tracing::warn!(query, error = %error, backend = self.backend.name(), "fact check failed");

        let release = self.claim_completion();
        let written = self.store.read_modify_write(&mut |s| {
            if release {
                s.finish_check();
            }
        });
        let state = match written {
            Ok(state) => state,
            Err(e) => {
                tracing::error!(query, error = %e, "failed to release pending check");
                self.notifier.notify(Notification::failed(query));
                return;
            }
        };

        let badge = if state.is_pending() {
            Badge::Pending
        } else {
            Badge::Error
        };
        self.badge.set_badge(badge);
        self.publish(CoordinatorEvent::updated(&state));
        self.notifier.notify(Notification::failed(query));
    }
}
