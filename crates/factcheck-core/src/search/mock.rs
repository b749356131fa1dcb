//! Scripted search backend for tests.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{SearchBackend, SearchError, WireRecord};

/// A configurable mock response for [`MockSearch`].
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Simulate a successful response with these records.
    Records(Vec<WireRecord>),
    /// Simulate a network error or non-2xx status.
    Failed(String),
    /// Simulate a body in an unexpected shape.
    Malformed(String),
}

impl MockResponse {
    /// A successful response with one record per statement.
    pub fn statements(statements: &[&str]) -> Self {
        MockResponse::Records(
            statements
                .iter()
                .map(|s| WireRecord {
                    statement: s.to_string(),
                    verdict: "True".into(),
                    ..Default::default()
                })
                .collect(),
        )
    }
}

#[derive(Clone, Debug)]
struct Script {
    response: MockResponse,
    delay: Option<Duration>,
}

/// A hand-rolled mock implementing [`SearchBackend`] for tests.
///
/// Supports:
/// - A response per query text, with a fallback for unscripted queries.
/// - Optional per-query latency, so tests can choose completion order.
/// - Call counting via [`call_count()`](MockSearch::call_count).
pub struct MockSearch {
    scripts: Mutex<HashMap<String, Script>>,
    fallback: MockResponse,
    call_count: AtomicUsize,
}

impl MockSearch {
    /// Create a mock that returns `fallback` for any unscripted query.
    pub fn new(fallback: MockResponse) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            fallback,
            call_count: AtomicUsize::new(0),
        }
    }

    /// Script the response for `query`, delivered after `delay`.
    pub fn respond(self, query: &str, response: MockResponse, delay: Option<Duration>) -> Self {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.insert(query.to_string(), Script { response, delay });
        }
        self
    }

    /// How many times `fetch_results()` has been called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn script_for(&self, query: &str) -> Script {
        self.scripts
            .lock()
            .ok()
            .and_then(|scripts| scripts.get(query).cloned())
            .unwrap_or_else(|| Script {
                response: self.fallback.clone(),
                delay: None,
            })
    }
}

impl SearchBackend for MockSearch {
    fn name(&self) -> &str {
        "Mock"
    }

    fn fetch_results<'a>(
        &'a self,
        query: &'a str,
        _limit: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<WireRecord>, SearchError>> + Send + 'a>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let script = self.script_for(query);

        Box::pin(async move {
            if let Some(d) = script.delay {
                tokio::time::sleep(d).await;
            }

            match script.response {
                MockResponse::Records(records) => Ok(records),
                MockResponse::Failed(msg) => Err(SearchError::RequestFailed(msg)),
                MockResponse::Malformed(msg) => Err(SearchError::MalformedResponse(msg)),
            }
        })
    }
}
