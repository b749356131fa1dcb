use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod badge;
pub mod config_file;
pub mod coordinator;
pub mod message;
pub mod notify;
pub mod search;
pub mod store;
pub mod view;

// Re-export for convenience
pub use badge::{Badge, BadgeSink};
pub use coordinator::Coordinator;
pub use message::{Command, CommandAck, CoordinatorEvent};
pub use notify::{Notification, NotificationKind, Notifier, RecordingSink, TracingSink};
pub use search::{RequestMethod, SearchBackend, SearchError, WireRecord, build_backend};
pub use store::{MemoryStore, SqliteStore, StateStore, StoreError};
pub use view::{ViewError, ViewModel, ViewStatus};

/// Default fact-check service endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/api/search";

/// Default number of records requested per query (`k`).
pub const DEFAULT_RESULT_LIMIT: u32 = 5;

/// The verdict attached to a fact-check record.
///
/// Open set: unknown verdict strings from the service are kept verbatim in
/// [`Verdict::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Verdict {
    True,
    False,
    Mixed,
    Unverified,
    Other(String),
}

impl Verdict {
    pub fn as_str(&self) -> &str {
        match self {
            Verdict::True => "True",
            Verdict::False => "False",
            Verdict::Mixed => "Mixed",
            Verdict::Unverified => "Unverified",
            Verdict::Other(s) => s,
        }
    }
}

impl From<String> for Verdict {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "true" => Verdict::True,
            "false" => Verdict::False,
            "mixed" => Verdict::Mixed,
            "unverified" | "" => Verdict::Unverified,
            _ => Verdict::Other(s),
        }
    }
}

impl From<&str> for Verdict {
    fn from(s: &str) -> Self {
        Verdict::from(s.to_string())
    }
}

impl From<Verdict> for String {
    fn from(v: Verdict) -> Self {
        v.as_str().to_string()
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One verdict returned for a submitted query.
///
/// Records are immutable once created: they are only ever prepended to the
/// accumulated list as a batch or cleared with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactCheckRecord {
    pub statement: String,
    pub verdict: Verdict,
    pub factchecker: String,
    pub statement_originator: String,
    pub statement_date: String,
    pub analysis_link: String,
    /// The query that produced this record.
    pub original_query: String,
    pub checked_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factcheck_date: Option<String>,
}

impl FactCheckRecord {
    /// Stamp a service row with the query that produced it and the check time.
    pub fn from_wire(wire: WireRecord, query: &str, checked_at: DateTime<Utc>) -> Self {
        Self {
            statement: wire.statement,
            verdict: Verdict::from(wire.verdict),
            factchecker: wire.factchecker,
            statement_originator: wire.statement_originator,
            statement_date: wire.statement_date,
            analysis_link: wire.factcheck_analysis_link,
            original_query: query.to_string(),
            checked_at,
            uid: wire.uid,
            statement_source: wire.statement_source,
            factcheck_date: wire.factcheck_date,
        }
    }
}

/// Process-wide accumulated state: results newest-batch-first plus the number
/// of requests still in flight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccumulatedState {
    pub results: Vec<FactCheckRecord>,
    pub pending_checks: u32,
}

impl AccumulatedState {
    pub fn begin_check(&mut self) {
        self.pending_checks = self.pending_checks.saturating_add(1);
    }

    /// Decrement the pending count, floored at zero.
    pub fn finish_check(&mut self) {
        self.pending_checks = self.pending_checks.saturating_sub(1);
    }

    /// Put a batch in front of all existing results, keeping its own order.
    pub fn prepend_batch(&mut self, batch: Vec<FactCheckRecord>) {
        if batch.is_empty() {
            return;
        }
        let older = std::mem::take(&mut self.results);
        self.results = batch;
        self.results.extend(older);
    }

    pub fn clear(&mut self) {
        self.results.clear();
        self.pending_checks = 0;
    }

    pub fn is_pending(&self) -> bool {
        self.pending_checks > 0
    }
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("query is empty")]
    EmptyQuery,
    #[error("state store error: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Resolved configuration for the coordinator and its search backend.
#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: String,
    pub method: RequestMethod,
    pub result_limit: u32,
    pub timeout_secs: u64,
    /// Use the built-in demo service instead of `endpoint`.
    pub use_dummy_api: bool,
    pub dummy_delay_ms: u64,
    /// Path to the persistent SQLite state. `None` keeps state in memory.
    pub state_path: Option<PathBuf>,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn dummy_delay(&self) -> Duration {
        Duration::from_millis(self.dummy_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            method: RequestMethod::Post,
            result_limit: DEFAULT_RESULT_LIMIT,
            timeout_secs: 10,
            use_dummy_api: true,
            dummy_delay_ms: 2000,
            state_path: None,
        }
    }
}

/// Build a [`StateStore`] from configuration.
///
/// With a `state_path`, opens the persistent SQLite store, creating parent
/// directories, and returns any failure to the caller. Without a path the
/// state lives in memory for this process only.
pub fn build_store(state_path: Option<&Path>) -> Result<Arc<dyn StateStore>, StoreError> {
    let Some(path) = state_path else {
        tracing::debug!("using in-memory state");
        return Ok(Arc::new(MemoryStore::default()));
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let store = SqliteStore::open(path).inspect_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "failed to open state");
    })?;
    tracing::info!(path = %path.display(), "opened persistent state");
    Ok(Arc::new(store))
}
