//! Search backend trait and implementations for querying the fact-check service.

pub mod dummy;
pub mod http;
pub mod mock;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::Config;

pub use dummy::DummySearch;
pub use http::{HttpSearch, RequestMethod};
pub use mock::{MockResponse, MockSearch};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Network error, timeout or non-2xx status.
    #[error("request failed: {0}")]
    RequestFailed(String),
    /// Body was not one of the accepted response shapes.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// One row as returned by the fact-check service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WireRecord {
    pub statement: String,
    #[serde(default)]
    pub verdict: String,
    #[serde(default)]
    pub factchecker: String,
    #[serde(default)]
    pub statement_originator: String,
    #[serde(default)]
    pub statement_date: String,
    #[serde(default)]
    pub factcheck_analysis_link: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub statement_source: Option<String>,
    #[serde(default)]
    pub factcheck_date: Option<String>,
}

/// Parse a service response body.
///
/// Accepted shapes: a bare JSON array of records, or an object whose
/// `results` or `data` field holds that array.
pub fn parse_response(body: &str) -> Result<Vec<WireRecord>, SearchError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| SearchError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut obj) => {
            match ["results", "data"]
                .iter()
                .find_map(|field| match obj.remove(*field) {
                    Some(serde_json::Value::Array(items)) => Some(items),
                    _ => None,
                }) {
                Some(items) => items,
                None => {
                    return Err(SearchError::MalformedResponse(
                        "object has no results array".into(),
                    ));
                }
            }
        }
        other => {
            return Err(SearchError::MalformedResponse(format!(
                "expected array, got {}",
                json_kind(&other)
            )));
        }
    };

    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item)
                .map_err(|e| SearchError::MalformedResponse(format!("bad record: {}", e)))
        })
        .collect()
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// A fact-check service that returns records for a query.
pub trait SearchBackend: Send + Sync {
    /// Display name used in logs (e.g., "HTTP", "Dummy").
    fn name(&self) -> &str;

    /// Fetch up to `limit` records matching `query`.
    fn fetch_results<'a>(
        &'a self,
        query: &'a str,
        limit: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<WireRecord>, SearchError>> + Send + 'a>>;
}

/// Select the backend for this configuration.
pub fn build_backend(config: &Config) -> Result<Arc<dyn SearchBackend>, SearchError> {
    if config.use_dummy_api {
        return Ok(Arc::new(DummySearch::new(config.dummy_delay())));
    }
    Ok(Arc::new(HttpSearch::new(
        config.endpoint.clone(),
        config.method,
        config.timeout(),
    )?))
}
