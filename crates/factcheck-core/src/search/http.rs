//! HTTP client for a fact-check search service.
//!
//! Two request styles are supported, matching the two service front ends the
//! extension has talked to:
//!
//! - `GET {endpoint}?q=<query>&k=<limit>` (API gateway)
//! - `POST {endpoint}` with body `{"query": "...", "k": <limit>}`

use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{SearchBackend, SearchError, WireRecord, parse_response};

/// How the query is sent to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestMethod {
    Get,
    Post,
}

impl FromStr for RequestMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "get" => Ok(RequestMethod::Get),
            "post" => Ok(RequestMethod::Post),
            other => Err(format!("unknown request method: {other} (expected get or post)")),
        }
    }
}

impl std::fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestMethod::Get => f.write_str("get"),
            RequestMethod::Post => f.write_str("post"),
        }
    }
}

/// Fact-check service reachable over HTTP.
pub struct HttpSearch {
    pub endpoint: String,
    pub method: RequestMethod,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpSearch {
    pub fn new(
        endpoint: String,
        method: RequestMethod,
        timeout: Duration,
    ) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("factcheck/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SearchError::Client(e.to_string()))?;
        Ok(Self {
            endpoint,
            method,
            timeout,
            client,
        })
    }

    /// URL of the service's health check: the endpoint's origin plus `/health`.
    pub fn health_url(&self) -> Result<reqwest::Url, String> {
        let mut url = reqwest::Url::parse(&self.endpoint)
            .map_err(|e| format!("invalid endpoint {}: {}", self.endpoint, e))?;
        url.set_path("/health");
        url.set_query(None);
        Ok(url)
    }

    /// Check if the service is reachable. Returns Ok(()) if reachable, Err with message otherwise.
    pub async fn check_connectivity(&self) -> Result<(), String> {
        let url = self.health_url()?;

        match self
            .client
            .get(url)
            .timeout(Duration::from_secs(3))
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => Ok(()),
            Ok(resp) => Err(format!("Service returned HTTP {}", resp.status())),
            Err(e) if e.is_connect() => Err(format!(
                "Cannot connect to fact-check service at {} - is it running?",
                self.endpoint
            )),
            Err(e) if e.is_timeout() => Err(format!(
                "Fact-check service at {} timed out",
                self.endpoint
            )),
            Err(e) => Err(format!("Fact-check service error: {}", e)),
        }
    }
}

impl SearchBackend for HttpSearch {
    fn name(&self) -> &str {
        "HTTP"
    }

    fn fetch_results<'a>(
        &'a self,
        query: &'a str,
        limit: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<WireRecord>, SearchError>> + Send + 'a>> {
        Box::pin(async move {
            let request = match self.method {
                RequestMethod::Get => self
                    .client
                    .get(&self.endpoint)
                    .query(&[("q", query.to_string()), ("k", limit.to_string())]),
                RequestMethod::Post => self
                    .client
                    .post(&self.endpoint)
                    .json(&serde_json::json!({ "query": query, "k": limit })),
            };

            let resp = request
                .timeout(self.timeout)
                .send()
                .await
                .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

            let status = resp.status();
            if !status.is_success() {
                return Err(SearchError::RequestFailed(format!("HTTP {}", status)));
            }

            let body = resp
                .text()
                .await
                .map_err(|e| SearchError::RequestFailed(e.to_string()))?;
            parse_response(&body)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("GET".parse::<RequestMethod>().unwrap(), RequestMethod::Get);
        assert_eq!(" post ".parse::<RequestMethod>().unwrap(), RequestMethod::Post);
        assert!("put".parse::<RequestMethod>().is_err());
    }

    #[test]
    fn health_url_replaces_path_and_query() {
        let search = HttpSearch::new(
            "http://localhost:8080/api/search?x=1".into(),
            RequestMethod::Get,
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            search.health_url().unwrap().as_str(),
            "http://localhost:8080/health"
        );
    }

    #[test]
    fn client_builds_for_a_plain_configuration() {
        let search = HttpSearch::new(
            "https://factcheck.example/api/search".into(),
            RequestMethod::Post,
            Duration::from_secs(10),
        );
        assert!(search.is_ok());
    }

    #[test]
    fn health_url_rejects_garbage_endpoint() {
        let search =
            HttpSearch::new("not a url".into(), RequestMethod::Get, Duration::from_secs(1)).unwrap();
        assert!(search.health_url().is_err());
    }
}
