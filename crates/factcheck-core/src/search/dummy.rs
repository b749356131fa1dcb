//! Built-in demo service used until a real backend is configured.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use super::{SearchBackend, SearchError, WireRecord};

/// Simulates service latency and returns three canned verdicts derived from
/// the query text.
pub struct DummySearch {
    delay: Duration,
}

impl DummySearch {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

fn prefix(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// The canned response for `query`.
pub fn canned_records(query: &str) -> Vec<WireRecord> {
    let mut statement = prefix(query, 100);
    if query.chars().count() > 100 {
        statement.push_str("...");
    }

    vec![
        WireRecord {
            statement,
            verdict: "True".into(),
            factchecker: "PolitiFact".into(),
            statement_originator: "Public Figure".into(),
            statement_date: "2024-01-15".into(),
            factcheck_analysis_link: "https://www.politifact.com/factchecks/2024/jan/15/example/"
                .into(),
            ..Default::default()
        },
        WireRecord {
            statement: format!("Related claim about {}", prefix(query, 50)),
            verdict: "False".into(),
            factchecker: "Snopes".into(),
            statement_originator: "Social Media".into(),
            statement_date: "2024-01-10".into(),
            factcheck_analysis_link: "https://www.snopes.com/fact-check/example/".into(),
            ..Default::default()
        },
        WireRecord {
            statement: format!("Another related statement regarding {}", prefix(query, 40)),
            verdict: "Mixed".into(),
            factchecker: "FactCheck.org".into(),
            statement_originator: "News Article".into(),
            statement_date: "2024-01-05".into(),
            factcheck_analysis_link: "https://www.factcheck.org/2024/01/example/".into(),
            ..Default::default()
        },
    ]
}

impl SearchBackend for DummySearch {
    fn name(&self) -> &str {
        "Dummy"
    }

    fn fetch_results<'a>(
        &'a self,
        query: &'a str,
        limit: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<WireRecord>, SearchError>> + Send + 'a>> {
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            let mut records = canned_records(query);
            records.truncate(limit as usize);
            Ok(records)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_query_is_shortened_with_ellipsis() {
        let query = "x".repeat(150);
        let records = canned_records(&query);
        assert_eq!(records[0].statement.len(), 103);
        assert!(records[0].statement.ends_with("..."));
        assert_eq!(
            records[1].statement,
            format!("Related claim about {}", "x".repeat(50))
        );
    }

    #[test]
    fn short_query_is_kept_whole() {
        let records = canned_records("The moon is made of cheese");
        assert_eq!(records[0].statement, "The moon is made of cheese");
        let verdicts: Vec<_> = records.iter().map(|r| r.verdict.as_str()).collect();
        assert_eq!(verdicts, vec!["True", "False", "Mixed"]);
    }

    #[tokio::test(start_paused = true)]
    async fn respects_limit_after_delay() {
        let search = DummySearch::new(Duration::from_secs(2));
        let records = search.fetch_results("claim", 2).await.unwrap();
        assert_eq!(records.len(), 2);
    }
}
