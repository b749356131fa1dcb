use std::io::Write;

use factcheck_core::notify::truncate_query;
use factcheck_core::{
    AccumulatedState, Badge, BadgeSink, Config, FactCheckRecord, Notification, NotificationKind,
    Notifier, Verdict,
};
use indicatif::ProgressBar;
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn verdict_label(verdict: &Verdict, color: ColorMode) -> String {
    let text = format!("Verdict: {}", verdict);
    if !color.enabled() {
        return text;
    }
    match verdict {
        Verdict::True => text.green().to_string(),
        Verdict::False => text.red().to_string(),
        Verdict::Mixed => text.yellow().to_string(),
        Verdict::Unverified | Verdict::Other(_) => text.cyan().to_string(),
    }
}

/// "Fact-checked by: X • Source: Y • Date: Z", skipping empty parts.
pub fn meta_line(record: &FactCheckRecord) -> String {
    let mut parts = Vec::new();
    if !record.factchecker.is_empty() {
        parts.push(format!("Fact-checked by: {}", record.factchecker));
    }
    if !record.statement_originator.is_empty() {
        parts.push(format!("Source: {}", record.statement_originator));
    }
    if !record.statement_date.is_empty() {
        parts.push(format!("Date: {}", record.statement_date));
    }
    parts.join(" \u{2022} ")
}

/// Print one record.
pub fn print_record(
    w: &mut dyn Write,
    index: usize,
    record: &FactCheckRecord,
    color: ColorMode,
) -> std::io::Result<()> {
    let statement = if record.statement.is_empty() {
        "No statement available"
    } else {
        record.statement.as_str()
    };
    if color.enabled() {
        writeln!(
            w,
            "{} {}",
            format!("[{}]", index + 1).bold().yellow(),
            statement.bold()
        )?;
    } else {
        writeln!(w, "[{}] {}", index + 1, statement)?;
    }
    writeln!(w, "    {}", verdict_label(&record.verdict, color))?;

    let meta = meta_line(record);
    if !meta.is_empty() {
        writeln!(w, "    {}", meta)?;
    }
    if !record.analysis_link.is_empty() {
        writeln!(w, "    View full analysis \u{2192} {}", record.analysis_link)?;
    }

    let origin = format!(
        "Query: \"{}\" ({})",
        truncate_query(&record.original_query),
        record.checked_at.format("%Y-%m-%d %H:%M UTC")
    );
    if color.enabled() {
        writeln!(w, "    {}", origin.dimmed())?;
    } else {
        writeln!(w, "    {}", origin)?;
    }
    Ok(())
}

/// Print the accumulated results newest-first, followed by a summary line.
pub fn print_state(
    w: &mut dyn Write,
    state: &AccumulatedState,
    limit: Option<usize>,
    color: ColorMode,
) -> std::io::Result<()> {
    if state.results.is_empty() {
        writeln!(w, "No results found")?;
    }

    let shown = limit.unwrap_or(state.results.len()).min(state.results.len());
    for (i, record) in state.results.iter().take(shown).enumerate() {
        print_record(w, i, record, color)?;
        writeln!(w)?;
    }
    if shown < state.results.len() {
        writeln!(w, "... {} older results not shown", state.results.len() - shown)?;
    }

    if state.is_pending() {
        let msg = format!("{} check(s) still in progress", state.pending_checks);
        if color.enabled() {
            writeln!(w, "{}", msg.blue())?;
        } else {
            writeln!(w, "{}", msg)?;
        }
    }
    Ok(())
}

pub fn print_config(
    w: &mut dyn Write,
    config: &Config,
    config_path: Option<&std::path::Path>,
) -> std::io::Result<()> {
    if let Some(path) = config_path {
        writeln!(w, "config file:   {}", path.display())?;
    }
    writeln!(w, "endpoint:      {}", config.endpoint)?;
    writeln!(w, "method:        {}", config.method)?;
    writeln!(w, "result limit:  {}", config.result_limit)?;
    writeln!(w, "timeout:       {}s", config.timeout_secs)?;
    writeln!(
        w,
        "backend:       {}",
        if config.use_dummy_api {
            format!("dummy ({} ms delay)", config.dummy_delay_ms)
        } else {
            "http".to_string()
        }
    )?;
    writeln!(
        w,
        "state:         {}",
        config
            .state_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(in memory)".to_string())
    )?;
    Ok(())
}

/// Badge and notification collaborator for the terminal: the badge drives a
/// spinner, notifications are printed above it.
pub struct TerminalSink {
    bar: ProgressBar,
    color: ColorMode,
}

impl TerminalSink {
    pub fn new(bar: ProgressBar, color: ColorMode) -> Self {
        Self { bar, color }
    }
}

impl BadgeSink for TerminalSink {
    fn set_badge(&self, badge: Badge) {
        let msg = match badge {
            Badge::Pending => "checking...".to_string(),
            Badge::Count(n) => format!("{} result{}", n, if n == 1 { "" } else { "s" }),
            Badge::Error => "last check failed".to_string(),
            Badge::Empty => String::new(),
        };
        self.bar.set_message(msg);
    }
}

impl Notifier for TerminalSink {
    fn notify(&self, notification: Notification) {
        let line = format!("{}: {}", notification.title, notification.message);
        let line = match (notification.kind, self.color.enabled()) {
            (NotificationKind::Completed, true) => line.green().to_string(),
            (NotificationKind::Failed, true) => line.red().to_string(),
            (_, false) => line,
        };
        self.bar.println(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use factcheck_core::WireRecord;

    fn record() -> FactCheckRecord {
        FactCheckRecord::from_wire(
            WireRecord {
                statement: "The moon is made of cheese".into(),
                verdict: "False".into(),
                factchecker: "Snopes".into(),
                statement_originator: "Social Media".into(),
                statement_date: "2024-01-10".into(),
                factcheck_analysis_link: "https://www.snopes.com/fact-check/example/".into(),
                ..Default::default()
            },
            "moon cheese",
            Utc.timestamp_opt(0, 0).unwrap(),
        )
    }

    fn render(state: &AccumulatedState, limit: Option<usize>) -> String {
        let mut buf = Vec::new();
        print_state(&mut buf, state, limit, ColorMode(false)).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn plain_record_layout() {
        let out = render(
            &AccumulatedState {
                results: vec![record()],
                pending_checks: 0,
            },
            None,
        );
        assert!(out.contains("[1] The moon is made of cheese"));
        assert!(out.contains("    Verdict: False"));
        assert!(out.contains(
            "Fact-checked by: Snopes \u{2022} Source: Social Media \u{2022} Date: 2024-01-10"
        ));
        assert!(
            out.contains("View full analysis \u{2192} https://www.snopes.com/fact-check/example/")
        );
        assert!(out.contains("Query: \"moon cheese\" (1970-01-01 00:00 UTC)"));
    }

    #[test]
    fn empty_state_and_pending_line() {
        let out = render(
            &AccumulatedState {
                results: vec![],
                pending_checks: 2,
            },
            None,
        );
        assert!(out.contains("No results found"));
        assert!(out.contains("2 check(s) still in progress"));
    }

    #[test]
    fn limit_reports_hidden_results() {
        let out = render(
            &AccumulatedState {
                results: vec![record(), record(), record()],
                pending_checks: 0,
            },
            Some(1),
        );
        assert!(out.contains("[1]"));
        assert!(!out.contains("[2]"));
        assert!(out.contains("... 2 older results not shown"));
    }

    #[test]
    fn meta_line_skips_empty_parts() {
        let mut r = record();
        r.statement_originator.clear();
        assert_eq!(meta_line(&r), "Fact-checked by: Snopes \u{2022} Date: 2024-01-10");
    }
}
