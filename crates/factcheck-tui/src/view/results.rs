use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use factcheck_core::FactCheckRecord;

use super::truncate;
use crate::app::{App, InputMode};
use crate::theme::Theme;

/// Render the accumulated results, newest first.
pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let browsing = app.input_mode == InputMode::Browsing;
    let results = app.view.results();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style(browsing))
        .title(format!(" Results ({}) ", results.len()));

    if results.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            " No results found",
            Style::default().fg(theme.dim),
        )))
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = results
        .iter()
        .map(|record| ListItem::new(record_lines(record, theme, width)))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(theme.highlight_style())
        .highlight_symbol("\u{25B6} ");
    let mut state = ListState::default().with_selected(Some(app.selected));
    f.render_stateful_widget(list, area, &mut state);
}

fn record_lines(record: &FactCheckRecord, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    let statement = if record.statement.is_empty() {
        "No statement available"
    } else {
        &record.statement
    };

    let mut lines = vec![
        Line::from(Span::styled(
            truncate(statement, width),
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("Verdict: ", Style::default().fg(theme.dim)),
            Span::styled(
                record.verdict.to_string(),
                Style::default()
                    .fg(theme.verdict_color(&record.verdict))
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
    ];

    let mut meta = Vec::new();
    if !record.factchecker.is_empty() {
        meta.push(format!("Fact-checked by: {}", record.factchecker));
    }
    if !record.statement_originator.is_empty() {
        meta.push(format!("Source: {}", record.statement_originator));
    }
    if !record.statement_date.is_empty() {
        meta.push(format!("Date: {}", record.statement_date));
    }
    if !meta.is_empty() {
        lines.push(Line::from(Span::styled(
            truncate(&meta.join(" \u{2022} "), width),
            Style::default().fg(theme.dim),
        )));
    }
    if !record.analysis_link.is_empty() {
        lines.push(Line::from(Span::styled(
            truncate(&record.analysis_link, width),
            Style::default()
                .fg(theme.link)
                .add_modifier(Modifier::UNDERLINED),
        )));
    }
    lines.push(Line::from(Span::styled(
        truncate(
            &format!(
                "\u{21B3} \"{}\" at {}",
                record.original_query,
                record.checked_at.format("%H:%M:%S")
            ),
            width,
        ),
        Style::default().fg(theme.dim),
    )));
    lines.push(Line::from(""));
    lines
}
