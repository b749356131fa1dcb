use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use factcheck_core::ViewStatus;

use super::{spinner_char, truncate};
use crate::app::{App, InputMode};

/// Render the claim input box and the status line beneath it.
pub fn render(f: &mut Frame, input_area: Rect, status_area: Rect, app: &App) {
    let theme = &app.theme;
    let editing = app.input_mode == InputMode::Editing;

    // Keep the tail of a long query visible while typing.
    let inner_width = input_area.width.saturating_sub(3) as usize;
    let query = app.view.query();
    let shown: String = if query.chars().count() > inner_width {
        let skip = query.chars().count() - inner_width;
        query.chars().skip(skip).collect()
    } else {
        query.to_string()
    };

    let mut spans = vec![Span::styled(shown, Style::default().fg(theme.text))];
    if editing {
        spans.push(Span::styled(
            "\u{2588}",
            Style::default()
                .fg(theme.focused_border)
                .add_modifier(Modifier::SLOW_BLINK),
        ));
    } else if query.is_empty() {
        spans.push(Span::styled(
            "Tab to type a claim",
            Style::default().fg(theme.dim),
        ));
    }

    let input = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style(editing))
            .title(" Claim "),
    );
    f.render_widget(input, input_area);

    f.render_widget(Paragraph::new(status_line(app, status_area.width as usize)), status_area);
}

fn status_line(app: &App, width: usize) -> Line<'static> {
    let theme = &app.theme;

    if let Some(error) = &app.command_error {
        return Line::from(Span::styled(
            format!(" {}", truncate(error, width.saturating_sub(1))),
            Style::default().fg(theme.error),
        ));
    }
    if let ViewStatus::Error(message) = app.view.status() {
        return Line::from(Span::styled(
            format!(" {}", truncate(message, width.saturating_sub(1))),
            Style::default().fg(theme.error),
        ));
    }
    if app.view.is_pending() {
        let n = app.view.pending_checks();
        return Line::from(Span::styled(
            format!(
                " {} Checking {} claim{}...",
                spinner_char(app.tick),
                n,
                if n == 1 { "" } else { "s" }
            ),
            Style::default().fg(theme.spinner),
        ));
    }
    let message = app.view.status().message();
    Line::from(Span::styled(
        format!(" {}", truncate(message, width.saturating_sub(1))),
        Style::default().fg(theme.dim),
    ))
}
