pub mod query;
pub mod quit_confirm;
pub mod results;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::app::{App, InputMode};

/// Spinner frames for animated progress indication.
const SPINNER_FRAMES: &[char] = &[
    '\u{280B}', '\u{2819}', '\u{2839}', '\u{2838}', '\u{283C}', '\u{2834}', '\u{2826}', '\u{2827}',
    '\u{2807}', '\u{280F}',
];

/// Get the current spinner character based on a tick counter.
pub fn spinner_char(tick: usize) -> char {
    SPINNER_FRAMES[tick % SPINNER_FRAMES.len()]
}

/// Truncate a string to fit in `max_width` columns, appending "\u{2026}" if truncated.
pub fn truncate(s: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if s.chars().count() <= max_width {
        return s.to_string();
    }
    let mut truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    truncated.push('\u{2026}');
    truncated
}

/// Draw the whole screen.
pub fn render(f: &mut Frame, app: &App) {
    let [header, query, status, results, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(f.area());

    render_header(f, header, app);
    query::render(f, query, status, app);
    results::render(f, results, app);
    render_footer(f, footer, app);

    if app.input_mode == InputMode::ConfirmQuit {
        quit_confirm::render(f, app);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let title = format!(" Fact Checker \u{2502} {} ", app.backend_name);
    let badge = app.badge.text();
    let badge_width = if badge.is_empty() { 0 } else { badge.chars().count() + 2 };
    let pad = (area.width as usize).saturating_sub(title.chars().count() + badge_width);

    let mut spans = vec![
        Span::styled(title, theme.header_style()),
        Span::styled(" ".repeat(pad), theme.header_style()),
    ];
    if !badge.is_empty() {
        spans.push(Span::styled(format!(" {} ", badge), theme.badge_style(&app.badge)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_footer(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let line = if let Some((notification, _)) = &app.notification {
        Line::from(vec![
            Span::styled(
                format!(" {}: ", notification.title),
                Style::default()
                    .fg(theme.notification_color(notification.kind))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(notification.message.clone(), Style::default().fg(theme.text)),
        ])
    } else {
        let hints = match app.input_mode {
            InputMode::Editing => {
                " Enter: check  Tab: browse  Ctrl+L: clear all  Ctrl+U: clear field  Esc: quit"
            }
            InputMode::Browsing => " j/k: scroll  g/G: top/bottom  Tab: edit  Ctrl+L: clear all  q: quit",
            InputMode::ConfirmQuit => " q: quit  Esc: cancel",
        };
        Line::from(Span::styled(hints, theme.footer_style()))
    };
    f.render_widget(Paragraph::new(line).style(theme.footer_style()), area);
}
