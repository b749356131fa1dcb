use ratatui::style::{Color, Modifier, Style};

use factcheck_core::{Badge, NotificationKind, Verdict};

/// Color theme for the TUI.
pub struct Theme {
    pub verdict_true: Color,
    pub verdict_false: Color,
    pub verdict_mixed: Color,
    pub verdict_other: Color,

    pub header_fg: Color,
    pub header_bg: Color,
    pub border: Color,
    pub focused_border: Color,
    pub text: Color,
    pub dim: Color,
    pub highlight_bg: Color,
    pub link: Color,
    pub spinner: Color,
    pub error: Color,
    pub footer_fg: Color,
    pub footer_bg: Color,
}

impl Theme {
    /// Hacker-green terminal theme.
    pub fn hacker() -> Self {
        Self {
            verdict_true: Color::Rgb(0, 210, 0),
            verdict_false: Color::Red,
            verdict_mixed: Color::Yellow,
            verdict_other: Color::Cyan,

            header_fg: Color::Black,
            header_bg: Color::Rgb(0, 210, 0),
            border: Color::DarkGray,
            focused_border: Color::Rgb(0, 210, 0),
            text: Color::White,
            dim: Color::DarkGray,
            highlight_bg: Color::Rgb(30, 50, 30),
            link: Color::Cyan,
            spinner: Color::Cyan,
            error: Color::Red,
            footer_fg: Color::DarkGray,
            footer_bg: Color::Reset,
        }
    }

    /// Modern theme: white text, electric blue accents, dark blue header.
    pub fn modern() -> Self {
        Self {
            verdict_true: Color::Rgb(0, 200, 80),
            verdict_false: Color::Rgb(255, 80, 80),
            verdict_mixed: Color::Rgb(255, 200, 0),
            verdict_other: Color::Rgb(120, 160, 255),

            header_fg: Color::White,
            header_bg: Color::Rgb(30, 60, 120),
            border: Color::Rgb(60, 60, 80),
            focused_border: Color::Rgb(60, 140, 255),
            text: Color::White,
            dim: Color::Rgb(120, 120, 140),
            highlight_bg: Color::Rgb(30, 40, 80),
            link: Color::Rgb(60, 140, 255),
            spinner: Color::Rgb(60, 140, 255),
            error: Color::Rgb(255, 80, 80),
            footer_fg: Color::Rgb(120, 120, 140),
            footer_bg: Color::Reset,
        }
    }

    /// Pick a theme by name; anything unrecognised gets the default.
    pub fn by_name(name: &str) -> Self {
        match name {
            "modern" => Self::modern(),
            _ => Self::hacker(),
        }
    }

    pub fn verdict_color(&self, verdict: &Verdict) -> Color {
        match verdict {
            Verdict::True => self.verdict_true,
            Verdict::False => self.verdict_false,
            Verdict::Mixed => self.verdict_mixed,
            Verdict::Unverified | Verdict::Other(_) => self.verdict_other,
        }
    }

    /// The header badge uses the same colours in every theme so it reads the
    /// same as the browser toolbar badge.
    pub fn badge_style(&self, badge: &Badge) -> Style {
        match hex_color(badge.color()) {
            Some(bg) => Style::default()
                .fg(Color::White)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
            None => self.header_style(),
        }
    }

    pub fn notification_color(&self, kind: NotificationKind) -> Color {
        match kind {
            NotificationKind::Completed => self.verdict_true,
            NotificationKind::Failed => self.error,
        }
    }

    pub fn header_style(&self) -> Style {
        Style::default()
            .fg(self.header_fg)
            .bg(self.header_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn highlight_style(&self) -> Style {
        Style::default()
            .bg(self.highlight_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.focused_border)
        } else {
            Style::default().fg(self.border)
        }
    }

    pub fn footer_style(&self) -> Style {
        Style::default().fg(self.footer_fg).bg(self.footer_bg)
    }
}

/// Parse `#rrggbb`. Anything else, including the transparent `#rrggbbaa`
/// used for an empty badge, yields `None`.
fn hex_color(hex: &str) -> Option<Color> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}
