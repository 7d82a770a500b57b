//! Status line widget for the TUI.
//!
//! Shows the outcome of the last run: success, a warning, or the error
//! with its diagnostic text.

use crate::tui::app::Status;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

/// Status line widget.
pub struct StatusLine<'a> {
    status: &'a Status,
    limit_label: &'a str,
    limit_rows: bool,
}

impl<'a> StatusLine<'a> {
    pub fn new(status: &'a Status, limit_label: &'a str, limit_rows: bool) -> Self {
        Self {
            status,
            limit_label,
            limit_rows,
        }
    }

    /// Lines needed to render `status`.
    pub fn height(status: &Status) -> u16 {
        match status {
            Status::Error {
                diagnostic: Some(_),
                ..
            } => 3,
            _ => 2,
        }
    }

    fn toggle_line(&self) -> Line<'a> {
        let check = if self.limit_rows { "[x]" } else { "[ ]" };
        let hint = Style::default().fg(Color::DarkGray);
        Line::from(vec![
            Span::styled(check, Style::default().fg(Color::Cyan)),
            Span::raw(" "),
            Span::raw(self.limit_label),
            Span::styled(
                "   Ctrl-L toggle · Ctrl-R/F5 run · Tab focus · Ctrl-Q quit",
                hint,
            ),
        ])
    }
}

impl Widget for StatusLine<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut lines = vec![self.toggle_line()];

        match self.status {
            Status::Idle => {}
            Status::Running => lines.push(Line::from(Span::styled(
                "Running query…",
                Style::default().fg(Color::Yellow),
            ))),
            Status::Reconnecting => lines.push(Line::from(Span::styled(
                "⚠ Session expired, reconnecting and running the query again…",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ))),
            Status::Success(message) => lines.push(Line::from(Span::styled(
                format!("✔ {message}"),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ))),
            Status::Warning(message) => lines.push(Line::from(Span::styled(
                format!("⚠ {message}"),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ))),
            Status::Error {
                message,
                diagnostic,
            } => {
                lines.push(Line::from(Span::styled(
                    format!("✖ {message}"),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )));
                if let Some(diagnostic) = diagnostic {
                    lines.push(Line::from(Span::styled(
                        diagnostic.clone(),
                        Style::default().fg(Color::Gray),
                    )));
                }
            }
        }

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
