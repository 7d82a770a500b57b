//! Connection status strip.
//!
//! Shows the session's role, warehouse, database and schema side by side,
//! or a warning with the error text if they could not be read.

use crate::tui::app::ContextStatus;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

/// Height the strip needs, borders included.
pub const HEIGHT: u16 = 4;

pub struct ContextPanel<'a> {
    status: &'a ContextStatus,
}

impl<'a> ContextPanel<'a> {
    pub fn new(status: &'a ContextStatus) -> Self {
        Self { status }
    }
}

impl Widget for ContextPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Connection status (current session context) ");
        let inner = block.inner(area);
        block.render(area, buf);

        match self.status {
            ContextStatus::Loading => {
                Paragraph::new(Span::styled(
                    "Reading session context…",
                    Style::default().fg(Color::DarkGray),
                ))
                .render(inner, buf);
            }
            ContextStatus::Ready(ctx) => {
                let columns = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(inner);
                for ((label, value), column) in ctx.metrics().into_iter().zip(columns.iter()) {
                    let lines = vec![
                        Line::from(Span::styled(label, Style::default().fg(Color::DarkGray))),
                        Line::from(Span::styled(
                            value.to_string(),
                            Style::default().add_modifier(Modifier::BOLD),
                        )),
                    ];
                    Paragraph::new(lines).render(*column, buf);
                }
            }
            ContextStatus::Failed {
                message,
                diagnostic,
            } => {
                let mut lines = vec![Line::from(Span::styled(
                    "⚠ Could not fetch session context.",
                    Style::default().fg(Color::Yellow),
                ))];
                let detail = match diagnostic {
                    Some(d) => format!("{message} ({d})"),
                    None => message.clone(),
                };
                lines.push(Line::from(Span::styled(
                    detail,
                    Style::default().fg(Color::Gray),
                )));
                Paragraph::new(lines)
                    .wrap(Wrap { trim: true })
                    .render(inner, buf);
            }
        }
    }
}
