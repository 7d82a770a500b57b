//! SQL editor widget for the TUI.
//!
//! Renders the multi-line editor with a line gutter, scrolled so the cursor
//! stays visible.

use crate::tui::app::EditorState;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Width of the line-number gutter, separator included.
const GUTTER_WIDTH: u16 = 4;

/// Calculates the scroll offset needed to keep `cursor` visible in a window
/// of `available` cells.
pub fn calculate_scroll_offset(cursor: usize, available: usize) -> usize {
    if available == 0 {
        return cursor;
    }
    if cursor < available {
        0
    } else {
        cursor + 1 - available
    }
}

/// SQL editor widget.
pub struct SqlEditor<'a> {
    editor: &'a EditorState,
    focused: bool,
}

impl<'a> SqlEditor<'a> {
    pub fn new(editor: &'a EditorState, focused: bool) -> Self {
        Self { editor, focused }
    }

    /// Screen position of the cursor inside `area`, if it is visible.
    pub fn cursor_position(&self, area: Rect) -> Option<(u16, u16)> {
        let (width, height) = Self::text_size(area);
        if width == 0 || height == 0 {
            return None;
        }
        let (row, col) = self.editor.cursor();
        let y = row - calculate_scroll_offset(row, height);
        let x = col - calculate_scroll_offset(col, width);
        Some((
            area.x + 1 + GUTTER_WIDTH + x as u16,
            area.y + 1 + y as u16,
        ))
    }

    fn text_size(area: Rect) -> (usize, usize) {
        (
            area.width.saturating_sub(2 + GUTTER_WIDTH) as usize,
            area.height.saturating_sub(2) as usize,
        )
    }
}

impl Widget for SqlEditor<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" SQL Query ");

        let (width, height) = Self::text_size(area);
        let (row, col) = self.editor.cursor();
        let first_line = calculate_scroll_offset(row, height);
        let first_col = calculate_scroll_offset(col, width);

        let gutter_style = Style::default().fg(Color::DarkGray);
        let lines: Vec<Line> = self
            .editor
            .lines()
            .iter()
            .enumerate()
            .skip(first_line)
            .take(height)
            .map(|(i, text)| {
                let visible: String = text.chars().skip(first_col).take(width).collect();
                Line::from(vec![
                    Span::styled(format!("{:>3}│", i + 1), gutter_style),
                    Span::raw(visible),
                ])
            })
            .collect();

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
