//! Result table widget for the TUI.
//!
//! Renders query results as formatted tables with column headers,
//! auto-sized columns, and styled NULL values. Headless mode reuses the
//! same layout through [`ResultTable::to_plain_lines`].

use crate::db::{QueryResult, Value};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// Maximum width for any column.
const MAX_COLUMN_WIDTH: usize = 40;

/// Minimum width for any column.
const MIN_COLUMN_WIDTH: usize = 4;

/// Rendered lines that are not data rows (borders, header, footer).
const FRAME_LINES: usize = 5;

/// Widget for rendering a query result as a table.
pub struct ResultTable<'a> {
    result: &'a QueryResult,
    /// Index of the first data row rendered.
    offset: usize,
    /// Maximum number of data rows rendered.
    max_rows: Option<usize>,
}

impl<'a> ResultTable<'a> {
    /// Creates a new result table widget.
    pub fn new(result: &'a QueryResult) -> Self {
        Self {
            result,
            offset: 0,
            max_rows: None,
        }
    }

    /// Starts rendering at data row `offset`.
    pub fn scrolled(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Calculates the optimal width for each column.
    fn calculate_column_widths(&self) -> Vec<usize> {
        if self.result.columns.is_empty() {
            return vec![];
        }

        let mut widths: Vec<usize> = self
            .result
            .columns
            .iter()
            .map(|col| col.name.chars().count().max(MIN_COLUMN_WIDTH))
            .collect();

        for row in &self.result.rows {
            for (i, value) in row.iter().enumerate() {
                if i < widths.len() {
                    let value_len = value.to_display_string().chars().count();
                    widths[i] = widths[i].max(value_len);
                }
            }
        }

        widths.iter().map(|&w| w.min(MAX_COLUMN_WIDTH)).collect()
    }

    /// Truncates a string to fit within the given width, adding ellipsis if needed.
    fn truncate(s: &str, max_width: usize) -> String {
        if s.chars().count() <= max_width {
            s.to_string()
        } else if max_width <= 3 {
            s.chars().take(max_width).collect()
        } else {
            let head: String = s.chars().take(max_width - 3).collect();
            format!("{head}...")
        }
    }

    /// Renders the table to a vector of Lines for embedding in other widgets.
    pub fn render_to_lines(&self, available_width: usize) -> Vec<Line<'a>> {
        let mut lines = Vec::new();

        if self.result.columns.is_empty() {
            lines.push(Line::from(Span::styled(
                "(statement returned no columns)",
                Style::default().fg(Color::DarkGray),
            )));
            return lines;
        }

        let widths = self.calculate_column_widths();

        // Borders and padding
        let total_width: usize = widths.iter().sum::<usize>() + widths.len() * 3 + 1;
        let scale_factor = if total_width > available_width && available_width > 0 {
            available_width as f64 / total_width as f64
        } else {
            1.0
        };

        let adjusted_widths: Vec<usize> = widths
            .iter()
            .map(|&w| ((w as f64 * scale_factor) as usize).max(MIN_COLUMN_WIDTH))
            .collect();

        lines.push(self.render_border(&adjusted_widths, '┌', '┬', '┐'));
        lines.push(self.render_header_row(&adjusted_widths));
        lines.push(self.render_border(&adjusted_widths, '├', '┼', '┤'));

        let visible = self
            .result
            .rows
            .iter()
            .skip(self.offset)
            .take(self.max_rows.unwrap_or(usize::MAX));
        for row in visible {
            lines.push(self.render_data_row(row, &adjusted_widths));
        }

        lines.push(self.render_border(&adjusted_widths, '└', '┴', '┘'));
        lines.push(Line::from(Span::styled(
            self.footer(),
            Style::default().fg(Color::DarkGray),
        )));

        lines
    }

    /// Renders the table as unstyled text lines.
    pub fn to_plain_lines(&self, available_width: usize) -> Vec<String> {
        self.render_to_lines(available_width)
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .map(|span| span.content.as_ref())
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect()
    }

    /// Row count and timing summary shown below the table.
    fn footer(&self) -> String {
        let shown = self.result.rows.len().saturating_sub(self.offset);
        let mut footer = format!(
            "{} row{} returned ({}ms)",
            self.result.row_count,
            if self.result.row_count == 1 { "" } else { "s" },
            self.result.execution_time.as_millis()
        );
        if self.offset > 0 || self.max_rows.is_some_and(|max| max < shown) {
            let last = self.offset + self.max_rows.map_or(shown, |max| max.min(shown));
            footer.push_str(&format!(
                " · showing {}-{}",
                (self.offset + 1).min(last),
                last
            ));
        }
        footer
    }

    /// Renders a horizontal border line.
    fn render_border(&self, widths: &[usize], left: char, mid: char, right: char) -> Line<'a> {
        let mut border = String::new();
        border.push(left);

        for (i, &width) in widths.iter().enumerate() {
            border.push_str(&"─".repeat(width + 2));
            if i < widths.len() - 1 {
                border.push(mid);
            }
        }

        border.push(right);

        Line::from(Span::styled(border, Style::default().fg(Color::DarkGray)))
    }

    /// Renders the header row with column names.
    fn render_header_row(&self, widths: &[usize]) -> Line<'a> {
        let mut spans = Vec::new();
        spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));

        for (i, col) in self.result.columns.iter().enumerate() {
            let width = widths.get(i).copied().unwrap_or(MIN_COLUMN_WIDTH);
            let name = Self::truncate(&col.name, width);
            let padded = format!(" {:width$} ", name, width = width);

            spans.push(Span::styled(
                padded,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
        }

        Line::from(spans)
    }

    /// Renders a data row. Numbers are right-aligned.
    fn render_data_row(&self, row: &[Value], widths: &[usize]) -> Line<'a> {
        let mut spans = Vec::new();
        spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));

        for (i, value) in row.iter().enumerate() {
            let width = widths.get(i).copied().unwrap_or(MIN_COLUMN_WIDTH);
            let display = value.to_display_string();
            let truncated = Self::truncate(&display, width);
            let padded = match value {
                Value::Int(_) | Value::Float(_) => format!(" {:>width$} ", truncated, width = width),
                _ => format!(" {:width$} ", truncated, width = width),
            };

            let style = if value.is_null() {
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC)
            } else {
                Style::default()
            };

            spans.push(Span::styled(padded, style));
            spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
        }

        Line::from(spans)
    }
}

impl Widget for ResultTable<'_> {
    fn render(mut self, area: Rect, buf: &mut Buffer) {
        self.max_rows = Some((area.height as usize).saturating_sub(FRAME_LINES));
        let lines = self.render_to_lines(area.width as usize);

        for (i, line) in lines.iter().enumerate() {
            if i >= area.height as usize {
                break;
            }
            let y = area.y + i as u16;
            buf.set_line(area.x, y, line, area.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ColumnInfo;
    use std::time::Duration;

    fn sample_result() -> QueryResult {
        QueryResult {
            columns: vec![
                ColumnInfo::new("TRUCK_BRAND_NAME", "text"),
                ColumnInfo::new("ITEM_COUNT", "fixed"),
                ColumnInfo::new("CITY", "text"),
            ],
            rows: vec![
                vec![
                    Value::from("Freezing Point"),
                    Value::Int(17),
                    Value::from("San Mateo"),
                ],
                vec![Value::from("Plant Palace"), Value::Int(12), Value::Null],
            ],
            execution_time: Duration::from_millis(23),
            row_count: 2,
            total_rows: Some(2),
        }
    }

    fn many_rows(n: i64) -> QueryResult {
        QueryResult::with_data(
            vec![ColumnInfo::new("N", "fixed")],
            (0..n).map(|i| vec![Value::Int(i)]).collect(),
        )
    }

    #[test]
    fn test_calculate_column_widths() {
        let result = sample_result();
        let table = ResultTable::new(&result);
        let widths = table.calculate_column_widths();

        // Header widths dominate the first two columns; "San Mateo" (9) the third.
        assert_eq!(widths, vec![16, 10, 9]);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(ResultTable::truncate("hello", 10), "hello");
        assert_eq!(ResultTable::truncate("hello world", 8), "hello...");
        assert_eq!(ResultTable::truncate("hi", 2), "hi");
        assert_eq!(ResultTable::truncate("hello", 3), "hel");
        assert_eq!(ResultTable::truncate("Guac n’ Roll", 8), "Guac ...");
    }

    #[test]
    fn test_render_to_lines() {
        let result = sample_result();
        let table = ResultTable::new(&result);
        let lines = table.render_to_lines(80);

        // top border, header, separator, 2 data rows, bottom border, footer
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn test_plain_lines() {
        let result = sample_result();
        let lines = ResultTable::new(&result).to_plain_lines(80);

        assert_eq!(
            lines[1],
            "│ TRUCK_BRAND_NAME │ ITEM_COUNT │ CITY      │"
        );
        assert_eq!(
            lines[3],
            "│ Freezing Point   │         17 │ San Mateo │"
        );
        assert_eq!(
            lines[4],
            "│ Plant Palace     │         12 │ NULL      │"
        );
        assert_eq!(lines[6], "2 rows returned (23ms)");
    }

    #[test]
    fn test_empty_result() {
        let result = QueryResult::new();
        let table = ResultTable::new(&result);
        let lines = table.render_to_lines(80);

        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_zero_rows_keeps_header() {
        let mut result = sample_result();
        result.rows.clear();
        result.row_count = 0;

        let lines = ResultTable::new(&result).to_plain_lines(80);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[4], "0 rows returned (23ms)");
    }

    #[test]
    fn test_widget_renders_only_rows_that_fit() {
        let result = many_rows(50);
        let area = Rect::new(0, 0, 60, 10);
        let mut buf = Buffer::empty(area);
        ResultTable::new(&result).scrolled(5).render(area, &mut buf);

        let row = |y: u16| -> String {
            (0..area.width)
                .map(|x| buf[(x, y)].symbol().to_string())
                .collect::<String>()
        };
        assert!(row(3).contains(" 5 "));
        assert!(row(9).contains("showing 6-10"));
    }
}
