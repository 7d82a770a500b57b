//! Bar chart widget for the TUI.

use crate::chart::{format_value, ChartSeries};
use ratatui::{
    buffer::Buffer,
    layout::{Direction, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Widget},
};

/// Longest label kept before truncation.
const MAX_LABEL_WIDTH: usize = 24;

/// Horizontal bar chart of a [`ChartSeries`].
pub struct SeriesChart<'a> {
    series: &'a ChartSeries,
    /// Index of the first bar shown.
    offset: usize,
}

impl<'a> SeriesChart<'a> {
    pub fn new(series: &'a ChartSeries, offset: usize) -> Self {
        Self { series, offset }
    }

    fn bars(&self, max_bars: usize) -> Vec<Bar<'a>> {
        self.series
            .bars
            .iter()
            .skip(self.offset)
            .take(max_bars)
            .map(|bar| {
                let label: String = bar.label.chars().take(MAX_LABEL_WIDTH).collect();
                Bar::default()
                    .value(bar.value.max(0.0).round() as u64)
                    .text_value(format_value(bar.value))
                    .label(Line::from(label))
                    .style(Style::default().fg(Color::Cyan))
                    .value_style(Style::default().fg(Color::Black).bg(Color::Cyan))
            })
            .collect()
    }
}

impl Widget for SeriesChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(format!(" 📊 {} ", self.series.title()));

        let visible = block.inner(area).height as usize;
        let bars = self.bars(visible);

        BarChart::default()
            .block(block)
            .direction(Direction::Horizontal)
            .bar_width(1)
            .bar_gap(0)
            .max(self.series.max_value().max(1.0).round() as u64)
            .data(BarGroup::default().bars(&bars))
            .render(area, buf);
    }
}
