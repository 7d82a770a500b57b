//! Bar chart data derived from a query result.
//!
//! A chart is only drawn when the result carries both configured columns.
//! Each row becomes one bar; rows whose value is not numeric are skipped.

use serde::Serialize;

use crate::config::ChartConfig;
use crate::db::QueryResult;

/// Width of the longest bar in the text rendering.
const TEXT_BAR_WIDTH: usize = 40;

/// One labelled bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

/// Bars extracted from a result, in row order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    /// Label column name as the warehouse returned it.
    pub label_column: String,
    /// Value column name as the warehouse returned it.
    pub value_column: String,
    pub bars: Vec<Bar>,
}

impl ChartSeries {
    /// Extracts the series, or `None` if either column is missing.
    pub fn from_result(result: &QueryResult, config: &ChartConfig) -> Option<Self> {
        let label_idx = result.column_index_ignore_case(&config.label_column)?;
        let value_idx = result.column_index_ignore_case(&config.value_column)?;

        let bars = result
            .rows
            .iter()
            .filter_map(|row| {
                let value = row.get(value_idx)?.as_f64()?;
                let label = row
                    .get(label_idx)
                    .map(|v| v.to_display_string())
                    .unwrap_or_default();
                Some(Bar { label, value })
            })
            .collect();

        Some(Self {
            label_column: result.columns[label_idx].name.clone(),
            value_column: result.columns[value_idx].name.clone(),
            bars,
        })
    }

    /// Title shown above the chart, e.g. "ITEM_COUNT per TRUCK_BRAND_NAME".
    pub fn title(&self) -> String {
        format!("{} per {}", self.value_column, self.label_column)
    }

    /// Largest bar value, or 0 when there are no positive bars.
    pub fn max_value(&self) -> f64 {
        self.bars.iter().map(|b| b.value).fold(0.0, f64::max)
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Renders the chart as horizontal text bars, one line per bar.
    pub fn render_text(&self) -> Vec<String> {
        let label_width = self
            .bars
            .iter()
            .map(|b| b.label.chars().count())
            .max()
            .unwrap_or(0);
        let max = self.max_value();

        self.bars
            .iter()
            .map(|bar| {
                let len = if max > 0.0 && bar.value > 0.0 {
                    ((bar.value / max) * TEXT_BAR_WIDTH as f64).round() as usize
                } else {
                    0
                };
                format!(
                    "{:<width$} │{} {}",
                    bar.label,
                    "█".repeat(len),
                    format_value(bar.value),
                    width = label_width
                )
            })
            .collect()
    }
}

/// Formats a bar value without a trailing ".0" for whole numbers.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value:.2}")
    }
}
