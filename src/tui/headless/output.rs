//! Output formatting for headless mode.
//!
//! Provides the output formats: a text table, JSON, and a rendered screen.

use super::HeadlessReport;
use crate::tui::widgets::table::ResultTable;
use ratatui::buffer::Buffer;
use serde::Serialize;

/// Width the text table is laid out for.
const TEXT_WIDTH: usize = 120;

const CONTEXT_WARNING: &str = "warning: could not fetch session context";

const RECONNECT_WARNING: &str =
    "warning: session had expired; reconnected and ran the query again";

/// Output format for headless mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Result table and text bar chart.
    #[default]
    Text,
    /// Context, result and chart as JSON.
    Json,
    /// The page as the terminal UI would draw it.
    Screen,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "screen" => Ok(Self::Screen),
            _ => Err(format!(
                "Invalid output format: {s}. Expected: text, json, or screen"
            )),
        }
    }
}

/// Renders a ratatui buffer to a string.
pub struct ScreenRenderer;

impl ScreenRenderer {
    /// Renders a buffer to plain text, trailing blanks removed.
    pub fn render(buffer: &Buffer) -> String {
        let area = buffer.area;
        if area.height == 0 {
            return String::new();
        }

        let lines = (area.top()..area.bottom())
            .map(|y| {
                let line = (area.left()..area.right())
                    .filter_map(|x| buffer.cell((x, y)))
                    .map(|cell| cell.symbol())
                    .collect::<Vec<_>>()
                    .join("");
                line.trim_end_matches(' ').to_string()
            })
            .collect::<Vec<_>>();

        let trimmed_lines = lines
            .into_iter()
            .rev()
            .skip_while(|line| line.is_empty())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect::<Vec<_>>();

        let output_lines = if trimmed_lines.is_empty() {
            vec![String::new()]
        } else {
            trimmed_lines
        };

        format!("{}\n", output_lines.join("\n"))
    }
}

/// JSON output structure.
#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a crate::query::SessionContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sql: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reconnected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a crate::db::QueryResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chart: Option<&'a crate::chart::ChartSeries>,
}

/// Formats headless execution results.
pub struct HeadlessOutput {
    format: OutputFormat,
}

impl HeadlessOutput {
    /// Creates a new output formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the report according to the configured format.
    pub fn format(&self, report: &HeadlessReport) -> String {
        match self.format {
            OutputFormat::Text => self.format_text(report),
            OutputFormat::Json => self.format_json(report),
            OutputFormat::Screen => report.screen.clone().unwrap_or_default(),
        }
    }

    /// Formats as plain text.
    fn format_text(&self, report: &HeadlessReport) -> String {
        let mut out = Vec::new();

        match &report.context {
            Some(Ok(ctx)) => {
                for (label, value) in ctx.metrics() {
                    out.push(format!("{label:<10} {value}"));
                }
                out.push(String::new());
            }
            Some(Err(e)) => {
                out.push(CONTEXT_WARNING.to_string());
                out.push(format!("  {e}"));
                if let Some(diagnostic) = e.diagnostic() {
                    out.push(format!("  {diagnostic}"));
                }
                out.push(String::new());
            }
            None => {}
        }

        if let Some(outcome) = &report.outcome {
            if outcome.reconnected {
                out.push(RECONNECT_WARNING.to_string());
            }
            out.extend(ResultTable::new(&outcome.result).to_plain_lines(TEXT_WIDTH));

            if let Some(chart) = report.chart.as_ref().filter(|c| !c.is_empty()) {
                out.push(String::new());
                out.push(chart.title());
                out.extend(chart.render_text());
            }
        }

        let mut text = out.join("\n");
        text.push('\n');
        text
    }

    /// Formats as JSON.
    fn format_json(&self, report: &HeadlessReport) -> String {
        let json_output = JsonOutput {
            context: report.context.as_ref().and_then(|c| c.as_ref().ok()),
            context_error: report
                .context
                .as_ref()
                .and_then(|c| c.as_ref().err())
                .map(|e| e.to_string()),
            sql: report.outcome.as_ref().map(|o| o.sql.as_str()),
            reconnected: report.outcome.as_ref().map(|o| o.reconnected),
            result: report.outcome.as_ref().map(|o| &o.result),
            chart: report.chart.as_ref(),
        };

        serde_json::to_string_pretty(&json_output)
            .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize: {}\"}}", e))
    }
}
