//! Headless mode for scripting and automation.
//!
//! Runs one query (and optionally the context read) through the same runner
//! as the terminal page and prints the outcome instead of drawing it.

pub mod output;

pub use output::{HeadlessOutput, OutputFormat, ScreenRenderer};

use crate::chart::ChartSeries;
use crate::cli::Cli;
use crate::config::Config;
use crate::error::{Result, SnowpaneError};
use crate::query::{read_context, QueryOutcome, QueryRequest, QueryRunner, SessionContext};
use crate::tui::app::App;
use crate::tui::ui;
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use std::path::PathBuf;
use tracing::{info, warn};

/// Configuration for headless mode execution.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Statement to run, if any.
    pub request: Option<QueryRequest>,
    /// Whether to read the session context.
    pub show_context: bool,
    /// Screen size for [`OutputFormat::Screen`].
    pub width: u16,
    pub height: u16,
    pub output_format: OutputFormat,
    /// Path to write output (None = stdout).
    pub output_file: Option<PathBuf>,
}

impl HeadlessConfig {
    /// Creates a HeadlessConfig from CLI arguments.
    pub fn from_cli(cli: &Cli, settings: &Config) -> Result<Self> {
        let (width, height) = cli.parse_screen_size().map_err(SnowpaneError::config)?;
        let output_format = cli.parse_output_format().map_err(SnowpaneError::config)?;
        let cap_rows = settings.query.limit_by_default && !cli.no_limit;

        let request = cli
            .sql_text()?
            .map(|sql| QueryRequest::new(sql, cap_rows));

        Ok(Self {
            request,
            show_context: cli.context,
            width,
            height,
            output_format,
            output_file: cli.output_file.clone(),
        })
    }
}

/// Everything a headless run produced.
#[derive(Debug, Default)]
pub struct HeadlessReport {
    /// Context read result; a failure is reported, not fatal.
    pub context: Option<Result<SessionContext>>,
    pub outcome: Option<QueryOutcome>,
    pub chart: Option<ChartSeries>,
    /// Rendered page, for [`OutputFormat::Screen`].
    pub screen: Option<String>,
}

/// Runs the configured steps and returns the report.
///
/// A failed context read is kept in the report and the query still runs.
/// Any query failure, including a failed retry after an expired session,
/// aborts the run with that error.
pub async fn execute(
    runner: &QueryRunner,
    settings: &Config,
    config: &HeadlessConfig,
    connection_info: &str,
) -> Result<HeadlessReport> {
    let mut report = HeadlessReport::default();

    if config.show_context {
        let context = read_context(runner).await;
        if let Err(e) = &context {
            warn!("Could not read session context: {}", e);
        }
        report.context = Some(context);
    }

    if let Some(request) = &config.request {
        let outcome = runner.run(request).await?;
        info!(
            "Query returned {} rows in {}ms",
            outcome.result.row_count,
            outcome.execution_time.as_millis()
        );
        report.chart = ChartSeries::from_result(&outcome.result, &settings.chart);
        report.outcome = Some(outcome);
    }

    if config.output_format == OutputFormat::Screen {
        report.screen = Some(render_screen(&report, settings, config, connection_info)?);
    }

    Ok(report)
}

/// Draws the page as it would look after this run.
fn render_screen(
    report: &HeadlessReport,
    settings: &Config,
    config: &HeadlessConfig,
    connection_info: &str,
) -> Result<String> {
    let mut app = App::new(settings);
    if let Some(request) = &config.request {
        app.editor.set_text(request.sql.trim());
        app.limit_rows = request.cap_rows;
    }
    if let Some(context) = &report.context {
        app.apply_context(context.clone());
    }
    if let Some(outcome) = &report.outcome {
        app.apply_outcome(Ok(outcome.clone()));
    }

    let mut terminal = Terminal::new(TestBackend::new(config.width, config.height))
        .map_err(|e| SnowpaneError::internal(format!("Failed to create terminal: {e}")))?;
    terminal
        .draw(|frame| ui::render(frame, &app, connection_info))
        .map_err(|e| SnowpaneError::internal(format!("Failed to draw: {e}")))?;

    Ok(ScreenRenderer::render(terminal.backend().buffer()))
}

/// Runs headless mode and writes the formatted output.
pub async fn run(
    runner: &QueryRunner,
    settings: &Config,
    config: &HeadlessConfig,
    connection_info: &str,
) -> Result<()> {
    let report = execute(runner, settings, config, connection_info).await?;
    let text = HeadlessOutput::new(config.output_format).format(&report);

    match &config.output_file {
        Some(path) => std::fs::write(path, text).map_err(|e| {
            SnowpaneError::internal(format!("Failed to write {}: {e}", path.display()))
        }),
        None => {
            print!("{text}");
            Ok(())
        }
    }
}
