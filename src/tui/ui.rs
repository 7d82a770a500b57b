//! UI rendering for the TUI.
//!
//! Defines the layout and renders all UI components.

use super::app::{App, Focus};
use super::widgets::{chart, context, header, input, status, table};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders},
    Frame,
};

/// Editor height including borders.
const EDITOR_HEIGHT: u16 = 10;

/// Results narrower than this put the chart below the table.
const SIDE_BY_SIDE_MIN_WIDTH: u16 = 110;

/// Renders the entire UI.
pub fn render(frame: &mut Frame, app: &App, connection_info: &str) {
    let area = frame.area();

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(context::HEIGHT),
            Constraint::Length(EDITOR_HEIGHT),
            Constraint::Length(status::StatusLine::height(&app.status)),
            Constraint::Min(3),
        ])
        .split(area);

    render_header(frame, main_layout[0], app, connection_info);
    frame.render_widget(context::ContextPanel::new(&app.context), main_layout[1]);
    render_editor(frame, main_layout[2], app);
    frame.render_widget(
        status::StatusLine::new(&app.status, &app.limit_label(), app.limit_rows),
        main_layout[3],
    );
    render_results(frame, main_layout[4], app);
}

/// Renders the header bar.
fn render_header(frame: &mut Frame, area: Rect, app: &App, connection_info: &str) {
    let widget = header::Header::new(connection_info, app.is_running_query());
    frame.render_widget(widget, area);
}

/// Renders the editor and places the terminal cursor in it when focused.
fn render_editor(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Editor;
    let widget = input::SqlEditor::new(&app.editor, focused);
    let cursor = widget.cursor_position(area);
    frame.render_widget(widget, area);

    if focused {
        if let Some(position) = cursor {
            frame.set_cursor_position(position);
        }
    }
}

/// Renders the result table and, when the chart columns are present, the
/// bar chart next to or below it.
fn render_results(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Results;
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let Some(result) = &app.result else {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" Results ");
        frame.render_widget(block, area);
        return;
    };

    let (table_area, chart_area) = match &app.chart {
        Some(series) if !series.is_empty() => {
            let direction = if area.width >= SIDE_BY_SIDE_MIN_WIDTH {
                Direction::Horizontal
            } else {
                Direction::Vertical
            };
            let parts = Layout::default()
                .direction(direction)
                .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                .split(area);
            (parts[0], Some(parts[1]))
        }
        _ => (area, None),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(" Results ");
    let inner = block.inner(table_area);
    frame.render_widget(block, table_area);
    frame.render_widget(
        table::ResultTable::new(result).scrolled(app.results_scroll),
        inner,
    );

    if let (Some(series), Some(chart_area)) = (&app.chart, chart_area) {
        frame.render_widget(
            chart::SeriesChart::new(series, app.results_scroll),
            chart_area,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::{ColumnInfo, QueryResult, Value};
    use crate::query::{QueryOutcome, SessionContext};
    use crate::tui::headless::output::ScreenRenderer;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;

    fn draw(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|frame| render(frame, app, "MOCK_USER@mock"))
            .unwrap();
        ScreenRenderer::render(terminal.backend().buffer())
    }

    fn menu() -> QueryOutcome {
        QueryOutcome {
            sql: "SELECT ...".to_string(),
            result: QueryResult::with_data(
                vec![
                    ColumnInfo::new("TRUCK_BRAND_NAME", "text"),
                    ColumnInfo::new("ITEM_COUNT", "fixed"),
                ],
                vec![
                    vec![Value::from("Freezing Point"), Value::Int(17)],
                    vec![Value::from("Plant Palace"), Value::Int(12)],
                ],
            ),
            execution_time: Duration::from_millis(3),
            reconnected: false,
        }
    }

    #[test]
    fn test_initial_page() {
        let app = App::new(&Config::default());
        let screen = draw(&app, 120, 40);

        assert!(screen.contains("Snowpane"));
        assert!(screen.contains("Reading session context"));
        assert!(screen.contains("SQL Query"));
        assert!(screen.contains("truck_brand_name"));
        assert!(screen.contains("[x] Limit results to 200 rows"));
        assert!(screen.contains("Results"));
    }

    #[test]
    fn test_page_after_successful_run() {
        let mut app = App::new(&Config::default());
        app.apply_context(Ok(SessionContext {
            role: Some("ANALYST".to_string()),
            warehouse: Some("COMPUTE_WH".to_string()),
            database: Some("TASTY_BYTES".to_string()),
            schema: Some("RAW_POS".to_string()),
        }));
        app.apply_outcome(Ok(menu()));

        let screen = draw(&app, 140, 40);

        assert!(screen.contains("COMPUTE_WH"));
        assert!(screen.contains("Query ran successfully!"));
        assert!(screen.contains("Freezing Point"));
        assert!(screen.contains("2 rows returned"));
        assert!(screen.contains("ITEM_COUNT per TRUCK_BRAND_NAME"));
    }

    #[test]
    fn test_no_chart_without_chart_columns() {
        let mut app = App::new(&Config::default());
        let mut outcome = menu();
        outcome.result.columns[1].name = "N".to_string();
        app.apply_outcome(Ok(outcome));

        let screen = draw(&app, 140, 40);
        assert!(screen.contains("Freezing Point"));
        assert!(!screen.contains(" per "));
    }

    #[test]
    fn test_small_terminal_does_not_panic() {
        let mut app = App::new(&Config::default());
        app.apply_outcome(Ok(menu()));
        draw(&app, 20, 8);
    }
}
