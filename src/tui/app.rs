//! Application state for the TUI.
//!
//! Contains the page state (editor, limit toggle, last result, status) and
//! the key handling that drives it. Nothing here touches the terminal or the
//! warehouse; the runner in `tui::mod` turns [`AppAction`]s into queries.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::chart::ChartSeries;
use crate::config::{ChartConfig, Config};
use crate::db::QueryResult;
use crate::error::{Result, SnowpaneError};
use crate::query::{QueryOutcome, QueryRequest, SessionContext};

/// Lines moved by PageUp/PageDown in the results panel.
const PAGE_SIZE: usize = 10;

/// Which panel currently has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Editor,
    Results,
}

impl Focus {
    /// Cycles to the next focus panel.
    pub fn next(self) -> Self {
        match self {
            Self::Editor => Self::Results,
            Self::Results => Self::Editor,
        }
    }
}

/// What the event loop should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    None,
    Run(QueryRequest),
    Quit,
}

/// State of the connection status strip.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContextStatus {
    #[default]
    Loading,
    Ready(SessionContext),
    Failed {
        message: String,
        diagnostic: Option<String>,
    },
}

/// Outcome line shown between the editor and the results.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Running,
    /// The session expired mid-run; a fresh one is being opened.
    Reconnecting,
    Success(String),
    Warning(String),
    Error {
        message: String,
        diagnostic: Option<String>,
    },
}

impl Status {
    fn from_error(heading: &str, error: &SnowpaneError) -> Self {
        Self::Error {
            message: format!("{heading}: {error}"),
            diagnostic: error.diagnostic(),
        }
    }
}

/// Multi-line SQL editor state.
///
/// The cursor is kept as (line, column) where the column counts characters,
/// not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorState {
    lines: Vec<String>,
    row: usize,
    col: usize,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            lines: vec![String::new()],
            row: 0,
            col: 0,
        }
    }
}

impl EditorState {
    /// Creates an editor holding `text`, cursor at the end.
    pub fn with_text(text: &str) -> Self {
        let mut editor = Self::default();
        editor.set_text(text);
        editor
    }

    /// Replaces the contents and moves the cursor to the end.
    pub fn set_text(&mut self, text: &str) {
        self.lines = text.split('\n').map(str::to_string).collect();
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.row = self.lines.len() - 1;
        self.col = self.current_len();
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Cursor position as (line, character column).
    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_offset();
        self.lines[self.row].insert(at, c);
        self.col += 1;
    }

    /// Splits the current line at the cursor.
    pub fn newline(&mut self) {
        let at = self.byte_offset();
        let rest = self.lines[self.row].split_off(at);
        self.lines.insert(self.row + 1, rest);
        self.row += 1;
        self.col = 0;
    }

    /// Deletes the character before the cursor, joining lines at column 0.
    pub fn backspace(&mut self) {
        if self.col > 0 {
            self.col -= 1;
            let at = self.byte_offset();
            self.lines[self.row].remove(at);
        } else if self.row > 0 {
            let line = self.lines.remove(self.row);
            self.row -= 1;
            self.col = self.current_len();
            self.lines[self.row].push_str(&line);
        }
    }

    /// Deletes the character at the cursor, joining lines at the end.
    pub fn delete(&mut self) {
        if self.col < self.current_len() {
            let at = self.byte_offset();
            self.lines[self.row].remove(at);
        } else if self.row + 1 < self.lines.len() {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&next);
        }
    }

    pub fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.current_len();
        }
    }

    pub fn move_right(&mut self) {
        if self.col < self.current_len() {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub fn move_up(&mut self) {
        if self.row > 0 {
            self.row -= 1;
            self.col = self.col.min(self.current_len());
        }
    }

    pub fn move_down(&mut self) {
        if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = self.col.min(self.current_len());
        }
    }

    pub fn move_home(&mut self) {
        self.col = 0;
    }

    pub fn move_end(&mut self) {
        self.col = self.current_len();
    }

    fn current_len(&self) -> usize {
        self.lines[self.row].chars().count()
    }

    fn byte_offset(&self) -> usize {
        let line = &self.lines[self.row];
        line.char_indices()
            .nth(self.col)
            .map(|(i, _)| i)
            .unwrap_or(line.len())
    }
}

/// Main application state.
pub struct App {
    /// Whether the application is still running.
    pub running: bool,
    pub focus: Focus,
    pub editor: EditorState,
    /// State of the "Limit results" toggle.
    pub limit_rows: bool,
    pub row_limit: usize,
    pub context: ContextStatus,
    pub status: Status,
    /// Statement submitted by the last successful run.
    pub last_sql: Option<String>,
    pub result: Option<QueryResult>,
    pub chart: Option<ChartSeries>,
    /// First result row shown in the table.
    pub results_scroll: usize,
    chart_config: ChartConfig,
}

impl App {
    /// Creates the page with the configured default query and toggle state.
    pub fn new(config: &Config) -> Self {
        Self {
            running: true,
            focus: Focus::default(),
            editor: EditorState::with_text(config.query.default_sql.trim()),
            limit_rows: config.query.limit_by_default,
            row_limit: config.query.row_limit,
            context: ContextStatus::default(),
            status: Status::default(),
            last_sql: None,
            result: None,
            chart: None,
            results_scroll: 0,
            chart_config: config.chart.clone(),
        }
    }

    /// Label of the limit toggle, e.g. "Limit results to 200 rows".
    pub fn limit_label(&self) -> String {
        format!("Limit results to {} rows", self.row_limit)
    }

    pub fn is_running_query(&self) -> bool {
        matches!(self.status, Status::Running | Status::Reconnecting)
    }

    /// Builds the request for the current editor contents and marks the
    /// page busy. Returns `None` while a query is already in flight.
    pub fn begin_query(&mut self) -> Option<QueryRequest> {
        if self.is_running_query() {
            return None;
        }
        self.status = Status::Running;
        Some(QueryRequest::new(self.editor.text(), self.limit_rows))
    }

    /// Notes that the running query hit an expired session.
    pub fn note_reconnecting(&mut self) {
        if self.is_running_query() {
            self.status = Status::Reconnecting;
        }
    }

    /// Records the outcome of a run.
    pub fn apply_outcome(&mut self, outcome: Result<QueryOutcome>) {
        self.results_scroll = 0;
        match outcome {
            Ok(outcome) => {
                self.status = if outcome.reconnected {
                    Status::Warning(
                        "Query ran successfully! (session had expired and was renewed)"
                            .to_string(),
                    )
                } else {
                    Status::Success("Query ran successfully!".to_string())
                };
                self.chart = ChartSeries::from_result(&outcome.result, &self.chart_config);
                self.last_sql = Some(outcome.sql);
                self.result = Some(outcome.result);
            }
            Err(e) => {
                self.status = Status::from_error("Error running query", &e);
                self.result = None;
                self.chart = None;
            }
        }
    }

    /// Records the session context read.
    pub fn apply_context(&mut self, context: Result<SessionContext>) {
        self.context = match context {
            Ok(ctx) => ContextStatus::Ready(ctx),
            Err(e) => ContextStatus::Failed {
                message: e.to_string(),
                diagnostic: e.diagnostic(),
            },
        };
    }

    /// Handles a key press and returns what the event loop should do.
    pub fn handle_key(&mut self, key: KeyEvent) -> AppAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => {
                self.running = false;
                return AppAction::Quit;
            }
            KeyCode::Char('r') if ctrl => return self.run_action(),
            KeyCode::F(5) => return self.run_action(),
            KeyCode::Char('l') if ctrl => {
                self.limit_rows = !self.limit_rows;
                return AppAction::None;
            }
            KeyCode::Tab => {
                self.focus = self.focus.next();
                return AppAction::None;
            }
            _ => {}
        }

        match self.focus {
            Focus::Editor if !ctrl => self.handle_editor_key(key.code),
            Focus::Results => self.handle_results_key(key.code),
            _ => {}
        }
        AppAction::None
    }

    fn run_action(&mut self) -> AppAction {
        match self.begin_query() {
            Some(request) => AppAction::Run(request),
            None => AppAction::None,
        }
    }

    fn handle_editor_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(c) => self.editor.insert(c),
            KeyCode::Enter => self.editor.newline(),
            KeyCode::Backspace => self.editor.backspace(),
            KeyCode::Delete => self.editor.delete(),
            KeyCode::Left => self.editor.move_left(),
            KeyCode::Right => self.editor.move_right(),
            KeyCode::Up => self.editor.move_up(),
            KeyCode::Down => self.editor.move_down(),
            KeyCode::Home => self.editor.move_home(),
            KeyCode::End => self.editor.move_end(),
            _ => {}
        }
    }

    fn handle_results_key(&mut self, code: KeyCode) {
        let max = self
            .result
            .as_ref()
            .map(|r| r.rows.len().saturating_sub(1))
            .unwrap_or(0);

        self.results_scroll = match code {
            KeyCode::Up => self.results_scroll.saturating_sub(1),
            KeyCode::Down => self.results_scroll.saturating_add(1),
            KeyCode::PageUp => self.results_scroll.saturating_sub(PAGE_SIZE),
            KeyCode::PageDown => self.results_scroll.saturating_add(PAGE_SIZE),
            KeyCode::Home => 0,
            KeyCode::End => max,
            _ => self.results_scroll,
        }
        .min(max);
    }
}
