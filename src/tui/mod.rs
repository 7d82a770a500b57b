//! Terminal User Interface for Snowpane.
//!
//! Provides the main TUI application loop using ratatui and crossterm.

pub mod app;
mod events;
pub mod headless;
mod ui;
pub mod widgets;

pub use app::{App, AppAction};
pub use events::{Event, EventHandler};

use crate::config::Config;
use crate::error::{Result, SnowpaneError};
use crate::query::{read_context, QueryOutcome, QueryRequest, QueryRunner, SessionContext};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::panic;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Messages sent from background tasks to the main loop.
#[derive(Debug)]
pub enum AsyncMessage {
    /// The session context read finished.
    Context(Result<SessionContext>),
    /// The running query hit an expired session and is reconnecting.
    Reconnecting,
    /// A query run finished.
    Query(Result<QueryOutcome>),
}

/// The main TUI application runner.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_handler: EventHandler,
}

impl Tui {
    /// Creates a new TUI instance, initializing the terminal.
    pub fn new() -> Result<Self> {
        let terminal = Self::setup_terminal()?;
        Ok(Self {
            terminal,
            event_handler: EventHandler::new(),
        })
    }

    /// Sets up the terminal for TUI rendering.
    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()
            .map_err(|e| SnowpaneError::internal(format!("Failed to enable raw mode: {e}")))?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).map_err(|e| {
            SnowpaneError::internal(format!("Failed to enter alternate screen: {e}"))
        })?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)
            .map_err(|e| SnowpaneError::internal(format!("Failed to create terminal: {e}")))?;

        Ok(terminal)
    }

    /// Restores the terminal to its original state.
    fn restore_terminal(&mut self) -> Result<()> {
        disable_raw_mode()
            .map_err(|e| SnowpaneError::internal(format!("Failed to disable raw mode: {e}")))?;

        execute!(self.terminal.backend_mut(), LeaveAlternateScreen).map_err(|e| {
            SnowpaneError::internal(format!("Failed to leave alternate screen: {e}"))
        })?;

        self.terminal
            .show_cursor()
            .map_err(|e| SnowpaneError::internal(format!("Failed to show cursor: {e}")))?;

        Ok(())
    }

    /// Runs the page until the user quits.
    pub async fn run(&mut self, runner: Arc<QueryRunner>, settings: &Config) -> Result<()> {
        // Restore the terminal before the default hook prints the panic.
        let original_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            original_hook(panic_info);
        }));

        let connection_info = runner.sessions().config().display_string();
        let mut app_state = App::new(settings);
        let (tx, mut rx) = mpsc::channel::<AsyncMessage>(8);

        spawn_context_read(Arc::clone(&runner), tx.clone());

        let result = self
            .run_event_loop(&mut app_state, &runner, &connection_info, tx, &mut rx)
            .await;

        let _ = panic::take_hook();
        result
    }

    /// The main event loop, separated for cleaner error handling.
    async fn run_event_loop(
        &mut self,
        app_state: &mut App,
        runner: &Arc<QueryRunner>,
        connection_info: &str,
        tx: mpsc::Sender<AsyncMessage>,
        rx: &mut mpsc::Receiver<AsyncMessage>,
    ) -> Result<()> {
        let (event_tx, mut events) = mpsc::channel::<Result<Event>>(32);
        let _input_task = self.event_handler.forward(event_tx);

        loop {
            self.terminal
                .draw(|frame| ui::render(frame, app_state, connection_info))
                .map_err(|e| SnowpaneError::internal(format!("Failed to draw: {e}")))?;

            if !app_state.running {
                break;
            }

            tokio::select! {
                Some(event) = events.recv() => {
                    if let Event::Key(key) = event? {
                        match app_state.handle_key(key) {
                            AppAction::Run(request) => {
                                debug!("Running query ({} chars)", request.sql.len());
                                spawn_query(Arc::clone(runner), request, tx.clone());
                            }
                            AppAction::Quit => info!("Quit requested"),
                            AppAction::None => {}
                        }
                    }
                }

                Some(msg) = rx.recv() => {
                    handle_async_message(msg, app_state);
                }

                else => break,
            }
        }

        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}

fn spawn_query(
    runner: Arc<QueryRunner>,
    request: QueryRequest,
    tx: mpsc::Sender<AsyncMessage>,
) {
    tokio::spawn(async move {
        let notice = tx.clone();
        let outcome = runner
            .run_observed(&request, |_| {
                let _ = notice.try_send(AsyncMessage::Reconnecting);
            })
            .await;
        let _ = tx.send(AsyncMessage::Query(outcome)).await;
    });
}

fn spawn_context_read(runner: Arc<QueryRunner>, tx: mpsc::Sender<AsyncMessage>) {
    tokio::spawn(async move {
        let context = read_context(&runner).await;
        let _ = tx.send(AsyncMessage::Context(context)).await;
    });
}

/// Applies a background task's result to the page.
fn handle_async_message(msg: AsyncMessage, app_state: &mut App) {
    match msg {
        AsyncMessage::Context(context) => {
            if let Err(e) = &context {
                warn!("Could not read session context: {}", e);
            }
            app_state.apply_context(context);
        }
        AsyncMessage::Reconnecting => app_state.note_reconnecting(),
        AsyncMessage::Query(outcome) => {
            match &outcome {
                Ok(o) if o.reconnected => warn!("Query succeeded after reconnecting"),
                Ok(o) => debug!("Query returned {} rows", o.result.row_count),
                Err(e) => warn!("Query failed: {}", e),
            }
            app_state.apply_outcome(outcome);
        }
    }
}

/// Runs the terminal page.
pub async fn run(runner: Arc<QueryRunner>, settings: &Config) -> Result<()> {
    let mut tui = Tui::new()?;
    tui.run(runner, settings).await
}
