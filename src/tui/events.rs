//! Event handling for the TUI.
//!
//! Processes keyboard and terminal events using crossterm.

use crate::error::{Result, SnowpaneError};
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Terminal events the page reacts to.
#[derive(Debug)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// The terminal was resized.
    Resize(u16, u16),
    /// Nothing happened within the tick rate.
    Tick,
}

/// Polls the terminal for events.
#[derive(Debug, Clone, Copy)]
pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    /// Creates a new event handler with default tick rate.
    pub fn new() -> Self {
        Self {
            tick_rate: Duration::from_millis(100),
        }
    }

    /// Creates a new event handler with a custom tick rate.
    pub fn with_tick_rate(tick_rate: Duration) -> Self {
        Self { tick_rate }
    }

    /// Waits up to the tick rate for the next event.
    ///
    /// Blocks the calling thread; the async loop runs it on the blocking pool.
    pub fn next(&self) -> Result<Event> {
        let ready = event::poll(self.tick_rate)
            .map_err(|e| SnowpaneError::internal(format!("Failed to poll events: {e}")))?;
        if !ready {
            return Ok(Event::Tick);
        }

        let event = event::read()
            .map_err(|e| SnowpaneError::internal(format!("Failed to read event: {e}")))?;

        Ok(match event {
            // Windows reports releases too.
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Event::Key(key),
            CrosstermEvent::Resize(width, height) => Event::Resize(width, height),
            _ => Event::Tick,
        })
    }
}

impl EventHandler {
    /// Polls the terminal on the blocking pool and sends every non-tick
    /// event to `tx`, so no key read is dropped while the loop is busy.
    ///
    /// Stops when `tx`'s receiver is dropped or polling fails.
    pub fn forward(self, tx: mpsc::Sender<Result<Event>>) -> JoinHandle<()> {
        tokio::task::spawn_blocking(move || pump(|| self.next(), &tx))
    }
}

/// Moves events from `source` into `tx` until the receiver goes away or
/// `source` fails. The failure is delivered before stopping.
fn pump<F>(mut source: F, tx: &mpsc::Sender<Result<Event>>)
where
    F: FnMut() -> Result<Event>,
{
    loop {
        let event = source();
        match event {
            Ok(Event::Tick) => {
                if tx.is_closed() {
                    return;
                }
            }
            Ok(event) => {
                if tx.blocking_send(Ok(event)).is_err() {
                    return;
                }
            }
            Err(e) => {
                let _ = tx.blocking_send(Err(e));
                return;
            }
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    #[test]
    fn test_event_handler_creation() {
        let handler = EventHandler::new();
        assert_eq!(handler.tick_rate, Duration::from_millis(100));
    }

    fn key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    #[tokio::test]
    async fn test_pump_delivers_keys_and_skips_ticks() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut script = vec![Ok(key('a')), Ok(Event::Tick), Ok(key('b'))].into_iter();

        tokio::task::spawn_blocking(move || {
            pump(
                || script.next().unwrap_or_else(|| Err(SnowpaneError::internal("done"))),
                &tx,
            )
        })
        .await
        .unwrap();

        let mut received = Vec::new();
        while let Some(event) = rx.recv().await {
            received.push(event);
        }

        let keys: Vec<Option<KeyCode>> = received
            .iter()
            .map(|event| match event {
                Ok(Event::Key(k)) => Some(k.code),
                _ => None,
            })
            .collect();
        assert_eq!(keys, vec![Some(KeyCode::Char('a')), Some(KeyCode::Char('b')), None]);
        assert!(received[2].is_err());
    }

    #[tokio::test]
    async fn test_pump_stops_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(8);
        drop(rx);

        tokio::task::spawn_blocking(move || pump(|| Ok(Event::Tick), &tx))
            .await
            .unwrap();
    }

    #[test]
    fn test_event_handler_custom_tick_rate() {
        let handler = EventHandler::with_tick_rate(Duration::from_millis(50));
        assert_eq!(handler.tick_rate, Duration::from_millis(50));
    }
}
