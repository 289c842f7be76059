use crate::auth::Session;
use crate::employee::StoreError;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;

/// Result of a background sign-in attempt
#[derive(Debug)]
pub enum AuthEvent {
  SignedIn(Session),
  Failed(StoreError),
}

/// Application events
#[derive(Debug)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Periodic tick: debounce timers, toast expiry and cache polling
  Tick,
  Auth(AuthEvent),
}

/// Merges terminal input, a tick timer and events sent by background tasks
pub struct EventHandler {
  tx: mpsc::UnboundedSender<Event>,
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  pub fn new(tick_rate: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    // crossterm's poll blocks, so the reader gets its own thread
    let input_tx = tx.clone();
    tokio::task::spawn_blocking(move || loop {
      let event = match event::poll(tick_rate) {
        Ok(true) => match event::read() {
          Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => Event::Key(key),
          // Resize and friends just trigger a redraw
          Ok(_) => Event::Tick,
          Err(e) => {
            tracing::warn!(error = %e, "failed to read terminal event");
            Event::Tick
          }
        },
        Ok(false) => Event::Tick,
        Err(e) => {
          tracing::error!(error = %e, "terminal event polling failed");
          break;
        }
      };
      if input_tx.send(event).is_err() {
        break;
      }
    });

    Self { tx, rx }
  }

  /// Sender for background tasks reporting back to the loop
  pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
    self.tx.clone()
  }

  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}
