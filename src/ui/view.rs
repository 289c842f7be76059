use std::time::Instant;

use crossterm::event::KeyEvent;
use ratatui::prelude::*;

use crate::auth::Route;
use crate::cache::{MutationOutcome, QueryCache};

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  pub priority: u8, // Lower = shown first
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }
}

/// Actions that a view can request in response to user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
  /// No action needed
  None,
  /// Navigate to a route; the app runs the route guard first
  Open(Route),
  /// Pop current view from stack (go back)
  Pop,
  /// Return to the directory, dropping every view above it
  Home,
  /// Show an informational toast
  Notify(String),
  /// Submit credentials to the auth provider
  SignIn { email: String, password: String },
  Quit,
}

/// Trait for views on the protected navigation stack.
///
/// Views own only transient UI state (selection, open dialogs, input
/// buffers). Everything fetched from the store lives in the [`QueryCache`];
/// views ask for it in `tick()` and read it back in `render()`.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent, cache: &mut QueryCache) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect, cache: &QueryCache);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self, cache: &QueryCache) -> String;

  /// Route that re-creates this view, used to come back after re-login
  fn route(&self) -> Route;

  /// Called on every loop iteration so the view can keep its queries alive
  fn tick(&mut self, _cache: &mut QueryCache, _now: Instant) {}

  /// Called for every settled mutation, whether or not this view submitted it
  fn on_mutation(&mut self, _outcome: &MutationOutcome) -> ViewAction {
    ViewAction::None
  }

  /// Run a view-specific `:` command. Returns false if the view has none by that name.
  fn command(&mut self, _name: &str) -> bool {
    false
  }

  /// True while a text field or dialog owns the keyboard, so global keys
  /// like `:` are passed through
  fn captures_input(&self) -> bool {
    false
  }

  /// Get keyboard shortcuts to display in the header
  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
