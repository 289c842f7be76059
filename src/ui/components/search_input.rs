use super::input::{InputResult, TextInput};
use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

const PLACEHOLDER: &str = "Search by name, email, or job title...";

/// Events emitted by search input that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
  /// Search text changed (emitted on each keystroke, empty string on cancel)
  Changed(String),
  /// Enter pressed; focus leaves the box and the text stays
  Submitted,
}

/// Search box with activation/deactivation
#[derive(Debug, Clone, Default)]
pub struct SearchInput {
  input: TextInput,
  active: bool,
}

impl SearchInput {
  pub fn new() -> Self {
    Self::default()
  }

  /// Check if search is currently active
  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Get the current search text
  #[cfg(test)]
  pub fn query(&self) -> &str {
    self.input.value()
  }

  /// Focus the box, keeping existing text for editing
  pub fn activate(&mut self) {
    self.active = true;
  }

  /// Handle a key event
  /// Call this regardless of active state - it handles activation too
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<SearchEvent> {
    if !self.active {
      if key.code == KeyCode::Char('/') {
        self.activate();
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    match self.input.handle_key(key) {
      InputResult::Submitted(_) => {
        self.active = false;
        KeyResult::Event(SearchEvent::Submitted)
      }
      InputResult::Cancelled => {
        self.active = false;
        self.input.clear();
        KeyResult::Event(SearchEvent::Changed(String::new()))
      }
      InputResult::Consumed => {
        KeyResult::Event(SearchEvent::Changed(self.input.value().to_string()))
      }
      // Swallow everything else while focused
      InputResult::NotHandled => KeyResult::Handled,
    }
  }

  /// Render the search box. `pending` marks text not yet applied to the list.
  pub fn render(&self, frame: &mut Frame, area: Rect, pending: bool) {
    let border = if self.active {
      Color::Yellow
    } else {
      Color::DarkGray
    };
    let title = if pending { " Search … " } else { " Search " };
    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(border))
      .title(title);

    let mut spans = vec![Span::styled("/ ", Style::default().fg(Color::Yellow))];
    if self.input.is_empty() && !self.active {
      spans.push(Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)));
    } else {
      spans.push(Span::raw(self.input.value()));
      if self.active {
        spans.push(Span::styled("_", Style::default().fg(Color::Yellow))); // Cursor
      }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
  }
}
