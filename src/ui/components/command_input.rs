use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::commands::{self, Command};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};

const MAX_SUGGESTIONS: usize = 6;

/// Events emitted by the command palette that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEvent {
  /// Canonical command name, or the raw text if nothing matched
  Submitted(String),
  Cancelled,
}

/// `:` command palette with autocomplete
#[derive(Debug, Clone, Default)]
pub struct CommandInput {
  input: TextInput,
  active: bool,
  highlighted: usize,
}

impl CommandInput {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  #[cfg(test)]
  pub fn value(&self) -> &str {
    self.input.value()
  }

  pub fn activate(&mut self) {
    self.active = true;
    self.input.clear();
    self.highlighted = 0;
  }

  fn close(&mut self) {
    self.active = false;
    self.input.clear();
    self.highlighted = 0;
  }

  pub fn suggestions(&self) -> Vec<&'static Command> {
    commands::get_suggestions(self.input.value())
  }

  /// Call this regardless of active state - `:` opens the palette
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<CommandEvent> {
    if !self.active {
      if key.code == KeyCode::Char(':') {
        self.activate();
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    let suggestions = self.suggestions();
    match key.code {
      KeyCode::Esc => {
        self.close();
        KeyResult::Event(CommandEvent::Cancelled)
      }
      KeyCode::Enter => {
        let name = match suggestions.get(self.highlighted) {
          Some(cmd) => cmd.name.to_string(),
          None => self.input.value().trim().to_lowercase(),
        };
        self.close();
        KeyResult::Event(CommandEvent::Submitted(name))
      }
      // Complete the highlighted suggestion into the buffer
      KeyCode::Tab => {
        if let Some(cmd) = suggestions.get(self.highlighted) {
          self.input.set_value(cmd.name);
          self.highlighted = 0;
        }
        KeyResult::Handled
      }
      KeyCode::Down => {
        if !suggestions.is_empty() {
          self.highlighted = (self.highlighted + 1) % suggestions.len();
        }
        KeyResult::Handled
      }
      KeyCode::Up => {
        if !suggestions.is_empty() {
          self.highlighted = self
            .highlighted
            .checked_sub(1)
            .unwrap_or(suggestions.len() - 1);
        }
        KeyResult::Handled
      }
      _ => match self.input.handle_key(key) {
        InputResult::Consumed => {
          self.highlighted = 0;
          KeyResult::Handled
        }
        _ => KeyResult::Handled,
      },
    }
  }

  /// Draw the palette over the top of `area` if open
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let suggestions = self.suggestions();
    let shown = suggestions.len().min(MAX_SUGGESTIONS) as u16;
    let width = (area.width * 60 / 100).clamp(30.min(area.width), 64);
    let height = (3 + shown).min(area.height);
    let overlay_area = Rect::new(area.x + 1, area.y + 1, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Command ");
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(1), Constraint::Min(0)])
      .split(inner);

    frame.render_widget(
      Paragraph::new(Line::from(vec![
        Span::styled(":", Style::default().fg(Color::Yellow)),
        Span::raw(self.input.value()),
        Span::styled("_", Style::default().fg(Color::Yellow)),
      ])),
      chunks[0],
    );

    if suggestions.is_empty() || chunks[1].height == 0 {
      return;
    }

    let items: Vec<ListItem> = suggestions
      .iter()
      .take(MAX_SUGGESTIONS)
      .map(|cmd| {
        ListItem::new(Line::from(vec![
          Span::styled(format!("{:<11}", cmd.name), Style::default().fg(Color::Cyan)),
          Span::styled(
            format!("{:<14}", cmd.aliases.join(",")),
            Style::default().fg(Color::DarkGray),
          ),
          Span::raw(cmd.description),
        ]))
      })
      .collect();

    let list = List::new(items).highlight_style(Style::default().bg(Color::DarkGray).bold());
    let mut state = ListState::default();
    state.select(Some(self.highlighted.min(MAX_SUGGESTIONS - 1)));
    frame.render_stateful_widget(list, chunks[1], &mut state);
  }
}
