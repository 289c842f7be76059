use super::KeyResult;
use crate::ui::renderfns::centered_rect;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Events emitted by the confirm dialog that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmEvent {
  Confirmed,
  Cancelled,
}

/// Modal yes/no prompt for destructive actions
#[derive(Debug, Clone, Default)]
pub struct ConfirmDialog {
  active: bool,
  title: String,
  message: String,
  confirm_label: String,
  /// Confirm button focused; defaults to cancel
  confirm_focused: bool,
}

impl ConfirmDialog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn show(
    &mut self,
    title: impl Into<String>,
    message: impl Into<String>,
    confirm_label: impl Into<String>,
  ) {
    self.active = true;
    self.title = title.into();
    self.message = message.into();
    self.confirm_label = confirm_label.into();
    self.confirm_focused = false;
  }

  pub fn hide(&mut self) {
    self.active = false;
    self.confirm_focused = false;
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<ConfirmEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('q') => {
        self.hide();
        KeyResult::Event(ConfirmEvent::Cancelled)
      }
      KeyCode::Char('y') => {
        self.hide();
        KeyResult::Event(ConfirmEvent::Confirmed)
      }
      KeyCode::Enter => {
        let confirmed = self.confirm_focused;
        self.hide();
        if confirmed {
          KeyResult::Event(ConfirmEvent::Confirmed)
        } else {
          KeyResult::Event(ConfirmEvent::Cancelled)
        }
      }
      KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char('h') | KeyCode::Char('l') => {
        self.confirm_focused = !self.confirm_focused;
        KeyResult::Handled
      }
      // Modal: swallow everything else
      _ => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = 56.min(area.width.saturating_sub(4)).max(20);
    let height = 8.min(area.height);
    let overlay_area = centered_rect(area, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(format!(" {} ", self.title))
      .title_alignment(Alignment::Center);

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Min(1), Constraint::Length(1)])
      .split(inner);

    frame.render_widget(
      Paragraph::new(self.message.as_str()).wrap(Wrap { trim: true }),
      chunks[0],
    );

    let button = |label: &str, focused: bool, color: Color| {
      let style = if focused {
        Style::default().fg(Color::Black).bg(color).bold()
      } else {
        Style::default().fg(color)
      };
      Span::styled(format!(" {} ", label), style)
    };
    let buttons = Line::from(vec![
      button("Cancel", !self.confirm_focused, Color::Gray),
      Span::raw("  "),
      button(&self.confirm_label, self.confirm_focused, Color::Red),
    ])
    .alignment(Alignment::Right);
    frame.render_widget(Paragraph::new(buttons), chunks[1]);
  }
}
