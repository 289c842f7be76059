use super::KeyResult;
use crate::employee::DepartmentFilter;
use crate::ui::renderfns::department_color;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Events emitted by the department bar that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepartmentBarEvent {
  /// User moved to a different tab
  Changed(DepartmentFilter),
}

/// Department filter tabs: "All" followed by every department
#[derive(Debug, Clone)]
pub struct DepartmentBar {
  options: Vec<DepartmentFilter>,
  selected: usize, // 0 = All
}

impl Default for DepartmentBar {
  fn default() -> Self {
    Self::new()
  }
}

impl DepartmentBar {
  pub fn new() -> Self {
    Self {
      options: DepartmentFilter::options(),
      selected: 0,
    }
  }

  pub fn selected(&self) -> DepartmentFilter {
    self.options.get(self.selected).copied().unwrap_or_default()
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<DepartmentBarEvent> {
    match key.code {
      KeyCode::PageUp | KeyCode::BackTab => {
        self.navigate(-1);
        KeyResult::Event(DepartmentBarEvent::Changed(self.selected()))
      }
      KeyCode::PageDown | KeyCode::Tab => {
        self.navigate(1);
        KeyResult::Event(DepartmentBarEvent::Changed(self.selected()))
      }
      _ => KeyResult::NotHandled,
    }
  }

  /// Navigate tabs with wrapping
  fn navigate(&mut self, direction: i32) {
    let total_tabs = self.options.len();
    self.selected = if direction > 0 {
      (self.selected + 1) % total_tabs
    } else if self.selected == 0 {
      total_tabs - 1
    } else {
      self.selected - 1
    };
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::styled(
      "[Department] ",
      Style::default().fg(Color::Yellow),
    )];

    for (idx, option) in self.options.iter().enumerate() {
      if idx > 0 {
        spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
      }
      let style = if idx == self.selected {
        Style::default().fg(Color::Black).bg(Color::Cyan)
      } else {
        match option.department() {
          Some(d) => Style::default().fg(department_color(d)),
          None => Style::default().fg(Color::Gray),
        }
      };
      let label = match option {
        DepartmentFilter::All => " All ".to_string(),
        DepartmentFilter::Only(d) => format!(" {} ", d),
      };
      spans.push(Span::styled(label, style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
  }
}
