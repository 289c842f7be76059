use super::KeyResult;
use crate::employee::Employee;
use crate::query::Query;
use crate::ui::renderfns::{department_color, truncate};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};

const CARD_HEIGHT: u16 = 7;
const MIN_CARD_WIDTH: u16 = 38;
const MAX_COLUMNS: u16 = 3;
const SKELETON_CARDS: usize = 6;

/// Events emitted by the grid that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridEvent {
  /// Enter pressed on a card; carries the employee id
  Open(String),
}

/// Responsive card grid of employees (1 to 3 columns)
#[derive(Debug, Clone)]
pub struct EmployeeGrid {
  selected: usize,
  columns: usize,
  scroll_row: usize,
}

impl Default for EmployeeGrid {
  fn default() -> Self {
    Self::new()
  }
}

impl EmployeeGrid {
  pub fn new() -> Self {
    Self {
      selected: 0,
      columns: 1,
      scroll_row: 0,
    }
  }

  #[cfg(test)]
  pub fn selected(&self) -> usize {
    self.selected
  }

  /// Jump back to the first card (after the result set changes)
  pub fn reset(&mut self) {
    self.selected = 0;
    self.scroll_row = 0;
  }

  pub fn handle_key(&mut self, key: KeyEvent, employees: &[Employee]) -> KeyResult<GridEvent> {
    if employees.is_empty() {
      return KeyResult::NotHandled;
    }
    let last = employees.len() - 1;
    self.selected = self.selected.min(last);

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.selected = (self.selected + self.columns).min(last);
        KeyResult::Handled
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.selected = self.selected.saturating_sub(self.columns);
        KeyResult::Handled
      }
      KeyCode::Char('l') | KeyCode::Right => {
        self.selected = (self.selected + 1).min(last);
        KeyResult::Handled
      }
      KeyCode::Char('h') | KeyCode::Left => {
        self.selected = self.selected.saturating_sub(1);
        KeyResult::Handled
      }
      KeyCode::Home | KeyCode::Char('g') => {
        self.selected = 0;
        KeyResult::Handled
      }
      KeyCode::End | KeyCode::Char('G') => {
        self.selected = last;
        KeyResult::Handled
      }
      KeyCode::Enter => KeyResult::Event(GridEvent::Open(employees[self.selected].id.clone())),
      _ => KeyResult::NotHandled,
    }
  }

  fn columns_for(width: u16) -> usize {
    (width / MIN_CARD_WIDTH).clamp(1, MAX_COLUMNS) as usize
  }

  /// Render placeholders, the empty/error state, or one card per employee
  pub fn render(&mut self, frame: &mut Frame, area: Rect, query: Query<'_, Vec<Employee>>) {
    self.columns = Self::columns_for(area.width);

    if query.is_initial_loading() {
      self.render_cells(frame, area, SKELETON_CARDS, |frame, cell, _| {
        render_skeleton(frame, cell)
      });
      return;
    }

    let employees = match query.data() {
      Some(employees) => employees,
      None => {
        if let Some(error) = query.error() {
          render_message(
            frame,
            area,
            "Failed to load employees",
            &format!("{}. Press 'r' to retry.", error),
            Color::Red,
          );
        }
        return;
      }
    };

    if employees.is_empty() {
      render_message(
        frame,
        area,
        "No employees found",
        "Try adjusting your search or filters, or add a new employee.",
        Color::DarkGray,
      );
      return;
    }

    self.selected = self.selected.min(employees.len() - 1);
    let selected = self.selected;
    self.render_cells(frame, area, employees.len(), |frame, cell, idx| {
      render_card(frame, cell, &employees[idx], idx == selected)
    });
  }

  fn render_cells<F>(&mut self, frame: &mut Frame, area: Rect, count: usize, mut draw: F)
  where
    F: FnMut(&mut Frame, Rect, usize),
  {
    let columns = self.columns;
    let visible_rows = ((area.height / CARD_HEIGHT) as usize).max(1);
    let selected_row = self.selected / columns;

    // Keep the selected row on screen
    if selected_row < self.scroll_row {
      self.scroll_row = selected_row;
    } else if selected_row >= self.scroll_row + visible_rows {
      self.scroll_row = selected_row + 1 - visible_rows;
    }

    let card_width = area.width / columns as u16;
    for idx in (self.scroll_row * columns)..count {
      let row = idx / columns - self.scroll_row;
      if row >= visible_rows {
        break;
      }
      let col = idx % columns;
      let y = area.y + row as u16 * CARD_HEIGHT;
      let height = CARD_HEIGHT.min(area.y + area.height - y);
      let cell = Rect::new(area.x + col as u16 * card_width, y, card_width, height);
      draw(frame, cell, idx);
    }
  }
}

fn card_block(selected: bool) -> Block<'static> {
  let border = if selected {
    Style::default().fg(Color::Cyan).bold()
  } else {
    Style::default().fg(Color::DarkGray)
  };
  Block::default()
    .borders(Borders::ALL)
    .border_type(BorderType::Rounded)
    .border_style(border)
}

fn render_card(frame: &mut Frame, area: Rect, employee: &Employee, selected: bool) {
  let block = card_block(selected);
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let width = inner.width.saturating_sub(1) as usize;
  let mut name_line = vec![
    Span::styled(
      format!(" {} ", employee.initials()),
      Style::default().fg(Color::Black).bg(Color::Cyan).bold(),
    ),
    Span::raw(" "),
    Span::styled(
      truncate(&employee.full_name(), width.saturating_sub(16)),
      Style::default().fg(Color::White).bold(),
    ),
  ];
  if !employee.is_active {
    name_line.push(Span::styled(" Inactive", Style::default().fg(Color::DarkGray)));
  }

  let extra: Vec<String> = [
    employee.phone.as_ref().map(|p| format!("☎ {}", p)),
    employee.location.as_ref().map(|l| format!("⌖ {}", l)),
  ]
  .into_iter()
  .flatten()
  .collect();

  let lines = vec![
    Line::from(name_line),
    Line::from(Span::styled(
      truncate(&employee.job_title, width),
      Style::default().fg(Color::Gray),
    )),
    Line::from(Span::styled(
      format!(" {} ", employee.department),
      Style::default()
        .fg(Color::Black)
        .bg(department_color(employee.department)),
    )),
    Line::from(Span::styled(
      format!("✉ {}", truncate(&employee.email, width.saturating_sub(2))),
      Style::default().fg(Color::Gray),
    )),
    Line::from(Span::styled(
      truncate(&extra.join("  "), width),
      Style::default().fg(Color::Gray),
    )),
  ];

  frame.render_widget(Paragraph::new(lines), inner);
}

fn render_skeleton(frame: &mut Frame, area: Rect) {
  let block = card_block(false);
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let bar = |fraction: u16| {
    let len = (inner.width * fraction / 10) as usize;
    Line::from(Span::styled(
      "▒".repeat(len),
      Style::default().fg(Color::DarkGray),
    ))
  };
  let lines = vec![bar(6), bar(4), bar(2), Line::default(), bar(8)];
  frame.render_widget(Paragraph::new(lines), inner);
}

fn render_message(frame: &mut Frame, area: Rect, title: &str, detail: &str, color: Color) {
  let lines = vec![
    Line::default(),
    Line::from(Span::styled(title.to_string(), Style::default().fg(color).bold())),
    Line::from(Span::styled(
      detail.to_string(),
      Style::default().fg(Color::DarkGray),
    )),
  ];
  let paragraph = Paragraph::new(lines)
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
  frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::employee::fixtures::employee;
  use crate::employee::{Department, StoreError};
  use crate::query::QueryState;
  use crossterm::event::KeyModifiers;
  use ratatui::backend::TestBackend;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn render(grid: &mut EmployeeGrid, query: Query<'_, Vec<Employee>>) -> String {
    let mut terminal = Terminal::new(TestBackend::new(120, 21)).unwrap();
    terminal
      .draw(|frame| grid.render(frame, frame.area(), query))
      .unwrap();
    terminal
      .backend()
      .buffer()
      .content()
      .iter()
      .map(|cell| cell.symbol())
      .collect()
  }

  fn roster() -> Vec<Employee> {
    (0..5)
      .map(|i| employee(&i.to_string(), "Ann", &format!("Baker{}", i), Department::Sales))
      .collect()
  }

  #[test]
  fn test_initial_load_shows_six_placeholders() {
    let mut grid = EmployeeGrid::new();
    let screen = render(&mut grid, Query::new(QueryState::Loading, None, None, false));
    assert_eq!(screen.matches('╭').count(), SKELETON_CARDS);
    assert!(screen.contains('▒'));
  }

  #[test]
  fn test_empty_result_shows_empty_state() {
    let mut grid = EmployeeGrid::new();
    let empty = Vec::new();
    let screen = render(
      &mut grid,
      Query::new(QueryState::Success, Some(&empty), None, false),
    );
    assert!(screen.contains("No employees found"));
  }

  #[test]
  fn test_error_without_data_shows_message() {
    let mut grid = EmployeeGrid::new();
    let err = StoreError::transport("connection refused");
    let screen = render(&mut grid, Query::new(QueryState::Error, None, Some(&err), false));
    assert!(screen.contains("Failed to load employees"));
    assert!(screen.contains("connection refused"));
  }

  #[test]
  fn test_error_with_data_keeps_cards() {
    let mut grid = EmployeeGrid::new();
    let rows = roster();
    let err = StoreError::transport("connection refused");
    let screen = render(
      &mut grid,
      Query::new(QueryState::Error, Some(&rows), Some(&err), false),
    );
    assert!(screen.contains("Ann Baker0"));
    assert!(!screen.contains("Failed to load"));
  }

  #[test]
  fn test_navigation_moves_by_row_and_opens() {
    let mut grid = EmployeeGrid::new();
    let rows = roster();
    render(
      &mut grid,
      Query::new(QueryState::Success, Some(&rows), None, false),
    );
    assert_eq!(grid.columns, 3);

    grid.handle_key(key(KeyCode::Down), &rows);
    assert_eq!(grid.selected(), 3);
    grid.handle_key(key(KeyCode::Down), &rows);
    assert_eq!(grid.selected(), 4);
    grid.handle_key(key(KeyCode::Left), &rows);
    assert_eq!(
      grid.handle_key(key(KeyCode::Enter), &rows),
      KeyResult::Event(GridEvent::Open("3".to_string()))
    );
    assert_eq!(grid.handle_key(key(KeyCode::Enter), &[]), KeyResult::NotHandled);
  }
}
