use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::auth::Route;
use crate::cache::{MutationOutcome, QueryCache};
use crate::employee::Employee;
use crate::query::QueryState;
use crate::search::SearchController;
use crate::ui::components::{
  DepartmentBar, DepartmentBarEvent, EmployeeForm, EmployeeGrid, FormEvent, GridEvent, KeyResult,
  SearchEvent, SearchInput,
};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Root view: searchable, filterable grid of every employee
pub struct DirectoryView {
  search: SearchController,
  search_input: SearchInput,
  departments: DepartmentBar,
  grid: EmployeeGrid,
  form: EmployeeForm,
}

impl DirectoryView {
  pub fn new(debounce: Duration) -> Self {
    Self {
      search: SearchController::new(debounce),
      search_input: SearchInput::new(),
      departments: DepartmentBar::new(),
      grid: EmployeeGrid::new(),
      form: EmployeeForm::new(),
    }
  }

  fn handle_overlays(&mut self, key: KeyEvent, cache: &mut QueryCache) -> Option<ViewAction> {
    match self.form.handle_key(key) {
      KeyResult::Handled | KeyResult::Event(FormEvent::Cancelled) => return Some(ViewAction::None),
      KeyResult::Event(FormEvent::Submit(data)) => {
        let ticket = cache.create(data);
        self.form.set_submitting(ticket);
        return Some(ViewAction::None);
      }
      KeyResult::NotHandled => {}
    }

    match self.search_input.handle_key(key) {
      KeyResult::Handled => return Some(ViewAction::None),
      KeyResult::Event(SearchEvent::Changed(text)) => {
        self.search.set_text(text, Instant::now());
        return Some(ViewAction::None);
      }
      KeyResult::Event(SearchEvent::Submitted) => {
        if self.search.apply_now() {
          self.grid.reset();
        }
        return Some(ViewAction::None);
      }
      KeyResult::NotHandled => {}
    }

    match self.departments.handle_key(key) {
      KeyResult::Event(DepartmentBarEvent::Changed(filter)) => {
        if self.search.set_department(filter) {
          self.grid.reset();
        }
        Some(ViewAction::None)
      }
      KeyResult::Handled => Some(ViewAction::None),
      KeyResult::NotHandled => None,
    }
  }

  fn handle_navigation(&mut self, key: KeyEvent, cache: &mut QueryCache) -> Option<ViewAction> {
    let query = cache.use_employees(self.search.applied(), self.search.department());
    let employees = query.data().map(|v| v.as_slice()).unwrap_or_default();
    match self.grid.handle_key(key, employees) {
      KeyResult::Handled => Some(ViewAction::None),
      KeyResult::Event(GridEvent::Open(id)) => Some(ViewAction::Open(Route::EmployeeDetail { id })),
      KeyResult::NotHandled => None,
    }
  }

  fn handle_actions(&mut self, key: KeyEvent, cache: &mut QueryCache) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('n') | KeyCode::Char('a') => {
        self.form.open_create();
        Some(ViewAction::None)
      }
      KeyCode::Char('r') => {
        cache.refetch(&self.search.list_key());
        Some(ViewAction::None)
      }
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }

  fn render_heading(&self, frame: &mut Frame, area: Rect, employees: Option<&[Employee]>) {
    let stat = |label: &str, value: Option<usize>| {
      vec![
        Span::styled(format!("{} ", label), Style::default().fg(Color::DarkGray)),
        Span::styled(
          value.map_or_else(|| "-".to_string(), |v| v.to_string()),
          Style::default().fg(Color::White).bold(),
        ),
      ]
    };

    let total = employees.map(|e| e.len());
    let active = employees.map(|e| e.iter().filter(|e| e.is_active).count());
    let departments =
      employees.map(|e| e.iter().map(|e| e.department).collect::<HashSet<_>>().len());

    let separator = || Span::styled("  │  ", Style::default().fg(Color::DarkGray));
    let mut stats = stat("Total", total);
    stats.push(separator());
    stats.extend(stat("Active", active));
    stats.push(separator());
    stats.extend(stat("Departments", departments));

    let lines = vec![
      Line::from(Span::styled(
        "Employee Directory",
        Style::default().fg(Color::White).bold(),
      )),
      Line::from(Span::styled(
        "Manage and explore your team members",
        Style::default().fg(Color::DarkGray),
      )),
      Line::from(stats),
    ];
    frame.render_widget(Paragraph::new(lines), area);
  }
}

impl View for DirectoryView {
  fn handle_key(&mut self, key: KeyEvent, cache: &mut QueryCache) -> ViewAction {
    self
      .handle_overlays(key, cache)
      .or_else(|| self.handle_navigation(key, cache))
      .or_else(|| self.handle_actions(key, cache))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, cache: &QueryCache) {
    let query = cache.employees(self.search.applied(), self.search.department());

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(3), // Title and stats
        Constraint::Length(3), // Search box
        Constraint::Length(1), // Department tabs
        Constraint::Min(0),    // Grid
      ])
      .split(area);

    self.render_heading(frame, chunks[0], query.data().map(|v| v.as_slice()));
    self
      .search_input
      .render(frame, chunks[1], self.search.is_pending());
    self.departments.render(frame, chunks[2]);

    let title = match query.state() {
      QueryState::Loading => " Employees (loading...) ".to_string(),
      QueryState::Error if query.data().is_some() => {
        " Employees (refresh failed, press 'r') ".to_string()
      }
      _ => match query.data() {
        Some(rows) => format!(" Employees ({}) ", rows.len()),
        None => " Employees ".to_string(),
      },
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(chunks[3]);
    frame.render_widget(block, chunks[3]);
    self.grid.render(frame, inner, query);

    self.form.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self, _cache: &QueryCache) -> String {
    match self.search.applied() {
      "" => "Directory".to_string(),
      text => format!("Directory [{}]", text),
    }
  }

  fn route(&self) -> Route {
    Route::Directory
  }

  fn tick(&mut self, cache: &mut QueryCache, now: Instant) {
    if self.search.tick(now) {
      self.grid.reset();
    }
    cache.ensure_employees(self.search.applied(), self.search.department());
  }

  fn on_mutation(&mut self, outcome: &MutationOutcome) -> ViewAction {
    self.form.on_outcome(outcome);
    ViewAction::None
  }

  fn command(&mut self, name: &str) -> bool {
    match name {
      "add" => {
        self.form.open_create();
        true
      }
      _ => false,
    }
  }

  fn captures_input(&self) -> bool {
    self.form.is_active() || self.search_input.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("Tab", "department").with_priority(30),
      ShortcutInfo::new("n", "add").with_priority(40),
      ShortcutInfo::new("Enter", "open").with_priority(50),
      ShortcutInfo::new("r", "refresh").with_priority(60),
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("q", "quit").with_priority(90),
    ]
  }
}
