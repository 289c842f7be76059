use std::time::Instant;

use crate::auth::Route;
use crate::cache::{MutationOutcome, MutationTicket, QueryCache, QueryKey};
use crate::employee::{Employee, EmployeePatch};
use crate::query::{Query, QueryState};
use crate::ui::components::{ConfirmDialog, ConfirmEvent, EmployeeForm, FormEvent, KeyResult};
use crate::ui::renderfns::{department_color, format_hire_date};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Profile page for a single employee
pub struct EmployeeDetailView {
  id: String,
  form: EmployeeForm,
  confirm: ConfirmDialog,
  deleting: Option<MutationTicket>,
}

impl EmployeeDetailView {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      form: EmployeeForm::new(),
      confirm: ConfirmDialog::new(),
      deleting: None,
    }
  }

  fn handle_overlays(&mut self, key: KeyEvent, cache: &mut QueryCache) -> Option<ViewAction> {
    match self.confirm.handle_key(key) {
      KeyResult::Event(ConfirmEvent::Confirmed) => {
        self.deleting = Some(cache.delete(&self.id));
        return Some(ViewAction::None);
      }
      KeyResult::Handled | KeyResult::Event(ConfirmEvent::Cancelled) => {
        return Some(ViewAction::None)
      }
      KeyResult::NotHandled => {}
    }

    match self.form.handle_key(key) {
      KeyResult::Event(FormEvent::Submit(data)) => {
        // Diff against the record the form was opened with, not a newer fetch
        let patch = self.form.original().map(|opened| EmployeePatch::diff(opened, &data));
        let Some(patch) = patch else {
          self.form.fail("Employee is no longer loaded");
          return Some(ViewAction::None);
        };
        if patch.is_empty() {
          self.form.hide();
          return Some(ViewAction::Notify("No changes to save".to_string()));
        }
        let ticket = cache.update(&self.id, patch);
        self.form.set_submitting(ticket);
        Some(ViewAction::None)
      }
      KeyResult::Handled | KeyResult::Event(FormEvent::Cancelled) => Some(ViewAction::None),
      KeyResult::NotHandled => None,
    }
  }

  fn handle_actions(&mut self, key: KeyEvent, cache: &mut QueryCache) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('e') => {
        if let Some(employee) = cache.use_employee(&self.id).data() {
          self.form.open_edit(employee);
        }
        Some(ViewAction::None)
      }
      KeyCode::Char('d') => {
        if self.deleting.is_none() {
          if let Some(employee) = cache.use_employee(&self.id).data() {
            self.confirm.show(
              "Delete Employee",
              format!(
                "Are you sure you want to delete {} {}? This action cannot be undone.",
                employee.first_name, employee.last_name
              ),
              "Delete",
            );
          }
        }
        Some(ViewAction::None)
      }
      KeyCode::Char('r') => {
        cache.refetch(&QueryKey::employee(self.id.as_str()));
        Some(ViewAction::None)
      }
      KeyCode::Char('q') | KeyCode::Esc | KeyCode::Backspace => Some(ViewAction::Pop),
      _ => None,
    }
  }

  fn render_state(&self, frame: &mut Frame, area: Rect, query: Query<'_, Employee>) {
    let (title, detail, color) = match query.error() {
      Some(e) if e.is_not_found() => (
        "Employee not found".to_string(),
        "The employee you're looking for doesn't exist.".to_string(),
        Color::White,
      ),
      Some(e) => (
        "Failed to load employee".to_string(),
        format!("{}. Press 'r' to retry.", e),
        Color::Red,
      ),
      None => {
        let paragraph = Paragraph::new("Loading employee...")
          .alignment(Alignment::Center)
          .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, area);
        return;
      }
    };

    let lines = vec![
      Line::default(),
      Line::from(Span::styled(title, Style::default().fg(color).bold())),
      Line::from(Span::styled(detail, Style::default().fg(Color::DarkGray))),
      Line::default(),
      Line::from(vec![
        Span::styled("[q] ", Style::default().fg(Color::Yellow)),
        Span::raw("Back to Directory"),
      ]),
    ];
    frame.render_widget(
      Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true }),
      area,
    );
  }

  fn render_profile(&self, frame: &mut Frame, area: Rect, employee: &Employee) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(4), // Name, title, badges
        Constraint::Length(6), // Contact and work
        Constraint::Min(0),    // About
      ])
      .split(area);

    let mut badges = vec![Span::styled(
      format!(" {} ", employee.department),
      Style::default()
        .fg(Color::Black)
        .bg(department_color(employee.department)),
    )];
    if !employee.is_active {
      badges.push(Span::raw(" "));
      badges.push(Span::styled(
        " Inactive ",
        Style::default().fg(Color::White).bg(Color::DarkGray),
      ));
    }

    let profile = vec![
      Line::from(vec![
        Span::styled(
          format!(" {} ", employee.initials()),
          Style::default().fg(Color::Black).bg(Color::Cyan).bold(),
        ),
        Span::raw("  "),
        Span::styled(employee.full_name(), Style::default().fg(Color::White).bold()),
      ]),
      Line::from(Span::styled(
        employee.job_title.as_str(),
        Style::default().fg(Color::Gray),
      )),
      Line::from(badges),
    ];
    frame.render_widget(Paragraph::new(profile), chunks[0]);

    let columns = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
      .split(chunks[1]);

    let field = |label: &'static str, value: String| {
      Line::from(vec![
        Span::styled(format!("{:<11}", label), Style::default().fg(Color::DarkGray)),
        Span::raw(value),
      ])
    };

    let mut contact = vec![field("Email", employee.email.clone())];
    if let Some(phone) = &employee.phone {
      contact.push(field("Phone", phone.clone()));
    }
    if let Some(location) = &employee.location {
      contact.push(field("Location", location.clone()));
    }
    frame.render_widget(
      Paragraph::new(contact).block(section("Contact Information")),
      columns[0],
    );

    let work = vec![
      field("Department", employee.department.to_string()),
      field("Job Title", employee.job_title.clone()),
      field("Hire Date", format_hire_date(employee.hire_date)),
    ];
    frame.render_widget(
      Paragraph::new(work).block(section("Work Information")),
      columns[1],
    );

    if let Some(bio) = &employee.bio {
      frame.render_widget(
        Paragraph::new(bio.as_str())
          .wrap(Wrap { trim: true })
          .style(Style::default().fg(Color::Gray))
          .block(section("About")),
        chunks[2],
      );
    }
  }
}

fn section(title: &str) -> Block<'_> {
  Block::default()
    .title(Span::styled(
      format!(" {} ", title),
      Style::default().fg(Color::White).bold(),
    ))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray))
}

impl View for EmployeeDetailView {
  fn handle_key(&mut self, key: KeyEvent, cache: &mut QueryCache) -> ViewAction {
    self
      .handle_overlays(key, cache)
      .or_else(|| self.handle_actions(key, cache))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, cache: &QueryCache) {
    let query = cache.employee(&self.id);

    let title = if self.deleting.is_some() {
      " Employee (deleting...) ".to_string()
    } else {
      match query.state() {
        QueryState::Loading if query.data().is_some() => " Employee (refreshing...) ".to_string(),
        QueryState::Loading => " Employee (loading...) ".to_string(),
        _ => " Employee ".to_string(),
      }
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match query.data() {
      Some(employee) => self.render_profile(frame, inner, employee),
      None => self.render_state(frame, inner, query),
    }

    self.form.render_overlay(frame, area);
    self.confirm.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self, cache: &QueryCache) -> String {
    cache
      .employee(&self.id)
      .data()
      .map(|e| e.full_name())
      .unwrap_or_else(|| self.id.clone())
  }

  fn route(&self) -> Route {
    Route::EmployeeDetail {
      id: self.id.clone(),
    }
  }

  fn tick(&mut self, cache: &mut QueryCache, _now: Instant) {
    // Nothing left to show once the delete went through
    if self.deleting.is_none() {
      cache.ensure_employee(&self.id);
    }
  }

  fn on_mutation(&mut self, outcome: &MutationOutcome) -> ViewAction {
    self.form.on_outcome(outcome);
    if self.deleting == Some(outcome.ticket) {
      self.deleting = None;
      if outcome.is_success() {
        return ViewAction::Home;
      }
    }
    ViewAction::None
  }

  fn captures_input(&self) -> bool {
    self.form.is_active() || self.confirm.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("e", "edit").with_priority(20),
      ShortcutInfo::new("d", "delete").with_priority(30),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::CacheOptions;
  use crate::employee::fixtures::employee;
  use crate::employee::{Department, EmployeeStore, InMemoryStore};
  use crossterm::event::KeyModifiers;
  use ratatui::backend::TestBackend;
  use std::sync::Arc;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn setup() -> (QueryCache, Arc<InMemoryStore>) {
    let mut ada = employee("1", "Ada", "Lovelace", Department::Engineering);
    ada.bio = Some("Wrote the first program.".to_string());
    let store = Arc::new(InMemoryStore::new(vec![ada]));
    (QueryCache::new(store.clone(), CacheOptions::default()), store)
  }

  fn screen(view: &mut EmployeeDetailView, cache: &QueryCache) -> String {
    let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
    terminal
      .draw(|frame| view.render(frame, frame.area(), cache))
      .unwrap();
    terminal
      .backend()
      .buffer()
      .content()
      .iter()
      .map(|cell| cell.symbol())
      .collect()
  }

  async fn loaded(view: &mut EmployeeDetailView, cache: &mut QueryCache) {
    view.tick(cache, Instant::now());
    cache.settle().await;
  }

  #[tokio::test]
  async fn test_profile_sections() {
    let (mut cache, _) = setup();
    let mut view = EmployeeDetailView::new("1");
    loaded(&mut view, &mut cache).await;

    let screen = screen(&mut view, &cache);
    assert!(screen.contains("Ada Lovelace"));
    assert!(screen.contains("Contact Information"));
    assert!(screen.contains("Work Information"));
    assert!(screen.contains("June 14, 2021"));
    assert!(screen.contains("Wrote the first program."));
    assert_eq!(view.breadcrumb_label(&cache), "Ada Lovelace");
  }

  #[tokio::test]
  async fn test_unknown_id_shows_not_found() {
    let (mut cache, _) = setup();
    let mut view = EmployeeDetailView::new("missing");
    loaded(&mut view, &mut cache).await;

    let screen = screen(&mut view, &cache);
    assert!(screen.contains("Employee not found"));
    assert!(screen.contains("Back to Directory"));
    assert_eq!(view.handle_key(key(KeyCode::Char('q')), &mut cache), ViewAction::Pop);
  }

  #[tokio::test]
  async fn test_confirmed_delete_returns_home() {
    let (mut cache, store) = setup();
    let mut view = EmployeeDetailView::new("1");
    loaded(&mut view, &mut cache).await;

    view.handle_key(key(KeyCode::Char('d')), &mut cache);
    assert!(view.captures_input());
    assert!(screen(&mut view, &cache).contains("Are you sure you want to delete Ada Lovelace?"));

    view.handle_key(key(KeyCode::Char('y')), &mut cache);
    let update = cache.settle().await;
    assert_eq!(update.outcomes.len(), 1);
    assert_eq!(view.on_mutation(&update.outcomes[0]), ViewAction::Home);
    assert!(store.get("1").await.unwrap_err().is_not_found());
  }

  #[tokio::test]
  async fn test_cancelled_delete_keeps_record() {
    let (mut cache, store) = setup();
    let mut view = EmployeeDetailView::new("1");
    loaded(&mut view, &mut cache).await;

    view.handle_key(key(KeyCode::Char('d')), &mut cache);
    view.handle_key(key(KeyCode::Esc), &mut cache);
    assert!(!view.captures_input());
    assert_eq!(cache.outstanding(), 0);
    assert!(store.get("1").await.is_ok());
  }

  #[tokio::test]
  async fn test_edit_without_changes_notifies() {
    let (mut cache, _) = setup();
    let mut view = EmployeeDetailView::new("1");
    loaded(&mut view, &mut cache).await;

    view.handle_key(key(KeyCode::Char('e')), &mut cache);
    assert!(screen(&mut view, &cache).contains("Edit Employee"));
    assert_eq!(
      view.handle_key(key(KeyCode::Enter), &mut cache),
      ViewAction::Notify("No changes to save".to_string())
    );
    assert!(!view.captures_input());
  }

  #[tokio::test]
  async fn test_edit_sends_only_changed_fields() {
    let (mut cache, store) = setup();
    let mut view = EmployeeDetailView::new("1");
    loaded(&mut view, &mut cache).await;

    view.handle_key(key(KeyCode::Char('e')), &mut cache);
    // First name field has focus
    view.handle_key(key(KeyCode::Backspace), &mut cache);
    view.handle_key(key(KeyCode::Backspace), &mut cache);
    view.handle_key(key(KeyCode::Backspace), &mut cache);
    for c in "Augusta".chars() {
      view.handle_key(key(KeyCode::Char(c)), &mut cache);
    }
    view.handle_key(key(KeyCode::Enter), &mut cache);
    assert!(view.captures_input());

    let update = cache.settle().await;
    assert!(update.outcomes[0].is_success());
    view.on_mutation(&update.outcomes[0]);
    assert!(!view.captures_input());

    let saved = store.get("1").await.unwrap();
    assert_eq!(saved.first_name, "Augusta");
    assert_eq!(saved.bio.as_deref(), Some("Wrote the first program."));
  }

  #[tokio::test]
  async fn test_edit_keeps_fields_changed_remotely_while_open() {
    let (mut cache, store) = setup();
    let mut view = EmployeeDetailView::new("1");
    loaded(&mut view, &mut cache).await;

    view.handle_key(key(KeyCode::Char('e')), &mut cache);

    // Someone else retitles Ada and the detail entry refreshes under the open form
    let retitle = EmployeePatch {
      job_title: Some("CTO".to_string()),
      ..Default::default()
    };
    store.update("1", &retitle).await.unwrap();
    cache.refetch(&QueryKey::employee("1"));
    cache.settle().await;
    assert_eq!(cache.employee("1").data().unwrap().job_title, "CTO");

    for _ in 0..3 {
      view.handle_key(key(KeyCode::Backspace), &mut cache);
    }
    for c in "Augusta".chars() {
      view.handle_key(key(KeyCode::Char(c)), &mut cache);
    }
    view.handle_key(key(KeyCode::Enter), &mut cache);

    let update = cache.settle().await;
    assert!(update.outcomes[0].is_success());

    let saved = store.get("1").await.unwrap();
    assert_eq!(saved.first_name, "Augusta");
    assert_eq!(saved.job_title, "CTO");
  }
}
