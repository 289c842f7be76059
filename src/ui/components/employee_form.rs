use super::input::TextInput;
use super::KeyResult;
use crate::cache::{MutationOutcome, MutationTicket};
use crate::employee::{Department, Employee, EmployeeFormData};
use crate::ui::renderfns::{centered_rect, department_color};
use chrono::{Local, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Events emitted by the form that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
  /// Validated data ready to be sent to the store
  Submit(EmployeeFormData),
  Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  FirstName,
  LastName,
  Email,
  Phone,
  Department,
  JobTitle,
  HireDate,
  Location,
  AvatarUrl,
  Bio,
  Active,
}

const FIELDS: [Field; 11] = [
  Field::FirstName,
  Field::LastName,
  Field::Email,
  Field::Phone,
  Field::Department,
  Field::JobTitle,
  Field::HireDate,
  Field::Location,
  Field::AvatarUrl,
  Field::Bio,
  Field::Active,
];

impl Field {
  fn label(self) -> &'static str {
    match self {
      Field::FirstName => "First name *",
      Field::LastName => "Last name *",
      Field::Email => "Email *",
      Field::Phone => "Phone",
      Field::Department => "Department *",
      Field::JobTitle => "Job title *",
      Field::HireDate => "Hire date *",
      Field::Location => "Location",
      Field::AvatarUrl => "Avatar URL",
      Field::Bio => "Bio",
      Field::Active => "Active",
    }
  }

  fn is_text(self) -> bool {
    !matches!(self, Field::Department | Field::Active)
  }

  fn index(self) -> usize {
    FIELDS.iter().position(|f| *f == self).unwrap_or(0)
  }
}

/// Create/edit dialog for a single employee.
///
/// The same component serves both modes; `original` is `Some` when editing.
#[derive(Debug, Clone, Default)]
pub struct EmployeeForm {
  active: bool,
  original: Option<Employee>,
  inputs: Vec<TextInput>,
  department: Department,
  is_active: bool,
  focus: usize,
  error: Option<String>,
  submitting: Option<MutationTicket>,
}

impl EmployeeForm {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Employee being edited, `None` in create mode
  pub fn original(&self) -> Option<&Employee> {
    self.original.as_ref()
  }

  #[cfg(test)]
  pub fn submitting(&self) -> Option<MutationTicket> {
    self.submitting
  }

  #[cfg(test)]
  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  /// Open blank, hire date defaulting to today
  pub fn open_create(&mut self) {
    let today = Local::now().date_naive();
    self.open_with(
      None,
      [
        "",
        "",
        "",
        "",
        "",
        "",
        &today.format("%Y-%m-%d").to_string(),
        "",
        "",
        "",
        "",
      ],
      Department::default(),
      true,
    );
  }

  /// Open pre-filled from an existing record
  pub fn open_edit(&mut self, employee: &Employee) {
    let hire_date = employee.hire_date.format("%Y-%m-%d").to_string();
    self.open_with(
      Some(employee.clone()),
      [
        &employee.first_name,
        &employee.last_name,
        &employee.email,
        employee.phone.as_deref().unwrap_or_default(),
        "",
        &employee.job_title,
        &hire_date,
        employee.location.as_deref().unwrap_or_default(),
        employee.avatar_url.as_deref().unwrap_or_default(),
        employee.bio.as_deref().unwrap_or_default(),
        "",
      ],
      employee.department,
      employee.is_active,
    );
  }

  fn open_with(
    &mut self,
    original: Option<Employee>,
    values: [&str; 11],
    department: Department,
    is_active: bool,
  ) {
    *self = Self {
      active: true,
      original,
      inputs: values.iter().map(|v| TextInput::with_value(*v)).collect(),
      department,
      is_active,
      focus: 0,
      error: None,
      submitting: None,
    };
  }

  pub fn hide(&mut self) {
    *self = Self::default();
  }

  /// Remember the mutation this form is waiting on
  pub fn set_submitting(&mut self, ticket: MutationTicket) {
    self.submitting = Some(ticket);
    self.error = None;
  }

  /// Show a message inline without closing
  pub fn fail(&mut self, message: impl Into<String>) {
    self.submitting = None;
    self.error = Some(message.into());
  }

  /// React to a settled mutation. Returns true if the form closed.
  pub fn on_outcome(&mut self, outcome: &MutationOutcome) -> bool {
    if !self.active || self.submitting != Some(outcome.ticket) {
      return false;
    }
    if outcome.is_success() {
      self.hide();
      true
    } else {
      self.fail(outcome.message());
      false
    }
  }

  fn value(&self, field: Field) -> &str {
    self
      .inputs
      .get(field.index())
      .map(|input| input.value())
      .unwrap_or_default()
  }

  fn optional(&self, field: Field) -> Option<String> {
    let value = self.value(field).trim();
    (!value.is_empty()).then(|| value.to_string())
  }

  /// Check required fields and build the payload
  pub fn validate(&self) -> Result<EmployeeFormData, String> {
    for field in [
      Field::FirstName,
      Field::LastName,
      Field::Email,
      Field::JobTitle,
      Field::HireDate,
    ] {
      if self.value(field).trim().is_empty() {
        return Err(format!(
          "{} is required",
          field.label().trim_end_matches(" *")
        ));
      }
    }

    let email = self.value(Field::Email).trim();
    if !email.contains('@') {
      return Err("Invalid email address".to_string());
    }

    let hire_date = NaiveDate::parse_from_str(self.value(Field::HireDate).trim(), "%Y-%m-%d")
      .map_err(|_| "Hire date must be a valid date (YYYY-MM-DD)".to_string())?;

    Ok(EmployeeFormData {
      first_name: self.value(Field::FirstName).trim().to_string(),
      last_name: self.value(Field::LastName).trim().to_string(),
      email: email.to_string(),
      phone: self.optional(Field::Phone),
      department: self.department,
      job_title: self.value(Field::JobTitle).trim().to_string(),
      hire_date,
      avatar_url: self.optional(Field::AvatarUrl),
      location: self.optional(Field::Location),
      bio: self.optional(Field::Bio),
      is_active: self.is_active,
    })
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }
    // Inputs are locked until the pending mutation settles
    if self.submitting.is_some() {
      return KeyResult::Handled;
    }

    let field = FIELDS[self.focus];
    match key.code {
      KeyCode::Esc => {
        self.hide();
        return KeyResult::Event(FormEvent::Cancelled);
      }
      KeyCode::Enter => {
        return match self.validate() {
          Ok(data) => {
            self.error = None;
            KeyResult::Event(FormEvent::Submit(data))
          }
          Err(message) => {
            self.error = Some(message);
            KeyResult::Handled
          }
        };
      }
      KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        return self.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
      }
      KeyCode::Tab | KeyCode::Down => {
        self.focus = (self.focus + 1) % FIELDS.len();
        return KeyResult::Handled;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.focus = if self.focus == 0 {
          FIELDS.len() - 1
        } else {
          self.focus - 1
        };
        return KeyResult::Handled;
      }
      _ => {}
    }

    match field {
      Field::Department => match key.code {
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => {
          self.department = self.department.next();
        }
        KeyCode::Left | KeyCode::Char('h') => {
          self.department = self.department.previous();
        }
        _ => {}
      },
      Field::Active => {
        if matches!(
          key.code,
          KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right
        ) {
          self.is_active = !self.is_active;
        }
      }
      _ => {
        if let Some(input) = self.inputs.get_mut(self.focus) {
          input.handle_key(key);
        }
      }
    }
    // Modal: nothing leaks to the view underneath
    KeyResult::Handled
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let (title, description, submit_label) = if self.original.is_some() {
      (
        "Edit Employee",
        "Update the employee information below.",
        "Save Changes",
      )
    } else {
      (
        "Add New Employee",
        "Fill in the details to add a new team member.",
        "Add Employee",
      )
    };

    let width = 72.min(area.width.saturating_sub(4)).max(30);
    let height = FIELDS.len() as u16 + 7;
    let overlay_area = centered_rect(area, width, height);

    frame.render_widget(Clear, overlay_area);

    let title = if self.submitting.is_some() {
      format!(" {} (saving...) ", title)
    } else {
      format!(" {} ", title)
    };
    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(title)
      .title_alignment(Alignment::Center);

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let mut lines = vec![
      Line::from(Span::styled(description, Style::default().fg(Color::DarkGray))),
      Line::default(),
    ];

    for (idx, field) in FIELDS.iter().enumerate() {
      let focused = idx == self.focus;
      let label_style = if focused {
        Style::default().fg(Color::Yellow).bold()
      } else {
        Style::default().fg(Color::Gray)
      };
      let mut spans = vec![
        Span::styled(if focused { "> " } else { "  " }, label_style),
        Span::styled(format!("{:<14}", field.label()), label_style),
      ];

      match field {
        Field::Department => {
          spans.push(Span::styled(
            format!("‹ {} ›", self.department),
            Style::default().fg(department_color(self.department)),
          ));
        }
        Field::Active => {
          spans.push(Span::raw(if self.is_active { "[x]" } else { "[ ]" }));
        }
        _ => {
          let value = self.value(*field);
          spans.push(Span::raw(value.to_string()));
          if focused && field.is_text() {
            spans.push(Span::styled("_", Style::default().fg(Color::Yellow))); // Cursor
          }
        }
      }
      lines.push(Line::from(spans));
    }

    lines.push(Line::default());
    lines.push(match &self.error {
      Some(error) => Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))),
      None => Line::default(),
    });
    lines.push(
      Line::from(vec![
        Span::styled("Esc ", Style::default().fg(Color::Yellow)),
        Span::styled("Cancel  ", Style::default().fg(Color::Gray)),
        Span::styled("Enter ", Style::default().fg(Color::Yellow)),
        Span::styled(submit_label, Style::default().fg(Color::Cyan).bold()),
      ])
      .alignment(Alignment::Right),
    );

    frame.render_widget(Paragraph::new(lines), inner);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{Mutated, MutationKind};
  use crate::employee::fixtures::employee;
  use crate::employee::{EmployeePatch, StoreError};

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_text(form: &mut EmployeeForm, text: &str) {
    for c in text.chars() {
      form.handle_key(key(KeyCode::Char(c)));
    }
  }

  fn fill_required(form: &mut EmployeeForm) {
    type_text(form, "Grace");
    form.handle_key(key(KeyCode::Tab));
    type_text(form, "Hopper");
    form.handle_key(key(KeyCode::Tab));
    type_text(form, "grace@example.com");
    // phone, department
    form.handle_key(key(KeyCode::Tab));
    form.handle_key(key(KeyCode::Tab));
    form.handle_key(key(KeyCode::Right));
    form.handle_key(key(KeyCode::Tab));
    type_text(form, "Rear Admiral");
  }

  #[test]
  fn test_create_submits_validated_data() {
    let mut form = EmployeeForm::new();
    form.open_create();
    assert!(form.original().is_none());
    fill_required(&mut form);

    match form.handle_key(key(KeyCode::Enter)) {
      KeyResult::Event(FormEvent::Submit(data)) => {
        assert_eq!(data.first_name, "Grace");
        assert_eq!(data.department, Department::Design);
        assert_eq!(data.job_title, "Rear Admiral");
        assert_eq!(data.phone, None);
        assert!(data.is_active);
      }
      other => panic!("expected submit, got {:?}", other),
    }
  }

  #[test]
  fn test_validation_keeps_form_open() {
    let mut form = EmployeeForm::new();
    form.open_create();
    assert_eq!(form.handle_key(key(KeyCode::Enter)), KeyResult::Handled);
    assert_eq!(form.error(), Some("First name is required"));

    fill_required(&mut form);
    form.handle_key(key(KeyCode::Tab));
    for _ in 0..10 {
      form.handle_key(key(KeyCode::Backspace));
    }
    type_text(&mut form, "2024-13-01");
    form.handle_key(key(KeyCode::Enter));
    assert_eq!(
      form.error(),
      Some("Hire date must be a valid date (YYYY-MM-DD)")
    );
    assert!(form.is_active());
  }

  #[test]
  fn test_email_needs_at_sign() {
    let mut form = EmployeeForm::new();
    form.open_edit(&employee("1", "Ada", "Lovelace", Department::Engineering));
    form.focus = Field::Email.index();
    for _ in 0..40 {
      form.handle_key(key(KeyCode::Backspace));
    }
    type_text(&mut form, "ada.example.com");
    form.handle_key(key(KeyCode::Enter));
    assert_eq!(form.error(), Some("Invalid email address"));
  }

  #[test]
  fn test_edit_prefill_yields_empty_diff() {
    let current = employee("1", "Ada", "Lovelace", Department::Engineering);
    let mut form = EmployeeForm::new();
    form.open_edit(&current);
    let data = form.validate().unwrap();
    assert!(EmployeePatch::diff(&current, &data).is_empty());
  }

  #[test]
  fn test_closes_only_on_matching_success() {
    let mut form = EmployeeForm::new();
    form.open_create();
    form.set_submitting(MutationTicket(7));
    assert_eq!(form.handle_key(key(KeyCode::Esc)), KeyResult::Handled);

    let other = MutationOutcome {
      ticket: MutationTicket(3),
      kind: MutationKind::Create,
      result: Err(StoreError::transport("boom")),
    };
    assert!(!form.on_outcome(&other));
    assert_eq!(form.submitting(), Some(MutationTicket(7)));

    let failed = MutationOutcome {
      ticket: MutationTicket(7),
      kind: MutationKind::Create,
      result: Err(StoreError::Validation {
        code: "23505".to_string(),
        message: "duplicate key".to_string(),
      }),
    };
    assert!(!form.on_outcome(&failed));
    assert!(form.is_active());
    assert!(form.error().unwrap().starts_with("Failed to create employee"));

    form.set_submitting(MutationTicket(8));
    let ok = MutationOutcome {
      ticket: MutationTicket(8),
      kind: MutationKind::Create,
      result: Ok(Mutated::Created(employee(
        "9",
        "Grace",
        "Hopper",
        Department::Design,
      ))),
    };
    assert!(form.on_outcome(&ok));
    assert!(!form.is_active());
  }
}
