use crate::ui::components::{InputResult, TextInput};
use crate::ui::renderfns::centered_rect;
use crate::ui::view::ViewAction;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
  Email,
  Password,
}

/// Sign-in screen shown whenever there is no session
pub struct LoginView {
  email: TextInput,
  password: TextInput,
  focus: Focus,
  pending: bool,
  error: Option<String>,
  backend: String,
}

impl LoginView {
  /// `email` pre-fills the form and moves focus to the password
  pub fn new(email: Option<&str>, backend: impl Into<String>) -> Self {
    let email = email.unwrap_or_default();
    Self {
      email: TextInput::with_value(email),
      password: TextInput::masked(),
      focus: if email.is_empty() {
        Focus::Email
      } else {
        Focus::Password
      },
      pending: false,
      error: None,
      backend: backend.into(),
    }
  }

  pub fn email(&self) -> &str {
    self.email.value()
  }

  pub fn is_pending(&self) -> bool {
    self.pending
  }

  /// Mark a sign-in attempt as in progress (used for auto sign-in)
  pub fn set_pending(&mut self) {
    self.pending = true;
    self.error = None;
  }

  /// Sign-in was rejected: show why and clear the password
  pub fn fail(&mut self, message: impl Into<String>) {
    self.pending = false;
    self.error = Some(message.into());
    self.password.clear();
    self.focus = Focus::Password;
  }

  fn focused(&mut self) -> &mut TextInput {
    match self.focus {
      Focus::Email => &mut self.email,
      Focus::Password => &mut self.password,
    }
  }

  fn toggle_focus(&mut self) {
    self.focus = match self.focus {
      Focus::Email => Focus::Password,
      Focus::Password => Focus::Email,
    };
  }

  fn submit(&mut self) -> ViewAction {
    let email = self.email.value().trim().to_string();
    let password = self.password.value().to_string();
    if email.is_empty() || password.is_empty() {
      self.error = Some("Email and password are required".to_string());
      return ViewAction::None;
    }
    self.set_pending();
    ViewAction::SignIn { email, password }
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if self.pending {
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Esc => ViewAction::Quit,
      KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
        self.toggle_focus();
        ViewAction::None
      }
      KeyCode::Enter if self.focus == Focus::Email && self.password.is_empty() => {
        self.focus = Focus::Password;
        ViewAction::None
      }
      KeyCode::Enter => self.submit(),
      _ => {
        if self.focused().handle_key(key) == InputResult::Consumed {
          self.error = None;
        }
        ViewAction::None
      }
    }
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let dialog = centered_rect(area, 60, 13);
    frame.render_widget(Clear, dialog);

    let title = if self.pending {
      " Sign in (signing in...) "
    } else {
      " Sign in "
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(dialog);
    frame.render_widget(block, dialog);

    let field = |label: &str, value: String, focused: bool| {
      let label_style = if focused {
        Style::default().fg(Color::Yellow).bold()
      } else {
        Style::default().fg(Color::Gray)
      };
      let mut spans = vec![
        Span::styled(if focused { "> " } else { "  " }, label_style),
        Span::styled(format!("{:<10}", label), label_style),
        Span::raw(value),
      ];
      if focused && !self.pending {
        spans.push(Span::styled("_", Style::default().fg(Color::Yellow))); // Cursor
      }
      Line::from(spans)
    };

    let lines = vec![
      Line::from(Span::styled(
        "TeamHub",
        Style::default().fg(Color::Cyan).bold(),
      )),
      Line::from(Span::styled(
        format!("Sign in to {}", self.backend),
        Style::default().fg(Color::DarkGray),
      )),
      Line::default(),
      field("Email", self.email.display(), self.focus == Focus::Email),
      field(
        "Password",
        self.password.display(),
        self.focus == Focus::Password,
      ),
      Line::default(),
      match &self.error {
        Some(error) => Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))),
        None => Line::default(),
      },
      Line::default(),
      Line::from(vec![
        Span::styled("Enter ", Style::default().fg(Color::Yellow)),
        Span::styled("sign in  ", Style::default().fg(Color::Gray)),
        Span::styled("Tab ", Style::default().fg(Color::Yellow)),
        Span::styled("switch  ", Style::default().fg(Color::Gray)),
        Span::styled("Esc ", Style::default().fg(Color::Yellow)),
        Span::styled("quit", Style::default().fg(Color::Gray)),
      ]),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
  }
}
