use crate::auth::{guard, AuthState, Route, RouteDecision, Session, User};
use crate::backend::Backend;
use crate::cache::{CacheUpdate, QueryCache};
use crate::config::Config;
use crate::employee::EmployeeStore;
use crate::event::{AuthEvent, Event, EventHandler};
use crate::notify::{Notifier, Toast};
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{DirectoryView, EmployeeDetailView, LoginView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{info, warn};

const TICK_RATE: Duration = Duration::from_millis(50);

/// What fills the body of the screen
enum Screen {
  Login(LoginView),
  /// Signed in: the navigation stack shares one query cache.
  /// The directory is always at index 0.
  Main {
    session: Session,
    cache: QueryCache,
    stack: Vec<Box<dyn View>>,
  },
}

/// Main application state
pub struct App {
  config: Config,
  backend: Backend,
  screen: Screen,
  auth: AuthState,
  /// Protected route requested while signed out, entered after sign-in
  pending_route: Option<Route>,
  command: CommandInput,
  notifier: Notifier,
  /// Credentials for signing in as soon as the loop starts
  auto_sign_in: Option<(String, String)>,
  event_tx: mpsc::UnboundedSender<Event>,
  should_quit: bool,
}

impl App {
  pub fn new(config: Config, backend: Backend) -> Self {
    // Replaced by the event handler's sender in run()
    let (tx, _rx) = mpsc::unbounded_channel();
    let login = LoginView::new(config.auth.email.as_deref(), backend.label());
    let notifier = Notifier::new(config.ui.toast_ttl());

    Self {
      config,
      backend,
      screen: Screen::Login(login),
      auth: AuthState::SignedOut,
      pending_route: None,
      command: CommandInput::new(),
      notifier,
      auto_sign_in: None,
      event_tx: tx,
      should_quit: false,
    }
  }

  pub fn with_credentials(mut self, email: String, password: String) -> Self {
    self.auto_sign_in = Some((email, password));
    self
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(TICK_RATE);
    self.event_tx = events.sender();

    if let Some((email, password)) = self.auto_sign_in.take() {
      if let Screen::Login(view) = &mut self.screen {
        view.set_pending();
      }
      self.sign_in(email, password);
    }

    let result = self.main_loop(&mut terminal, &mut events).await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn main_loop<B: ratatui::backend::Backend>(
    &mut self,
    terminal: &mut Terminal<B>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }
    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {}
      Event::Auth(auth) => self.handle_auth(auth),
    }
    self.tick(Instant::now());
  }

  /// Expire toasts, apply settled cache results and let the top view
  /// keep its queries alive
  fn tick(&mut self, now: Instant) {
    self.notifier.expire(now);

    let update = match &mut self.screen {
      Screen::Main { cache, .. } => cache.poll(),
      Screen::Login(_) => return,
    };
    self.apply_update(update);

    if let Screen::Main { cache, stack, .. } = &mut self.screen {
      if let Some(top) = stack.last_mut() {
        top.tick(cache, now);
      }
    }
  }

  /// Toast every settled mutation and let each view on the stack react
  fn apply_update(&mut self, update: CacheUpdate) {
    let mut actions = Vec::new();
    if let Screen::Main { stack, .. } = &mut self.screen {
      for outcome in &update.outcomes {
        if outcome.is_success() {
          self.notifier.success(outcome.message());
        } else {
          self.notifier.error(outcome.message());
        }
        for view in stack.iter_mut() {
          actions.push(view.on_mutation(outcome));
        }
      }
    }

    for action in actions {
      self.apply(action);
    }

    if update.auth_required {
      warn!("store rejected the session");
      self.notifier.error("Session expired. Please sign in again.");
      self.sign_out(true);
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let mut command = None;
    let action = match &mut self.screen {
      Screen::Login(view) => view.handle_key(key),
      Screen::Main { cache, stack, .. } => {
        let Some(top) = stack.last_mut() else {
          return;
        };

        // The palette gets first go unless a text field owns the keyboard
        let palette = if self.command.is_active() || !top.captures_input() {
          self.command.handle_key(key)
        } else {
          KeyResult::NotHandled
        };
        match palette {
          KeyResult::Handled | KeyResult::Event(CommandEvent::Cancelled) => ViewAction::None,
          KeyResult::Event(CommandEvent::Submitted(name)) => {
            command = Some(name);
            ViewAction::None
          }
          KeyResult::NotHandled => top.handle_key(key, cache),
        }
      }
    };

    if let Some(name) = command {
      self.run_command(&name);
    }
    self.apply(action);
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Open(route) => self.navigate(route),
      ViewAction::Pop => {
        if let Screen::Main { stack, .. } = &mut self.screen {
          if stack.len() > 1 {
            stack.pop();
            return;
          }
        }
        self.should_quit = true;
      }
      ViewAction::Home => self.navigate(Route::Directory),
      ViewAction::Notify(message) => self.notifier.info(message),
      ViewAction::SignIn { email, password } => self.sign_in(email, password),
      ViewAction::Quit => self.should_quit = true,
    }
  }

  /// Run the route guard, then enter, park or redirect
  pub fn navigate(&mut self, route: Route) {
    match guard(&route, &self.auth) {
      RouteDecision::Enter => self.enter(route),
      RouteDecision::Wait => {
        info!(path = %route.path(), "auth resolving, parking route");
        self.pending_route = Some(route);
      }
      RouteDecision::Redirect(target) => {
        info!(from = %route.path(), to = %target.path(), "redirecting");
        if target == Route::Login {
          self.pending_route = Some(route);
        }
        self.enter(target);
      }
    }
  }

  fn enter(&mut self, route: Route) {
    if route == Route::Login {
      if matches!(self.screen, Screen::Main { .. }) {
        self.sign_out(false);
      }
      return;
    }

    // Protected routes only get here once signed in
    let Screen::Main { stack, .. } = &mut self.screen else {
      return;
    };
    match route {
      Route::Directory => stack.truncate(1),
      Route::EmployeeDetail { id } => stack.push(Box::new(EmployeeDetailView::new(id))),
      Route::Login => {}
    }
  }

  fn run_command(&mut self, name: &str) {
    if let Screen::Main { stack, .. } = &mut self.screen {
      if stack.last_mut().is_some_and(|top| top.command(name)) {
        return;
      }
    }

    match name {
      "" => {}
      "directory" => self.navigate(Route::Directory),
      "add" => {
        self.navigate(Route::Directory);
        if let Screen::Main { stack, .. } = &mut self.screen {
          if let Some(root) = stack.first_mut() {
            root.command("add");
          }
        }
      }
      "refresh" => {
        if let Screen::Main { cache, .. } = &mut self.screen {
          cache.invalidate_all();
          self.notifier.info("Refreshing");
        }
      }
      "signout" => self.sign_out(false),
      "quit" => self.should_quit = true,
      other => self.notifier.error(format!("Unknown command: {}", other)),
    }
  }

  fn sign_in(&mut self, email: String, password: String) {
    self.auth = AuthState::Resolving;
    info!(%email, backend = %self.backend.label(), "signing in");

    let backend = self.backend.clone();
    let tx = self.event_tx.clone();
    tokio::spawn(async move {
      let event = match backend.sign_in(&email, &password).await {
        Ok(session) => AuthEvent::SignedIn(session),
        Err(e) => AuthEvent::Failed(e),
      };
      let _ = tx.send(Event::Auth(event));
    });
  }

  fn handle_auth(&mut self, event: AuthEvent) {
    let session = match event {
      AuthEvent::SignedIn(session) => session,
      AuthEvent::Failed(e) => {
        warn!(error = %e, "sign-in failed");
        self.auth = AuthState::SignedOut;
        if let Screen::Login(view) = &mut self.screen {
          view.fail(e.to_string());
        }
        return;
      }
    };

    match self.backend.store_for(&session) {
      Ok(store) => self.start_session(session, store),
      Err(e) => {
        warn!(error = %e, "could not build store client");
        self.auth = AuthState::SignedOut;
        if let Screen::Login(view) = &mut self.screen {
          view.fail(e.to_string());
        }
      }
    }
  }

  fn start_session(&mut self, session: Session, store: Arc<dyn EmployeeStore>) {
    info!(email = %session.user.email, "signed in");
    self.auth = AuthState::SignedIn(session.user.clone());
    self.screen = Screen::Main {
      session,
      cache: QueryCache::new(store, self.config.cache.options()),
      stack: vec![Box::new(DirectoryView::new(self.config.ui.debounce()))],
    };

    if let Some(route) = self.pending_route.take() {
      self.navigate(route);
    }
  }

  /// Drop the session and its cache and go back to the login screen.
  /// `expired` keeps the current route so re-login returns to it.
  fn sign_out(&mut self, expired: bool) {
    let email = self.auth.user().map(|u| u.email.clone());
    let login = LoginView::new(email.as_deref(), self.backend.label());
    let previous = std::mem::replace(&mut self.screen, Screen::Login(login));
    self.auth = AuthState::SignedOut;
    self.command = CommandInput::new();

    let Screen::Main { session, stack, .. } = previous else {
      return;
    };
    if expired {
      self.pending_route = stack.last().map(|view| view.route());
    } else {
      self.notifier.info("Signed out");
    }

    info!(email = %session.user.email, expired, "signing out");
    let backend = self.backend.clone();
    tokio::spawn(async move {
      if let Err(e) = backend.sign_out(&session).await {
        warn!(error = %e, "sign-out request failed");
      }
    });
  }

  // Accessors for UI rendering

  pub fn backend_label(&self) -> String {
    self.backend.label()
  }

  pub fn user(&self) -> Option<&User> {
    self.auth.user()
  }

  pub fn shortcuts(&self) -> Vec<ShortcutInfo> {
    match &self.screen {
      Screen::Main { stack, .. } => stack.last().map(|v| v.shortcuts()).unwrap_or_default(),
      Screen::Login(_) => Vec::new(),
    }
  }

  pub fn breadcrumb(&self) -> Vec<String> {
    match &self.screen {
      Screen::Main { stack, cache, .. } => {
        stack.iter().map(|v| v.breadcrumb_label(cache)).collect()
      }
      Screen::Login(_) => vec!["Sign in".to_string()],
    }
  }

  pub fn toast(&self) -> Option<&Toast> {
    self.notifier.latest()
  }

  /// Draw the login screen or the top of the stack, plus the palette
  pub fn render_body(&mut self, frame: &mut Frame, area: Rect) {
    match &mut self.screen {
      Screen::Login(view) => view.render(frame, area),
      Screen::Main { cache, stack, .. } => {
        if let Some(top) = stack.last_mut() {
          top.render(frame, area, cache);
        }
      }
    }
    self.command.render_overlay(frame, area);
  }
}
