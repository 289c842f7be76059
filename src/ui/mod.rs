pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;
use renderfns::{draw_footer, draw_header};

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Body
      Constraint::Length(1), // Breadcrumb and toasts
    ])
    .split(frame.area());

  draw_header(
    frame,
    chunks[0],
    &app.backend_label(),
    app.user(),
    &app.shortcuts(),
  );
  app.render_body(frame, chunks[1]);
  draw_footer(frame, chunks[2], &app.breadcrumb(), app.toast());
}
