use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::auth::User;
use crate::ui::view::ShortcutInfo;

/// Draw the header bar with logo, backend, signed-in user and shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  backend: &str,
  user: Option<&User>,
  shortcuts: &[ShortcutInfo],
) {
  let mut spans = vec![
    Span::styled(" TeamHub ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} ", extract_domain(backend)),
      Style::default().fg(Color::White),
    ),
  ];

  if let Some(user) = user {
    spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
    spans.push(Span::styled(
      format!(" {} ", user.initials()),
      Style::default().fg(Color::Black).bg(Color::Cyan).bold(),
    ));
    spans.push(Span::styled(
      format!(" {} ", user.email),
      Style::default().fg(Color::Yellow),
    ));
    spans.push(Span::styled("Team Member ", Style::default().fg(Color::DarkGray)));
  }

  spans.push(Span::raw(" "));

  let mut shortcuts = shortcuts.to_vec();
  shortcuts.sort_by_key(|s| s.priority);
  for shortcut in shortcuts {
    spans.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::styled(
      format!(" {}   ", shortcut.label),
      Style::default().fg(Color::DarkGray),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}

/// Host part of the project URL
fn extract_domain(url: &str) -> &str {
  url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or(url)
}
