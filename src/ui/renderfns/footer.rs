use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::notify::{Toast, ToastLevel};

/// Draw the footer bar with view breadcrumb and the latest toast
pub fn draw_footer(frame: &mut Frame, area: Rect, breadcrumb: &[String], toast: Option<&Toast>) {
  let mut spans = Vec::new();

  spans.push(Span::raw(" "));

  for (i, part) in breadcrumb.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
    }

    let style = if i == breadcrumb.len() - 1 {
      // Current view - highlighted
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::White)
    };

    spans.push(Span::styled(part.clone(), style));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);

  if let Some(toast) = toast {
    let (icon, color) = match toast.level {
      ToastLevel::Success => ("✓", Color::Green),
      ToastLevel::Error => ("✗", Color::Red),
      ToastLevel::Info => ("•", Color::Cyan),
    };
    let text = Line::from(Span::styled(
      format!("{} {} ", icon, toast.message),
      Style::default().fg(color).bg(Color::Black).bold(),
    ))
    .alignment(Alignment::Right);
    frame.render_widget(Paragraph::new(text), area);
  }
}
