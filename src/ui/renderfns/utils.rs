use chrono::NaiveDate;
use ratatui::prelude::{Color, Rect};

use crate::employee::Department;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Badge colour for a department
pub fn department_color(department: Department) -> Color {
  match department {
    Department::Engineering => Color::Blue,
    Department::Design => Color::Magenta,
    Department::Marketing => Color::LightMagenta,
    Department::Sales => Color::Green,
    Department::Hr => Color::Yellow,
    Department::Finance => Color::LightGreen,
    Department::Operations => Color::LightRed,
    Department::Legal => Color::Gray,
    Department::Product => Color::LightBlue,
  }
}

/// "March 4, 2019"
pub fn format_hire_date(date: NaiveDate) -> String {
  date.format("%B %-d, %Y").to_string()
}

/// Rectangle of at most `width` x `height` centred in `area`
pub fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
  let width = width.min(area.width);
  let height = height.min(area.height);
  Rect::new(
    area.x + (area.width - width) / 2,
    area.y + (area.height - height) / 2,
    width,
    height,
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
    assert_eq!(truncate("Zoë Müller-Lüdenscheidt", 8), "Zoë M...");
  }

  #[test]
  fn test_every_department_has_distinct_color() {
    let colors: Vec<Color> = Department::ALL.iter().map(|d| department_color(*d)).collect();
    for (i, a) in colors.iter().enumerate() {
      assert!(colors[i + 1..].iter().all(|b| b != a), "{:?} reused", a);
    }
  }

  #[test]
  fn test_hire_date_format() {
    let date = NaiveDate::from_ymd_opt(2019, 3, 4).unwrap();
    assert_eq!(format_hire_date(date), "March 4, 2019");
  }

  #[test]
  fn test_centered_rect_clamps_to_area() {
    let area = Rect::new(0, 0, 40, 10);
    assert_eq!(centered_rect(area, 20, 4), Rect::new(10, 3, 20, 4));
    assert_eq!(centered_rect(area, 80, 20), area);
  }
}
