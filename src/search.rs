//! Debounced search text and department filter for the directory.

use std::time::{Duration, Instant};

use crate::cache::QueryKey;
use crate::employee::DepartmentFilter;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Holds what the user typed and what the list query actually uses.
///
/// Keystrokes update the raw text immediately and restart the quiet-period
/// timer; the applied text only catches up once `delay` has passed without
/// another keystroke. The department filter applies immediately.
#[derive(Debug, Clone)]
pub struct SearchController {
  raw: String,
  applied: String,
  department: DepartmentFilter,
  delay: Duration,
  last_keystroke: Option<Instant>,
}

impl Default for SearchController {
  fn default() -> Self {
    Self::new(DEFAULT_DEBOUNCE)
  }
}

impl SearchController {
  pub fn new(delay: Duration) -> Self {
    Self {
      raw: String::new(),
      applied: String::new(),
      department: DepartmentFilter::All,
      delay,
      last_keystroke: None,
    }
  }

  #[cfg(test)]
  pub fn raw(&self) -> &str {
    &self.raw
  }

  pub fn applied(&self) -> &str {
    &self.applied
  }

  pub fn department(&self) -> DepartmentFilter {
    self.department
  }

  /// Record a keystroke. Restarts the debounce timer.
  pub fn set_text(&mut self, text: impl Into<String>, now: Instant) {
    self.raw = text.into();
    self.last_keystroke = Some(now);
  }

  /// Promote the raw text once the quiet period has elapsed.
  /// Returns true if the applied text changed.
  pub fn tick(&mut self, now: Instant) -> bool {
    match self.last_keystroke {
      Some(at) if now.saturating_duration_since(at) >= self.delay => self.apply_now(),
      _ => false,
    }
  }

  /// Apply the raw text without waiting (Enter in the search box)
  pub fn apply_now(&mut self) -> bool {
    self.last_keystroke = None;
    if self.applied == self.raw {
      return false;
    }
    self.applied = self.raw.clone();
    tracing::debug!(search = %self.applied, "applied search");
    true
  }

  /// Returns true if the filter changed
  pub fn set_department(&mut self, department: DepartmentFilter) -> bool {
    if self.department == department {
      return false;
    }
    self.department = department;
    true
  }

  pub fn is_pending(&self) -> bool {
    self.last_keystroke.is_some()
  }

  /// Cache key for the list currently applied
  pub fn list_key(&self) -> QueryKey {
    QueryKey::employees(self.applied.clone(), self.department)
  }
}
