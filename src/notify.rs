//! Transient success/error toasts.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

const MAX_TOASTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
  Success,
  Error,
  Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
  pub level: ToastLevel,
  pub message: String,
  expires_at: Instant,
}

/// Queue of toasts, newest last, each expiring after `ttl`
#[derive(Debug)]
pub struct Notifier {
  toasts: VecDeque<Toast>,
  ttl: Duration,
}

impl Notifier {
  pub fn new(ttl: Duration) -> Self {
    Self {
      toasts: VecDeque::new(),
      ttl,
    }
  }

  pub fn push(&mut self, level: ToastLevel, message: impl Into<String>, now: Instant) {
    let message = message.into();
    match level {
      ToastLevel::Error => tracing::warn!(%message, "toast"),
      _ => tracing::info!(%message, "toast"),
    }
    self.toasts.push_back(Toast {
      level,
      message,
      expires_at: now + self.ttl,
    });
    while self.toasts.len() > MAX_TOASTS {
      self.toasts.pop_front();
    }
  }

  pub fn success(&mut self, message: impl Into<String>) {
    self.push(ToastLevel::Success, message, Instant::now());
  }

  pub fn error(&mut self, message: impl Into<String>) {
    self.push(ToastLevel::Error, message, Instant::now());
  }

  pub fn info(&mut self, message: impl Into<String>) {
    self.push(ToastLevel::Info, message, Instant::now());
  }

  /// Drop expired toasts. Returns true if any were removed.
  pub fn expire(&mut self, now: Instant) -> bool {
    let before = self.toasts.len();
    self.toasts.retain(|t| t.expires_at > now);
    self.toasts.len() != before
  }

  /// Most recent toast, shown in the footer
  pub fn latest(&self) -> Option<&Toast> {
    self.toasts.back()
  }

  #[cfg(test)]
  pub fn is_empty(&self) -> bool {
    self.toasts.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_toasts_expire_after_ttl() {
    let now = Instant::now();
    let mut notifier = Notifier::new(Duration::from_secs(4));
    notifier.push(ToastLevel::Success, "Employee created successfully", now);

    assert!(!notifier.expire(now + Duration::from_secs(3)));
    assert_eq!(
      notifier.latest().map(|t| t.message.as_str()),
      Some("Employee created successfully")
    );
    assert!(notifier.expire(now + Duration::from_secs(4)));
    assert!(notifier.is_empty());
  }

  #[test]
  fn test_only_recent_toasts_are_kept() {
    let now = Instant::now();
    let mut notifier = Notifier::new(Duration::from_secs(4));
    for i in 0..5 {
      notifier.push(ToastLevel::Error, format!("failure {}", i), now);
    }
    assert_eq!(notifier.toasts.len(), MAX_TOASTS);
    assert_eq!(notifier.latest().map(|t| t.level), Some(ToastLevel::Error));
    assert_eq!(notifier.latest().map(|t| t.message.as_str()), Some("failure 4"));
  }
}
