//! Errors surfaced by the employee store and the auth provider.

use thiserror::Error;

/// Error returned by every remote store operation.
///
/// Errors are cloneable so the query cache can keep the last failure for a
/// key alongside its last-known-good data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
  /// The remote store could not be reached or answered with a server error
  #[error("{0}")]
  Transport(String),

  /// The remote store rejected the request (constraint violation, bad input)
  #[error("{message}")]
  Validation { code: String, message: String },

  /// A single-record lookup matched zero or several rows
  #[error("{0}")]
  NotFound(String),

  /// No session, or the session was rejected
  #[error("Authentication required")]
  AuthRequired,

  /// Any other structured rejection from the remote store
  #[error("{message}")]
  Remote { code: String, message: String },
}

impl StoreError {
  pub fn transport(err: impl std::fmt::Display) -> Self {
    StoreError::Transport(err.to_string())
  }

  pub fn not_found(id: &str) -> Self {
    StoreError::NotFound(format!("Employee {} not found", id))
  }

  /// Remote error code, when the store supplied one
  pub fn code(&self) -> Option<&str> {
    match self {
      StoreError::Validation { code, .. } | StoreError::Remote { code, .. } => Some(code),
      _ => None,
    }
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, StoreError::NotFound(_))
  }

  pub fn is_auth_required(&self) -> bool {
    matches!(self, StoreError::AuthRequired)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_messages_are_verbatim() {
    let err = StoreError::Validation {
      code: "23505".to_string(),
      message: "duplicate key value violates unique constraint \"employees_email_key\"".to_string(),
    };
    assert_eq!(
      err.to_string(),
      "duplicate key value violates unique constraint \"employees_email_key\""
    );
    assert_eq!(err.code(), Some("23505"));
    assert!(StoreError::not_found("x").is_not_found());
    assert_eq!(StoreError::AuthRequired.code(), None);
  }
}
