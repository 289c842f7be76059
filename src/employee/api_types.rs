//! Serde types matching the remote store and auth provider responses.
//!
//! Rows deserialize straight into [`Employee`](super::types::Employee); the
//! types here cover error bodies and the auth token endpoint.

use reqwest::StatusCode;
use serde::Deserialize;

use super::error::StoreError;

/// PostgREST error body: `{"code": "...", "message": "...", "details": ..., "hint": ...}`
#[derive(Debug, Default, Deserialize)]
pub struct ApiError {
  #[serde(default)]
  pub code: Option<String>,
  #[serde(default)]
  pub message: Option<String>,
  #[serde(default)]
  pub details: Option<String>,
  #[serde(default)]
  pub hint: Option<String>,
}

/// Auth provider error body. Older releases use `error`/`error_description`,
/// newer ones `error_code`/`msg`.
#[derive(Debug, Default, Deserialize)]
pub struct ApiAuthError {
  #[serde(default)]
  pub error: Option<String>,
  #[serde(default)]
  pub error_description: Option<String>,
  #[serde(default)]
  pub error_code: Option<String>,
  #[serde(default)]
  pub msg: Option<String>,
  #[serde(default)]
  pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiAuthUser {
  pub id: String,
  #[serde(default)]
  pub email: Option<String>,
}

/// Response of `POST /auth/v1/token?grant_type=password`
#[derive(Debug, Deserialize)]
pub struct ApiTokenResponse {
  pub access_token: String,
  pub user: ApiAuthUser,
}

/// Codes PostgREST uses for rejected or expired JWTs
const AUTH_CODES: &[&str] = &["PGRST301", "PGRST302", "42501"];

/// Code PostgREST returns when a single-object request matched 0 or >1 rows
pub const SINGULAR_CODE: &str = "PGRST116";

impl ApiError {
  /// Classify a failed store response into the error taxonomy
  pub fn into_store_error(self, status: StatusCode) -> StoreError {
    let code = self.code.unwrap_or_default();
    let message = self
      .message
      .or(self.details)
      .or(self.hint)
      .unwrap_or_else(|| format!("HTTP {}", status));

    if status == StatusCode::UNAUTHORIZED
      || status == StatusCode::FORBIDDEN
      || AUTH_CODES.contains(&code.as_str())
    {
      return StoreError::AuthRequired;
    }
    if code == SINGULAR_CODE {
      return StoreError::NotFound(message);
    }
    if status.is_server_error() {
      return StoreError::Transport(format!("HTTP {}: {}", status, message));
    }
    if status.is_client_error() {
      return StoreError::Validation { code, message };
    }
    StoreError::Remote { code, message }
  }
}

impl ApiAuthError {
  pub fn into_store_error(self, status: StatusCode) -> StoreError {
    let code = self
      .error_code
      .or(self.error)
      .unwrap_or_else(|| status.as_u16().to_string());
    let message = self
      .error_description
      .or(self.msg)
      .or(self.message)
      .unwrap_or_else(|| format!("HTTP {}", status));

    if status.is_server_error() {
      StoreError::Transport(format!("HTTP {}: {}", status, message))
    } else {
      StoreError::Validation { code, message }
    }
  }
}

/// Parse an error body, tolerating empty or non-JSON payloads
pub fn parse_error_body<T: Default + for<'de> Deserialize<'de>>(body: &str) -> T {
  serde_json::from_str(body).unwrap_or_default()
}
