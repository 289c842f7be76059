//! Sessions, routes and the guard deciding whether a route may be entered.

use color_eyre::{eyre::eyre, Result};
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use crate::config::StoreConfig;
use crate::employee::{parse_error_body, ApiAuthError, ApiTokenResponse, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
  pub id: String,
  pub email: String,
}

impl User {
  /// First two characters of the email, uppercased
  pub fn initials(&self) -> String {
    let initials: String = self.email.chars().take(2).flat_map(char::to_uppercase).collect();
    if initials.is_empty() {
      "U".to_string()
    } else {
      initials
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub user: User,
  pub access_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
  /// A sign-in attempt is in progress
  Resolving,
  SignedOut,
  SignedIn(User),
}

impl AuthState {
  pub fn user(&self) -> Option<&User> {
    match self {
      AuthState::SignedIn(user) => Some(user),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
  Directory,
  EmployeeDetail { id: String },
  Login,
}

impl Route {
  pub fn is_protected(&self) -> bool {
    !matches!(self, Route::Login)
  }

  pub fn path(&self) -> String {
    match self {
      Route::Directory => "/".to_string(),
      Route::EmployeeDetail { id } => format!("/employee/{}", id),
      Route::Login => "/auth".to_string(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
  Enter,
  /// Auth has not resolved yet; show a placeholder and ask again later
  Wait,
  Redirect(Route),
}

/// Decide whether `route` may be entered in the current auth state
pub fn guard(route: &Route, auth: &AuthState) -> RouteDecision {
  match (route.is_protected(), auth) {
    (_, AuthState::Resolving) => RouteDecision::Wait,
    (true, AuthState::SignedOut) => RouteDecision::Redirect(Route::Login),
    (true, AuthState::SignedIn(_)) => RouteDecision::Enter,
    (false, AuthState::SignedIn(_)) => RouteDecision::Redirect(Route::Directory),
    (false, AuthState::SignedOut) => RouteDecision::Enter,
  }
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
  email: &'a str,
  password: &'a str,
}

/// Client for the auth provider's password grant and logout endpoints
#[derive(Clone)]
pub struct AuthClient {
  http: reqwest::Client,
  base_url: Url,
  api_key: String,
}

impl AuthClient {
  pub fn new(config: &StoreConfig, api_key: &str) -> Result<Self> {
    let mut base_url =
      Url::parse(&config.url).map_err(|e| eyre!("Invalid store URL {}: {}", config.url, e))?;
    if !base_url.path().ends_with('/') {
      let path = format!("{}/", base_url.path());
      base_url.set_path(&path);
    }

    let http = reqwest::Client::builder()
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url,
      api_key: api_key.to_string(),
    })
  }

  fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
    self.base_url.join(path).map_err(StoreError::transport)
  }

  pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, StoreError> {
    debug!(email, "signing in");
    let url = self.endpoint("auth/v1/token")?;

    let response = self
      .http
      .post(url)
      .query(&[("grant_type", "password")])
      .header("apikey", &self.api_key)
      .json(&PasswordGrant { email, password })
      .send()
      .await
      .map_err(StoreError::transport)?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(parse_error_body::<ApiAuthError>(&body).into_store_error(status));
    }

    let token: ApiTokenResponse = response
      .json()
      .await
      .map_err(|e| StoreError::transport(format!("Failed to parse response: {}", e)))?;

    info!(user = %token.user.id, "signed in");
    Ok(Session {
      user: User {
        id: token.user.id,
        email: token.user.email.unwrap_or_else(|| email.to_string()),
      },
      access_token: token.access_token,
    })
  }

  pub async fn sign_out(&self, session: &Session) -> Result<(), StoreError> {
    debug!(user = %session.user.id, "signing out");
    let url = self.endpoint("auth/v1/logout")?;

    let response = self
      .http
      .post(url)
      .header("apikey", &self.api_key)
      .header(AUTHORIZATION, format!("Bearer {}", session.access_token))
      .send()
      .await
      .map_err(StoreError::transport)?;

    let status = response.status();
    // An already-expired token still ends the local session
    if status.is_success() || status == reqwest::StatusCode::UNAUTHORIZED {
      return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(parse_error_body::<ApiAuthError>(&body).into_store_error(status))
  }
}
