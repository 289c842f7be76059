//! Where sessions and employee stores come from.

use std::sync::Arc;

use color_eyre::Result;
use tracing::info;

use crate::auth::{AuthClient, Session, User};
use crate::config::StoreConfig;
use crate::employee::{EmployeeStore, InMemoryStore, RestStore, StoreError};

#[derive(Clone)]
pub enum Backend {
  /// Hosted project: auth provider plus REST table
  Remote {
    store: StoreConfig,
    api_key: String,
    auth: AuthClient,
  },
  /// Seeded in-memory table; any non-empty credentials sign in
  Demo(Arc<InMemoryStore>),
}

impl Backend {
  pub fn remote(store: &StoreConfig, api_key: String) -> Result<Self> {
    let auth = AuthClient::new(store, &api_key)?;
    Ok(Backend::Remote {
      store: store.clone(),
      api_key,
      auth,
    })
  }

  pub fn demo() -> Self {
    Backend::Demo(Arc::new(InMemoryStore::seeded()))
  }

  pub fn is_demo(&self) -> bool {
    matches!(self, Backend::Demo(_))
  }

  /// Label shown in the header
  pub fn label(&self) -> String {
    match self {
      Backend::Remote { store, .. } => store.url.clone(),
      Backend::Demo(_) => "demo".to_string(),
    }
  }

  pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, StoreError> {
    match self {
      Backend::Remote { auth, .. } => auth.sign_in(email, password).await,
      Backend::Demo(_) => {
        if email.trim().is_empty() || password.is_empty() {
          return Err(StoreError::Validation {
            code: "invalid_credentials".to_string(),
            message: "Invalid login credentials".to_string(),
          });
        }
        info!(email, "signed in to demo backend");
        Ok(Session {
          user: User {
            id: format!("demo-{}", email.trim().to_lowercase()),
            email: email.trim().to_string(),
          },
          access_token: String::new(),
        })
      }
    }
  }

  pub async fn sign_out(&self, session: &Session) -> Result<(), StoreError> {
    match self {
      Backend::Remote { auth, .. } => auth.sign_out(session).await,
      Backend::Demo(_) => Ok(()),
    }
  }

  /// Store authorized with the session's access token
  pub fn store_for(&self, session: &Session) -> Result<Arc<dyn EmployeeStore>> {
    match self {
      Backend::Remote { store, api_key, .. } => {
        let client: Arc<dyn EmployeeStore> =
          Arc::new(RestStore::new(store, api_key, Some(&session.access_token))?);
        Ok(client)
      }
      Backend::Demo(store) => {
        let store: Arc<dyn EmployeeStore> = store.clone();
        Ok(store)
      }
    }
  }
}
