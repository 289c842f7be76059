use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::CacheOptions;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub store: StoreConfig,
  #[serde(default)]
  pub auth: AuthConfig,
  #[serde(default)]
  pub ui: UiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
  /// Project URL, e.g. https://abc.supabase.co
  #[serde(default)]
  pub url: String,
  #[serde(default = "default_table")]
  pub table: String,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      url: String::new(),
      table: default_table(),
    }
  }
}

fn default_table() -> String {
  "employees".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
  /// Pre-fills the login form; with TEAMHUB_PASSWORD set, signs in on start
  pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
  #[serde(default = "default_debounce_ms")]
  pub debounce_ms: u64,
  #[serde(default = "default_toast_secs")]
  pub toast_secs: u64,
}

impl Default for UiConfig {
  fn default() -> Self {
    Self {
      debounce_ms: default_debounce_ms(),
      toast_secs: default_toast_secs(),
    }
  }
}

fn default_debounce_ms() -> u64 {
  300
}

fn default_toast_secs() -> u64 {
  4
}

impl UiConfig {
  pub fn debounce(&self) -> Duration {
    Duration::from_millis(self.debounce_ms)
  }

  pub fn toast_ttl(&self) -> Duration {
    Duration::from_secs(self.toast_secs)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Seconds before cached data is refetched on use (unset: until invalidated)
  pub stale_secs: Option<u64>,
  #[serde(default = "default_max_entries")]
  pub max_entries: usize,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      stale_secs: None,
      max_entries: default_max_entries(),
    }
  }
}

fn default_max_entries() -> usize {
  64
}

impl CacheConfig {
  pub fn options(&self) -> CacheOptions {
    CacheOptions {
      stale_time: self.stale_secs.map(Duration::from_secs),
      max_entries: self.max_entries,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./teamhub.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/teamhub/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/teamhub/config.yaml\n\
                 or run with --demo to use the built-in sample data."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("teamhub.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("teamhub").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))?;
    if config.store.url.trim().is_empty() {
      return Err(eyre!("store.url is required"));
    }
    Ok(config)
  }

  /// Get the project API key from environment variables.
  ///
  /// Checks TEAMHUB_API_KEY first, then SUPABASE_ANON_KEY as fallback.
  pub fn get_api_key() -> Result<String> {
    std::env::var("TEAMHUB_API_KEY")
      .or_else(|_| std::env::var("SUPABASE_ANON_KEY"))
      .map_err(|_| {
        eyre!("API key not found. Set TEAMHUB_API_KEY or SUPABASE_ANON_KEY environment variable.")
      })
  }

  /// Get the sign-in password from environment variables.
  ///
  /// Checks TEAMHUB_PASSWORD.
  pub fn get_password() -> Option<String> {
    std::env::var("TEAMHUB_PASSWORD")
      .ok()
      .filter(|p| !p.is_empty())
  }
}
