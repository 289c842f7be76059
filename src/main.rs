mod app;
mod auth;
mod backend;
mod cache;
mod commands;
mod config;
mod employee;
mod event;
mod logging;
mod notify;
mod query;
mod search;
mod ui;

use backend::Backend;
use clap::Parser;
use color_eyre::Result;
use config::Config;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "teamhub")]
#[command(about = "A terminal UI for your team's employee directory")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/teamhub/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Use a seeded in-memory directory instead of a remote project
  #[arg(long)]
  demo: bool,

  /// Log file (default: $XDG_DATA_HOME/teamhub/teamhub.log)
  #[arg(long)]
  log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let log_path = match args.log_file {
    Some(path) => path,
    None => logging::default_log_path()?,
  };
  let _guard = logging::init_logging(&log_path)?;

  let (config, backend) = if args.demo {
    let config = match args.config.as_deref() {
      Some(path) => Config::load(Some(path))?,
      None => Config::default(),
    };
    (config, Backend::demo())
  } else {
    let config = Config::load(args.config.as_deref())?;
    let backend = Backend::remote(&config.store, Config::get_api_key()?)?;
    (config, backend)
  };
  info!(backend = %backend.label(), demo = backend.is_demo(), "starting");

  let credentials = config.auth.email.clone().zip(Config::get_password());
  let mut app = app::App::new(config, backend);
  if let Some((email, password)) = credentials {
    app = app.with_credentials(email, password);
  }
  app.run().await?;

  Ok(())
}
