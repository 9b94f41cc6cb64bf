//! `mctl`: live dashboard and operator console for Mission Control.
//!
//! # Usage
//!
//! ```
//! mctl --url http://localhost:8080                  # live dashboard
//! mctl --config ~/.config/mctl/config.toml watch
//! mctl --user ops --password secret session select <launch-id>
//! mctl overlay custom --text "Hold for range safety"
//! ```

mod app;
mod catalogue;
mod client;
mod commands;
mod sync;
mod ui;

use std::{
  fs::File,
  io,
  path::PathBuf,
  sync::{Arc, Mutex},
  time::Duration,
};

use anyhow::{Context, Result, ensure};
use app::App;
use catalogue::{CatalogueClient, DEFAULT_CATALOGUE_URL};
use clap::Parser;
use client::{ApiClient, ApiConfig};
use commands::Command;
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use mctl_core::resolve::{DEFAULT_LAUNCH_GRACE_MINUTES, MAX_LAUNCH_GRACE_MINUTES};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use sync::{SyncConfig, Syncer};
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "mctl", about = "Live dashboard and operator console for Mission Control")]
struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE", global = true)]
  config: Option<PathBuf>,

  /// Base URL of the Mission Control server (default: http://localhost:8080).
  #[arg(long, env = "MCTL_URL", global = true)]
  url: Option<String>,

  /// Operator username.
  #[arg(long, env = "MCTL_USER", global = true)]
  user: Option<String>,

  /// Operator password (plaintext).
  #[arg(long, env = "MCTL_PASSWORD", global = true)]
  password: Option<String>,

  /// Seconds between dashboard refreshes (default: 30).
  #[arg(long, global = true)]
  interval: Option<u64>,

  /// Write logs here. The dashboard logs nowhere otherwise.
  #[arg(long, value_name = "FILE", global = true)]
  log_file: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Command>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:                  String,
  #[serde(default)]
  username:             String,
  #[serde(default)]
  password:             String,
  #[serde(default)]
  interval_secs:        Option<u64>,
  #[serde(default)]
  catalogue_url:        String,
  /// Must match the server's setting for the dashboard to agree with it.
  #[serde(default)]
  launch_grace_minutes: Option<i64>,
}

fn non_empty(s: &str) -> Option<String> { (!s.is_empty()).then(|| s.to_owned()) }

/// Same bounds the server applies: non-negative, and no more than a week.
fn launch_grace(minutes: Option<i64>) -> Result<chrono::Duration> {
  let minutes = minutes.unwrap_or(DEFAULT_LAUNCH_GRACE_MINUTES);
  ensure!(
    (0..=MAX_LAUNCH_GRACE_MINUTES).contains(&minutes),
    "launch_grace_minutes must be between 0 and {MAX_LAUNCH_GRACE_MINUTES}"
  );
  Ok(chrono::Duration::minutes(minutes))
}

fn init_tracing(log_file: Option<&PathBuf>, watching: bool) -> Result<()> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  match log_file {
    Some(path) => {
      let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    }
    // The dashboard owns the terminal.
    None if watching => {}
    None => {
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    }
  }
  Ok(())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let command = args.command.unwrap_or(Command::Watch);
  let watching = matches!(command, Command::Watch);
  init_tracing(args.log_file.as_ref(), watching)?;

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| non_empty(&file_cfg.url))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    username: args
      .user
      .or_else(|| non_empty(&file_cfg.username))
      .unwrap_or_default(),
    password: args
      .password
      .or_else(|| non_empty(&file_cfg.password))
      .unwrap_or_default(),
  };
  let client = ApiClient::new(api_config)?;

  if !watching {
    let catalogue_url =
      non_empty(&file_cfg.catalogue_url).unwrap_or_else(|| DEFAULT_CATALOGUE_URL.to_owned());
    let catalogue = CatalogueClient::new(&catalogue_url)?;
    return commands::run(command, &client, &catalogue).await;
  }

  let sync_config = SyncConfig {
    interval: Duration::from_secs(args.interval.or(file_cfg.interval_secs).unwrap_or(30).max(1)),
    grace:    launch_grace(file_cfg.launch_grace_minutes)?,
  };
  watch(client, sync_config).await
}

// ─── Dashboard ────────────────────────────────────────────────────────────────

async fn watch(client: ApiClient, config: SyncConfig) -> Result<()> {
  let syncer = Syncer::spawn(Arc::new(client), config);
  let mut app = App::new(syncer.subscribe());

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Run the event loop; restore terminal even on error.
  let run_result = run_event_loop(&mut terminal, &mut app);

  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  syncer.stop().await;
  run_result
}

fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    app.refresh();
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Short poll so the countdown and clock tick without input.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(250))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && !app.handle_key(key)
    {
      break;
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn launch_grace_defaults_and_bounds() {
    assert_eq!(
      launch_grace(None).unwrap(),
      chrono::Duration::minutes(DEFAULT_LAUNCH_GRACE_MINUTES)
    );
    assert_eq!(launch_grace(Some(0)).unwrap(), chrono::Duration::zero());
    assert!(launch_grace(Some(-1)).is_err());
    assert!(launch_grace(Some(i64::MAX)).is_err());
  }
}
