//! `merit`: terminal UI for the merit/demerit point ledger.
//!
//! # Usage
//!
//! ```
//! merit
//! merit --data-dir ~/school/merit
//! merit --database ./points.db --backup-dir /mnt/usb/backups
//! ```

mod app;
mod config;
mod context;
mod ui;

use std::{
  fs::OpenOptions,
  io,
  path::{Path, PathBuf},
  sync::Mutex,
  time::Duration,
};

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use context::{AppContext, Paths};
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "merit", about = "Terminal ledger for student merit and demerit points")]
struct Args {
  /// Directory holding the database, settings, backups and log.
  /// Defaults to the directory of the executable.
  #[arg(long, env = "MERIT_DATA_DIR", value_name = "DIR")]
  data_dir: Option<PathBuf>,

  /// Database file (default: <data-dir>/data.db).
  #[arg(long, value_name = "FILE")]
  database: Option<PathBuf>,

  /// Settings file (default: <data-dir>/config.toml).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Directory that receives backups before a reset (default: <data-dir>/backups).
  #[arg(long, value_name = "DIR")]
  backup_dir: Option<PathBuf>,

  /// Log file (default: <data-dir>/merit.log).
  #[arg(long, value_name = "FILE")]
  log_file: Option<PathBuf>,
}

impl Args {
  /// CLI overrides on top of the data-directory layout.
  fn paths(&self, data_dir: &Path) -> Paths {
    let defaults = Paths::in_dir(data_dir);
    Paths {
      database: self.database.clone().unwrap_or(defaults.database),
      settings: self.config.clone().unwrap_or(defaults.settings),
      backups:  self.backup_dir.clone().unwrap_or(defaults.backups),
      log:      self.log_file.clone().unwrap_or(defaults.log),
    }
  }
}

fn default_data_dir() -> PathBuf {
  std::env::current_exe()
    .ok()
    .and_then(|exe| exe.parent().map(Path::to_path_buf))
    .unwrap_or_else(|| PathBuf::from("."))
}

// ─── Logging ──────────────────────────────────────────────────────────────────

/// The terminal belongs to the UI, so logs go to a file.
fn init_tracing(path: &Path) -> Result<()> {
  let file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(path)
    .with_context(|| format!("opening log file {}", path.display()))?;

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    )
    .with_writer(Mutex::new(file))
    .with_ansi(false)
    .init();
  Ok(())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
  let args = Args::parse();

  let data_dir = args.data_dir.clone().unwrap_or_else(default_data_dir);
  std::fs::create_dir_all(&data_dir)
    .with_context(|| format!("creating data directory {}", data_dir.display()))?;
  let paths = args.paths(&data_dir);

  init_tracing(&paths.log)?;
  tracing::info!(data_dir = %data_dir.display(), "starting merit");

  let ctx = AppContext::open(paths).await?;
  tracing::info!(database = %ctx.paths().database.display(), "store ready");
  let mut app = App::new(ctx);

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Run the event loop; restore terminal even on error.
  let run_result = run_event_loop(&mut terminal, &mut app).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  if let Err(e) = &run_result {
    tracing::error!(error = %e, "event loop failed");
  }
  app.ctx.close().await?;
  tracing::info!("shut down");

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    if !event::poll(Duration::from_millis(100)).context("polling terminal events")? {
      continue;
    }

    match event::read().context("reading terminal event")? {
      Event::Key(key) if key.kind == KeyEventKind::Press => {
        if !app.handle_key(key).await? {
          break;
        }
      }
      // Terminal will redraw on next iteration.
      _ => {}
    }
  }

  Ok(())
}
