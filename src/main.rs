// Entry point for the Minesweeper TUI application
// Resolves configuration, sets up file logging, and launches the main UI

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::{self, File};
use std::sync::Mutex;
use tracing::{info, warn};

use mswpr::msw_config::{Config, load_or_create_config, log_path};
use mswpr::msw_game::Game;
use mswpr::msw_ui::run as run_ui;

#[derive(Parser, Debug)]
#[command(name = "mswpr", about = "Terminal Minesweeper with a safe first click", version)]
struct Args {
    /// Board dimension; the board is D x D cells
    #[arg(short, long)]
    dimension: Option<usize>,
    /// Number of mines
    #[arg(short, long)]
    mines: Option<usize>,
}

/// Send tracing output to the log file; stdout belongs to the TUI
fn init_logging(cfg: &Config) -> Result<()> {
    let path = log_path().context("no location for the log file")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(cfg.max_level())
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing log subscriber: {e}"))
}

fn main() -> Result<()> {
    let args = Args::parse();

    // A broken config file falls back to defaults rather than blocking play
    let loaded = load_or_create_config();
    let cfg = loaded
        .as_ref()
        .cloned()
        .unwrap_or_default()
        .with_overrides(args.dimension, args.mines);

    if let Err(e) = init_logging(&cfg) {
        eprintln!("logging disabled: {e:#}");
    }
    if let Err(e) = &loaded {
        warn!("using default configuration: {e:#}");
    }

    // Invalid board settings are fatal before the terminal is touched
    let mut game = Game::new(cfg.dimension, cfg.mines).context("invalid board configuration")?;
    info!(dimension = cfg.dimension, mines = cfg.mines, "starting");

    run_ui(&mut game, &cfg)
}
