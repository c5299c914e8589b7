// Startup configuration
// Board size and mine count from a TOML file, overridable on the command line

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing::Level;

const APP_NAME: &str = "mswpr";

/// Mine count used when only the dimension is chosen: a quarter of the board, minus one,
/// capped so a 3x3 safe area always fits. Zero when the board is smaller than that.
pub fn default_mines(dimension: usize) -> usize {
    let cells = dimension.saturating_mul(dimension);
    (cells / 4).saturating_sub(1).min(cells.saturating_sub(9))
}

/// User configuration, persisted to disk as TOML
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub dimension: usize,   // Board is dimension x dimension
    pub mines: usize,       // Total mine count
    pub ascii_icons: bool,  // Use ASCII fallback icons
    pub log_level: String,  // trace, debug, info, warn or error
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dimension: 20,
            mines: default_mines(20),
            ascii_icons: false,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Apply command line choices. A new dimension without an explicit mine
    /// count gets the default density for that size.
    pub fn with_overrides(mut self, dimension: Option<usize>, mines: Option<usize>) -> Self {
        if let Some(d) = dimension {
            self.dimension = d;
            self.mines = default_mines(d);
        }
        if let Some(m) = mines {
            self.mines = m;
        }
        self
    }

    /// Parsed `log_level`, INFO when unrecognized
    pub fn max_level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::INFO)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", APP_NAME, APP_NAME)
}

/// Get the configuration file path
/// (e.g., ~/.config/mswpr/mswpr.toml on Linux), falling back to the current directory
pub fn config_path() -> Option<PathBuf> {
    let file = format!("{}.toml", APP_NAME);
    if let Some(proj) = project_dirs() {
        return Some(proj.config_dir().join(file));
    }
    env::current_dir().ok().map(|dir| dir.join(file))
}

/// Log file location in the platform data directory
pub fn log_path() -> Option<PathBuf> {
    let file = format!("{}.log", APP_NAME);
    if let Some(proj) = project_dirs() {
        return Some(proj.data_local_dir().join(file));
    }
    env::current_dir().ok().map(|dir| dir.join(file))
}

pub fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("invalid configuration file")
}

/// Load configuration from disk, writing the defaults on first run
pub fn load_or_create_config() -> Result<Config> {
    let Some(path) = config_path() else {
        return Ok(Config::default());
    };
    if path.exists() {
        let s = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        return parse_config(&s).with_context(|| format!("parsing {}", path.display()));
    }

    let cfg = Config::default();
    let s = toml::to_string(&cfg).context("serializing default configuration")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(&path, s).with_context(|| format!("writing {}", path.display()))?;
    Ok(cfg)
}
