//! Runtime configuration resolved once at startup: where the database, the
//! log file, and generated exports live. Logging is routed to a file because
//! the terminal belongs to the TUI while the app is running.

use std::env;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".song-order-manager";
/// Overrides the data directory entirely when set.
const HOME_ENV: &str = "SONG_ORDER_HOME";
/// Standard `EnvFilter` directives for the log file.
const LOG_ENV: &str = "SONG_ORDER_LOG";
const DEFAULT_LOG_FILTER: &str = "song_order_manager=info";

const DB_FILE_NAME: &str = "songs.sqlite";
const LOG_FILE_NAME: &str = "song-order-manager.log";
const EXPORT_DIR_NAME: &str = "exports";

#[derive(Debug, Clone)]
pub struct Config {
    data_dir: PathBuf,
}

impl Config {
    /// Resolve the data directory from `SONG_ORDER_HOME` or the user's home.
    pub fn resolve() -> Result<Self> {
        if let Some(dir) = env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
            return Ok(Self::with_data_dir(PathBuf::from(dir)));
        }
        let base_dirs =
            BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
        Ok(Self::with_data_dir(base_dirs.home_dir().join(DATA_DIR_NAME)))
    }

    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE_NAME)
    }

    pub fn export_dir(&self) -> PathBuf {
        self.data_dir.join(EXPORT_DIR_NAME)
    }

    /// Create the data and export directories if they are missing.
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir).context("failed to create data directory")?;
        fs::create_dir_all(self.export_dir()).context("failed to create export directory")?;
        Ok(())
    }
}

/// Install the global `tracing` subscriber, appending to the log file in the
/// data directory.
pub fn init_logging(config: &Config) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path())
        .context("failed to open log file")?;

    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .try_init()
        .context("failed to install log subscriber")?;

    tracing::info!(data_dir = %config.data_dir().display(), "logging initialised");
    Ok(())
}
