use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};
use log::LevelFilter;
use simplelog::{Config, WriteLogger};

/// Fixed log file name, created in the working directory.
pub const LOG_FILE_NAME: &str = "gp-recover.log";

/// Default engine adapter when `GPREC_ENGINE` is unset.
pub const DEFAULT_ENGINE: &str = "rizin";

/// Install an append-mode file logger at info level.
///
/// The file is shared across runs in the same directory; each run appends
/// its own lines. Can only be called once per process.
pub fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file at {}", path.display()))?;
    WriteLogger::init(LevelFilter::Info, Config::default(), file)
        .context("Failed to install file logger")?;
    Ok(())
}

/// Engine adapter name from `GPREC_ENGINE`, falling back to the default.
pub fn engine_name_from_env() -> String {
    std::env::var("GPREC_ENGINE").unwrap_or_else(|_| DEFAULT_ENGINE.to_string())
}
