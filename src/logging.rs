//! File-backed diagnostics. The TUI owns the terminal, so tracing output can
//! only go to a file the user names.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Install a global `tracing` subscriber writing plain text to `path`.
/// `RUST_LOG` overrides the default `info` filter. Fails if the file cannot be
/// created or a subscriber is already installed.
pub fn init_file_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(anyhow::Error::msg)
        .context("failed to install log subscriber")
}
