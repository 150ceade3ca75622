//! Binary entry point that glues the CSV record store to the TUI: parse the
//! flags, optionally route diagnostics to a log file, open the data directory,
//! and drive the Ratatui event loop until the user exits.
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use library_catalog::logging::init_file_logging;
use library_catalog::store::DEFAULT_DATA_DIR;
use library_catalog::{run_app, App, RecordStore};

#[derive(Parser)]
#[command(
    name = "library-catalog",
    version,
    about = "Browse, search, and extend the books and magazines CSV catalog"
)]
struct Cli {
    /// Directory holding books.csv and magazines.csv.
    #[arg(long, value_name = "DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Write diagnostics here. The terminal itself is owned by the UI, so
    /// without this flag nothing is logged.
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

/// Returning a `Result` bubbles up fatal startup problems (for example an
/// unwritable data directory) to the terminal instead of crashing silently.
fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(path) = &cli.log_file {
        init_file_logging(path)?;
    }

    let store = RecordStore::open(&cli.data_dir)?;
    tracing::info!(data_dir = %store.data_dir().display(), "starting library catalog");

    let mut app = App::new(store);
    run_app(&mut app)
}
