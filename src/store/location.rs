use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::models::RecordType;

/// Directory, relative to the working directory, that holds the CSV files
/// when no `--data-dir` is given.
pub const DEFAULT_DATA_DIR: &str = "data";
/// Field separator used by every backing file. Values are never escaped.
pub const DELIMITER: char = ';';

/// Handle on the directory of `<type>.csv` files. It plays the role a database
/// connection would: every read and append goes through it, but it holds no
/// cached records.
#[derive(Debug, Clone)]
pub struct RecordStore {
    data_dir: PathBuf,
}

impl RecordStore {
    /// Make sure the data directory exists and return a handle on it. Missing
    /// CSV files are not created here; reads report them, appends create them.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Backing file for a record type: `<data_dir>/<type>.csv`.
    pub fn path_for(&self, record_type: RecordType) -> PathBuf {
        self.data_dir.join(format!("{}.csv", record_type.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("data");

        let store = RecordStore::open(&nested).unwrap();

        assert!(nested.is_dir());
        assert_eq!(store.path_for(RecordType::Books), nested.join("books.csv"));
        assert_eq!(
            store.path_for(RecordType::Magazines),
            nested.join("magazines.csv")
        );
    }
}
