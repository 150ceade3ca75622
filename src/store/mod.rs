//! Persistence module split across logical submodules.

mod error;
mod location;
mod reader;
mod writer;

pub use error::StoreError;
pub use location::{RecordStore, DEFAULT_DATA_DIR, DELIMITER};
pub use reader::{load_many, load_records};
pub use writer::append_record;
