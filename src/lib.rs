//! Core library surface for the library catalog TUI.
//!
//! Books and magazines live in `;`-delimited CSV files, one per record type.
//! The modules below load those files into keyed records, run the listing,
//! ISBN search, and title sort queries, append new rows, and drive the
//! terminal menu on top of all that.
pub mod logging;
pub mod models;
pub mod query;
pub mod store;
pub mod ui;

/// Schema registry and record containers.
pub use models::{fields_for, Record, RecordSet, RecordType, ISBN_FIELD, TITLE_FIELD};

/// Pure queries over loaded record sets.
pub use query::{find_by_key, list_all, merge_sorted, SearchOutcome};

/// The persistence layer: a handle on the data directory plus load/append.
pub use store::{append_record, load_many, load_records, RecordStore, StoreError};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
