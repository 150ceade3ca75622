use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, warn};

use crate::models::{Record, RecordSet, RecordType};

use super::error::StoreError;
use super::location::{RecordStore, DELIMITER};

/// Read every row of a type's backing file. The first non-empty line is the
/// header; each later line becomes one record keyed by the header tokens.
/// Nothing is cached, so every call reflects the file as it is right now.
pub fn load_records(store: &RecordStore, record_type: RecordType) -> Result<RecordSet, StoreError> {
    let path = store.path_for(record_type);
    let file = File::open(&path).map_err(|err| {
        warn!(path = %path.display(), error = %err, "record store unavailable");
        StoreError::unavailable(&path, err)
    })?;

    let set = parse_records(BufReader::new(file), record_type, &path)?;
    debug!(
        path = %path.display(),
        records = set.len(),
        "loaded {record_type}"
    );
    Ok(set)
}

/// Load several types in one go. The result lists the sets in request order
/// and the first failing type aborts the whole call.
pub fn load_many(store: &RecordStore, types: &[RecordType]) -> Result<Vec<RecordSet>, StoreError> {
    types
        .iter()
        .map(|record_type| load_records(store, *record_type))
        .collect()
}

fn parse_records<R: BufRead>(
    reader: R,
    record_type: RecordType,
    path: &Path,
) -> Result<RecordSet, StoreError> {
    let mut set = RecordSet::new(record_type);
    let mut header: Option<Vec<String>> = None;

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|err| StoreError::unavailable(path, err))?;
        let line = line.strip_suffix('\r').unwrap_or(&line);
        if line.is_empty() {
            continue;
        }

        let tokens: Vec<&str> = line.split(DELIMITER).collect();
        match &header {
            None => header = Some(check_header(&tokens, record_type)?),
            Some(columns) => {
                if tokens.len() != columns.len() {
                    warn!(path = %path.display(), line = index + 1, "malformed row");
                    return Err(StoreError::MalformedRow {
                        path: path.to_path_buf(),
                        line: index + 1,
                        expected: columns.len(),
                        found: tokens.len(),
                    });
                }
                set.records
                    .push(Record::from_pairs(columns.iter().cloned().zip(tokens)));
            }
        }
    }

    Ok(set)
}

/// The header must list the schema's fields in schema order. The writer
/// always appends values in that order, so any other layout would shift
/// appended values into the wrong columns.
pub(super) fn check_header(
    tokens: &[&str],
    record_type: RecordType,
) -> Result<Vec<String>, StoreError> {
    let schema = record_type.fields();
    if tokens.iter().copied().eq(schema.iter().copied()) {
        Ok(tokens.iter().map(|token| token.to_string()).collect())
    } else {
        Err(StoreError::SchemaMismatch {
            record_type,
            expected: schema.iter().map(|field| field.to_string()).collect(),
            found: tokens.iter().map(|token| token.to_string()).collect(),
        })
    }
}
