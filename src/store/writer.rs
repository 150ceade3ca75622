use std::fs::OpenOptions;
use std::io::{Read, Write};

use tracing::{debug, warn};

use crate::models::{Record, RecordType};

use super::error::StoreError;
use super::location::{RecordStore, DELIMITER};
use super::reader::check_header;

/// Append one record as a single `;`-joined line in schema order.
///
/// The record must carry exactly the schema's fields; anything else is a
/// `SchemaMismatch` and the file is left untouched. An existing header must
/// match the schema in order too, since values are positioned by schema
/// order. Values are written verbatim, so a value containing `;` produces a
/// row the reader will later reject as malformed. A file with no header
/// (missing, empty, or only blank lines) gets the header line first.
pub fn append_record(
    store: &RecordStore,
    record_type: RecordType,
    record: &Record,
) -> Result<(), StoreError> {
    let schema = record_type.fields();
    if !record.matches_schema(schema) {
        return Err(StoreError::SchemaMismatch {
            record_type,
            expected: schema.iter().map(|field| field.to_string()).collect(),
            found: record.field_names(),
        });
    }

    let path = store.path_for(record_type);
    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(&path)
        .map_err(|err| StoreError::unavailable(&path, err))?;

    let mut existing = String::new();
    file.read_to_string(&mut existing)
        .map_err(|err| StoreError::unavailable(&path, err))?;

    let mut payload = String::new();
    if !existing.is_empty() && !existing.ends_with('\n') {
        payload.push('\n');
    }
    match first_non_empty_line(&existing) {
        Some(header) => {
            let tokens: Vec<&str> = header.split(DELIMITER).collect();
            check_header(&tokens, record_type)?;
        }
        None => {
            payload.push_str(&join_line(schema.iter().copied()));
            payload.push('\n');
        }
    }
    payload.push_str(&join_line(record.values_in(schema)));
    payload.push('\n');

    file.write_all(payload.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|err| {
            warn!(path = %path.display(), error = %err, "append failed");
            StoreError::unavailable(&path, err)
        })?;

    debug!(path = %path.display(), "appended {} record", record_type.singular());
    Ok(())
}

fn first_non_empty_line(contents: &str) -> Option<&str> {
    contents
        .lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .find(|line| !line.is_empty())
}

fn join_line<'a>(values: impl Iterator<Item = &'a str>) -> String {
    values.collect::<Vec<_>>().join(&DELIMITER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::load_records;
    use std::fs;
    use tempfile::TempDir;

    fn book(title: &str, isbn: &str) -> Record {
        Record::from_pairs([
            ("title", title),
            ("isbn", isbn),
            ("authors", "Someone"),
            ("description", "Something"),
        ])
    }

    #[test]
    fn append_to_missing_file_writes_header_first() {
        let temp_dir = TempDir::new().unwrap();
        let store = RecordStore::open(temp_dir.path()).unwrap();

        append_record(&store, RecordType::Books, &book("Dune", "111")).unwrap();

        let contents = fs::read_to_string(store.path_for(RecordType::Books)).unwrap();
        assert_eq!(
            contents,
            "title;isbn;authors;description\nDune;111;Someone;Something\n"
        );
    }

    #[test]
    fn append_starts_a_new_line_after_unterminated_content() {
        let temp_dir = TempDir::new().unwrap();
        let store = RecordStore::open(temp_dir.path()).unwrap();
        let path = store.path_for(RecordType::Books);
        fs::write(&path, "title;isbn;authors;description\nEmma;222;Austen;Match").unwrap();

        append_record(&store, RecordType::Books, &book("Dune", "111")).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "title;isbn;authors;description\nEmma;222;Austen;Match\nDune;111;Someone;Something\n"
        );
    }

    #[test]
    fn blank_only_file_gets_a_header() {
        let temp_dir = TempDir::new().unwrap();
        let store = RecordStore::open(temp_dir.path()).unwrap();
        let path = store.path_for(RecordType::Books);
        fs::write(&path, "\n\n").unwrap();

        append_record(&store, RecordType::Books, &book("Dune", "111")).unwrap();

        let set = load_records(&store, RecordType::Books).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.records[0].get("title"), Some("Dune"));
    }

    #[test]
    fn reordered_header_blocks_append() {
        let temp_dir = TempDir::new().unwrap();
        let store = RecordStore::open(temp_dir.path()).unwrap();
        let path = store.path_for(RecordType::Books);
        fs::write(&path, "isbn;title;authors;description\n").unwrap();

        let err = append_record(&store, RecordType::Books, &book("Dune", "111")).unwrap_err();

        assert!(matches!(err, StoreError::SchemaMismatch { .. }));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "isbn;title;authors;description\n"
        );
    }

    #[test]
    fn values_are_written_in_schema_order() {
        let temp_dir = TempDir::new().unwrap();
        let store = RecordStore::open(temp_dir.path()).unwrap();
        let record = Record::from_pairs([
            ("publishedAt", "2021-05-01"),
            ("authors", "Staff"),
            ("isbn", "9"),
            ("title", "Wired"),
        ]);

        append_record(&store, RecordType::Magazines, &record).unwrap();

        let contents = fs::read_to_string(store.path_for(RecordType::Magazines)).unwrap();
        assert!(contents.ends_with("Wired;9;Staff;2021-05-01\n"));
    }

    #[test]
    fn missing_field_is_rejected_without_writing() {
        let temp_dir = TempDir::new().unwrap();
        let store = RecordStore::open(temp_dir.path()).unwrap();
        let path = store.path_for(RecordType::Books);
        fs::write(&path, "title;isbn;authors;description\n").unwrap();
        let record = Record::from_pairs([("title", "Dune"), ("isbn", "1"), ("authors", "H")]);

        let err = append_record(&store, RecordType::Books, &record).unwrap_err();

        assert!(matches!(err, StoreError::SchemaMismatch { ref found, .. } if found.len() == 3));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "title;isbn;authors;description\n"
        );
    }

    #[test]
    fn magazine_record_does_not_fit_books() {
        let temp_dir = TempDir::new().unwrap();
        let store = RecordStore::open(temp_dir.path()).unwrap();
        let record = Record::from_pairs([
            ("title", "Wired"),
            ("isbn", "9"),
            ("authors", "Staff"),
            ("publishedAt", "2021"),
        ]);

        let err = append_record(&store, RecordType::Books, &record).unwrap_err();

        assert!(matches!(err, StoreError::SchemaMismatch { .. }));
        assert!(!store.path_for(RecordType::Books).exists());
    }

    #[test]
    fn unwritable_location_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let store = RecordStore::open(temp_dir.path()).unwrap();
        // A directory where the file should be cannot be opened for append.
        fs::create_dir(store.path_for(RecordType::Books)).unwrap();

        let err = append_record(&store, RecordType::Books, &book("Dune", "1")).unwrap_err();
        assert!(matches!(err, StoreError::StoreUnavailable { .. }));
    }
}
