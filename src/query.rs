//! Pure queries over record sets that have already been loaded. Nothing here
//! touches the filesystem, which keeps the search and sort rules testable
//! without fixtures.

use crate::models::{Record, RecordSet, RecordType};

/// Result of a key lookup across several record types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Matches from the first type, in scan order, that had any.
    Found {
        record_type: RecordType,
        records: Vec<Record>,
    },
    /// Every type was scanned without a hit.
    NotFound { scanned: usize },
}

impl SearchOutcome {
    pub fn records(&self) -> &[Record] {
        match self {
            SearchOutcome::Found { records, .. } => records,
            SearchOutcome::NotFound { .. } => &[],
        }
    }
}

/// Every record in file order, for display.
pub fn list_all(set: &RecordSet) -> &[Record] {
    &set.records
}

/// Scan `sets` in order and return the matches of the first set that has any.
/// Later sets are not consulted once a hit is found, so a value present in
/// both books and magazines only yields the books. Not-found is reported only
/// after the last set has been scanned.
pub fn find_by_key(sets: &[RecordSet], key_field: &str, value: &str) -> SearchOutcome {
    for set in sets {
        let records: Vec<Record> = set
            .records
            .iter()
            .filter(|record| record.get(key_field) == Some(value))
            .cloned()
            .collect();
        if !records.is_empty() {
            return SearchOutcome::Found {
                record_type: set.record_type,
                records,
            };
        }
    }
    SearchOutcome::NotFound {
        scanned: sets.len(),
    }
}

/// Concatenate `sets` in order and sort by `sort_field`, comparing lowercased
/// values. The sort is stable, so equal keys keep their concatenated order.
/// Records without the field sort as if it were empty.
pub fn merge_sorted(sets: &[RecordSet], sort_field: &str) -> Vec<Record> {
    let mut merged: Vec<Record> = sets
        .iter()
        .flat_map(|set| set.records.iter().cloned())
        .collect();
    merged.sort_by_cached_key(|record| record.get(sort_field).unwrap_or("").to_lowercase());
    merged
}
