//! Domain models for the catalog: the two record types, their schemas, and
//! the string-keyed records loaded from the CSV stores. These stay plain data
//! holders so the store and the TUI can share them without conversions.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::store::StoreError;

/// Field every record type carries and the shell searches on.
pub const ISBN_FIELD: &str = "isbn";
/// Field the merged listing is ordered by.
pub const TITLE_FIELD: &str = "title";

const BOOK_FIELDS: &[&str] = &["title", "isbn", "authors", "description"];
const MAGAZINE_FIELDS: &[&str] = &["title", "isbn", "authors", "publishedAt"];

/// The fixed set of record types the catalog knows how to store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    Books,
    Magazines,
}

impl RecordType {
    /// Every record type in scan order. ISBN search walks this list and stops
    /// at the first type with a hit, so books win over magazines.
    pub const ALL: [RecordType; 2] = [RecordType::Books, RecordType::Magazines];

    /// Name used both for display and for the backing file stem.
    pub fn name(self) -> &'static str {
        match self {
            RecordType::Books => "books",
            RecordType::Magazines => "magazines",
        }
    }

    /// Singular noun for status messages ("Add book").
    pub fn singular(self) -> &'static str {
        match self {
            RecordType::Books => "book",
            RecordType::Magazines => "magazine",
        }
    }

    /// Ordered field names for this type. Serialization follows this order.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            RecordType::Books => BOOK_FIELDS,
            RecordType::Magazines => MAGAZINE_FIELDS,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RecordType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordType::ALL
            .into_iter()
            .find(|record_type| record_type.name() == s)
            .ok_or_else(|| StoreError::UnknownType(s.to_string()))
    }
}

/// Look up the ordered schema for a type given by name.
pub fn fields_for(type_name: &str) -> Result<&'static [&'static str], StoreError> {
    type_name.parse::<RecordType>().map(RecordType::fields)
}

/// One book or magazine, keyed by field name. Key order carries no meaning;
/// callers that need schema order go through [`Record::values_in`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: HashMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from `(field, value)` pairs. Later duplicates win.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names present on the record, sorted so error messages are stable.
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.fields.keys().cloned().collect();
        names.sort();
        names
    }

    /// True when the key set is exactly `schema`, ignoring order.
    pub fn matches_schema(&self, schema: &[&str]) -> bool {
        self.fields.len() == schema.len()
            && schema.iter().all(|field| self.fields.contains_key(*field))
    }

    /// Values listed in the given field order. Missing fields come back empty.
    pub fn values_in<'a>(&'a self, order: &'a [&'a str]) -> impl Iterator<Item = &'a str> + 'a {
        order.iter().map(|field| self.get(field).unwrap_or(""))
    }
}

/// All records of one type, in the order they appear in the backing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSet {
    pub record_type: RecordType,
    pub records: Vec<Record>,
}

impl RecordSet {
    pub fn new(record_type: RecordType) -> Self {
        Self {
            record_type,
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
