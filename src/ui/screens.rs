use crate::models::Record;

/// One selectable line of the welcome menu.
pub(crate) struct MenuEntry {
    pub(crate) key: char,
    pub(crate) label: &'static str,
    pub(crate) action: MenuAction,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum MenuAction {
    ListBooks,
    ListMagazines,
    SearchIsbn,
    ListSorted,
    AddRecord,
    Exit,
}

pub(crate) const MENU: &[MenuEntry] = &[
    MenuEntry {
        key: '1',
        label: "Print all books data",
        action: MenuAction::ListBooks,
    },
    MenuEntry {
        key: '2',
        label: "Print all magazines data",
        action: MenuAction::ListMagazines,
    },
    MenuEntry {
        key: '3',
        label: "Find a book or magazine by its ISBN",
        action: MenuAction::SearchIsbn,
    },
    MenuEntry {
        key: '4',
        label: "Print all books and magazines sorted by title",
        action: MenuAction::ListSorted,
    },
    MenuEntry {
        key: '5',
        label: "Add a book / magazine",
        action: MenuAction::AddRecord,
    },
    MenuEntry {
        key: '0',
        label: "Exit program",
        action: MenuAction::Exit,
    },
];

pub(crate) fn menu_action_for(key: char) -> Option<MenuAction> {
    MENU.iter()
        .find(|entry| entry.key == key)
        .map(|entry| entry.action)
}

/// A rendered table of records. Columns are the union of every record's
/// fields in first-seen order, so a merged listing shows both
/// `description` and `publishedAt` with blanks where a record lacks one.
pub(crate) struct ResultScreen {
    pub(crate) title: String,
    pub(crate) columns: Vec<String>,
    pub(crate) rows: Vec<Vec<String>>,
    pub(crate) selected: usize,
}

impl ResultScreen {
    /// `schema_hint` fixes the leading columns, even for an empty table.
    /// Records are keyed maps, so fields outside the hint are appended sorted.
    pub(crate) fn new(title: impl Into<String>, records: &[Record], schema_hint: &[&[&str]]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for field in schema_hint.iter().flat_map(|schema| schema.iter()) {
            if !columns.iter().any(|column| column == field) {
                columns.push(field.to_string());
            }
        }
        for record in records {
            for field in record.field_names() {
                if !columns.contains(&field) {
                    columns.push(field);
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| record.get(column).unwrap_or("").to_string())
                    .collect()
            })
            .collect();

        Self {
            title: title.into(),
            columns,
            rows,
            selected: 0,
        }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.rows.is_empty() {
            return;
        }
        let len = self.rows.len() as isize;
        let new = (self.selected as isize + offset).clamp(0, len - 1);
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.rows.len().saturating_sub(1);
    }
}
