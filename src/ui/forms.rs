use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Record, RecordType};
use crate::store::DELIMITER;

/// Input state for adding one book or magazine. There is one text buffer per
/// schema field, kept in schema order.
#[derive(Clone)]
pub(crate) struct RecordForm {
    pub(crate) record_type: RecordType,
    pub(crate) values: Vec<String>,
    pub(crate) active: usize,
    pub(crate) error: Option<String>,
}

impl RecordForm {
    pub(crate) fn new(record_type: RecordType) -> Self {
        Self {
            record_type,
            values: vec![String::new(); record_type.fields().len()],
            active: 0,
            error: None,
        }
    }

    pub(crate) fn fields(&self) -> &'static [&'static str] {
        self.record_type.fields()
    }

    pub(crate) fn is_last_field(&self) -> bool {
        self.active + 1 >= self.values.len()
    }

    /// Move focus forward, wrapping back to the first field.
    pub(crate) fn next_field(&mut self) {
        self.active = (self.active + 1) % self.values.len();
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = (self.active + self.values.len() - 1) % self.values.len();
    }

    /// Append a character to the focused field. The delimiter is refused
    /// because the store writes values unescaped.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch == DELIMITER {
            self.error = Some(format!("'{DELIMITER}' cannot be stored in a field."));
            return false;
        }
        if ch.is_control() {
            return false;
        }
        self.values[self.active].push(ch);
        self.error = None;
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.values[self.active].pop();
    }

    /// Assemble the record to append. Values are kept exactly as typed,
    /// surrounding spaces included. Empty values are allowed; the format only
    /// requires that every field is present.
    pub(crate) fn to_record(&self) -> Result<Record> {
        if let Some(value) = self.values.iter().find(|value| value.contains(DELIMITER)) {
            return Err(anyhow!("Value {value:?} contains '{DELIMITER}'."));
        }
        Ok(Record::from_pairs(
            self.fields()
                .iter()
                .zip(&self.values)
                .map(|(field, value)| (*field, value.as_str())),
        ))
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, index: usize) -> Line<'static> {
        let field_name = self.fields()[index];
        let value = &self.values[index];
        let is_active = self.active == index;

        let display = if value.is_empty() && !is_active {
            "<empty>".to_string()
        } else {
            value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{field_name}: ")),
            Span::styled(display, style),
        ])
    }

    /// Cursor column offset for the focused field, relative to the form area.
    pub(crate) fn cursor_offset(&self) -> usize {
        self.fields()[self.active].chars().count() + 2 + self.values[self.active].chars().count()
    }
}
