use std::mem;
use std::slice;

use anyhow::{Context, Result};
use crossterm::event::KeyCode;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap,
};
use ratatui::Frame;
use tracing::warn;

use crate::models::{RecordType, ISBN_FIELD, TITLE_FIELD};
use crate::query::{find_by_key, list_all, merge_sorted, SearchOutcome};
use crate::store::{append_record, load_many, load_records, RecordStore};

use super::forms::RecordForm;
use super::helpers::{centered_rect, surface_error};
use super::screens::{menu_action_for, MenuAction, ResultScreen, MENU};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows skipped by PageUp/PageDown in the results table.
const PAGE_STEP: isize = 10;

/// What fills the main area. The results view doubles as the "back to menu or
/// exit" prompt that follows every action.
enum Screen {
    Menu,
    Results(ResultScreen),
}

/// Modal input states layered over the current screen.
enum Mode {
    Normal,
    SearchingIsbn(SearchState),
    ChoosingType,
    AddingRecord(RecordForm),
}

/// State for the ISBN prompt.
#[derive(Default)]
struct SearchState {
    query: String,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    store: RecordStore,
    menu_selected: usize,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(store: RecordStore) -> Self {
        Self {
            store,
            menu_selected: 0,
            screen: Screen::Menu,
            mode: Mode::Normal,
            status: None,
        }
    }

    /// Process one key press. Returns `true` once the user asked to exit.
    /// Store failures never escape: they land in the footer and the loop
    /// keeps running.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::SearchingIsbn(state) => self.handle_search(code, state),
            Mode::ChoosingType => self.handle_choose_type(code),
            Mode::AddingRecord(form) => self.handle_add_record(code, form),
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match self.screen {
            Screen::Menu => match code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    *exit = true;
                    Mode::Normal
                }
                KeyCode::Up => {
                    self.menu_selected = self.menu_selected.saturating_sub(1);
                    Mode::Normal
                }
                KeyCode::Down => {
                    self.menu_selected = (self.menu_selected + 1).min(MENU.len() - 1);
                    Mode::Normal
                }
                KeyCode::Enter => self.run_action(MENU[self.menu_selected].action, exit),
                KeyCode::Char(ch) => match menu_action_for(ch) {
                    Some(action) => self.run_action(action, exit),
                    None => Mode::Normal,
                },
                _ => Mode::Normal,
            },
            Screen::Results(ref mut results) => {
                let mut back_to_menu = false;
                match code {
                    KeyCode::Char('0') | KeyCode::Char('q') => *exit = true,
                    KeyCode::Char('9') | KeyCode::Esc | KeyCode::Backspace => back_to_menu = true,
                    KeyCode::Up => results.move_selection(-1),
                    KeyCode::Down => results.move_selection(1),
                    KeyCode::PageUp => results.move_selection(-PAGE_STEP),
                    KeyCode::PageDown => results.move_selection(PAGE_STEP),
                    KeyCode::Home => results.select_first(),
                    KeyCode::End => results.select_last(),
                    _ => {}
                }

                if back_to_menu {
                    self.screen = Screen::Menu;
                    self.clear_status();
                }
                Mode::Normal
            }
        }
    }

    fn run_action(&mut self, action: MenuAction, exit: &mut bool) -> Mode {
        self.clear_status();
        let outcome = match action {
            MenuAction::ListBooks => self.show_list(RecordType::Books),
            MenuAction::ListMagazines => self.show_list(RecordType::Magazines),
            MenuAction::ListSorted => self.show_sorted(),
            MenuAction::SearchIsbn => return Mode::SearchingIsbn(SearchState::default()),
            MenuAction::AddRecord => return Mode::ChoosingType,
            MenuAction::Exit => {
                *exit = true;
                return Mode::Normal;
            }
        };
        if let Err(err) = outcome {
            self.report_error(&err);
        }
        Mode::Normal
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Search cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Backspace => {
                state.query.pop();
            }
            KeyCode::Enter => {
                if state.query.is_empty() {
                    self.set_status("Enter an ISBN to search.", StatusKind::Error);
                } else {
                    let isbn = state.query.clone();
                    if let Err(err) = self.run_search(&isbn) {
                        self.report_error(&err);
                    }
                    return Mode::Normal;
                }
            }
            KeyCode::Char(ch) if !ch.is_control() => state.query.push(ch),
            _ => {}
        }
        Mode::SearchingIsbn(state)
    }

    fn handle_choose_type(&mut self, code: KeyCode) -> Mode {
        match code {
            KeyCode::Char('1') => Mode::AddingRecord(RecordForm::new(RecordType::Books)),
            KeyCode::Char('2') => Mode::AddingRecord(RecordForm::new(RecordType::Magazines)),
            KeyCode::Esc => {
                self.set_status("Add cancelled.", StatusKind::Info);
                Mode::Normal
            }
            _ => Mode::ChoosingType,
        }
    }

    fn handle_add_record(&mut self, code: KeyCode, mut form: RecordForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status(
                    format!("Add {} cancelled.", form.record_type.singular()),
                    StatusKind::Info,
                );
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter if !form.is_last_field() => form.next_field(),
            KeyCode::Enter => match self.save_record(&form) {
                Ok(()) => return Mode::Normal,
                Err(err) => {
                    let message = surface_error(&err);
                    warn!(error = %message, "could not add record");
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                form.push_char(ch);
            }
            _ => {}
        }
        Mode::AddingRecord(form)
    }

    fn show_list(&mut self, record_type: RecordType) -> Result<()> {
        let set = load_records(&self.store, record_type)
            .with_context(|| format!("failed to load {record_type}"))?;
        let records = list_all(&set);
        self.screen = Screen::Results(ResultScreen::new(
            format!("All {record_type} ({})", records.len()),
            records,
            &[record_type.fields()],
        ));
        Ok(())
    }

    fn show_sorted(&mut self) -> Result<()> {
        let sets = load_many(&self.store, &RecordType::ALL)
            .context("failed to load books and magazines")?;
        let merged = merge_sorted(&sets, TITLE_FIELD);
        self.screen = Screen::Results(ResultScreen::new(
            format!("Books and magazines by title ({})", merged.len()),
            &merged,
            &[RecordType::Books.fields(), RecordType::Magazines.fields()],
        ));
        Ok(())
    }

    fn run_search(&mut self, isbn: &str) -> Result<()> {
        let sets = load_many(&self.store, &RecordType::ALL)
            .context("failed to load books and magazines")?;
        match find_by_key(&sets, ISBN_FIELD, isbn) {
            SearchOutcome::Found {
                record_type,
                records,
            } => {
                self.screen = Screen::Results(ResultScreen::new(
                    format!("{record_type} with ISBN {isbn} ({})", records.len()),
                    &records,
                    &[record_type.fields()],
                ));
                self.set_status(
                    format!("Found {} in {record_type}.", plural(records.len())),
                    StatusKind::Info,
                );
            }
            SearchOutcome::NotFound { .. } => {
                self.set_status("No records found.", StatusKind::Error);
            }
        }
        Ok(())
    }

    fn save_record(&mut self, form: &RecordForm) -> Result<()> {
        let record_type = form.record_type;
        let record = form.to_record()?;
        append_record(&self.store, record_type, &record)
            .with_context(|| format!("failed to add {}", record_type.singular()))?;

        self.screen = Screen::Results(ResultScreen::new(
            format!("Added {}", record_type.singular()),
            slice::from_ref(&record),
            &[record_type.fields()],
        ));
        self.set_status(
            format!(
                "Record added to {}.",
                self.store.path_for(record_type).display()
            ),
            StatusKind::Info,
        );
        Ok(())
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Menu => self.draw_menu(frame, content_area),
            Screen::Results(results) => self.draw_results(frame, content_area, results),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::SearchingIsbn(state) => self.draw_search_bar(frame, area, state),
            Mode::ChoosingType => self.draw_type_chooser(frame, area),
            Mode::AddingRecord(form) => self.draw_record_form(frame, area, form),
            Mode::Normal => {}
        }
    }

    fn draw_menu(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Welcome to the library!");
        let items: Vec<ListItem> = MENU
            .iter()
            .map(|entry| ListItem::new(format!("{}. {}", entry.key, entry.label)))
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let mut state = ListState::default().with_selected(Some(self.menu_selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_results(&self, frame: &mut Frame, area: Rect, results: &ResultScreen) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(results.title.clone());

        if results.rows.is_empty() {
            let paragraph = Paragraph::new(Span::styled(
                "No records.",
                Style::default().fg(Color::DarkGray),
            ))
            .block(block);
            frame.render_widget(paragraph, area);
            return;
        }

        let header = Row::new(results.columns.iter().cloned()).style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
        let rows = results.rows.iter().map(|row| Row::new(row.iter().cloned()));
        let widths = vec![Constraint::Fill(1); results.columns.len()];
        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .column_spacing(2)
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        let mut state = TableState::default().with_selected(Some(results.selected));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        match (&self.screen, &self.mode) {
            (_, Mode::SearchingIsbn(_)) => Line::from(vec![
                Span::styled("[Enter]", key_style),
                Span::raw(" Search   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            (_, Mode::ChoosingType) => Line::from(vec![
                Span::styled("[1]", key_style),
                Span::raw(" Book   "),
                Span::styled("[2]", key_style),
                Span::raw(" Magazine   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            (_, Mode::AddingRecord(_)) => Line::from(vec![
                Span::styled("[Tab]", key_style),
                Span::raw(" Next field   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Next / Save   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            (Screen::Menu, Mode::Normal) => Line::from(vec![
                Span::styled("[0-5]", key_style),
                Span::raw(" Choose   "),
                Span::styled("[↑↓]", key_style),
                Span::raw(" Navigate   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Select   "),
                Span::styled("[q]", key_style),
                Span::raw(" Quit"),
            ]),
            (Screen::Results(_), Mode::Normal) => Line::from(vec![
                Span::styled("[↑↓]", key_style),
                Span::raw(" Scroll   "),
                Span::styled("[9]", key_style),
                Span::raw(" Back to menu   "),
                Span::styled("[0]", key_style),
                Span::raw(" Exit program"),
            ]),
        }
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title("Find by ISBN");
        let paragraph = Paragraph::new(Span::raw(format!("ISBN: {}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "ISBN: ".len() as u16 + state.query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_type_chooser(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(40, 30, area);
        frame.render_widget(Clear, popup_area);

        let lines = vec![
            Line::from("Would you like to add a..."),
            Line::from(""),
            Line::from("1. book"),
            Line::from("2. magazine"),
        ];
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Add"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);
    }

    fn draw_record_form(&self, frame: &mut Frame, area: Rect, form: &RecordForm) {
        let popup_area = centered_rect(70, 50, area);
        frame.render_widget(Clear, popup_area);

        let title = format!("Add {}", form.record_type.singular());
        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = (0..form.values.len())
            .map(|index| form.build_line(index))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter on the last field saves • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        // No wrapping: the cursor math below assumes one line per field.
        frame.render_widget(Paragraph::new(lines), inner);

        let cursor_x = inner.x + form.cursor_offset() as u16;
        let cursor_y = inner.y + form.active as u16;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn report_error(&mut self, err: &anyhow::Error) {
        let message = surface_error(err);
        let detail = format!("{err:#}");
        warn!(error = %detail, "action failed");
        self.set_status(message, StatusKind::Error);
    }
}

fn plural(count: usize) -> String {
    if count == 1 {
        "1 record".to_string()
    } else {
        format!("{count} records")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, App) {
        let temp_dir = TempDir::new().unwrap();
        let store = RecordStore::open(temp_dir.path()).unwrap();
        fs::write(
            store.path_for(RecordType::Books),
            "title;isbn;authors;description\n\
             banana;123;A;first\n\
             Apple;456;B;second\n",
        )
        .unwrap();
        fs::write(
            store.path_for(RecordType::Magazines),
            "title;isbn;authors;publishedAt\n\
             apple;123;C;2020\n\
             Zine;789;D;2021\n",
        )
        .unwrap();
        (temp_dir, App::new(store))
    }

    fn press(app: &mut App, keys: &str) {
        for ch in keys.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    fn expect_results(app: &App) -> Result<&ResultScreen> {
        match &app.screen {
            Screen::Results(results) => Ok(results),
            Screen::Menu => Err(anyhow!("menu is showing")),
        }
    }

    fn status_text(app: &App) -> &str {
        app.status.as_ref().map(|s| s.text.as_str()).unwrap_or("")
    }

    #[test]
    fn menu_digit_lists_books() {
        let (_dir, mut app) = fixture();
        press(&mut app, "1");

        let results = expect_results(&app).unwrap();
        assert_eq!(results.columns, vec!["title", "isbn", "authors", "description"]);
        assert_eq!(results.rows.len(), 2);
        assert_eq!(results.rows[0][0], "banana");
    }

    #[test]
    fn enter_on_highlighted_entry_lists_magazines() {
        let (_dir, mut app) = fixture();
        app.handle_key(KeyCode::Down).unwrap();
        app.handle_key(KeyCode::Enter).unwrap();

        let results = expect_results(&app).unwrap();
        assert_eq!(results.columns[3], "publishedAt");
        assert_eq!(results.rows[1][0], "Zine");
    }

    #[test]
    fn sorted_listing_merges_both_types() {
        let (_dir, mut app) = fixture();
        press(&mut app, "4");

        let results = expect_results(&app).unwrap();
        let titles: Vec<&str> = results.rows.iter().map(|row| row[0].as_str()).collect();
        assert_eq!(titles, vec!["Apple", "apple", "banana", "Zine"]);
        assert_eq!(results.columns.len(), 5);
    }

    #[test]
    fn isbn_search_prefers_books() {
        let (_dir, mut app) = fixture();
        press(&mut app, "3123");
        app.handle_key(KeyCode::Enter).unwrap();

        let results = expect_results(&app).unwrap();
        assert_eq!(results.rows.len(), 1);
        assert_eq!(results.rows[0][0], "banana");
        assert!(matches!(app.mode, Mode::Normal));
    }

    #[test]
    fn isbn_search_reports_not_found() {
        let (_dir, mut app) = fixture();
        press(&mut app, "3000");
        app.handle_key(KeyCode::Enter).unwrap();

        assert!(matches!(app.screen, Screen::Menu));
        assert_eq!(status_text(&app), "No records found.");
    }

    #[test]
    fn add_book_appends_a_line() {
        let (dir, mut app) = fixture();
        press(&mut app, "51");
        assert!(matches!(app.mode, Mode::AddingRecord(_)));

        for value in ["Dune", "111", "Herbert", "Sand"] {
            press(&mut app, value);
            app.handle_key(KeyCode::Enter).unwrap();
        }

        assert!(matches!(app.mode, Mode::Normal));
        assert!(status_text(&app).starts_with("Record added"));
        let contents = fs::read_to_string(dir.path().join("books.csv")).unwrap();
        assert!(contents.ends_with("Apple;456;B;second\nDune;111;Herbert;Sand\n"));

        press(&mut app, "9");
        press(&mut app, "1");
        assert_eq!(expect_results(&app).unwrap().rows.len(), 3);
    }

    #[test]
    fn isbn_query_is_matched_exactly_as_typed() {
        let (_dir, mut app) = fixture();
        press(&mut app, "3 123");
        app.handle_key(KeyCode::Enter).unwrap();

        assert!(matches!(app.screen, Screen::Menu));
        assert_eq!(status_text(&app), "No records found.");
    }

    #[test]
    fn added_values_keep_surrounding_spaces() {
        let (dir, mut app) = fixture();
        press(&mut app, "52");

        for value in [" Wired ", "555", "Staff", "2022"] {
            press(&mut app, value);
            app.handle_key(KeyCode::Enter).unwrap();
        }

        let contents = fs::read_to_string(dir.path().join("magazines.csv")).unwrap();
        assert!(contents.ends_with("Zine;789;D;2021\n Wired ;555;Staff;2022\n"));

        press(&mut app, "93555");
        app.handle_key(KeyCode::Enter).unwrap();
        assert_eq!(expect_results(&app).unwrap().rows[0][0], " Wired ");
    }

    #[test]
    fn load_failure_is_reported_and_loop_continues() {
        let (dir, mut app) = fixture();
        fs::remove_file(dir.path().join("magazines.csv")).unwrap();

        let exit = app.handle_key(KeyCode::Char('2')).unwrap();

        assert!(!exit);
        assert!(matches!(app.screen, Screen::Menu));
        assert!(status_text(&app).contains("magazines.csv"));
        assert!(matches!(
            app.status.as_ref().map(|s| &s.kind),
            Some(StatusKind::Error)
        ));
    }

    #[test]
    fn results_offer_back_and_exit() {
        let (_dir, mut app) = fixture();
        press(&mut app, "1");
        assert!(!app.handle_key(KeyCode::Char('9')).unwrap());
        assert!(matches!(app.screen, Screen::Menu));

        press(&mut app, "1");
        assert!(app.handle_key(KeyCode::Char('0')).unwrap());
    }

    #[test]
    fn zero_on_menu_exits() {
        let (_dir, mut app) = fixture();
        assert!(app.handle_key(KeyCode::Char('0')).unwrap());
    }

    #[test]
    fn escape_cancels_type_chooser() {
        let (_dir, mut app) = fixture();
        press(&mut app, "5");
        assert!(matches!(app.mode, Mode::ChoosingType));
        app.handle_key(KeyCode::Esc).unwrap();
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(status_text(&app), "Add cancelled.");
    }
}
