//! Ratatui front-end split across logical submodules: the state machine in
//! `app`, input forms, table screens, layout helpers, and the terminal loop.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
