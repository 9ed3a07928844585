//! Ratatui front-end: the library and program panes, the full-screen song
//! editor, and the popups for themes, printing, export, and import.
//!
//! `App` owns all state and the SQLite connection; `run_app` drives the
//! crossterm event loop around it.

mod app;
mod editor;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
