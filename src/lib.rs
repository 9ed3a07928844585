//! Core library surface for the song order manager TUI.
//!
//! The modules below are shared by the `bin` target and by the tests: the
//! text engine, the models and the projector slides are pure, `db` owns the
//! SQLite store, and `import` and `export` move songs and programs in and
//! out of files.
pub mod catalog;
pub mod config;
pub mod db;
pub mod export;
pub mod import;
pub mod models;
pub mod projector;
pub mod song_text;
pub mod ui;

/// Startup configuration and the file-backed log subscriber.
pub use config::{init_logging, Config};

/// Persistence entry points used by `main.rs` to open the store and preload
/// the library and the saved program.
pub use db::{ensure_schema, load_or_seed_songs, load_program};

/// The domain types the other layers pass around.
pub use models::{PrintOptions, Program, ProgramEntry, ProgramItem, Song, Theme};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
