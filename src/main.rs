//! Binary entry point: resolve the data directory, start file logging, open
//! the SQLite store, hydrate the library and saved program, then hand control
//! to the Ratatui event loop until the user exits.
use song_order_manager::catalog::default_themes;
use song_order_manager::{
    ensure_schema, init_logging, load_or_seed_songs, load_program, run_app, App, Config,
};

/// Initialize persistence, load stored data, and launch the event loop.
///
/// Fatal startup problems (an unwritable data directory, a corrupt database)
/// are returned so they reach the terminal instead of a half-drawn screen.
fn main() -> anyhow::Result<()> {
    let config = Config::resolve()?;
    config.ensure_dirs()?;
    init_logging(&config)?;

    let conn = ensure_schema(&config.db_path())?;
    let songs = load_or_seed_songs(&conn)?;
    let program = load_program(&conn)?;
    tracing::info!(
        songs = songs.len(),
        program_items = program.len(),
        "starting song order manager"
    );

    let mut app = App::new(conn, config, songs, program, default_themes());
    let result = run_app(&mut app);
    if let Err(err) = &result {
        tracing::error!(error = ?err, "application exited with an error");
    }
    result
}
