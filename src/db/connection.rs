use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

/// Open (or create) the database, run lazy migrations, and return a live
/// connection. Foreign keys are switched on so reference rows follow their
/// song on delete and rename.
pub fn ensure_schema(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    let conn = Connection::open(db_path).context("failed to open SQLite database")?;
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign keys")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS songs (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            author TEXT,
            content TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create songs table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS song_references (
            song_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            code TEXT NOT NULL,
            PRIMARY KEY (song_id, position),
            FOREIGN KEY(song_id) REFERENCES songs(id) ON DELETE CASCADE ON UPDATE CASCADE
        )",
        [],
    )
    .context("failed to create song_references table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS program_items (
            position INTEGER PRIMARY KEY,
            instance_id TEXT NOT NULL UNIQUE,
            kind TEXT NOT NULL CHECK (kind IN ('song', 'theme')),
            item_id TEXT NOT NULL,
            title TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create program_items table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS app_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create app_meta table")?;

    debug!(path = %db_path.display(), "database schema ready");
    Ok(conn)
}

/// Read a flag or setting from the key-value table.
pub fn get_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM app_meta WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
    .context("failed to read app metadata")
}

pub fn set_meta(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO app_meta (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )
    .context("failed to write app metadata")?;
    Ok(())
}
