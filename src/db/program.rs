use std::collections::HashMap;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use tracing::warn;

use crate::models::{Program, ProgramEntry, ProgramItem, Song, Theme};

use super::songs::fetch_all_songs;

/// Load the saved order of service. Song slots are hydrated from the
/// library; a slot whose song no longer exists is dropped with a warning.
pub fn load_program(conn: &Connection) -> Result<Program> {
    let songs: HashMap<String, Song> = fetch_all_songs(conn)?
        .into_iter()
        .map(|song| (song.id.clone(), song))
        .collect();

    let mut stmt = conn
        .prepare(
            "SELECT instance_id, kind, item_id, title
             FROM program_items
             ORDER BY position",
        )
        .context("failed to prepare program query")?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })
        .context("failed to iterate program items")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect program items")?;

    let mut items = Vec::with_capacity(rows.len());
    for (instance_id, kind, item_id, title) in rows {
        let entry = match kind.as_str() {
            "song" => match songs.get(&item_id) {
                Some(song) => ProgramEntry::Song(song.clone()),
                None => {
                    warn!(%instance_id, song_id = %item_id, "dropping program slot for missing song");
                    continue;
                }
            },
            _ => ProgramEntry::Theme(Theme { id: item_id, title }),
        };
        items.push(ProgramItem { instance_id, entry });
    }

    Ok(Program::new(items))
}

/// Replace the stored program with the given one.
pub fn save_program(conn: &Connection, program: &Program) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .context("failed to start program transaction")?;
    tx.execute("DELETE FROM program_items", [])
        .context("failed to clear program")?;

    for (position, item) in program.items().iter().enumerate() {
        tx.execute(
            "INSERT INTO program_items (position, instance_id, kind, item_id, title)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                position as i64,
                item.instance_id,
                item.entry.kind(),
                item.entry.id(),
                item.entry.title()
            ],
        )
        .context("failed to write program item")?;
    }

    tx.commit().context("failed to commit program")?;
    Ok(())
}
