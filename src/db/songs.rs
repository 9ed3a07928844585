use std::collections::{HashMap, HashSet};

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, Transaction};
use tracing::{debug, info};

use crate::catalog::default_songs;
use crate::models::Song;

use super::connection::{get_meta, set_meta};

/// Flag recording that the default songs were inserted once. Deleting every
/// song afterwards must not bring them back.
const SEEDED_KEY: &str = "songs_seeded";

/// Fetch every song, ordered case-insensitively by title so mixed-case
/// titles group together in the library list.
pub fn fetch_all_songs(conn: &Connection) -> Result<Vec<Song>> {
    let mut references = fetch_references(conn)?;

    let mut stmt = conn
        .prepare(
            "SELECT id, title, author, content
             FROM songs
             ORDER BY title COLLATE NOCASE, id",
        )
        .context("failed to prepare all songs query")?;

    let songs = stmt
        .query_map([], |row| {
            Ok(Song {
                id: row.get(0)?,
                title: row.get(1)?,
                author: row.get(2)?,
                content: row.get(3)?,
                references: Vec::new(),
            })
        })
        .context("failed to iterate songs")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect songs")?;

    Ok(songs
        .into_iter()
        .map(|mut song| {
            song.references = references.remove(&song.id).unwrap_or_default();
            song
        })
        .collect())
}

/// Reference codes grouped by song, each list in its stored order.
fn fetch_references(conn: &Connection) -> Result<HashMap<String, Vec<String>>> {
    let mut stmt = conn
        .prepare("SELECT song_id, code FROM song_references ORDER BY song_id, position")
        .context("failed to prepare references query")?;

    let mut rows = stmt.query([]).context("failed to execute references query")?;
    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
    while let Some(row) = rows.next().context("failed to fetch reference row")? {
        let song_id: String = row.get(0).context("failed to read reference song id")?;
        let code: String = row.get(1).context("failed to read reference code")?;
        grouped.entry(song_id).or_default().push(code);
    }
    Ok(grouped)
}

/// Ids already present in the library, used to skip duplicate imports.
pub fn fetch_song_ids(conn: &Connection) -> Result<HashSet<String>> {
    let mut stmt = conn
        .prepare("SELECT id FROM songs")
        .context("failed to prepare song id query")?;
    let ids = stmt
        .query_map([], |row| row.get(0))
        .context("failed to iterate song ids")?
        .collect::<Result<HashSet<String>, _>>()
        .context("failed to collect song ids")?;
    Ok(ids)
}

/// Insert or replace a song row together with its reference codes.
fn write_song(tx: &Transaction<'_>, song: &Song) -> Result<()> {
    tx.execute(
        "INSERT INTO songs (id, title, author, content) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
             title = excluded.title,
             author = excluded.author,
             content = excluded.content",
        params![song.id, song.title, song.author, song.content],
    )
    .context("failed to write song")?;

    tx.execute(
        "DELETE FROM song_references WHERE song_id = ?1",
        params![song.id],
    )
    .context("failed to clear song references")?;

    for (position, code) in song.references.iter().enumerate() {
        tx.execute(
            "INSERT INTO song_references (song_id, position, code) VALUES (?1, ?2, ?3)",
            params![song.id, position as i64, code],
        )
        .context("failed to write song reference")?;
    }
    Ok(())
}

/// Save a song from the editor. When `previous_id` differs from the song's
/// id the row is renamed first, so program slots keep pointing at it.
pub fn save_song(conn: &Connection, song: &Song, previous_id: Option<&str>) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .context("failed to start song transaction")?;

    if let Some(previous) = previous_id.filter(|previous| *previous != song.id) {
        let renamed = tx
            .execute(
                "UPDATE songs SET id = ?1 WHERE id = ?2",
                params![song.id, previous],
            )
            .map_err(|err| map_duplicate_id(err, &song.id))
            .context("failed to rename song")?;
        if renamed == 0 {
            return Err(anyhow!("Song not found"));
        }
        tx.execute(
            "UPDATE program_items SET item_id = ?1 WHERE kind = 'song' AND item_id = ?2",
            params![song.id, previous],
        )
        .context("failed to repoint program items")?;
        debug!(from = previous, to = %song.id, "renamed song");
    }

    write_song(&tx, song)?;
    tx.commit().context("failed to commit song")?;
    Ok(())
}

/// Insert a batch of new songs in one transaction, returning how many rows
/// were written.
pub fn insert_songs(conn: &Connection, songs: &[Song]) -> Result<usize> {
    let tx = conn
        .unchecked_transaction()
        .context("failed to start import transaction")?;
    for song in songs {
        write_song(&tx, song)?;
    }
    tx.commit().context("failed to commit imported songs")?;
    Ok(songs.len())
}

/// Permanently delete a song. Reference rows cascade; program slots are
/// removed explicitly since they point at songs by id only.
pub fn delete_song(conn: &Connection, id: &str) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .context("failed to start delete transaction")?;
    let deleted = tx
        .execute("DELETE FROM songs WHERE id = ?1", params![id])
        .context("failed to delete song")?;

    if deleted == 0 {
        return Err(anyhow!("Song not found"));
    }

    tx.execute(
        "DELETE FROM program_items WHERE kind = 'song' AND item_id = ?1",
        params![id],
    )
    .context("failed to remove song from program")?;
    tx.commit().context("failed to commit song deletion")?;
    Ok(())
}

/// Load the library, seeding the default songs on the very first start.
pub fn load_or_seed_songs(conn: &Connection) -> Result<Vec<Song>> {
    if get_meta(conn, SEEDED_KEY)?.is_none() {
        let seeded = insert_songs(conn, &default_songs())?;
        set_meta(conn, SEEDED_KEY, "1")?;
        info!(count = seeded, "seeded default songs");
    }
    fetch_all_songs(conn)
}

fn map_duplicate_id(err: rusqlite::Error, id: &str) -> anyhow::Error {
    if matches!(
        err.sqlite_error_code(),
        Some(rusqlite::ErrorCode::ConstraintViolation)
    ) {
        anyhow!("A song with file name {id} already exists.")
    } else {
        err.into()
    }
}
