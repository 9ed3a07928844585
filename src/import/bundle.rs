use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::db::{fetch_song_ids, insert_songs, save_program};
use crate::models::{Program, ProgramItem, Song};

use super::ImportError;

/// Wire shape of an exported bundle. Both keys are optional so partial
/// bundles (only songs, only an order) still import.
#[derive(Debug, Default, Deserialize)]
struct RawBundle {
    #[serde(default)]
    order: Option<Vec<ProgramItem>>,
    #[serde(default)]
    songs: Option<Vec<Value>>,
}

/// A parsed bundle, not yet merged into the library.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportedBundle {
    /// Replacement program, when the bundle carried an order.
    pub order: Option<Program>,
    /// Valid songs, one per id; a later duplicate wins.
    pub songs: Vec<Song>,
    /// Song entries dropped for a missing id or wrong shape.
    pub rejected: usize,
}

/// What a bundle import changed, for the status line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleImport {
    pub songs_merged: usize,
    pub order_items: Option<usize>,
    pub rejected: usize,
}

impl BundleImport {
    pub fn message(&self) -> String {
        let mut message = format!("Bundle imported: {} song(s) merged", self.songs_merged);
        if let Some(count) = self.order_items {
            message.push_str(&format!(", program replaced with {count} item(s)"));
        }
        if self.rejected > 0 {
            message.push_str(&format!(", {} invalid song(s) ignored", self.rejected));
        }
        message.push('.');
        message
    }
}

pub fn parse_bundle(text: &str) -> Result<ImportedBundle, ImportError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.trim().is_empty() {
        return Err(ImportError::Empty);
    }
    let raw: RawBundle = serde_json::from_str(text)?;

    let mut bundle = ImportedBundle {
        order: raw.order.map(Program::new),
        ..ImportedBundle::default()
    };

    for value in raw.songs.unwrap_or_default() {
        match serde_json::from_value::<Song>(value) {
            Ok(song) if !song.id.trim().is_empty() => {
                match bundle.songs.iter_mut().find(|existing| existing.id == song.id) {
                    Some(existing) => *existing = song,
                    None => bundle.songs.push(song),
                }
            }
            _ => bundle.rejected += 1,
        }
    }
    Ok(bundle)
}

/// Merge a bundle file into the library and, when it carries an order,
/// replace the stored program. Songs the order uses but neither the library
/// nor the bundle knows are added too, so no program slot is lost on reload.
pub fn import_bundle(conn: &Connection, path: &Path) -> Result<BundleImport> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let bundle = parse_bundle(&text).with_context(|| format!("failed to import {}", path.display()))?;

    let mut songs = bundle.songs;
    if let Some(program) = &bundle.order {
        let library = fetch_song_ids(conn)?;
        let mut known: HashSet<String> = songs.iter().map(|song| song.id.clone()).collect();
        for song in program.songs() {
            if !library.contains(&song.id) && known.insert(song.id.clone()) {
                warn!(song_id = %song.id, "adding song only present in bundle order");
                songs.push(song.clone());
            }
        }
    }

    let songs_merged = insert_songs(conn, &songs)?;
    let order_items = match &bundle.order {
        Some(program) => {
            save_program(conn, program)?;
            Some(program.len())
        }
        None => None,
    };

    info!(songs = songs_merged, ?order_items, rejected = bundle.rejected, "bundle import finished");
    Ok(BundleImport {
        songs_merged,
        order_items,
        rejected: bundle.rejected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ensure_schema, fetch_all_songs, load_program};
    use crate::models::ProgramEntry;

    const BUNDLE: &str = r#"{
  "order": [
    { "instanceId": "theme_theme_kyrie_1", "kind": "theme", "id": "theme_kyrie", "title": "Kyrie" },
    { "instanceId": "song_a.xml_2", "kind": "song", "id": "a.xml", "title": "A", "content": "La" },
    { "instanceId": "song_c.xml_3", "kind": "song", "id": "c.xml", "title": "C", "content": "Lo" }
  ],
  "songs": [
    { "id": "a.xml", "title": "A", "content": "La", "references": ["K1"] },
    { "id": "", "title": "No id", "content": "x" },
    { "id": "b.xml", "title": 5 }
  ]
}"#;

    #[test]
    fn parse_keeps_valid_songs_and_the_order() {
        let bundle = parse_bundle(BUNDLE).unwrap();
        assert_eq!(bundle.songs.len(), 1);
        assert_eq!(bundle.rejected, 2);
        let order = bundle.order.unwrap();
        assert_eq!(order.len(), 3);
        assert!(matches!(order.items()[0].entry, ProgramEntry::Theme(_)));
    }

    #[test]
    fn missing_keys_are_fine_and_garbage_is_not() {
        let bundle = parse_bundle("{}").unwrap();
        assert_eq!(bundle, ImportedBundle::default());
        assert!(matches!(parse_bundle("not json"), Err(ImportError::Json(_))));
        assert!(matches!(parse_bundle("  "), Err(ImportError::Empty)));
    }

    #[test]
    fn import_merges_songs_and_replaces_program() {
        let dir = tempfile::tempdir().unwrap();
        let conn = ensure_schema(&dir.path().join("db.sqlite")).unwrap();
        let path = dir.path().join("enekrend.json");
        fs::write(&path, BUNDLE).unwrap();

        let outcome = import_bundle(&conn, &path).unwrap();
        assert_eq!(outcome.songs_merged, 2);
        assert_eq!(outcome.order_items, Some(3));
        assert!(outcome.message().contains("2 invalid song(s) ignored"));

        let ids: Vec<String> = fetch_all_songs(&conn).unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["a.xml", "c.xml"]);
        let program = load_program(&conn).unwrap();
        assert_eq!(program.len(), 3);
        assert_eq!(program.items()[1].entry.as_song().unwrap().references, vec!["K1"]);
    }
}
