use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use roxmltree::{Document, Node};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::catalog::book_prefix;
use crate::db::{fetch_song_ids, insert_songs};
use crate::models::Song;

use super::{ImportError, ImportSummary};

/// Songbook codes embedded in file names, e.g. `jezus_eletem_D17_sk28.xml`.
static FILE_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(K|D|SK|Z|E|SZ)\d+").unwrap());

const TITLE_PATHS: &[&[&str]] = &[&["properties", "titles", "title"], &["title"]];
const AUTHOR_PATHS: &[&[&str]] = &[&["properties", "authors", "author"], &["author"]];
const LYRICS_PATHS: &[&[&str]] = &[&["lyrics"]];
const SONGBOOK_PATH: &[&str] = &["properties", "songbooks", "songbook"];

/// Build a song from one XML file. The file name becomes the song id.
pub fn parse_song_xml(file_name: &str, text: &str) -> Result<Song, ImportError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text).trim();
    if text.is_empty() {
        return Err(ImportError::Empty);
    }

    let doc = Document::parse(text)?;

    let title = first_text(&doc, TITLE_PATHS).unwrap_or_else(|| title_from_file_name(file_name));
    let author = first_text(&doc, AUTHOR_PATHS);
    let content = first_text(&doc, LYRICS_PATHS).ok_or(ImportError::MissingLyrics)?;

    let mut references: Vec<String> = doc
        .descendants()
        .filter(|node| matches_path(*node, SONGBOOK_PATH))
        .filter_map(|node| {
            let prefix = book_prefix(node.attribute("name")?)?;
            let entry = node.attribute("entry")?;
            Some(format!("{prefix}{entry}"))
        })
        .collect();
    references.extend(references_from_file_name(file_name));

    let mut seen = HashSet::new();
    references.retain(|code| seen.insert(code.clone()));

    Ok(Song {
        id: file_name.to_string(),
        title,
        author,
        content,
        references,
    })
}

/// Every songbook code found in a file name, uppercased.
pub fn references_from_file_name(file_name: &str) -> Vec<String> {
    FILE_REFERENCE
        .find_iter(file_name)
        .map(|found| found.as_str().to_uppercase())
        .collect()
}

fn title_from_file_name(file_name: &str) -> String {
    let stem = match file_name.len().checked_sub(4) {
        Some(cut)
            if file_name.is_char_boundary(cut)
                && file_name[cut..].eq_ignore_ascii_case(".xml") =>
        {
            &file_name[..cut]
        }
        _ => file_name,
    };
    stem.replace('_', " ")
}

/// Trimmed text of the first element matching one of the paths, trying the
/// paths in order. Elements whose text is empty are passed over.
fn first_text(doc: &Document<'_>, paths: &[&[&str]]) -> Option<String> {
    for path in paths {
        let Some(node) = doc.descendants().find(|node| matches_path(*node, path)) else {
            continue;
        };
        let text = text_content(node);
        if !text.is_empty() {
            let trimmed = text.trim();
            return (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
    }
    None
}

/// True when the element and its ancestors spell out `path`, innermost last.
fn matches_path(node: Node<'_, '_>, path: &[&str]) -> bool {
    let mut current = Some(node);
    for name in path.iter().rev() {
        match current {
            Some(n) if n.is_element() && n.tag_name().name() == *name => current = n.parent(),
            _ => return false,
        }
    }
    true
}

fn text_content(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

/// Files named directly, plus the `.xml` files inside named directories.
fn expand_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = fs::read_dir(path)
                .with_context(|| format!("failed to read directory {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|entry| entry.path()))
                .filter(|candidate| candidate.is_file() && has_xml_extension(candidate))
                .collect();
            found.sort();
            files.extend(found);
        } else if path.exists() {
            files.push(path.clone());
        } else {
            bail!("{} does not exist", path.display());
        }
    }
    Ok(files)
}

fn has_xml_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}

/// Import XML songs into the library. Files whose name is already a song id
/// are skipped; unreadable or malformed files are counted as failures and
/// never abort the batch.
pub fn import_xml_paths(conn: &Connection, paths: &[PathBuf]) -> Result<ImportSummary> {
    let files = expand_paths(paths)?;
    let mut existing = fetch_song_ids(conn)?;
    let mut summary = ImportSummary::default();
    let mut songs = Vec::new();

    for path in files {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        if existing.contains(&file_name) {
            summary.skipped.push(file_name);
            continue;
        }

        let parsed = fs::read_to_string(&path)
            .map_err(ImportError::from)
            .and_then(|text| parse_song_xml(&file_name, &text));

        match parsed {
            Ok(song) => {
                existing.insert(song.id.clone());
                songs.push(song);
            }
            Err(err) => {
                warn!(file = %path.display(), error = %err, "skipping song file");
                summary.failed += 1;
            }
        }
    }

    summary.imported = insert_songs(conn, &songs)?;
    info!(
        imported = summary.imported,
        skipped = summary.skipped.len(),
        failed = summary.failed,
        "xml import finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ensure_schema, fetch_all_songs};

    const OPEN_LYRICS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<song>
  <properties>
    <titles><title>Jézus életem</title></titles>
    <authors><author>Ismeretlen</author></authors>
    <songbooks>
      <songbook name="Dúrkönyv" entry="17"/>
      <songbook name="Ismeretlen könyv" entry="3"/>
      <songbook name="Sárgakönyv" entry="28"/>
    </songbooks>
  </properties>
  <lyrics>
[C]
Jézus életem, erőm, békém,
.G    D      Em   C
  </lyrics>
</song>"#;

    #[test]
    fn reads_properties_and_lyrics() {
        let song = parse_song_xml("jezus_d17_z5.xml", OPEN_LYRICS).unwrap();
        assert_eq!(song.id, "jezus_d17_z5.xml");
        assert_eq!(song.title, "Jézus életem");
        assert_eq!(song.author.as_deref(), Some("Ismeretlen"));
        assert!(song.content.starts_with("[C]\nJézus"));
        assert!(song.content.ends_with("Em   C"));
        assert_eq!(song.references, vec!["D17", "SK28", "Z5"]);
    }

    #[test]
    fn falls_back_to_plain_elements_and_file_name() {
        let text = "\u{feff}  <song><author>  </author><lyrics>La la</lyrics></song>  ";
        let song = parse_song_xml("szent_vagy_uram.XML", text).unwrap();
        assert_eq!(song.title, "szent vagy uram");
        assert_eq!(song.author, None);
        assert_eq!(song.content, "La la");

        let plain = "<song><title>Plain</title><lyrics>x</lyrics></song>";
        assert_eq!(parse_song_xml("p.xml", plain).unwrap().title, "Plain");
    }

    #[test]
    fn rejects_empty_malformed_and_lyricless_files() {
        assert!(matches!(parse_song_xml("a.xml", "\u{feff}  \n"), Err(ImportError::Empty)));
        assert!(matches!(parse_song_xml("a.xml", "<song>"), Err(ImportError::Xml(_))));
        assert!(matches!(
            parse_song_xml("a.xml", "<song><lyrics> </lyrics></song>"),
            Err(ImportError::MissingLyrics)
        ));
    }

    #[test]
    fn file_name_references_are_uppercased() {
        assert_eq!(references_from_file_name("ének_sk12_k3.xml"), vec!["SK12", "K3"]);
        assert!(references_from_file_name("amint_vagyok.xml").is_empty());
    }

    #[test]
    fn directory_import_skips_existing_and_counts_failures() {
        let dir = tempfile::tempdir().unwrap();
        let conn = ensure_schema(&dir.path().join("db.sqlite")).unwrap();
        let songs_dir = dir.path().join("songs");
        fs::create_dir(&songs_dir).unwrap();
        fs::write(songs_dir.join("jezus.xml"), OPEN_LYRICS).unwrap();
        fs::write(songs_dir.join("broken.xml"), "<song>").unwrap();
        fs::write(songs_dir.join("notes.txt"), "ignored").unwrap();

        let first = import_xml_paths(&conn, &[songs_dir.clone()]).unwrap();
        assert_eq!(first.imported, 1);
        assert_eq!(first.failed, 1);
        assert!(first.skipped.is_empty());

        let second = import_xml_paths(&conn, &[songs_dir.join("jezus.xml")]).unwrap();
        assert_eq!(second.imported, 0);
        assert_eq!(second.skipped, vec!["jezus.xml"]);
        assert_eq!(fetch_all_songs(&conn).unwrap().len(), 1);
    }

    #[test]
    fn missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let conn = ensure_schema(&dir.path().join("db.sqlite")).unwrap();
        assert!(import_xml_paths(&conn, &[dir.path().join("nope")]).is_err());
    }
}
