//! Everything the app writes to disk: the shareable plain-text order, the
//! JSON bundle, the printable HTML page, the editable Word-compatible
//! document and the projected slide page. Rendering functions are pure;
//! `write_export` is the only place that touches the filesystem.

mod document;
mod print;
mod projector;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::models::{Program, ProgramEntry, ProgramItem, Song};

pub use document::editable_doc_html;
pub use print::print_html;
pub use projector::slide_html;

pub const TEXT_FILE_NAME: &str = "enekrend.txt";
pub const BUNDLE_FILE_NAME: &str = "enekrend.json";
pub const PRINT_FILE_NAME: &str = "enekrend-nyomtatas.html";
pub const DOC_FILE_NAME: &str = "enekrend.doc";
pub const SLIDE_FILE_NAME: &str = "enekrend-vetites.html";

#[derive(Serialize)]
struct Bundle<'a> {
    order: &'a [ProgramItem],
    songs: Vec<&'a Song>,
}

/// One line per slot, `"{n}. {title}"`, with the references of songs that
/// have any appended in parentheses.
pub fn order_as_text(program: &Program) -> String {
    program
        .items()
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let mut line = format!("{}. {}", index + 1, item.entry.title());
            if let ProgramEntry::Song(song) = &item.entry {
                if !song.references.is_empty() {
                    line.push_str(&format!(" ({})", song.references_label()));
                }
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The order plus the library songs it uses, pretty-printed.
pub fn bundle_json(program: &Program, library: &[Song]) -> Result<String> {
    let songs = library
        .iter()
        .filter(|song| {
            program
                .items()
                .iter()
                .any(|item| item.entry.as_song().is_some_and(|used| used.id == song.id))
        })
        .collect();
    let bundle = Bundle {
        order: program.items(),
        songs,
    };
    serde_json::to_string_pretty(&bundle).context("failed to serialize bundle")
}

/// Write an export file into `dir`, creating the directory when needed.
pub fn write_export(dir: &Path, file_name: &str, content: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export directory {}", dir.display()))?;
    let path = dir.join(file_name);
    fs::write(&path, content).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = content.len(), "export written");
    Ok(path)
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}
