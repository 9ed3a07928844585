//! Bringing songs and saved programs in from files on disk.
//!
//! Two sources are understood: songbook XML files (one song per file, named
//! after the song id) and the JSON bundle produced by the export menu. Both
//! end up merged into the SQLite library; a bundle may also replace the
//! current program.

mod bundle;
mod xml;

use std::io;

use thiserror::Error;

pub use bundle::{import_bundle, parse_bundle, BundleImport, ImportedBundle};
pub use xml::{import_xml_paths, parse_song_xml, references_from_file_name};

/// Why a single file could not be turned into a song or bundle.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("file is empty")]
    Empty,
    #[error("invalid XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("no <lyrics> element with text")]
    MissingLyrics,
    #[error("invalid JSON bundle: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Outcome of an XML import run, rendered for the status line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    /// File names skipped because a song with that id already existed.
    pub skipped: Vec<String>,
    pub failed: usize,
}

impl ImportSummary {
    /// Only failures and nothing imported counts as an error for display.
    pub fn is_error(&self) -> bool {
        self.failed > 0 && self.imported == 0
    }

    pub fn message(&self) -> String {
        let mut parts = Vec::new();
        if self.imported > 0 {
            parts.push(format!("{} song(s) imported.", self.imported));
        }
        if !self.skipped.is_empty() {
            parts.push(format!(
                "{} skipped (already existed): {}.",
                self.skipped.len(),
                self.skipped.join(", ")
            ));
        }
        if self.failed > 0 {
            parts.push(format!("{} failed (invalid format).", self.failed));
        }
        if parts.is_empty() {
            "The selected files contained no importable songs.".to_string()
        } else {
            parts.join(" ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_message_lists_every_outcome() {
        let summary = ImportSummary {
            imported: 2,
            skipped: vec!["a.xml".to_string(), "b.xml".to_string()],
            failed: 1,
        };
        assert_eq!(
            summary.message(),
            "2 song(s) imported. 2 skipped (already existed): a.xml, b.xml. 1 failed (invalid format)."
        );
        assert!(!summary.is_error());
    }

    #[test]
    fn empty_summary_has_a_fallback_message() {
        let summary = ImportSummary::default();
        assert!(summary.message().contains("no importable songs"));
        assert!(!summary.is_error());

        let failed = ImportSummary {
            failed: 3,
            ..ImportSummary::default()
        };
        assert!(failed.is_error());
    }
}
