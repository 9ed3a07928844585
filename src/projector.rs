//! Slides for the projector screen. An order item goes in and the list of
//! cues that can be put on screen for it comes out: a black screen, the
//! title, the song references when there are any, and one slide per verse.

use crate::models::ProgramEntry;
use crate::song_text::{is_chord_line, parse_to_verses, verses_to_content};

/// What the projected screen currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Slide {
    #[default]
    Blank,
    Title(String),
    References(String),
    /// Raw text of a single verse, marker line included.
    Verse(String),
}

impl Slide {
    /// Lines put on screen. Chord lines only show when asked for, and
    /// trailing blank lines are dropped.
    pub fn lines(&self, show_chords: bool) -> Vec<String> {
        let mut lines: Vec<String> = match self {
            Slide::Blank => Vec::new(),
            Slide::Title(title) => vec![title.clone()],
            Slide::References(references) => vec![format!("({references})")],
            Slide::Verse(text) => text
                .split('\n')
                .filter(|line| show_chords || !is_chord_line(line))
                .map(str::to_string)
                .collect(),
        };
        while lines.last().is_some_and(|line| line.trim().is_empty()) {
            lines.pop();
        }
        lines
    }
}

/// One selectable entry of the projector control list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideCue {
    pub label: String,
    /// First lyric line of a verse cue, `...` when the verse has none.
    pub preview: Option<String>,
    pub slide: Slide,
}

impl SlideCue {
    fn new(label: impl Into<String>, slide: Slide) -> Self {
        Self {
            label: label.into(),
            preview: None,
            slide,
        }
    }
}

pub fn slide_cues(entry: &ProgramEntry) -> Vec<SlideCue> {
    let title = entry.title().to_string();
    let mut cues = vec![
        SlideCue::new("Black screen", Slide::Blank),
        SlideCue::new(format!("Title: {title}"), Slide::Title(title)),
    ];

    let ProgramEntry::Song(song) = entry else {
        return cues;
    };
    if !song.references.is_empty() {
        let references = song.references_label();
        cues.push(SlideCue::new(
            format!("Ref: {references}"),
            Slide::References(references),
        ));
    }
    for (index, verse) in parse_to_verses(&song.content).into_iter().enumerate() {
        cues.push(SlideCue {
            label: verse.label(index),
            preview: Some(verse.first_lyric().unwrap_or("...").to_string()),
            slide: Slide::Verse(verses_to_content(std::slice::from_ref(&verse))),
        });
    }
    cues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Song, Theme};

    fn song(content: &str, references: &[&str]) -> ProgramEntry {
        ProgramEntry::Song(Song {
            id: "a.xml".to_string(),
            title: "Amint vagyok".to_string(),
            author: None,
            content: content.to_string(),
            references: references.iter().map(|r| r.to_string()).collect(),
        })
    }

    #[test]
    fn themes_only_offer_black_and_title() {
        let entry = ProgramEntry::Theme(Theme {
            id: "theme_gloria".to_string(),
            title: "Gloria".to_string(),
        });
        let cues = slide_cues(&entry);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].slide, Slide::Blank);
        assert_eq!(cues[1].slide, Slide::Title("Gloria".to_string()));
    }

    #[test]
    fn songs_get_references_and_one_cue_per_verse() {
        let cues = slide_cues(&song("Intro\n[V1]\n.C G\nLa la\n[R]\n.F", &["K12", "SZVU3"]));
        let labels: Vec<&str> = cues.iter().map(|cue| cue.label.as_str()).collect();
        assert_eq!(
            labels,
            ["Black screen", "Title: Amint vagyok", "Ref: K12, SZVU3", "(verse 1)", "[V1]", "[R]"]
        );
        assert_eq!(cues[4].slide, Slide::Verse("[V1]\n.C G\nLa la".to_string()));
        assert_eq!(cues[4].preview.as_deref(), Some("La la"));
        assert_eq!(cues[5].preview.as_deref(), Some("..."));
    }

    #[test]
    fn songs_without_references_skip_that_cue() {
        let cues = slide_cues(&song("[V1]\nLa", &[]));
        assert!(cues
            .iter()
            .all(|cue| !matches!(cue.slide, Slide::References(_))));
    }

    #[test]
    fn verse_lines_hide_chords_unless_asked() {
        let slide = Slide::Verse("[V1]\n  .C   G\nLa la\n\n".to_string());
        assert_eq!(slide.lines(false), ["[V1]", "La la"]);
        assert_eq!(slide.lines(true), ["[V1]", "  .C   G", "La la"]);
        assert_eq!(Slide::References("K1".to_string()).lines(false), ["(K1)"]);
        assert!(Slide::Blank.lines(true).is_empty());
    }
}
