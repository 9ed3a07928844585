//! Verse-level view of a song's raw text. The raw content string stays the
//! system of record; the structures here are rebuilt on demand whenever an
//! editor or a print view needs to reason about markers, chord lines, and
//! lyric lines, and then thrown away again.

/// Character that marks a line as a chord line once surrounding whitespace
/// is trimmed.
pub const CHORD_PREFIX: char = '.';

/// Explicit tag for a stored line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Lyric,
    Chord,
}

/// One line of a verse. `text` is the untouched source line, including the
/// leading whitespace and the `.` prefix of chord lines, so that chord
/// alignment survives a parse/serialize cycle byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseLine {
    pub kind: LineKind,
    pub text: String,
}

impl VerseLine {
    pub fn lyric(text: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Lyric,
            text: text.into(),
        }
    }

    pub fn chord(text: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Chord,
            text: text.into(),
        }
    }

    /// Tag a raw (non-marker) line by its trimmed prefix.
    pub fn classify(text: &str) -> Self {
        if is_chord_line(text) {
            Self::chord(text)
        } else {
            Self::lyric(text)
        }
    }

    pub fn is_chord(&self) -> bool {
        self.kind == LineKind::Chord
    }

    pub fn is_lyric(&self) -> bool {
        self.kind == LineKind::Lyric
    }

    /// Whitespace-only lines carry no syllables to hang a chord on.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A labeled group of consecutive lines. The marker is either empty (the
/// preamble before the first bracketed tag) or the trimmed tag text such as
/// `[V1]`; it is never interpreted beyond that.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verse {
    pub marker: String,
    pub lines: Vec<VerseLine>,
}

impl Verse {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            lines: Vec::new(),
        }
    }

    pub fn chord_lines(&self) -> impl Iterator<Item = &VerseLine> {
        self.lines.iter().filter(|line| line.is_chord())
    }

    pub fn lyric_lines(&self) -> impl Iterator<Item = &VerseLine> {
        self.lines.iter().filter(|line| line.is_lyric())
    }

    /// True when every stored line is blank (or there are none).
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(VerseLine::is_blank)
    }

    /// First non-blank lyric line, used as a preview next to the marker.
    pub fn first_lyric(&self) -> Option<&str> {
        self.lyric_lines()
            .find(|line| !line.is_blank())
            .map(|line| line.text.trim())
    }

    /// Marker text suitable for pickers; the unlabeled preamble gets a
    /// positional name instead of an empty string.
    pub fn label(&self, index: usize) -> String {
        if self.marker.is_empty() {
            format!("(verse {})", index + 1)
        } else {
            self.marker.clone()
        }
    }
}

/// A trimmed line wrapped in `[` and `]` opens a new verse. A lone bracket is
/// not a marker.
pub fn is_marker_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 2 && trimmed.starts_with('[') && trimmed.ends_with(']')
}

pub fn is_chord_line(line: &str) -> bool {
    line.trim_start().starts_with(CHORD_PREFIX)
}

/// Split raw song text into verses.
///
/// Every input line lands in exactly one verse except marker lines, which
/// become the `marker` of the verse they open. Lines before the first marker
/// are collected into an implicit verse with an empty marker. Empty input is
/// a single empty lyric line in one unlabeled verse, which serializes back to
/// the empty string.
pub fn parse_to_verses(content: &str) -> Vec<Verse> {
    let mut verses = Vec::new();
    let mut current: Option<Verse> = None;

    for line in content.split('\n') {
        if is_marker_line(line) {
            if let Some(verse) = current.take() {
                verses.push(verse);
            }
            current = Some(Verse::new(line.trim()));
        } else {
            current
                .get_or_insert_with(Verse::default)
                .lines
                .push(VerseLine::classify(line));
        }
    }

    verses.extend(current);
    verses
}

/// Rebuild raw text from verses: each labeled verse emits its marker on its
/// own line followed by the stored line texts, verbatim.
pub fn verses_to_content(verses: &[Verse]) -> String {
    verses
        .iter()
        .map(verse_block)
        .collect::<Vec<_>>()
        .join("\n")
}

fn verse_block(verse: &Verse) -> String {
    let body = verse
        .lines
        .iter()
        .map(|line| line.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    if verse.marker.is_empty() {
        body
    } else if verse.lines.is_empty() {
        verse.marker.clone()
    } else {
        format!("{}\n{}", verse.marker, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_marker_lyric_and_chord_lines() {
        let verses = parse_to_verses("[V1]\nAmint vagyok,\n.C    G    Am");
        assert_eq!(
            verses,
            vec![Verse {
                marker: "[V1]".to_string(),
                lines: vec![
                    VerseLine::lyric("Amint vagyok,"),
                    VerseLine::chord(".C    G    Am"),
                ],
            }]
        );
    }

    #[test]
    fn lines_before_first_marker_form_an_unlabeled_verse() {
        let verses = parse_to_verses("intro line\n.G D\n[C]\nrefrain");
        assert_eq!(verses.len(), 2);
        assert_eq!(verses[0].marker, "");
        assert_eq!(verses[0].lines.len(), 2);
        assert!(verses[0].lines[1].is_chord());
        assert_eq!(verses[1].marker, "[C]");
        assert_eq!(verses[1].lines, vec![VerseLine::lyric("refrain")]);
    }

    #[test]
    fn marker_is_trimmed_and_chord_text_is_kept_verbatim() {
        let verses = parse_to_verses("   [V2]  \n   .  C   G  ");
        assert_eq!(verses[0].marker, "[V2]");
        assert_eq!(verses[0].lines[0], VerseLine::chord("   .  C   G  "));
    }

    #[test]
    fn blank_lines_are_lyrics() {
        let verses = parse_to_verses("[V1]\n\n   \nText");
        let kinds: Vec<LineKind> = verses[0].lines.iter().map(|l| l.kind).collect();
        assert_eq!(kinds, vec![LineKind::Lyric, LineKind::Lyric, LineKind::Lyric]);
    }

    #[test]
    fn lone_brackets_are_not_markers() {
        let verses = parse_to_verses("[\n]\n[]");
        assert_eq!(verses.len(), 2);
        assert_eq!(verses[0].marker, "");
        assert_eq!(
            verses[0].lines,
            vec![VerseLine::lyric("["), VerseLine::lyric("]")]
        );
        assert_eq!(verses[1].marker, "[]");
        assert!(verses[1].lines.is_empty());
    }

    #[test]
    fn marker_only_content_round_trips_to_a_single_line() {
        let verses = parse_to_verses("[V1]");
        assert_eq!(verses, vec![Verse::new("[V1]")]);
        assert_eq!(verses_to_content(&verses), "[V1]");
    }

    #[test]
    fn consecutive_markers_produce_empty_verses() {
        let verses = parse_to_verses("[V1]\n[V2]\nline");
        assert_eq!(verses.len(), 2);
        assert!(verses[0].lines.is_empty());
        assert_eq!(verses_to_content(&verses), "[V1]\n[V2]\nline");
    }

    #[test]
    fn empty_input_is_one_unlabeled_verse_with_one_blank_line() {
        let verses = parse_to_verses("");
        assert_eq!(
            verses,
            vec![Verse {
                marker: String::new(),
                lines: vec![VerseLine::lyric("")],
            }]
        );
        assert_eq!(verses_to_content(&verses), "");
    }

    #[test]
    fn whitespace_only_input_keeps_its_whitespace() {
        let verses = parse_to_verses("   ");
        assert_eq!(verses[0].lines, vec![VerseLine::lyric("   ")]);
        assert_eq!(verses_to_content(&verses), "   ");
    }

    #[test]
    fn trailing_newline_after_marker_survives() {
        let content = "[V1]\n";
        let verses = parse_to_verses(content);
        assert_eq!(verses[0].lines, vec![VerseLine::lyric("")]);
        assert_eq!(verses_to_content(&verses), content);
    }

    #[test]
    fn serialize_then_parse_is_stable() {
        let samples = [
            "[V1]\nSzent vagy, szent vagy,\n.C         G\n[V2]\nÁldott\n.F     C\n",
            "preamble\n\n[C]\n  .G    D\nJézus életem\n\n[B]",
            ".Am\n[]\n[V1]\n[V2]",
            "\r\n[V1]\r\nline\r\n",
        ];
        for content in samples {
            let verses = parse_to_verses(content);
            let rebuilt = verses_to_content(&verses);
            assert_eq!(parse_to_verses(&rebuilt), verses, "content: {content:?}");
        }
    }

    #[test]
    fn serializer_reinserts_trimmed_markers() {
        let verses = parse_to_verses("  [V1]\nText");
        assert_eq!(verses_to_content(&verses), "[V1]\nText");
    }

    #[test]
    fn verse_helpers_describe_contents() {
        let verses = parse_to_verses("[V1]\n.C G\n\nHello world\n.F\nSecond");
        let verse = &verses[0];
        assert_eq!(verse.chord_lines().count(), 2);
        assert_eq!(verse.lyric_lines().count(), 3);
        assert_eq!(verse.first_lyric(), Some("Hello world"));
        assert!(!verse.is_blank());
        assert_eq!(verse.label(0), "[V1]");
        assert_eq!(Verse::default().label(2), "(verse 3)");
    }
}
