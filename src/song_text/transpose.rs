//! Semitone transposition of chord lines.
//!
//! Notes are matched anywhere inside a chord token with `[A-G][#b]?`,
//! normalized to a sharp-scale name, and shifted along either the sharp or
//! the flat scale depending on how the matched note was written. A flat
//! spelling normalizes to a sharp name the flat scale does not contain, so
//! `Bb`, `Eb` and friends pass through unchanged, keeping a transpose and
//! its inverse exact. Anything the pattern does not match (quality suffixes
//! such as `m`, `7`, `sus4`, or the regional `H`) passes through untouched.
//!
//! Chord lines are re-tokenized, so the spacing that aligned chords under
//! lyric syllables is collapsed to single spaces. That loss is accepted.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::verse::{is_chord_line, CHORD_PREFIX};

const SHARP_SCALE: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const FLAT_SCALE: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

static NOTE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-G][#b]?").unwrap());

/// Sharp-scale name for any spelling the note pattern can produce,
/// including the theoretical ones (`B#`, `Cb`, `E#`, `Fb`).
fn sharp_name(note: &str) -> Option<&'static str> {
    let name = match note {
        "B#" | "C" => "C",
        "C#" | "Db" => "C#",
        "D" => "D",
        "D#" | "Eb" => "D#",
        "E" | "Fb" => "E",
        "E#" | "F" => "F",
        "F#" | "Gb" => "F#",
        "G" => "G",
        "G#" | "Ab" => "G#",
        "A" => "A",
        "A#" | "Bb" => "A#",
        "B" | "Cb" => "B",
        _ => return None,
    };
    Some(name)
}

fn is_flat_spelling(note: &str) -> bool {
    note.len() > 1 && note[1..].contains('b')
}

/// Shift a single note name. Names missing from the chosen scale come back
/// unchanged.
pub fn transpose_note(note: &str, semitones: i32) -> String {
    let scale = if is_flat_spelling(note) {
        &FLAT_SCALE
    } else {
        &SHARP_SCALE
    };
    let Some(index) = sharp_name(note).and_then(|name| scale.iter().position(|&n| n == name))
    else {
        return note.to_string();
    };
    let shifted = (index as i32 + semitones).rem_euclid(12) as usize;
    scale[shifted].to_string()
}

fn transpose_notes_in(text: &str, semitones: i32) -> String {
    NOTE_PATTERN
        .replace_all(text, |caps: &Captures| transpose_note(&caps[0], semitones))
        .into_owned()
}

/// Transpose one chord token. A slash splits the chord from its bass note;
/// both halves are shifted by the same amount and joined again.
pub fn transpose_chord(chord: &str, semitones: i32) -> String {
    match chord.split_once('/') {
        Some((main, bass)) => format!(
            "{}/{}",
            transpose_notes_in(main, semitones),
            transpose_notes_in(bass, semitones)
        ),
        None => transpose_notes_in(chord, semitones),
    }
}

/// Whitespace-separated chord tokens of a chord line, or `None` for lyric
/// lines.
pub fn chord_tokens(line: &str) -> Option<Vec<&str>> {
    if !is_chord_line(line) {
        return None;
    }
    let dot = line.find(CHORD_PREFIX)?;
    Some(line[dot + CHORD_PREFIX.len_utf8()..].split_whitespace().collect())
}

fn transpose_line(line: &str, semitones: i32) -> String {
    if !is_chord_line(line) {
        return line.to_string();
    }
    let Some(dot) = line.find(CHORD_PREFIX) else {
        return line.to_string();
    };
    let split = dot + CHORD_PREFIX.len_utf8();
    let (prefix, chords) = line.split_at(split);
    let transposed = chords
        .split_whitespace()
        .map(|chord| transpose_chord(chord, semitones))
        .collect::<Vec<_>>()
        .join(" ");
    format!("{prefix}{transposed}")
}

/// Transpose every chord line of a song by `semitones`; lyric and marker
/// lines are returned as they were.
pub fn transpose(content: &str, semitones: i32) -> String {
    content
        .split('\n')
        .map(|line| transpose_line(line, semitones))
        .collect::<Vec<_>>()
        .join("\n")
}
