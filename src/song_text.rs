//! Song text engine: parsing lyric/chord text into verses, writing verses
//! back out, and the whole-song rewrites the editor offers (transposition,
//! B/H spelling, chord copying).
//!
//! Every function here is a pure function of its arguments. Callers pass the
//! raw content string in and get a new string (or derived verse data) back.

mod transform;
mod transpose;
mod verse;

pub use transform::{copy_chords, normalize_bh};
pub use transpose::{chord_tokens, transpose, transpose_chord, transpose_note};
pub use verse::{
    is_chord_line, is_marker_line, parse_to_verses, verses_to_content, LineKind, Verse, VerseLine,
    CHORD_PREFIX,
};
