//! Whole-song rewrites that sit on top of the verse parser: the regional
//! B/H spelling pass and copying chord lines between verses.

use super::verse::{parse_to_verses, verses_to_content, VerseLine};

/// Private-use character that does not occur in `content`, so the
/// placeholder can never collide with (or be rewritten as) real text.
fn placeholder_for(content: &str) -> char {
    ('\u{E000}'..='\u{F8FF}')
        .find(|candidate| !content.contains(*candidate))
        .unwrap_or('\u{E000}')
}

/// Rewrite to the B/H convention: `Bb` becomes `B` and every other `B`
/// becomes `H`.
///
/// This is plain text substitution over the whole content, lyrics included,
/// performed as three passes in a fixed order: protect `Bb`, rewrite `B`,
/// restore the protected spots as `B`.
pub fn normalize_bh(content: &str) -> String {
    let placeholder = placeholder_for(content).to_string();
    content
        .replace("Bb", &placeholder)
        .replace('B', "H")
        .replace(&placeholder, "B")
}

/// Copy the chord lines of one verse onto the lyric lines of others.
///
/// The source verse's chord lines are handed out in order, one before each
/// non-blank lyric line of a target verse, until they run out. Existing
/// chord lines in a target are dropped. An out-of-range source leaves the
/// content untouched; out-of-range targets are skipped.
pub fn copy_chords(content: &str, source_index: usize, target_indices: &[usize]) -> String {
    let mut verses = parse_to_verses(content);
    let Some(source) = verses.get(source_index) else {
        return content.to_string();
    };
    let source_chords: Vec<VerseLine> = source.chord_lines().cloned().collect();

    for &target_index in target_indices {
        let Some(target) = verses.get_mut(target_index) else {
            continue;
        };

        let mut supply = source_chords.iter();
        let mut lines = Vec::with_capacity(target.lines.len() + source_chords.len());
        for lyric in target.lines.drain(..).filter(VerseLine::is_lyric) {
            if !lyric.is_blank() {
                if let Some(chord) = supply.next() {
                    lines.push(chord.clone());
                }
            }
            lines.push(lyric);
        }
        target.lines = lines;
    }

    verses_to_content(&verses)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_rewrites_b_and_keeps_flats_as_b() {
        assert_eq!(normalize_bh(".B Bb"), ".H B");
        assert_eq!(normalize_bh(".F Bb/D Bbm7"), ".F B/D Bm7");
        assert_eq!(normalize_bh(".Bm7 E"), ".Hm7 E");
    }

    #[test]
    fn normalize_is_textual_and_touches_lyrics() {
        assert_eq!(normalize_bh("[B]\nBárány"), "[H]\nHárány");
    }

    #[test]
    fn normalize_leaves_content_without_b_alone() {
        let content = "[V1]\nAmint vagyok\n.C G Am";
        assert_eq!(normalize_bh(content), content);
    }

    #[test]
    fn normalize_does_not_confuse_existing_private_use_text() {
        let content = "\u{E000} Bb B";
        assert_eq!(normalize_bh(content), "\u{E000} B H");
    }

    #[test]
    fn copies_chords_onto_non_blank_lyrics() {
        let content = "[V1]\n.C G\nFirst line\n.Am F\nSecond line\n[V2]\nUno\n\nDos";
        let copied = copy_chords(content, 0, &[1]);
        assert_eq!(
            copied,
            "[V1]\n.C G\nFirst line\n.Am F\nSecond line\n[V2]\n.C G\nUno\n\n.Am F\nDos"
        );
    }

    #[test]
    fn chord_supply_runs_out_quietly() {
        let content = "[V1]\n.C\nA\n.G\nB\n[V2]\n1\n2\n3\n4\n5";
        let copied = copy_chords(content, 0, &[1]);
        let verses = parse_to_verses(&copied);
        let texts: Vec<&str> = verses[1].lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec![".C", "1", ".G", "2", "3", "4", "5"]);
    }

    #[test]
    fn existing_target_chords_are_replaced() {
        let content = "[V1]\n.D\nOne\n[V2]\n.Em  Em\nTwo";
        assert_eq!(
            copy_chords(content, 0, &[1]),
            "[V1]\n.D\nOne\n[V2]\n.D\nTwo"
        );
    }

    #[test]
    fn source_out_of_range_returns_input_verbatim() {
        let content = "  [V1]  \nline";
        assert_eq!(copy_chords(content, 4, &[0]), content);
    }

    #[test]
    fn invalid_targets_are_skipped() {
        let content = "[V1]\n.C\nA\n[V2]\nB";
        assert_eq!(
            copy_chords(content, 0, &[7, 1, 42]),
            "[V1]\n.C\nA\n[V2]\n.C\nB"
        );
    }

    #[test]
    fn copying_onto_itself_realigns_chords() {
        let content = "[V1]\n.C\n.G\nLine one\nLine two";
        assert_eq!(
            copy_chords(content, 0, &[0]),
            "[V1]\n.C\nLine one\n.G\nLine two"
        );
    }

    #[test]
    fn multiple_targets_each_restart_the_chord_supply() {
        let content = "[V1]\n.C\nx\n[V2]\ny\n[V3]\nz";
        assert_eq!(
            copy_chords(content, 0, &[1, 2]),
            "[V1]\n.C\nx\n[V2]\n.C\ny\n[V3]\n.C\nz"
        );
    }
}
