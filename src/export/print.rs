use crate::models::{FontSize, PrintLayout, PrintOptions, Program, ProgramEntry, Song};
use crate::song_text::{parse_to_verses, LineKind, Verse, CHORD_PREFIX};

use super::escape_html;

const STYLE: &str = r#"
      @media print {
        body { -webkit-print-color-adjust: exact; print-color-adjust: exact; }
        .no-print { display: none; }
        @page { size: A4; margin: 1.5cm; }
      }
      header { text-align: center; margin-bottom: 2rem; }
      h1 { font-size: 1.8em; font-weight: bold; font-family: sans-serif; }
      h2 { font-size: 1.4em; font-family: sans-serif; }
      .song, .theme-title { break-inside: avoid; margin-bottom: 1.5rem; padding-top: 0.5rem; }
      .theme-title { margin-top: 1rem; border-top: 1px solid #999; font-family: sans-serif; font-weight: bold; font-size: 1.3em; }
      .song-title { font-family: sans-serif; font-weight: bold; font-size: 1.2em; margin-bottom: 0.1em; }
      .song-author { font-family: sans-serif; font-style: italic; font-size: 0.9em; margin-bottom: 0.5em; color: #555; }
      .verse { margin-bottom: 0.75rem; break-inside: avoid; }
      .line-pair { break-inside: avoid; }
      .song-content-wrapper pre { font-family: 'Courier New', Courier, monospace; margin: 0; padding: 0; font-size: 1em; line-height: 1.3; white-space: pre-wrap; word-break: break-all; }
      pre.verse-marker { font-style: italic; font-weight: bold; margin-bottom: 0.25rem; font-family: sans-serif; }
      pre.chords { font-weight: bold; color: black; }
      .page-footer { position: fixed; bottom: 0; left: 0; right: 0; text-align: center; font-size: 0.8em; font-family: sans-serif; }
"#;

fn font_size_pt(size: FontSize) -> u8 {
    match size {
        FontSize::Small => 10,
        FontSize::Normal => 12,
        FontSize::Large => 14,
    }
}

/// Standalone printable page for the whole program.
pub fn print_html(program: &Program, options: &PrintOptions) -> String {
    let columns = match options.layout {
        PrintLayout::OneColumn => 1,
        PrintLayout::TwoColumn => 2,
    };

    let mut body = String::new();
    for item in program.items() {
        match &item.entry {
            ProgramEntry::Theme(theme) => {
                body.push_str(&format!(
                    "<h2 class=\"theme-title\">{}</h2>\n",
                    escape_html(&theme.title)
                ));
            }
            ProgramEntry::Song(song) => body.push_str(&song_block(song, options.show_chords)),
        }
    }

    let title = escape_html(&options.header_title);
    let footer = if options.show_page_numbers {
        r#"<footer class="page-footer no-print">Oldal</footer>"#
    } else {
        ""
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="hu">
  <head>
    <meta charset="utf-8">
    <title>Nyomtatás - {title}</title>
    <style>{STYLE}
      body {{ font-family: Georgia, 'Times New Roman', Times, serif; font-size: {size}pt; line-height: 1.5; }}
      main {{ column-count: {columns}; column-gap: 2rem; widows: 3; orphans: 3; }}
    </style>
  </head>
  <body>
    <header>
      <h1>{title}</h1>
      <h2>{date}</h2>
    </header>
    <main>
{body}    </main>
    {footer}
  </body>
</html>
"#,
        size = font_size_pt(options.font_size),
        date = escape_html(&options.header_date),
    )
}

fn song_block(song: &Song, show_chords: bool) -> String {
    let mut html = String::from("<div class=\"song\">\n");
    html.push_str(&format!(
        "<h3 class=\"song-title\">{}</h3>\n",
        escape_html(&song.title)
    ));
    if let Some(author) = song.author.as_deref().filter(|author| !author.is_empty()) {
        html.push_str(&format!(
            "<p class=\"song-author\">{}</p>\n",
            escape_html(author)
        ));
    }
    html.push_str(r#"<div class="song-content-wrapper">"#);
    for verse in parse_to_verses(&song.content) {
        html.push_str(&verse_block(&verse, show_chords));
    }
    html.push_str("</div>\n</div>\n");
    html
}

/// A chord line is paired with the lyric line right after it so the two
/// never split across a column or page.
fn verse_block(verse: &Verse, show_chords: bool) -> String {
    if verse.is_blank() {
        return String::new();
    }

    let mut html = String::from(r#"<div class="verse">"#);
    let marker = verse.marker.trim();
    if !marker.is_empty() && marker != "[]" {
        html.push_str(&format!(
            r#"<pre class="verse-marker">{}</pre>"#,
            escape_html(&verse.marker)
        ));
    }

    let mut lines = verse.lines.iter().peekable();
    while let Some(line) = lines.next() {
        if line.is_blank() {
            html.push_str(r#"<div class="line-pair"><pre class="lyrics">&nbsp;</pre></div>"#);
            continue;
        }
        match line.kind {
            LineKind::Chord if show_chords => {
                let chords = escape_html(&line.text.replacen(CHORD_PREFIX, " ", 1));
                match lines.next_if(|next| next.kind == LineKind::Lyric) {
                    Some(lyric) => html.push_str(&format!(
                        r#"<div class="line-pair"><pre class="chords">{chords}</pre><pre class="lyrics">{}</pre></div>"#,
                        escape_html(&lyric.text)
                    )),
                    None => html.push_str(&format!(
                        r#"<div class="line-pair"><pre class="chords">{chords}</pre></div>"#
                    )),
                }
            }
            LineKind::Chord => {}
            LineKind::Lyric => html.push_str(&format!(
                r#"<div class="line-pair"><pre class="lyrics">{}</pre></div>"#,
                escape_html(&line.text)
            )),
        }
    }
    html.push_str("</div>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Theme;
    use chrono::NaiveDate;

    fn options() -> PrintOptions {
        PrintOptions::for_date(NaiveDate::from_ymd_opt(2024, 12, 24).unwrap())
    }

    fn program_with(content: &str) -> Program {
        let mut program = Program::default();
        program.push_theme(Theme {
            id: "theme_gloria".to_string(),
            title: "Gloria".to_string(),
        });
        program.push_song(Song {
            id: "a.xml".to_string(),
            title: "Ének <1>".to_string(),
            author: Some("Ismeretlen".to_string()),
            content: content.to_string(),
            references: Vec::new(),
        });
        program
    }

    #[test]
    fn header_themes_and_escaped_titles() {
        let html = print_html(&program_with("[V1]\nLa"), &options());
        assert!(html.contains("<h1>Szentmise énekrend</h1>"));
        assert!(html.contains("<h2>2024. 12. 24.</h2>"));
        assert!(html.contains(r#"<h2 class="theme-title">Gloria</h2>"#));
        assert!(html.contains("Ének &lt;1&gt;"));
        assert!(html.contains(r#"<p class="song-author">Ismeretlen</p>"#));
        assert!(html.contains("font-size: 12pt"));
        assert!(html.contains("column-count: 1"));
        assert!(html.contains(r#"class="page-footer"#));
    }

    #[test]
    fn chord_lines_pair_with_the_next_lyric() {
        let html = print_html(&program_with("[V1]\n.C   G\nLa la\n\n.Am"), &options());
        assert!(html.contains(
            r#"<pre class="chords"> C   G</pre><pre class="lyrics">La la</pre>"#
        ));
        assert!(html.contains(r#"<pre class="lyrics">&nbsp;</pre>"#));
        assert!(html.contains(r#"<div class="line-pair"><pre class="chords"> Am</pre></div>"#));
        assert!(html.contains(r#"<pre class="verse-marker">[V1]</pre>"#));
    }

    #[test]
    fn chords_hidden_and_blank_verses_skipped() {
        let mut opts = options();
        opts.show_chords = false;
        opts.show_page_numbers = false;
        opts.layout = PrintLayout::TwoColumn;
        opts.font_size = FontSize::Large;
        let html = print_html(&program_with("[]\n.C\nLa\n[V2]\n  \n"), &opts);
        assert!(!html.contains(r#"class="chords""#));
        assert!(!html.contains(r#"class="verse-marker"#));
        assert!(!html.contains(r#"class="page-footer"#));
        assert_eq!(html.matches(r#"<div class="verse">"#).count(), 1);
        assert!(html.contains("column-count: 2"));
        assert!(html.contains("font-size: 14pt"));
    }

    #[test]
    fn song_block_lays_out_one_element_per_line() {
        let song = Song {
            id: "a.xml".to_string(),
            title: "Ének".to_string(),
            author: Some("Ismeretlen".to_string()),
            content: "La".to_string(),
            references: Vec::new(),
        };
        let html = song_block(&song, true);
        assert!(html.starts_with(
            "<div class=\"song\">\n<h3 class=\"song-title\">Ének</h3>\n<p class=\"song-author\">Ismeretlen</p>\n"
        ));
        assert!(html.contains(r#"<pre class="lyrics">La</pre>"#));
        assert!(html.ends_with("</div>\n</div>\n"));
    }
}
