use crate::models::{FontSize, PrintLayout, PrintOptions, Program, ProgramEntry, Song};
use crate::song_text::{parse_to_verses, LineKind, CHORD_PREFIX};

use super::escape_html;

const FONT_FAMILY: &str = "Arial";
const PAGE_MARGIN_MM: u8 = 10;
const COLUMN_GAP_MM: f32 = 5.0;

// Word renders slightly smaller than a browser, so the document runs two
// points above the print page.
fn font_size_pt(size: FontSize) -> u8 {
    match size {
        FontSize::Small => 12,
        FontSize::Normal => 14,
        FontSize::Large => 16,
    }
}

/// HTML that word processors open as an editable document. Two-column
/// layout is a two-cell table since Word ignores CSS columns; the first
/// cell takes the larger half of the items.
pub fn editable_doc_html(program: &Program, options: &PrintOptions) -> String {
    let items: Vec<String> = program
        .items()
        .iter()
        .enumerate()
        .map(|(index, item)| item_block(index, &item.entry, options.show_chords))
        .collect();

    let body = match options.layout {
        PrintLayout::OneColumn => items.join("\n"),
        PrintLayout::TwoColumn => {
            let midpoint = items.len().div_ceil(2);
            let gap = COLUMN_GAP_MM / 2.0;
            format!(
                r#"<table style="width: 100%; border-collapse: collapse;">
  <tbody>
    <tr>
      <td style="width: 50%; vertical-align: top; padding-right: {gap}mm;">
{left}
      </td>
      <td style="width: 50%; vertical-align: top; padding-left: {gap}mm;">
{right}
      </td>
    </tr>
  </tbody>
</table>"#,
                left = items[..midpoint].join("\n"),
                right = items[midpoint..].join("\n"),
            )
        }
    };

    let title = escape_html(&options.header_title);
    format!(
        r#"<html xmlns:o='urn:schemas-microsoft-com:office:office' xmlns:w='urn:schemas-microsoft-com:office:word' xmlns='http://www.w3.org/TR/REC-html40'>
  <head>
    <meta charset='utf-8'>
    <title>{title}</title>
    <!--[if gte mso 9]>
    <xml>
      <w:WordDocument>
        <w:View>Print</w:View>
        <w:Zoom>90</w:Zoom>
        <w:DoNotOptimizeForBrowser/>
      </w:WordDocument>
    </xml>
    <![endif]-->
    <style>
      @page {{ size: A4; mso-page-orientation: portrait; margin: {PAGE_MARGIN_MM}mm; }}
      body {{ font-family: '{FONT_FAMILY}', sans-serif; font-size: {size}pt; line-height: 1.6; }}
    </style>
  </head>
  <body>
    <div style="text-align: center; margin-bottom: 2em;">
      <h1>{title}</h1>
      <p>{date}</p>
    </div>
{body}
  </body>
</html>
"#,
        size = font_size_pt(options.font_size),
        date = escape_html(&options.header_date),
    )
}

fn item_block(index: usize, entry: &ProgramEntry, show_chords: bool) -> String {
    let heading_style = match entry {
        ProgramEntry::Song(_) => "margin-top: 1.5em;",
        ProgramEntry::Theme(_) => {
            "margin: 1.5em 0; text-align: center; border-top: 1px solid #ccc; border-bottom: 1px solid #ccc; padding: 0.5em 0;"
        }
    };
    let heading = format!(
        r#"<h3 style="font-weight: bold; margin-bottom: 0.5em; {heading_style}">{}. {}</h3>"#,
        index + 1,
        escape_html(entry.title())
    );

    match entry {
        ProgramEntry::Theme(_) => heading,
        ProgramEntry::Song(song) => {
            let references = if song.references.is_empty() {
                String::new()
            } else {
                format!(
                    r#"<p style="font-style: italic; font-size: 0.9em; margin-top: 0; color: #555;">({})</p>"#,
                    escape_html(&song.references_label())
                )
            };
            format!(
                r#"<div class="song-item" style="break-inside: avoid;">{heading}{references}{}</div>"#,
                song_body(song, show_chords)
            )
        }
    }
}

fn song_body(song: &Song, show_chords: bool) -> String {
    let mut html = String::new();
    for verse in parse_to_verses(&song.content) {
        if !verse.marker.is_empty() {
            html.push_str(&format!(
                r#"<p style="margin-top: 0.5em; margin-bottom: 0.2em;"><b>{}</b></p>"#,
                escape_html(&verse.marker)
            ));
        }
        for line in &verse.lines {
            match line.kind {
                LineKind::Lyric => {
                    let text = if line.text.is_empty() {
                        "&nbsp;".to_string()
                    } else {
                        escape_html(&line.text)
                    };
                    html.push_str(&format!(
                        r#"<p style="margin: 0; min-height: 1.2em;">{text}</p>"#
                    ));
                }
                LineKind::Chord if show_chords => {
                    let chords = line.text.replacen(CHORD_PREFIX, "", 1);
                    let chords = if chords.is_empty() {
                        "&nbsp;".to_string()
                    } else {
                        escape_html(&chords).replace(' ', "&nbsp;")
                    };
                    html.push_str(&format!(
                        r#"<p style="margin: 0; color: #000000;"><font face="Courier New, Courier, monospace"><b>{chords}</b></font></p>"#
                    ));
                }
                LineKind::Chord => {}
            }
        }
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Theme;
    use chrono::NaiveDate;

    fn options(layout: PrintLayout) -> PrintOptions {
        let mut options = PrintOptions::for_date(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
        options.layout = layout;
        options
    }

    fn theme(title: &str) -> Theme {
        Theme {
            id: format!("theme_{title}"),
            title: title.to_string(),
        }
    }

    #[test]
    fn songs_render_numbered_with_references_and_chords() {
        let mut program = Program::default();
        program.push_song(Song {
            id: "a.xml".to_string(),
            title: "Amint vagyok".to_string(),
            author: None,
            content: "[V1]\n.C  G\nLa\n".to_string(),
            references: vec!["K123".to_string(), "D4".to_string()],
        });
        let html = editable_doc_html(&program, &options(PrintLayout::OneColumn));
        assert!(html.contains("1. Amint vagyok</h3>"));
        assert!(html.contains("(K123, D4)</p>"));
        assert!(html.contains("<b>[V1]</b>"));
        assert!(html.contains("<b>C&nbsp;&nbsp;G</b>"));
        assert!(html.contains(r#"min-height: 1.2em;">La</p>"#));
        assert!(html.contains(r#"min-height: 1.2em;">&nbsp;</p>"#));
        assert!(!html.contains("<table"));
        assert!(html.contains("font-size: 14pt"));
    }

    #[test]
    fn two_columns_split_at_the_ceiling_midpoint() {
        let mut program = Program::default();
        for title in ["Kyrie", "Gloria", "Sanctus"] {
            program.push_theme(theme(title));
        }
        let html = editable_doc_html(&program, &options(PrintLayout::TwoColumn));
        let (left, right) = html.split_once("padding-left").unwrap();
        assert!(left.contains("1. Kyrie") && left.contains("2. Gloria"));
        assert!(right.contains("3. Sanctus"));
        assert!(!right.contains("Gloria"));
    }

    #[test]
    fn hidden_chords_are_dropped() {
        let mut program = Program::default();
        program.push_song(Song {
            id: "a.xml".to_string(),
            title: "A".to_string(),
            author: None,
            content: ".Am\nLa".to_string(),
            references: Vec::new(),
        });
        let mut opts = options(PrintLayout::OneColumn);
        opts.show_chords = false;
        assert!(!editable_doc_html(&program, &opts).contains("Courier"));
    }
}
