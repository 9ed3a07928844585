use crate::models::ProjectorSettings;
use crate::projector::Slide;

use super::escape_html;

/// A single full-window page for the slide on screen, styled with the
/// projector settings. Titles and references get heading tags; verse lines
/// are joined with `<br/>`.
pub fn slide_html(slide: &Slide, settings: &ProjectorSettings) -> String {
    let lines: Vec<String> = slide
        .lines(settings.show_chords)
        .iter()
        .map(|line| escape_html(line))
        .collect();
    let content = match slide {
        Slide::Blank => String::new(),
        Slide::Title(_) => format!("<h1>{}</h1>", lines.join("")),
        Slide::References(_) => format!("<h2>{}</h2>", lines.join("")),
        Slide::Verse(_) => lines.join("<br/>\n"),
    };
    let weight = if settings.is_bold { "bold" } else { "normal" };

    format!(
        r#"<!DOCTYPE html>
<html lang="hu">
  <head>
    <meta charset="utf-8">
    <title>Vetítés</title>
    <style>
      html, body {{ height: 100%; margin: 0; }}
      body {{
        display: flex; align-items: center; justify-content: center; padding: 3rem; box-sizing: border-box;
        background-color: {background}; color: {color};
        font-family: '{family}'; font-size: {size}pt; font-weight: {weight}; text-align: {align};
      }}
      .slide {{ white-space: pre-wrap; }}
    </style>
  </head>
  <body>
    <div class="slide">{content}</div>
  </body>
</html>
"#,
        background = escape_html(&settings.background_color),
        color = escape_html(&settings.text_color),
        family = escape_html(&settings.font_family),
        size = settings.font_size,
        align = settings.text_align.css(),
    )
}
