//! Domain models shared by persistence, import/export, and the TUI. These
//! stay plain data holders; the text engine in `song_text` works on the
//! `content` strings they carry and never mutates a song directly.

use std::fmt;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// A song in the library. The id is the filename the song was imported from
/// (or was given in the editor), e.g. `amint_vagyok.xml`, and is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Raw lyric/chord text with verse markers.
    pub content: String,
    /// Songbook reference codes such as `K123` or `SK28`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

impl Song {
    /// `Title - Author`, or only the title when the author is blank.
    pub fn display_title(&self) -> String {
        match self.author.as_deref().map(str::trim) {
            Some(author) if !author.is_empty() => format!("{} - {}", self.title, author),
            _ => self.title.clone(),
        }
    }

    /// Comma separated reference codes, empty when there are none.
    pub fn references_label(&self) -> String {
        self.references.join(", ")
    }
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_title())
    }
}

/// A liturgical section heading placed between songs ("Kyrie", "Gloria").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub id: String,
    pub title: String,
}

/// What a program slot holds, tagged explicitly instead of being inferred
/// from which fields happen to be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProgramEntry {
    Song(Song),
    Theme(Theme),
}

impl ProgramEntry {
    pub fn id(&self) -> &str {
        match self {
            ProgramEntry::Song(song) => &song.id,
            ProgramEntry::Theme(theme) => &theme.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ProgramEntry::Song(song) => &song.title,
            ProgramEntry::Theme(theme) => &theme.title,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ProgramEntry::Song(_) => "song",
            ProgramEntry::Theme(_) => "theme",
        }
    }

    pub fn as_song(&self) -> Option<&Song> {
        match self {
            ProgramEntry::Song(song) => Some(song),
            ProgramEntry::Theme(_) => None,
        }
    }
}

/// One slot of the order of service. `instance_id` distinguishes repeated
/// uses of the same song or theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramItem {
    pub instance_id: String,
    #[serde(flatten)]
    pub entry: ProgramEntry,
}

/// The ordered song/theme sequence being assembled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    items: Vec<ProgramItem>,
}

impl Program {
    pub fn new(items: Vec<ProgramItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[ProgramItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ProgramItem> {
        self.items.get(index)
    }

    pub fn push_song(&mut self, song: Song) -> &ProgramItem {
        let instance_id = self.next_instance_id("song", &song.id);
        self.push(ProgramItem {
            instance_id,
            entry: ProgramEntry::Song(song),
        })
    }

    pub fn push_theme(&mut self, theme: Theme) -> &ProgramItem {
        let instance_id = self.next_instance_id("theme", &theme.id);
        self.push(ProgramItem {
            instance_id,
            entry: ProgramEntry::Theme(theme),
        })
    }

    fn push(&mut self, item: ProgramItem) -> &ProgramItem {
        self.items.push(item);
        &self.items[self.items.len() - 1]
    }

    /// `<kind>_<id>_<millis>`, with a numeric suffix when two slots are added
    /// within the same millisecond.
    fn next_instance_id(&self, kind: &str, id: &str) -> String {
        let base = format!("{kind}_{id}_{}", Local::now().timestamp_millis());
        let taken = |candidate: &str| self.items.iter().any(|i| i.instance_id == candidate);
        if !taken(&base) {
            return base;
        }
        let mut suffix = 1;
        loop {
            let candidate = format!("{base}_{suffix}");
            if !taken(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Drop a slot by instance id, returning whether anything was removed.
    pub fn remove(&mut self, instance_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.instance_id != instance_id);
        before != self.items.len()
    }

    /// Move a slot from one position to another, shifting the others like a
    /// drag-and-drop reorder would. Out-of-range positions are ignored.
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        if from >= self.items.len() || to >= self.items.len() || from == to {
            return false;
        }
        let item = self.items.remove(from);
        self.items.insert(to, item);
        true
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Push edited song data into every slot holding that song.
    pub fn refresh_song(&mut self, song: &Song) {
        for item in &mut self.items {
            if let ProgramEntry::Song(existing) = &mut item.entry {
                if existing.id == song.id {
                    *existing = song.clone();
                }
            }
        }
    }

    /// Remove every slot referencing a deleted library song.
    pub fn remove_song(&mut self, song_id: &str) -> usize {
        let before = self.items.len();
        self.items.retain(|item| match &item.entry {
            ProgramEntry::Song(song) => song.id != song_id,
            ProgramEntry::Theme(_) => true,
        });
        before - self.items.len()
    }

    /// Distinct songs used by the program, in first-use order.
    pub fn songs(&self) -> Vec<&Song> {
        let mut seen = Vec::new();
        for song in self.items.iter().filter_map(|item| item.entry.as_song()) {
            if !seen.iter().any(|s: &&Song| s.id == song.id) {
                seen.push(song);
            }
        }
        seen
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintLayout {
    OneColumn,
    TwoColumn,
}

impl PrintLayout {
    pub fn toggle(self) -> Self {
        match self {
            PrintLayout::OneColumn => PrintLayout::TwoColumn,
            PrintLayout::TwoColumn => PrintLayout::OneColumn,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PrintLayout::OneColumn => "One column",
            PrintLayout::TwoColumn => "Two columns",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontSize {
    Small,
    Normal,
    Large,
}

impl FontSize {
    pub fn next(self) -> Self {
        match self {
            FontSize::Small => FontSize::Normal,
            FontSize::Normal => FontSize::Large,
            FontSize::Large => FontSize::Small,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FontSize::Small => "Small",
            FontSize::Normal => "Normal",
            FontSize::Large => "Large",
        }
    }
}

/// Settings for the printable and editable document exports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintOptions {
    pub header_title: String,
    pub header_date: String,
    pub layout: PrintLayout,
    pub font_size: FontSize,
    pub show_chords: bool,
    pub show_page_numbers: bool,
}

impl PrintOptions {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            header_title: "Szentmise énekrend".to_string(),
            header_date: date.format("%Y. %m. %d.").to_string(),
            layout: PrintLayout::OneColumn,
            font_size: FontSize::Normal,
            show_chords: true,
            show_page_numbers: true,
        }
    }
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self::for_date(Local::now().date_naive())
    }
}

/// Fonts offered for the projected slide page.
pub const PROJECTOR_FONTS: [&str; 10] = [
    "Arial",
    "Verdana",
    "Helvetica",
    "Tahoma",
    "Trebuchet MS",
    "Times New Roman",
    "Georgia",
    "Garamond",
    "Courier New",
    "Lucida Console",
];

pub const MIN_PROJECTOR_FONT_SIZE: u8 = 14;
pub const MAX_PROJECTOR_FONT_SIZE: u8 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn next(self) -> Self {
        match self {
            TextAlign::Left => TextAlign::Center,
            TextAlign::Center => TextAlign::Right,
            TextAlign::Right => TextAlign::Left,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TextAlign::Left => "Left",
            TextAlign::Center => "Center",
            TextAlign::Right => "Right",
        }
    }

    pub fn css(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

/// How projected slides look. Colours are `#rrggbb` strings; the font size
/// is in points and only applies to the slide page opened in a browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectorSettings {
    pub background_color: String,
    pub text_color: String,
    pub font_family: String,
    pub font_size: u8,
    pub is_bold: bool,
    pub text_align: TextAlign,
    pub show_chords: bool,
}

impl Default for ProjectorSettings {
    fn default() -> Self {
        Self {
            background_color: "#000000".to_string(),
            text_color: "#FFFFFF".to_string(),
            font_family: PROJECTOR_FONTS[0].to_string(),
            font_size: 40,
            is_bold: false,
            text_align: TextAlign::Center,
            show_chords: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(id: &str, title: &str) -> Song {
        Song {
            id: id.to_string(),
            title: title.to_string(),
            author: None,
            content: "[V1]\nText".to_string(),
            references: Vec::new(),
        }
    }

    fn theme(id: &str, title: &str) -> Theme {
        Theme {
            id: id.to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    fn display_title_skips_blank_author() {
        let mut s = song("a.xml", "Amint vagyok");
        assert_eq!(s.display_title(), "Amint vagyok");
        s.author = Some("  ".to_string());
        assert_eq!(s.display_title(), "Amint vagyok");
        s.author = Some("Ismeretlen".to_string());
        assert_eq!(s.display_title(), "Amint vagyok - Ismeretlen");
    }

    #[test]
    fn same_song_can_fill_several_slots() {
        let mut program = Program::default();
        program.push_song(song("a.xml", "A"));
        program.push_song(song("a.xml", "A"));
        program.push_theme(theme("theme_kyrie", "Kyrie"));
        assert_eq!(program.len(), 3);
        let ids: Vec<&str> = program.items().iter().map(|i| i.instance_id.as_str()).collect();
        assert_ne!(ids[0], ids[1]);
        assert!(ids[0].starts_with("song_a.xml_"));
        assert!(ids[2].starts_with("theme_theme_kyrie_"));
        assert_eq!(program.songs().len(), 1);
    }

    #[test]
    fn move_item_shifts_neighbours() {
        let mut program = Program::default();
        for id in ["a", "b", "c"] {
            program.push_song(song(id, id));
        }
        assert!(program.move_item(0, 2));
        let order: Vec<&str> = program.items().iter().map(|i| i.entry.id()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
        assert!(!program.move_item(0, 3));
        assert!(!program.move_item(1, 1));
    }

    #[test]
    fn remove_and_remove_song() {
        let mut program = Program::default();
        let first = program.push_song(song("a", "A")).instance_id.clone();
        program.push_theme(theme("t", "T"));
        program.push_song(song("a", "A"));
        assert!(program.remove(&first));
        assert!(!program.remove(&first));
        assert_eq!(program.remove_song("a"), 1);
        assert_eq!(program.len(), 1);
        assert_eq!(program.items()[0].entry.kind(), "theme");
    }

    #[test]
    fn refresh_song_updates_every_slot() {
        let mut program = Program::default();
        program.push_song(song("a", "Old"));
        program.push_song(song("a", "Old"));
        program.refresh_song(&song("a", "New"));
        assert!(program.items().iter().all(|i| i.entry.title() == "New"));
    }

    #[test]
    fn program_items_serialize_with_explicit_kind_tag() {
        let item = ProgramItem {
            instance_id: "theme_kyrie_1".to_string(),
            entry: ProgramEntry::Theme(theme("theme_kyrie", "Kyrie")),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "theme");
        assert_eq!(json["instanceId"], "theme_kyrie_1");
        assert_eq!(json["title"], "Kyrie");

        let parsed: ProgramItem = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, item);
    }

    #[test]
    fn print_options_default_header() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let options = PrintOptions::for_date(date);
        assert_eq!(options.header_date, "2024. 03. 09.");
        assert_eq!(options.layout, PrintLayout::OneColumn);
        assert!(options.show_chords);
    }

    #[test]
    fn projector_settings_use_camel_case_keys() {
        let json = serde_json::to_string(&ProjectorSettings::default()).unwrap();
        assert!(json.contains(r##""backgroundColor":"#000000""##));
        assert!(json.contains(r#""textAlign":"center""#));
        assert!(json.contains(r#""isBold":false"#));
    }

    #[test]
    fn text_align_cycles_through_all_three() {
        let align = TextAlign::Left;
        assert_eq!(align.next(), TextAlign::Center);
        assert_eq!(align.next().next().next(), TextAlign::Left);
    }
}
