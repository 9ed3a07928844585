use std::path::PathBuf;

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use regex::Regex;

use crate::models::{
    PrintOptions, ProjectorSettings, Song, MAX_PROJECTOR_FONT_SIZE, MIN_PROJECTOR_FONT_SIZE,
    PROJECTOR_FONTS,
};

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap());

/// Points added or removed per Left/Right press on the font size field.
const FONT_SIZE_STEP: u8 = 2;

/// Fields of the print options form, in focus order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub(crate) enum PrintField {
    #[default]
    HeaderTitle,
    HeaderDate,
    Layout,
    FontSize,
    ShowChords,
    PageNumbers,
}

impl PrintField {
    const ORDER: [PrintField; 6] = [
        PrintField::HeaderTitle,
        PrintField::HeaderDate,
        PrintField::Layout,
        PrintField::FontSize,
        PrintField::ShowChords,
        PrintField::PageNumbers,
    ];

    pub(crate) fn row(self) -> usize {
        Self::ORDER
            .iter()
            .position(|field| *field == self)
            .unwrap_or(0)
    }

    fn is_text(self) -> bool {
        matches!(self, PrintField::HeaderTitle | PrintField::HeaderDate)
    }
}

/// Form state for the print and editable-document exports.
#[derive(Clone, Debug)]
pub(crate) struct PrintForm {
    pub(crate) options: PrintOptions,
    pub(crate) active: PrintField,
    pub(crate) error: Option<String>,
}

impl PrintForm {
    pub(crate) fn new(options: PrintOptions) -> Self {
        Self {
            options,
            active: PrintField::default(),
            error: None,
        }
    }

    pub(crate) fn next_field(&mut self) {
        let row = (self.active.row() + 1) % PrintField::ORDER.len();
        self.active = PrintField::ORDER[row];
    }

    pub(crate) fn previous_field(&mut self) {
        let len = PrintField::ORDER.len();
        self.active = PrintField::ORDER[(self.active.row() + len - 1) % len];
    }

    /// Typing only lands in the two header text fields.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            PrintField::HeaderTitle => self.options.header_title.push(ch),
            PrintField::HeaderDate => self.options.header_date.push(ch),
            _ => {
                if ch == ' ' {
                    self.cycle();
                    return true;
                }
                return false;
            }
        }
        self.error = None;
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            PrintField::HeaderTitle => {
                self.options.header_title.pop();
            }
            PrintField::HeaderDate => {
                self.options.header_date.pop();
            }
            _ => {}
        }
    }

    /// Flip or advance the value of a choice field.
    pub(crate) fn cycle(&mut self) {
        match self.active {
            PrintField::Layout => self.options.layout = self.options.layout.toggle(),
            PrintField::FontSize => self.options.font_size = self.options.font_size.next(),
            PrintField::ShowChords => self.options.show_chords = !self.options.show_chords,
            PrintField::PageNumbers => {
                self.options.show_page_numbers = !self.options.show_page_numbers
            }
            PrintField::HeaderTitle | PrintField::HeaderDate => {}
        }
    }

    pub(crate) fn parse_inputs(&self) -> Result<PrintOptions> {
        if self.options.header_title.trim().is_empty() {
            return Err(anyhow!("Header title is required."));
        }
        Ok(self.options.clone())
    }

    fn value(&self, field: PrintField) -> String {
        let flag = |on: bool| (if on { "[x]" } else { "[ ]" }).to_string();
        match field {
            PrintField::HeaderTitle => self.options.header_title.clone(),
            PrintField::HeaderDate => self.options.header_date.clone(),
            PrintField::Layout => format!("< {} >", self.options.layout.label()),
            PrintField::FontSize => format!("< {} >", self.options.font_size.label()),
            PrintField::ShowChords => flag(self.options.show_chords),
            PrintField::PageNumbers => flag(self.options.show_page_numbers),
        }
    }

    pub(crate) fn build_line(&self, field_name: &str, field: PrintField) -> Line<'static> {
        let style = if self.active == field {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        Line::from(vec![
            Span::raw(format!("{field_name}: ")),
            Span::styled(self.value(field), style),
        ])
    }

    /// Cursor column for the text fields, `None` for choice fields.
    pub(crate) fn cursor_len(&self) -> Option<usize> {
        self.active
            .is_text()
            .then(|| self.value(self.active).chars().count())
    }
}

/// Fields of the projector settings form, in focus order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub(crate) enum ProjectorField {
    #[default]
    Background,
    TextColor,
    Font,
    FontSize,
    Bold,
    Align,
    ShowChords,
}

impl ProjectorField {
    pub(crate) const ORDER: [ProjectorField; 7] = [
        ProjectorField::Background,
        ProjectorField::TextColor,
        ProjectorField::Font,
        ProjectorField::FontSize,
        ProjectorField::Bold,
        ProjectorField::Align,
        ProjectorField::ShowChords,
    ];

    pub(crate) fn row(self) -> usize {
        Self::ORDER
            .iter()
            .position(|field| *field == self)
            .unwrap_or(0)
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            ProjectorField::Background => "Background",
            ProjectorField::TextColor => "Text colour",
            ProjectorField::Font => "Font",
            ProjectorField::FontSize => "Font size",
            ProjectorField::Bold => "Bold",
            ProjectorField::Align => "Alignment",
            ProjectorField::ShowChords => "Show chords",
        }
    }

    fn is_text(self) -> bool {
        matches!(self, ProjectorField::Background | ProjectorField::TextColor)
    }
}

/// Form state for the projector look. The projector screen previews the
/// settings while they are being edited.
#[derive(Clone, Debug)]
pub(crate) struct ProjectorForm {
    pub(crate) settings: ProjectorSettings,
    pub(crate) active: ProjectorField,
    pub(crate) error: Option<String>,
}

impl ProjectorForm {
    pub(crate) fn new(settings: ProjectorSettings) -> Self {
        Self {
            settings,
            active: ProjectorField::default(),
            error: None,
        }
    }

    pub(crate) fn next_field(&mut self) {
        let row = (self.active.row() + 1) % ProjectorField::ORDER.len();
        self.active = ProjectorField::ORDER[row];
    }

    pub(crate) fn previous_field(&mut self) {
        let len = ProjectorField::ORDER.len();
        self.active = ProjectorField::ORDER[(self.active.row() + len - 1) % len];
    }

    /// Typing lands in the two colour fields; a space flips a choice.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            ProjectorField::Background => self.settings.background_color.push(ch),
            ProjectorField::TextColor => self.settings.text_color.push(ch),
            _ => {
                if ch == ' ' {
                    self.adjust(true);
                    return true;
                }
                return false;
            }
        }
        self.error = None;
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            ProjectorField::Background => {
                self.settings.background_color.pop();
            }
            ProjectorField::TextColor => {
                self.settings.text_color.pop();
            }
            _ => {}
        }
    }

    /// Step a choice field forward or back.
    pub(crate) fn adjust(&mut self, forward: bool) {
        let settings = &mut self.settings;
        match self.active {
            ProjectorField::Font => {
                let len = PROJECTOR_FONTS.len();
                let current = PROJECTOR_FONTS
                    .iter()
                    .position(|font| *font == settings.font_family)
                    .unwrap_or(0);
                let next = if forward {
                    (current + 1) % len
                } else {
                    (current + len - 1) % len
                };
                settings.font_family = PROJECTOR_FONTS[next].to_string();
            }
            ProjectorField::FontSize => {
                let size = if forward {
                    settings.font_size.saturating_add(FONT_SIZE_STEP)
                } else {
                    settings.font_size.saturating_sub(FONT_SIZE_STEP)
                };
                settings.font_size = size.clamp(MIN_PROJECTOR_FONT_SIZE, MAX_PROJECTOR_FONT_SIZE);
            }
            ProjectorField::Bold => settings.is_bold = !settings.is_bold,
            ProjectorField::Align => {
                settings.text_align = if forward {
                    settings.text_align.next()
                } else {
                    settings.text_align.next().next()
                };
            }
            ProjectorField::ShowChords => settings.show_chords = !settings.show_chords,
            ProjectorField::Background | ProjectorField::TextColor => {}
        }
    }

    pub(crate) fn parse_inputs(&self) -> Result<ProjectorSettings> {
        if !HEX_COLOR.is_match(self.settings.background_color.trim()) {
            return Err(anyhow!("Background must be a colour like #000000."));
        }
        if !HEX_COLOR.is_match(self.settings.text_color.trim()) {
            return Err(anyhow!("Text colour must be a colour like #FFFFFF."));
        }
        let mut settings = self.settings.clone();
        settings.background_color = settings.background_color.trim().to_string();
        settings.text_color = settings.text_color.trim().to_string();
        Ok(settings)
    }

    fn value(&self, field: ProjectorField) -> String {
        let flag = |on: bool| (if on { "[x]" } else { "[ ]" }).to_string();
        match field {
            ProjectorField::Background => self.settings.background_color.clone(),
            ProjectorField::TextColor => self.settings.text_color.clone(),
            ProjectorField::Font => format!("< {} >", self.settings.font_family),
            ProjectorField::FontSize => format!("< {}pt >", self.settings.font_size),
            ProjectorField::Bold => flag(self.settings.is_bold),
            ProjectorField::Align => format!("< {} >", self.settings.text_align.label()),
            ProjectorField::ShowChords => flag(self.settings.show_chords),
        }
    }

    pub(crate) fn build_line(&self, field: ProjectorField) -> Line<'static> {
        let style = if self.active == field {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        Line::from(vec![
            Span::raw(format!("{}: ", field.label())),
            Span::styled(self.value(field), style),
        ])
    }

    pub(crate) fn cursor_len(&self) -> Option<usize> {
        self.active
            .is_text()
            .then(|| self.value(self.active).chars().count())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum ExportKind {
    Text,
    Bundle,
    Document,
}

impl ExportKind {
    pub(crate) const ALL: [ExportKind; 3] = [ExportKind::Text, ExportKind::Bundle, ExportKind::Document];

    pub(crate) fn label(self) -> &'static str {
        match self {
            ExportKind::Text => "Order for sharing (txt)",
            ExportKind::Bundle => "Order and songs (json)",
            ExportKind::Document => "Editable document (doc)",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct ExportMenu {
    pub(crate) selected: usize,
}

impl ExportMenu {
    pub(crate) fn move_selection(&mut self, offset: isize) {
        let last = ExportKind::ALL.len() as isize - 1;
        self.selected = (self.selected as isize + offset).clamp(0, last) as usize;
    }

    pub(crate) fn current(&self) -> ExportKind {
        ExportKind::ALL[self.selected.min(ExportKind::ALL.len() - 1)]
    }
}

/// Path prompt for imports. A `.json` path is read as a bundle; anything
/// else is treated as an XML file or a directory of them.
#[derive(Clone, Debug, Default)]
pub(crate) struct ImportPrompt {
    pub(crate) path: String,
    pub(crate) error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ImportTarget {
    Bundle(PathBuf),
    Xml(Vec<PathBuf>),
}

impl ImportPrompt {
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.path.push(ch);
        self.error = None;
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.path.pop();
    }

    pub(crate) fn parse_inputs(&self) -> Result<ImportTarget> {
        let raw = self.path.trim().trim_matches(|c: char| c == '"' || c == '\'');
        if raw.is_empty() {
            return Err(anyhow!("Enter a file or directory path."));
        }
        let path = PathBuf::from(raw);
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Ok(ImportTarget::Bundle(path))
        } else {
            Ok(ImportTarget::Xml(vec![path]))
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct ConfirmSongDelete {
    pub(crate) song: Song,
    /// Program slots that will disappear along with the song.
    pub(crate) slots: usize,
}

#[derive(Clone, Debug)]
pub(crate) struct ConfirmClear {
    pub(crate) items: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FontSize, PrintLayout};
    use chrono::NaiveDate;

    fn form() -> PrintForm {
        PrintForm::new(PrintOptions::for_date(
            NaiveDate::from_ymd_opt(2024, 5, 19).unwrap(),
        ))
    }

    #[test]
    fn print_form_edits_text_and_cycles_choices() {
        let mut form = form();
        form.push_char('!');
        assert_eq!(form.options.header_title, "Szentmise énekrend!");
        assert_eq!(form.cursor_len(), Some(19));

        form.next_field();
        form.next_field();
        assert_eq!(form.active, PrintField::Layout);
        assert_eq!(form.cursor_len(), None);
        assert!(form.push_char(' '));
        assert_eq!(form.options.layout, PrintLayout::TwoColumn);
        assert!(!form.push_char('x'));

        form.next_field();
        form.cycle();
        assert_eq!(form.options.font_size, FontSize::Large);

        form.previous_field();
        form.previous_field();
        form.previous_field();
        assert_eq!(form.active, PrintField::HeaderTitle);
        form.previous_field();
        assert_eq!(form.active, PrintField::PageNumbers);
    }

    #[test]
    fn print_form_requires_a_header() {
        let mut form = form();
        form.options.header_title = "  ".to_string();
        assert!(form.parse_inputs().is_err());
    }

    #[test]
    fn import_prompt_routes_json_to_bundles() {
        let mut prompt = ImportPrompt::default();
        assert!(prompt.parse_inputs().is_err());
        prompt.path = " \"/tmp/enekrend.JSON\" ".to_string();
        assert_eq!(
            prompt.parse_inputs().unwrap(),
            ImportTarget::Bundle(PathBuf::from("/tmp/enekrend.JSON"))
        );
        prompt.path = "/tmp/songs".to_string();
        assert_eq!(
            prompt.parse_inputs().unwrap(),
            ImportTarget::Xml(vec![PathBuf::from("/tmp/songs")])
        );
    }

    #[test]
    fn export_menu_clamps() {
        let mut menu = ExportMenu::default();
        menu.move_selection(-1);
        assert_eq!(menu.current(), ExportKind::Text);
        menu.move_selection(10);
        assert_eq!(menu.current(), ExportKind::Document);
    }

    #[test]
    fn projector_form_steps_choices_within_bounds() {
        let mut form = ProjectorForm::new(ProjectorSettings::default());
        form.active = ProjectorField::Font;
        form.adjust(false);
        assert_eq!(form.settings.font_family, "Lucida Console");
        form.adjust(true);
        assert_eq!(form.settings.font_family, "Arial");

        form.next_field();
        form.settings.font_size = 79;
        form.adjust(true);
        assert_eq!(form.settings.font_size, 80);
        form.settings.font_size = 15;
        form.adjust(false);
        assert_eq!(form.settings.font_size, 14);

        form.next_field();
        assert!(form.push_char(' '));
        assert!(form.settings.is_bold);

        form.next_field();
        form.adjust(false);
        assert_eq!(form.settings.text_align, crate::models::TextAlign::Left);
    }

    #[test]
    fn projector_form_rejects_malformed_colours() {
        let mut form = ProjectorForm::new(ProjectorSettings::default());
        form.backspace();
        assert_eq!(form.cursor_len(), Some(6));
        let err = form.parse_inputs().unwrap_err();
        assert_eq!(err.to_string(), "Background must be a colour like #000000.");

        form.push_char('0');
        form.previous_field();
        assert_eq!(form.active, ProjectorField::ShowChords);
        form.active = ProjectorField::TextColor;
        form.push_char('x');
        assert!(form.parse_inputs().is_err());
        form.backspace();
        assert_eq!(form.parse_inputs().unwrap(), ProjectorSettings::default());
    }
}
