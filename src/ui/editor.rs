use std::collections::HashSet;

use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::catalog::{COMMON_CHORDS, VERSE_MARKERS};
use crate::models::Song;
use crate::song_text::{copy_chords, normalize_bh, parse_to_verses, transpose, Verse};

/// Multi-line text with a cursor addressed as (row, column in chars).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ContentBuffer {
    lines: Vec<String>,
    row: usize,
    col: usize,
}

impl Default for ContentBuffer {
    fn default() -> Self {
        Self::from_text("")
    }
}

fn byte_index(line: &str, col: usize) -> usize {
    line.char_indices()
        .nth(col)
        .map(|(index, _)| index)
        .unwrap_or(line.len())
}

impl ContentBuffer {
    pub(crate) fn from_text(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(str::to_string).collect(),
            row: 0,
            col: 0,
        }
    }

    pub(crate) fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub(crate) fn lines(&self) -> &[String] {
        &self.lines
    }

    pub(crate) fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    fn line_len(&self, row: usize) -> usize {
        self.lines.get(row).map_or(0, |line| line.chars().count())
    }

    /// Cursor as a char offset into `text()`.
    pub(crate) fn cursor_offset(&self) -> usize {
        self.lines[..self.row]
            .iter()
            .map(|line| line.chars().count() + 1)
            .sum::<usize>()
            + self.col
    }

    /// Place the cursor at a char offset, clamped to the end of the text.
    pub(crate) fn set_cursor_offset(&mut self, offset: usize) {
        let mut remaining = offset;
        for (row, line) in self.lines.iter().enumerate() {
            let len = line.chars().count();
            if remaining <= len {
                self.row = row;
                self.col = remaining;
                return;
            }
            remaining -= len + 1;
        }
        self.row = self.lines.len() - 1;
        self.col = self.line_len(self.row);
    }

    /// Swap the whole text, keeping the cursor at the same offset if it
    /// still fits.
    pub(crate) fn replace_text(&mut self, text: &str) {
        let offset = self.cursor_offset();
        self.lines = text.split('\n').map(str::to_string).collect();
        self.set_cursor_offset(offset);
    }

    pub(crate) fn insert_char(&mut self, ch: char) {
        if ch == '\n' {
            self.newline();
            return;
        }
        let line = &mut self.lines[self.row];
        let at = byte_index(line, self.col);
        line.insert(at, ch);
        self.col += 1;
    }

    pub(crate) fn insert_str(&mut self, text: &str) {
        for ch in text.chars() {
            self.insert_char(ch);
        }
    }

    pub(crate) fn newline(&mut self) {
        let line = &mut self.lines[self.row];
        let at = byte_index(line, self.col);
        let rest = line.split_off(at);
        self.lines.insert(self.row + 1, rest);
        self.row += 1;
        self.col = 0;
    }

    /// Delete the char before the cursor, joining lines at column zero.
    /// Returns false when there was nothing to delete.
    pub(crate) fn backspace(&mut self) -> bool {
        if self.col > 0 {
            let line = &mut self.lines[self.row];
            let at = byte_index(line, self.col - 1);
            line.remove(at);
            self.col -= 1;
            true
        } else if self.row > 0 {
            let current = self.lines.remove(self.row);
            self.row -= 1;
            self.col = self.line_len(self.row);
            self.lines[self.row].push_str(&current);
            true
        } else {
            false
        }
    }

    pub(crate) fn delete(&mut self) -> bool {
        if self.col < self.line_len(self.row) {
            let line = &mut self.lines[self.row];
            let at = byte_index(line, self.col);
            line.remove(at);
            true
        } else if self.row + 1 < self.lines.len() {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&next);
            true
        } else {
            false
        }
    }

    pub(crate) fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.line_len(self.row);
        }
    }

    pub(crate) fn move_right(&mut self) {
        if self.col < self.line_len(self.row) {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub(crate) fn move_up(&mut self, rows: usize) {
        self.row = self.row.saturating_sub(rows);
        self.col = self.col.min(self.line_len(self.row));
    }

    pub(crate) fn move_down(&mut self, rows: usize) {
        self.row = (self.row + rows).min(self.lines.len() - 1);
        self.col = self.col.min(self.line_len(self.row));
    }

    pub(crate) fn move_home(&mut self) {
        self.col = 0;
    }

    pub(crate) fn move_end(&mut self) {
        self.col = self.line_len(self.row);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HistoryEntry {
    pub(crate) content: String,
    pub(crate) cursor: usize,
}

/// Linear undo history. Recording after an undo drops the redo tail.
#[derive(Debug, Clone)]
pub(crate) struct EditHistory {
    entries: Vec<HistoryEntry>,
    index: usize,
}

impl EditHistory {
    pub(crate) fn new(content: &str) -> Self {
        Self {
            entries: vec![HistoryEntry {
                content: content.to_string(),
                cursor: 0,
            }],
            index: 0,
        }
    }

    pub(crate) fn record(&mut self, content: String, cursor: usize) {
        self.entries.truncate(self.index + 1);
        self.entries.push(HistoryEntry { content, cursor });
        self.index = self.entries.len() - 1;
    }

    pub(crate) fn undo(&mut self) -> Option<&HistoryEntry> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index)
    }

    pub(crate) fn redo(&mut self) -> Option<&HistoryEntry> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index)
    }

    pub(crate) fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub(crate) fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub(crate) enum EditorField {
    #[default]
    FileName,
    Title,
    Author,
    References,
    Content,
}

impl EditorField {
    const ORDER: [EditorField; 5] = [
        EditorField::FileName,
        EditorField::Title,
        EditorField::Author,
        EditorField::References,
        EditorField::Content,
    ];

    fn position(self) -> usize {
        Self::ORDER
            .iter()
            .position(|field| *field == self)
            .unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    fn previous(self) -> Self {
        Self::ORDER[(self.position() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// Full-screen song editor state. Every change to the content goes through
/// the history so Ctrl-Z can walk it back, transforms included.
#[derive(Debug, Clone)]
pub(crate) struct SongEditor {
    pub(crate) original_id: Option<String>,
    pub(crate) file_name: String,
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) references: String,
    pub(crate) content: ContentBuffer,
    pub(crate) active: EditorField,
    pub(crate) error: Option<String>,
    history: EditHistory,
    next_marker: usize,
    next_chord: usize,
}

impl SongEditor {
    pub(crate) fn new_song() -> Self {
        Self {
            original_id: None,
            file_name: String::new(),
            title: String::new(),
            author: String::new(),
            references: String::new(),
            content: ContentBuffer::default(),
            active: EditorField::FileName,
            error: None,
            history: EditHistory::new(""),
            next_marker: 0,
            next_chord: 0,
        }
    }

    pub(crate) fn from_song(song: &Song) -> Self {
        Self {
            original_id: Some(song.id.clone()),
            file_name: song.id.clone(),
            title: song.title.clone(),
            author: song.author.clone().unwrap_or_default(),
            references: song.references_label(),
            content: ContentBuffer::from_text(&song.content),
            active: EditorField::Title,
            error: None,
            history: EditHistory::new(&song.content),
            next_marker: 0,
            next_chord: 0,
        }
    }

    pub(crate) fn is_new(&self) -> bool {
        self.original_id.is_none()
    }

    pub(crate) fn toggle_field(&mut self) {
        self.active = self.active.next();
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = self.active.previous();
    }

    fn single_line_field(&mut self) -> Option<&mut String> {
        match self.active {
            EditorField::FileName => Some(&mut self.file_name),
            EditorField::Title => Some(&mut self.title),
            EditorField::Author => Some(&mut self.author),
            EditorField::References => Some(&mut self.references),
            EditorField::Content => None,
        }
    }

    fn record(&mut self) {
        self.history
            .record(self.content.text(), self.content.cursor_offset());
        self.error = None;
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.single_line_field() {
            Some(value) => value.push(ch),
            None => {
                self.content.insert_char(ch);
                self.record();
            }
        }
        self.error = None;
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.single_line_field() {
            Some(value) => {
                value.pop();
            }
            None => {
                if self.content.backspace() {
                    self.record();
                }
            }
        }
    }

    pub(crate) fn delete(&mut self) {
        if self.active == EditorField::Content && self.content.delete() {
            self.record();
        }
    }

    /// Enter breaks the line in the content area and advances focus in the
    /// single-line fields.
    pub(crate) fn enter(&mut self) {
        if self.active == EditorField::Content {
            self.content.newline();
            self.record();
        } else {
            self.toggle_field();
        }
    }

    fn apply(&mut self, rewrite: impl FnOnce(&str) -> String) -> bool {
        let current = self.content.text();
        let rewritten = rewrite(&current);
        if rewritten == current {
            return false;
        }
        self.content.replace_text(&rewritten);
        self.record();
        true
    }

    pub(crate) fn transpose(&mut self, semitones: i32) -> bool {
        self.apply(|content| transpose(content, semitones))
    }

    pub(crate) fn normalize_bh(&mut self) -> bool {
        self.apply(normalize_bh)
    }

    pub(crate) fn copy_chords(&mut self, source: usize, targets: &[usize]) -> bool {
        self.apply(|content| copy_chords(content, source, targets))
    }

    fn insert_snippet(&mut self, snippet: &str) {
        self.active = EditorField::Content;
        self.content.insert_str(snippet);
        self.record();
    }

    /// Insert the next verse marker of the palette on its own line.
    pub(crate) fn insert_next_marker(&mut self) -> &'static str {
        let marker = VERSE_MARKERS[self.next_marker % VERSE_MARKERS.len()];
        self.next_marker += 1;
        self.insert_snippet(&format!("\n{marker}\n"));
        marker
    }

    pub(crate) fn insert_next_chord(&mut self) -> &'static str {
        let chord = COMMON_CHORDS[self.next_chord % COMMON_CHORDS.len()];
        self.next_chord += 1;
        self.insert_snippet(&format!("{chord} "));
        chord
    }

    pub(crate) fn undo(&mut self) -> bool {
        let Some(entry) = self.history.undo().cloned() else {
            return false;
        };
        self.restore(entry);
        true
    }

    pub(crate) fn redo(&mut self) -> bool {
        let Some(entry) = self.history.redo().cloned() else {
            return false;
        };
        self.restore(entry);
        true
    }

    fn restore(&mut self, entry: HistoryEntry) {
        self.content = ContentBuffer::from_text(&entry.content);
        self.content.set_cursor_offset(entry.cursor);
        self.active = EditorField::Content;
    }

    pub(crate) fn history_flags(&self) -> (bool, bool) {
        (self.history.can_undo(), self.history.can_redo())
    }

    pub(crate) fn verses(&self) -> Vec<Verse> {
        parse_to_verses(&self.content.text())
    }

    /// Validate the form against the ids already in the library. Returns
    /// the song to store and the id it had before editing.
    pub(crate) fn parse_inputs(&self, existing_ids: &HashSet<String>) -> Result<(Song, Option<String>)> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(anyhow!("Title is required."));
        }
        let id = self.file_name.trim();
        if !id.ends_with(".xml") {
            return Err(anyhow!("File name must end in .xml."));
        }
        if existing_ids.contains(id) && self.original_id.as_deref() != Some(id) {
            return Err(anyhow!("A song with file name {id} already exists."));
        }

        let mut references: Vec<String> = Vec::new();
        for code in self
            .references
            .split(|c: char| c == ',' || c.is_whitespace())
            .map(str::trim)
            .filter(|code| !code.is_empty())
        {
            let code = code.to_uppercase();
            if !references.contains(&code) {
                references.push(code);
            }
        }

        let author = self.author.trim();
        let song = Song {
            id: id.to_string(),
            title: title.to_string(),
            author: (!author.is_empty()).then(|| author.to_string()),
            content: self.content.text(),
            references,
        };
        Ok((song, self.original_id.clone()))
    }

    pub(crate) fn build_line(&self, field_name: &str, field: EditorField, required: bool) -> Line<'static> {
        let value = match field {
            EditorField::FileName => &self.file_name,
            EditorField::Title => &self.title,
            EditorField::Author => &self.author,
            EditorField::References => &self.references,
            EditorField::Content => return Line::from(field_name.to_string()),
        };
        let display = if value.is_empty() && required {
            "<required>".to_string()
        } else {
            value.clone()
        };
        let style = if self.active == field {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };
        Line::from(vec![
            Span::raw(format!("{field_name}: ")),
            Span::styled(display, style),
        ])
    }

    pub(crate) fn value_len(&self, field: EditorField) -> usize {
        match field {
            EditorField::FileName => self.file_name.chars().count(),
            EditorField::Title => self.title.chars().count(),
            EditorField::Author => self.author.chars().count(),
            EditorField::References => self.references.chars().count(),
            EditorField::Content => self.content.cursor().1,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum CopyColumn {
    Source,
    Targets,
}

/// Pick one source verse and any number of target verses.
#[derive(Debug, Clone)]
pub(crate) struct CopyChordsDialog {
    pub(crate) labels: Vec<String>,
    pub(crate) cursor: usize,
    pub(crate) column: CopyColumn,
    pub(crate) source: Option<usize>,
    pub(crate) targets: Vec<usize>,
}

impl CopyChordsDialog {
    pub(crate) fn new(verses: &[Verse]) -> Self {
        let labels = verses
            .iter()
            .enumerate()
            .map(|(index, verse)| match verse.first_lyric() {
                Some(preview) => format!("{}  {}", verse.label(index), preview),
                None => verse.label(index),
            })
            .collect();
        Self {
            labels,
            cursor: 0,
            column: CopyColumn::Source,
            source: None,
            targets: Vec::new(),
        }
    }

    pub(crate) fn move_cursor(&mut self, offset: isize) {
        if self.labels.is_empty() {
            return;
        }
        let last = self.labels.len() as isize - 1;
        self.cursor = (self.cursor as isize + offset).clamp(0, last) as usize;
    }

    pub(crate) fn switch_column(&mut self) {
        self.column = match self.column {
            CopyColumn::Source => CopyColumn::Targets,
            CopyColumn::Targets => CopyColumn::Source,
        };
    }

    /// Space: choose the source, or toggle a target.
    pub(crate) fn toggle(&mut self) {
        if self.labels.is_empty() {
            return;
        }
        match self.column {
            CopyColumn::Source => self.source = Some(self.cursor),
            CopyColumn::Targets => match self.targets.iter().position(|t| *t == self.cursor) {
                Some(pos) => {
                    self.targets.remove(pos);
                }
                None => self.targets.push(self.cursor),
            },
        }
    }

    pub(crate) fn selection(&self) -> Option<(usize, Vec<usize>)> {
        let source = self.source?;
        if self.targets.is_empty() {
            return None;
        }
        Some((source, self.targets.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_text(editor: &mut SongEditor, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                editor.enter();
            } else {
                editor.push_char(ch);
            }
        }
    }

    #[test]
    fn buffer_edits_across_lines() {
        let mut buffer = ContentBuffer::from_text("ab\ncd");
        buffer.move_down(1);
        buffer.move_end();
        buffer.insert_char('é');
        assert_eq!(buffer.text(), "ab\ncdé");
        buffer.move_home();
        assert!(buffer.backspace());
        assert_eq!(buffer.text(), "abcdé");
        assert_eq!(buffer.cursor(), (0, 2));
        buffer.newline();
        assert_eq!(buffer.text(), "ab\ncdé");
        buffer.move_up(1);
        buffer.move_end();
        assert!(buffer.delete());
        assert_eq!(buffer.text(), "abcdé");
    }

    #[test]
    fn cursor_offsets_map_both_ways() {
        let mut buffer = ContentBuffer::from_text("[V1]\nLá\n.C");
        buffer.set_cursor_offset(7);
        assert_eq!(buffer.cursor(), (1, 2));
        assert_eq!(buffer.cursor_offset(), 7);
        buffer.set_cursor_offset(999);
        assert_eq!(buffer.cursor(), (2, 2));
        buffer.replace_text("x");
        assert_eq!(buffer.cursor(), (0, 1));
    }

    #[test]
    fn backspace_at_start_does_nothing() {
        let mut buffer = ContentBuffer::default();
        assert!(!buffer.backspace());
        assert!(!buffer.delete());
    }

    #[test]
    fn undo_and_redo_walk_transforms() {
        let song = Song {
            id: "a.xml".to_string(),
            title: "A".to_string(),
            author: None,
            content: "[V1]\n.C G\nLa".to_string(),
            references: vec!["K1".to_string()],
        };
        let mut editor = SongEditor::from_song(&song);
        assert!(editor.transpose(2));
        assert_eq!(editor.content.text(), "[V1]\n.D A\nLa");
        assert!(editor.undo());
        assert_eq!(editor.content.text(), "[V1]\n.C G\nLa");
        assert!(!editor.undo());
        assert!(editor.redo());
        assert_eq!(editor.content.text(), "[V1]\n.D A\nLa");
        assert!(!editor.redo());

        editor.undo();
        assert_eq!(editor.history_flags(), (false, true));
        assert!(editor.transpose(1));
        assert_eq!(editor.history_flags(), (true, false));
    }

    #[test]
    fn unchanged_transform_leaves_history_alone() {
        let mut editor = SongEditor::from_song(&Song {
            id: "a.xml".to_string(),
            title: "A".to_string(),
            author: None,
            content: "La".to_string(),
            references: Vec::new(),
        });
        assert!(!editor.transpose(1));
        assert_eq!(editor.history_flags(), (false, false));
    }

    #[test]
    fn palette_insertions_cycle() {
        let mut editor = SongEditor::new_song();
        assert_eq!(editor.insert_next_marker(), "[V1]");
        assert_eq!(editor.insert_next_chord(), "C");
        assert_eq!(editor.insert_next_chord(), "G");
        assert_eq!(editor.content.text(), "\n[V1]\nC G ");
        assert!(editor.undo());
        assert_eq!(editor.content.text(), "\n[V1]\nC ");
    }

    #[test]
    fn validation_rules() {
        let existing: HashSet<String> = ["taken.xml".to_string(), "mine.xml".to_string()].into();
        let mut editor = SongEditor::new_song();
        assert_eq!(
            editor.parse_inputs(&existing).unwrap_err().to_string(),
            "Title is required."
        );

        type_text(&mut editor, "song.txt");
        editor.toggle_field();
        type_text(&mut editor, "Title");
        assert!(editor.parse_inputs(&existing).unwrap_err().to_string().contains(".xml"));

        editor.file_name = "taken.xml".to_string();
        assert!(editor
            .parse_inputs(&existing)
            .unwrap_err()
            .to_string()
            .contains("already exists"));

        editor.file_name = "new.xml".to_string();
        editor.references = "k1, sk2 K1".to_string();
        editor.author = "  ".to_string();
        let (song, previous) = editor.parse_inputs(&existing).unwrap();
        assert_eq!(song.references, vec!["K1", "SK2"]);
        assert_eq!(song.author, None);
        assert_eq!(previous, None);
    }

    #[test]
    fn editing_keeps_own_file_name() {
        let existing: HashSet<String> = ["mine.xml".to_string()].into();
        let song = Song {
            id: "mine.xml".to_string(),
            title: "Mine".to_string(),
            author: Some("Me".to_string()),
            content: String::new(),
            references: Vec::new(),
        };
        let editor = SongEditor::from_song(&song);
        let (saved, previous) = editor.parse_inputs(&existing).unwrap();
        assert_eq!(saved, song);
        assert_eq!(previous.as_deref(), Some("mine.xml"));
    }

    #[test]
    fn content_typing_goes_through_history() {
        let mut editor = SongEditor::new_song();
        editor.active = EditorField::Content;
        type_text(&mut editor, "[V1]\nLa");
        assert_eq!(editor.content.text(), "[V1]\nLa");
        editor.undo();
        assert_eq!(editor.content.text(), "[V1]\nL");
        assert_eq!(editor.content.cursor(), (1, 1));
    }

    #[test]
    fn copy_dialog_needs_source_and_targets() {
        let verses = parse_to_verses("[V1]\n.C\nLa\n[V2]\nLo");
        let mut dialog = CopyChordsDialog::new(&verses);
        assert_eq!(dialog.labels, vec!["[V1]  La", "[V2]  Lo"]);
        dialog.toggle();
        assert_eq!(dialog.selection(), None);
        dialog.switch_column();
        dialog.move_cursor(5);
        dialog.toggle();
        assert_eq!(dialog.selection(), Some((0, vec![1])));
        dialog.toggle();
        assert_eq!(dialog.selection(), None);
    }
}
