use std::mem;
use std::path::PathBuf;

use anyhow::Result;
use crossterm::event::KeyCode;
use open::that as open_path;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use rusqlite::Connection;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::db::{
    delete_song, fetch_all_songs, fetch_song_ids, load_program, load_projector_settings,
    save_program, save_projector_settings, save_song,
};
use crate::export::{
    bundle_json, editable_doc_html, order_as_text, print_html, slide_html, write_export,
    BUNDLE_FILE_NAME, DOC_FILE_NAME, PRINT_FILE_NAME, SLIDE_FILE_NAME, TEXT_FILE_NAME,
};
use crate::import::{import_bundle, import_xml_paths};
use crate::models::{
    PrintOptions, Program, ProgramEntry, ProjectorSettings, Song, TextAlign, Theme,
};

use super::editor::{CopyChordsDialog, CopyColumn, EditorField, SongEditor};
use super::forms::{
    ConfirmClear, ConfirmSongDelete, ExportKind, ExportMenu, ImportPrompt, ImportTarget,
    PrintField, PrintForm, ProjectorField, ProjectorForm,
};
use super::helpers::{centered_rect, hex_color, key_hints, song_line, surface_error};
use super::screens::{
    step_selection, LibraryPane, Pane, ProjectorColumn, ProjectorView, ThemePicker,
};

/// Height reserved at the bottom of the screen for status and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows skipped by PageUp/PageDown in lists and the content editor.
const PAGE_STEP: usize = 10;

const EDITOR_FIELDS: [(&str, EditorField, bool); 4] = [
    ("File name", EditorField::FileName, true),
    ("Title", EditorField::Title, true),
    ("Author", EditorField::Author, false),
    ("References", EditorField::References, false),
];

const PRINT_FIELDS: [(&str, PrintField); 6] = [
    ("Header title", PrintField::HeaderTitle),
    ("Date", PrintField::HeaderDate),
    ("Layout", PrintField::Layout),
    ("Font size", PrintField::FontSize),
    ("Show chords", PrintField::ShowChords),
    ("Page numbers", PrintField::PageNumbers),
];

/// Fine-grained modes layered over the library/program screen.
enum Mode {
    Normal,
    Searching(SearchState),
    PickingTheme(ThemePicker),
    EditingSong(Box<SongEditor>),
    CopyingChords {
        editor: Box<SongEditor>,
        dialog: CopyChordsDialog,
    },
    ConfirmSongDelete(ConfirmSongDelete),
    ConfirmClear(ConfirmClear),
    PrintSetup(PrintForm),
    ExportMenu(ExportMenu),
    Importing(ImportPrompt),
    Projecting(Box<ProjectorView>),
    ProjectorSetup {
        view: Box<ProjectorView>,
        form: ProjectorForm,
    },
}

/// State for an active inline library search.
struct SearchState {
    query: String,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    conn: Connection,
    config: Config,
    library: LibraryPane,
    program: Program,
    program_selected: usize,
    themes: Vec<Theme>,
    focus: Pane,
    mode: Mode,
    status: Option<StatusMessage>,
    print_options: PrintOptions,
}

impl App {
    pub fn new(
        conn: Connection,
        config: Config,
        songs: Vec<Song>,
        program: Program,
        themes: Vec<Theme>,
    ) -> Self {
        Self {
            conn,
            config,
            library: LibraryPane::new(songs),
            program,
            program_selected: 0,
            themes,
            focus: Pane::Library,
            mode: Mode::Normal,
            status: None,
            print_options: PrintOptions::default(),
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Searching(state) => self.handle_search(code, state)?,
            Mode::PickingTheme(picker) => self.handle_pick_theme(code, picker)?,
            Mode::EditingSong(editor) => self.handle_edit_song(code, editor)?,
            Mode::CopyingChords { editor, dialog } => {
                self.handle_copy_chords(code, editor, dialog)?
            }
            Mode::ConfirmSongDelete(confirm) => self.handle_confirm_song_delete(code, confirm)?,
            Mode::ConfirmClear(confirm) => self.handle_confirm_clear(code, confirm)?,
            Mode::PrintSetup(form) => self.handle_print_setup(code, form)?,
            Mode::ExportMenu(menu) => self.handle_export_menu(code, menu)?,
            Mode::Importing(prompt) => self.handle_import(code, prompt)?,
            Mode::Projecting(view) => self.handle_projecting(code, view)?,
            Mode::ProjectorSetup { view, form } => self.handle_projector_setup(code, view, form)?,
        };

        self.mode = mode;
        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
            }
            KeyCode::Tab | KeyCode::BackTab => self.focus = self.focus.toggle(),
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-(PAGE_STEP as isize)),
            KeyCode::PageDown => self.move_selection(PAGE_STEP as isize),
            KeyCode::Home => match self.focus {
                Pane::Library => self.library.select_first(),
                Pane::Program => self.program_selected = 0,
            },
            KeyCode::End => match self.focus {
                Pane::Library => self.library.select_last(),
                Pane::Program => self.program_selected = self.program.len().saturating_sub(1),
            },
            KeyCode::Enter => match self.focus {
                Pane::Library => self.add_current_song(),
                Pane::Program => return Ok(self.open_editor()),
            },
            KeyCode::Char('e') => return Ok(self.open_editor()),
            KeyCode::Char('+') => {
                self.clear_status();
                return Ok(Mode::EditingSong(Box::new(SongEditor::new_song())));
            }
            KeyCode::Char('t') => {
                if self.themes.is_empty() {
                    self.set_status("No themes available.", StatusKind::Error);
                } else {
                    return Ok(Mode::PickingTheme(ThemePicker::new(self.themes.clone())));
                }
            }
            KeyCode::Char('-') => match self.focus {
                Pane::Library => {
                    if let Some(song) = self.library.current_song().cloned() {
                        let slots = self
                            .program
                            .items()
                            .iter()
                            .filter(|item| item.entry.as_song().is_some_and(|s| s.id == song.id))
                            .count();
                        return Ok(Mode::ConfirmSongDelete(ConfirmSongDelete { song, slots }));
                    }
                    self.set_status("No song selected to delete.", StatusKind::Error);
                }
                Pane::Program => self.remove_current_slot(),
            },
            KeyCode::Char('K') => self.move_current_slot(-1),
            KeyCode::Char('J') => self.move_current_slot(1),
            KeyCode::Char('c') => {
                if self.program.is_empty() {
                    self.set_status("The program is already empty.", StatusKind::Error);
                } else {
                    return Ok(Mode::ConfirmClear(ConfirmClear {
                        items: self.program.len(),
                    }));
                }
            }
            KeyCode::Char('f') | KeyCode::Char('/') => {
                self.focus = Pane::Library;
                self.clear_status();
                let query = self.library.filter.clone().unwrap_or_default();
                return Ok(Mode::Searching(SearchState { query }));
            }
            KeyCode::Char('p') => {
                if self.program.is_empty() {
                    self.set_status("The program is empty.", StatusKind::Error);
                } else {
                    return Ok(Mode::PrintSetup(PrintForm::new(self.print_options.clone())));
                }
            }
            KeyCode::Char('x') => {
                if self.program.is_empty() {
                    self.set_status("The program is empty.", StatusKind::Error);
                } else {
                    return Ok(Mode::ExportMenu(ExportMenu::default()));
                }
            }
            KeyCode::Char('i') => return Ok(Mode::Importing(ImportPrompt::default())),
            KeyCode::Char('v') => {
                if self.program.is_empty() {
                    self.set_status("The program is empty.", StatusKind::Error);
                } else {
                    let start = match self.focus {
                        Pane::Library => 0,
                        Pane::Program => self.program_selected,
                    };
                    let settings = match load_projector_settings(&self.conn) {
                        Ok(settings) => settings,
                        Err(err) => {
                            warn!(error = %err, "using default projector settings");
                            ProjectorSettings::default()
                        }
                    };
                    self.clear_status();
                    return Ok(Mode::Projecting(Box::new(ProjectorView::new(
                        &self.program,
                        start,
                        settings,
                    ))));
                }
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.library.set_filter(None);
                return Ok(Mode::Normal);
            }
            KeyCode::Tab => return Ok(Mode::Normal),
            KeyCode::Up => self.library.move_selection(-1),
            KeyCode::Down => self.library.move_selection(1),
            KeyCode::PageUp => self.library.move_selection(-(PAGE_STEP as isize)),
            KeyCode::PageDown => self.library.move_selection(PAGE_STEP as isize),
            KeyCode::Home => self.library.select_first(),
            KeyCode::End => self.library.select_last(),
            KeyCode::Enter => self.add_current_song(),
            KeyCode::Backspace => {
                state.query.pop();
                self.library.set_filter(Some(state.query.clone()));
            }
            KeyCode::Char(ch) => {
                state.query.push(ch);
                self.library.set_filter(Some(state.query.clone()));
            }
            _ => {}
        }
        Ok(Mode::Searching(state))
    }

    fn handle_pick_theme(&mut self, code: KeyCode, mut picker: ThemePicker) -> Result<Mode> {
        match code {
            KeyCode::Esc => return Ok(Mode::Normal),
            KeyCode::Up => picker.move_selection(-1),
            KeyCode::Down => picker.move_selection(1),
            KeyCode::PageUp => picker.move_selection(-(PAGE_STEP as isize)),
            KeyCode::PageDown => picker.move_selection(PAGE_STEP as isize),
            KeyCode::Enter => {
                if let Some(theme) = picker.current().cloned() {
                    let title = theme.title.clone();
                    self.program.push_theme(theme);
                    self.program_selected = self.program.len() - 1;
                    self.set_status(format!("Added theme '{title}'."), StatusKind::Info);
                    self.persist_program();
                }
                return Ok(Mode::Normal);
            }
            _ => {}
        }
        Ok(Mode::PickingTheme(picker))
    }

    fn handle_edit_song(&mut self, code: KeyCode, mut editor: Box<SongEditor>) -> Result<Mode> {
        let in_content = editor.active == EditorField::Content;
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Tab => editor.toggle_field(),
            KeyCode::BackTab => editor.previous_field(),
            KeyCode::Enter => editor.enter(),
            KeyCode::Backspace => editor.backspace(),
            KeyCode::Delete => editor.delete(),
            KeyCode::Up if in_content => editor.content.move_up(1),
            KeyCode::Down if in_content => editor.content.move_down(1),
            KeyCode::Up => editor.previous_field(),
            KeyCode::Down => editor.toggle_field(),
            KeyCode::PageUp if in_content => editor.content.move_up(PAGE_STEP),
            KeyCode::PageDown if in_content => editor.content.move_down(PAGE_STEP),
            KeyCode::Left if in_content => editor.content.move_left(),
            KeyCode::Right if in_content => editor.content.move_right(),
            KeyCode::Home if in_content => editor.content.move_home(),
            KeyCode::End if in_content => editor.content.move_end(),
            KeyCode::F(2) => self.transpose(&mut editor, -1),
            KeyCode::F(3) => self.transpose(&mut editor, 1),
            KeyCode::F(4) => self.transpose(&mut editor, -2),
            KeyCode::F(5) => self.transpose(&mut editor, 2),
            KeyCode::F(6) => {
                if editor.normalize_bh() {
                    self.set_status("Converted B chords to H notation.", StatusKind::Info);
                } else {
                    self.set_status("No B chords to convert.", StatusKind::Info);
                }
            }
            KeyCode::F(7) => {
                let verses = editor.verses();
                if verses.len() < 2 {
                    self.set_status(
                        "Copying chords needs at least two verses.",
                        StatusKind::Error,
                    );
                } else {
                    self.clear_status();
                    let dialog = CopyChordsDialog::new(&verses);
                    return Ok(Mode::CopyingChords { editor, dialog });
                }
            }
            KeyCode::F(8) => {
                let marker = editor.insert_next_marker();
                self.set_status(format!("Inserted {marker}."), StatusKind::Info);
            }
            KeyCode::F(9) => {
                let chord = editor.insert_next_chord();
                self.set_status(format!("Inserted {chord}."), StatusKind::Info);
            }
            KeyCode::Char(ch) => {
                editor.push_char(ch);
            }
            _ => {}
        }
        Ok(Mode::EditingSong(editor))
    }

    fn transpose(&mut self, editor: &mut SongEditor, semitones: i32) {
        if editor.transpose(semitones) {
            self.set_status(
                format!("Transposed by {semitones:+} semitone(s)."),
                StatusKind::Info,
            );
        } else {
            self.set_status("No chords to transpose.", StatusKind::Info);
        }
    }

    fn handle_copy_chords(
        &mut self,
        code: KeyCode,
        mut editor: Box<SongEditor>,
        mut dialog: CopyChordsDialog,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Copy cancelled.", StatusKind::Info);
                return Ok(Mode::EditingSong(editor));
            }
            KeyCode::Up => dialog.move_cursor(-1),
            KeyCode::Down => dialog.move_cursor(1),
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Left | KeyCode::Right => {
                dialog.switch_column()
            }
            KeyCode::Char(' ') => dialog.toggle(),
            KeyCode::Enter => match dialog.selection() {
                Some((source, targets)) => {
                    if editor.copy_chords(source, &targets) {
                        self.set_status(
                            format!("Chords copied to {} verse(s).", targets.len()),
                            StatusKind::Info,
                        );
                    } else {
                        self.set_status("No lines changed.", StatusKind::Info);
                    }
                    return Ok(Mode::EditingSong(editor));
                }
                None => self.set_status(
                    "Pick a source verse and at least one target.",
                    StatusKind::Error,
                ),
            },
            _ => {}
        }
        Ok(Mode::CopyingChords { editor, dialog })
    }

    fn handle_confirm_song_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmSongDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                let song = confirm.song;
                if let Err(err) = delete_song(&self.conn, &song.id) {
                    self.set_status(surface_error(&err), StatusKind::Error);
                } else {
                    let removed = self.program.remove_song(&song.id);
                    self.clamp_program_selection();
                    self.reload_library(None)?;
                    info!(song_id = %song.id, removed, "deleted song");
                    let mut message = format!("Deleted '{}'.", song.title);
                    if removed > 0 {
                        message.push_str(&format!(" Removed {removed} program slot(s)."));
                    }
                    self.set_status(message, StatusKind::Info);
                }
                Ok(Mode::Normal)
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.set_status("Delete cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::ConfirmSongDelete(confirm)),
        }
    }

    fn handle_confirm_clear(&mut self, code: KeyCode, confirm: ConfirmClear) -> Result<Mode> {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.program.clear();
                self.program_selected = 0;
                self.set_status("Program cleared.", StatusKind::Info);
                self.persist_program();
                Ok(Mode::Normal)
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.clear_status();
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::ConfirmClear(confirm)),
        }
    }

    fn handle_print_setup(&mut self, code: KeyCode, mut form: PrintForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.clear_status();
                return Ok(Mode::Normal);
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Left | KeyCode::Right => form.cycle(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match form.parse_inputs() {
                Ok(options) => {
                    self.print_options = options;
                    if let Err(err) = self.open_print_view() {
                        let message = surface_error(&err);
                        form.error = Some(message.clone());
                        self.set_status(message, StatusKind::Error);
                    } else {
                        return Ok(Mode::Normal);
                    }
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                form.push_char(ch);
            }
            _ => {}
        }
        Ok(Mode::PrintSetup(form))
    }

    fn handle_export_menu(&mut self, code: KeyCode, mut menu: ExportMenu) -> Result<Mode> {
        match code {
            KeyCode::Esc => return Ok(Mode::Normal),
            KeyCode::Up => menu.move_selection(-1),
            KeyCode::Down => menu.move_selection(1),
            KeyCode::Enter => {
                match self.export(menu.current()) {
                    Ok(path) => {
                        self.set_status(format!("Exported to {}", path.display()), StatusKind::Info)
                    }
                    Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
                }
                return Ok(Mode::Normal);
            }
            _ => {}
        }
        Ok(Mode::ExportMenu(menu))
    }

    fn handle_import(&mut self, code: KeyCode, mut prompt: ImportPrompt) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.clear_status();
                return Ok(Mode::Normal);
            }
            KeyCode::Backspace => prompt.backspace(),
            KeyCode::Char(ch) => {
                prompt.push_char(ch);
            }
            KeyCode::Enter => {
                let result = prompt.parse_inputs().and_then(|target| self.run_import(target));
                match result {
                    Ok(()) => return Ok(Mode::Normal),
                    Err(err) => {
                        let message = surface_error(&err);
                        prompt.error = Some(message.clone());
                        self.set_status(message, StatusKind::Error);
                    }
                }
            }
            _ => {}
        }
        Ok(Mode::Importing(prompt))
    }

    fn handle_projecting(&mut self, code: KeyCode, mut view: Box<ProjectorView>) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.clear_status();
                return Ok(Mode::Normal);
            }
            KeyCode::Tab | KeyCode::BackTab => view.toggle_column(),
            KeyCode::Up => view.move_selection(&self.program, -1),
            KeyCode::Down => view.move_selection(&self.program, 1),
            KeyCode::Enter => match view.column {
                ProjectorColumn::Order => view.toggle_column(),
                ProjectorColumn::Slides => view.project_current(),
            },
            KeyCode::Right | KeyCode::Char(' ') => view.step_and_project(1),
            KeyCode::Left => view.step_and_project(-1),
            KeyCode::Char('b') => view.blank(),
            KeyCode::Char('s') => {
                let form = ProjectorForm::new(view.settings.clone());
                return Ok(Mode::ProjectorSetup { view, form });
            }
            KeyCode::Char('o') => {
                if let Err(err) = self.open_slide_page(&view) {
                    self.set_status(surface_error(&err), StatusKind::Error);
                }
            }
            _ => {}
        }
        Ok(Mode::Projecting(view))
    }

    fn handle_projector_setup(
        &mut self,
        code: KeyCode,
        mut view: Box<ProjectorView>,
        mut form: ProjectorForm,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.clear_status();
                return Ok(Mode::Projecting(view));
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Left => form.adjust(false),
            KeyCode::Right => form.adjust(true),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match form.parse_inputs() {
                Ok(settings) => {
                    self.store_projector_settings(&settings);
                    view.settings = settings;
                    return Ok(Mode::Projecting(view));
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                form.push_char(ch);
            }
            _ => {}
        }
        Ok(Mode::ProjectorSetup { view, form })
    }

    pub(crate) fn handle_ctrl_z(&mut self) {
        let undone = match &mut self.mode {
            Mode::EditingSong(editor) => editor.undo(),
            _ => return,
        };
        if !undone {
            self.set_status("Nothing to undo.", StatusKind::Info);
        }
    }

    pub(crate) fn handle_ctrl_y(&mut self) {
        let redone = match &mut self.mode {
            Mode::EditingSong(editor) => editor.redo(),
            _ => return,
        };
        if !redone {
            self.set_status("Nothing to redo.", StatusKind::Info);
        }
    }

    pub(crate) fn handle_ctrl_s(&mut self) -> Result<()> {
        if !matches!(self.mode, Mode::EditingSong(_)) {
            return Ok(());
        }
        if let Mode::EditingSong(editor) = mem::replace(&mut self.mode, Mode::Normal) {
            self.mode = self.save_editor(editor)?;
        }
        Ok(())
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.mode {
            Mode::EditingSong(editor) => self.draw_editor(frame, content_area, editor, true),
            Mode::CopyingChords { editor, .. } => {
                self.draw_editor(frame, content_area, editor, false)
            }
            Mode::Projecting(view) => {
                self.draw_projector(frame, content_area, view, &view.settings)
            }
            Mode::ProjectorSetup { view, form } => {
                self.draw_projector(frame, content_area, view, &form.settings)
            }
            _ => self.draw_main(frame, content_area),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::Searching(state) => self.draw_search_bar(frame, area, state),
            Mode::PickingTheme(picker) => self.draw_theme_picker(frame, area, picker),
            Mode::CopyingChords { dialog, .. } => self.draw_copy_chords(frame, area, dialog),
            Mode::ConfirmSongDelete(confirm) => self.draw_confirm_song_delete(frame, area, confirm),
            Mode::ConfirmClear(confirm) => self.draw_confirm_clear(frame, area, confirm),
            Mode::PrintSetup(form) => self.draw_print_form(frame, area, form),
            Mode::ExportMenu(menu) => self.draw_export_menu(frame, area, menu),
            Mode::Importing(prompt) => self.draw_import_prompt(frame, area, prompt),
            Mode::ProjectorSetup { form, .. } => self.draw_projector_form(frame, area, form),
            Mode::Normal | Mode::EditingSong(_) | Mode::Projecting(_) => {}
        }
    }

    fn draw_main(&self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);
        self.draw_library(frame, columns[0]);
        self.draw_program(frame, columns[1]);
    }

    fn pane_block(&self, title: String, pane: Pane) -> Block<'static> {
        let border_style = if self.focus == pane {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(border_style)
    }

    fn highlight_style(&self, pane: Pane) -> Style {
        if self.focus == pane {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::REVERSED)
        }
    }

    fn draw_library(&self, frame: &mut Frame, area: Rect) {
        let library = &self.library;
        let title = match library.filter.as_deref().map(str::trim) {
            Some(query) if !query.is_empty() => format!(
                "Library ({}/{}) search: {query}",
                library.filtered.len(),
                library.songs.len()
            ),
            _ => format!("Library ({})", library.songs.len()),
        };
        let block = self.pane_block(title, Pane::Library);

        let empty_message = if library.songs.is_empty() {
            Some("No songs yet. Press '+' to write one or 'i' to import.")
        } else if library.filtered.is_empty() {
            Some("No songs match the current search.")
        } else {
            None
        };
        if let Some(message) = empty_message {
            let paragraph = Paragraph::new(message)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(block);
            frame.render_widget(paragraph, area);
            return;
        }

        let items: Vec<ListItem> = library
            .visible()
            .map(|song| {
                let mut spans = vec![Span::raw(song.display_title())];
                if !song.references.is_empty() {
                    spans.push(Span::styled(
                        format!("  {}", song.references_label()),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(self.highlight_style(Pane::Library))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(library.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_program(&self, frame: &mut Frame, area: Rect) {
        let block = self.pane_block(format!("Program ({})", self.program.len()), Pane::Program);

        if self.program.is_empty() {
            let paragraph = Paragraph::new(
                "The program is empty. Add songs with Enter in the library or themes with 't'.",
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block);
            frame.render_widget(paragraph, area);
            return;
        }

        let items: Vec<ListItem> = self
            .program
            .items()
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let number = index + 1;
                let line = match &item.entry {
                    ProgramEntry::Theme(theme) => Line::from(Span::styled(
                        format!("{number}. {}", theme.title),
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    )),
                    ProgramEntry::Song(song) => {
                        let mut spans = vec![Span::raw(format!("{number}. {}", song.title))];
                        if !song.references.is_empty() {
                            spans.push(Span::styled(
                                format!("  ({})", song.references_label()),
                                Style::default().fg(Color::DarkGray),
                            ));
                        }
                        Line::from(spans)
                    }
                };
                ListItem::new(line)
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(self.highlight_style(Pane::Program))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(self.program_selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_editor(&self, frame: &mut Frame, area: Rect, editor: &SongEditor, show_cursor: bool) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(3)])
            .split(area);

        let title = match &editor.original_id {
            Some(id) => format!("Edit Song: {id}"),
            None => "New Song".to_string(),
        };
        let fields_block = Block::default().title(title).borders(Borders::ALL);
        let fields_inner = fields_block.inner(chunks[0]);
        let lines: Vec<Line> = EDITOR_FIELDS
            .iter()
            .map(|(name, field, required)| editor.build_line(name, *field, *required))
            .collect();
        frame.render_widget(Paragraph::new(lines).block(fields_block), chunks[0]);

        let (can_undo, can_redo) = editor.history_flags();
        let mut content_title = vec![Span::raw("Lyrics")];
        if can_undo {
            content_title.push(Span::styled("  [undo]", Style::default().fg(Color::DarkGray)));
        }
        if can_redo {
            content_title.push(Span::styled("  [redo]", Style::default().fg(Color::DarkGray)));
        }
        let border_style = if editor.active == EditorField::Content {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let mut content_block = Block::default()
            .title(Line::from(content_title))
            .borders(Borders::ALL)
            .border_style(border_style);
        if let Some(error) = &editor.error {
            content_block = content_block.title_bottom(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }
        let content_inner = content_block.inner(chunks[1]);

        let (row, col) = editor.content.cursor();
        let visible = content_inner.height as usize;
        let scroll = if visible == 0 {
            0
        } else {
            row.saturating_sub(visible - 1)
        };
        let lines: Vec<Line> = editor
            .content
            .lines()
            .iter()
            .map(|line| song_line(line))
            .collect();
        let paragraph = Paragraph::new(lines)
            .block(content_block)
            .scroll((scroll as u16, 0));
        frame.render_widget(paragraph, chunks[1]);

        if !show_cursor {
            return;
        }
        let (cursor_x, cursor_y) = match EDITOR_FIELDS
            .iter()
            .position(|(_, field, _)| *field == editor.active)
        {
            Some(row_index) => {
                let (name, field, _) = EDITOR_FIELDS[row_index];
                let prefix = name.chars().count() as u16 + 2;
                (
                    fields_inner.x + prefix + editor.value_len(field) as u16,
                    fields_inner.y + row_index as u16,
                )
            }
            None => {
                let max_x = content_inner.right().saturating_sub(1);
                (
                    (content_inner.x + col as u16).min(max_x),
                    content_inner.y + (row - scroll) as u16,
                )
            }
        };
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Search: ".len() as u16 + state.query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn footer_instructions(&self) -> Line<'static> {
        match &self.mode {
            Mode::Normal => match self.focus {
                Pane::Library => key_hints(&[
                    ("Enter", "Add"),
                    ("t", "Theme"),
                    ("+", "New"),
                    ("e", "Edit"),
                    ("-", "Delete"),
                    ("f", "Search"),
                    ("p", "Print"),
                    ("x", "Export"),
                    ("i", "Import"),
                    ("v", "Project"),
                    ("Tab", "Program"),
                    ("q", "Quit"),
                ]),
                Pane::Program => key_hints(&[
                    ("K/J", "Move"),
                    ("-", "Remove"),
                    ("c", "Clear"),
                    ("Enter", "Edit song"),
                    ("t", "Theme"),
                    ("p", "Print"),
                    ("x", "Export"),
                    ("v", "Project"),
                    ("Tab", "Library"),
                    ("q", "Quit"),
                ]),
            },
            Mode::Searching(_) => key_hints(&[
                ("Up/Down", "Navigate"),
                ("Enter", "Add to program"),
                ("Tab", "Keep filter"),
                ("Esc", "Clear search"),
            ]),
            Mode::PickingTheme(_) => key_hints(&[
                ("Up/Down", "Navigate"),
                ("Enter", "Add"),
                ("Esc", "Cancel"),
            ]),
            Mode::EditingSong(_) => key_hints(&[
                ("Ctrl-S", "Save"),
                ("Ctrl-Z/Y", "Undo/Redo"),
                ("F2/F3", "-1/+1"),
                ("F4/F5", "-2/+2"),
                ("F6", "B to H"),
                ("F7", "Copy chords"),
                ("F8", "Marker"),
                ("F9", "Chord"),
                ("Esc", "Cancel"),
            ]),
            Mode::CopyingChords { .. } => key_hints(&[
                ("Up/Down", "Navigate"),
                ("Tab", "Column"),
                ("Space", "Select"),
                ("Enter", "Copy"),
                ("Esc", "Back"),
            ]),
            Mode::ConfirmSongDelete(_) | Mode::ConfirmClear(_) => {
                key_hints(&[("Y", "Confirm"), ("N/Esc", "Cancel")])
            }
            Mode::PrintSetup(_) => key_hints(&[
                ("Tab", "Next field"),
                ("Space", "Change"),
                ("Enter", "Open print view"),
                ("Esc", "Cancel"),
            ]),
            Mode::ExportMenu(_) => key_hints(&[
                ("Up/Down", "Navigate"),
                ("Enter", "Export"),
                ("Esc", "Cancel"),
            ]),
            Mode::Importing(_) => key_hints(&[("Enter", "Import"), ("Esc", "Cancel")]),
            Mode::Projecting(_) => key_hints(&[
                ("Up/Down", "Navigate"),
                ("Tab", "Column"),
                ("Enter", "Project"),
                ("Left/Right", "Previous/Next slide"),
                ("b", "Black"),
                ("s", "Settings"),
                ("o", "Open in browser"),
                ("Esc", "Back"),
            ]),
            Mode::ProjectorSetup { .. } => key_hints(&[
                ("Tab", "Next field"),
                ("Left/Right", "Change"),
                ("Enter", "Save"),
                ("Esc", "Cancel"),
            ]),
        }
    }

    fn draw_theme_picker(&self, frame: &mut Frame, area: Rect, picker: &ThemePicker) {
        let popup_area = centered_rect(40, 60, area);
        frame.render_widget(Clear, popup_area);

        let items: Vec<ListItem> = picker
            .themes
            .iter()
            .map(|theme| ListItem::new(theme.title.clone()))
            .collect();
        let list = List::new(items)
            .block(Block::default().title("Add Theme").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(picker.selected));
        frame.render_stateful_widget(list, popup_area, &mut state);
    }

    fn draw_copy_chords(&self, frame: &mut Frame, area: Rect, dialog: &CopyChordsDialog) {
        let popup_area = centered_rect(80, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Copy Chords").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(inner);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[0]);

        let source_items: Vec<ListItem> = dialog
            .labels
            .iter()
            .enumerate()
            .map(|(index, label)| {
                let mark = if dialog.source == Some(index) { "(o)" } else { "( )" };
                ListItem::new(format!("{mark} {label}"))
            })
            .collect();
        let target_items: Vec<ListItem> = dialog
            .labels
            .iter()
            .enumerate()
            .map(|(index, label)| {
                let mark = if dialog.targets.contains(&index) { "[x]" } else { "[ ]" };
                ListItem::new(format!("{mark} {label}"))
            })
            .collect();

        for (column, items, area, title) in [
            (CopyColumn::Source, source_items, columns[0], "Source verse"),
            (CopyColumn::Targets, target_items, columns[1], "Target verses"),
        ] {
            let active = dialog.column == column;
            let border_style = if active {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            };
            let list = List::new(items)
                .block(
                    Block::default()
                        .title(title)
                        .borders(Borders::ALL)
                        .border_style(border_style),
                )
                .highlight_style(Style::default().fg(Color::Yellow))
                .highlight_symbol("> ");
            let mut state = ListState::default();
            if active {
                state.select(Some(dialog.cursor));
            }
            frame.render_stateful_widget(list, area, &mut state);
        }

        let hint = Paragraph::new(Span::styled(
            "Chord lines of the source are laid over the matching lines of each target.",
            Style::default().fg(Color::Gray),
        ));
        frame.render_widget(hint, rows[1]);
    }

    fn draw_confirm_song_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmSongDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Delete Song").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let usage = if confirm.slots > 0 {
            format!(
                "It fills {} program slot(s), which will be removed too.",
                confirm.slots
            )
        } else {
            "It is not used in the current program.".to_string()
        };
        let lines = vec![
            Line::from(format!(
                "Delete '{}' permanently?",
                confirm.song.display_title()
            )),
            Line::from(usage),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_confirm_clear(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmClear) {
        let popup_area = centered_rect(50, 25, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Clear Program").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!(
                "Remove all {} item(s) from the program?",
                confirm.items
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
    }

    fn draw_print_form(&self, frame: &mut Frame, area: Rect, form: &PrintForm) {
        let popup_area = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Print").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = PRINT_FIELDS
            .iter()
            .map(|(name, field)| form.build_line(name, *field))
            .collect();
        lines.push(Line::from(""));
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Left/Right or Space change a choice. The page opens in your browser.",
                Style::default().fg(Color::Gray),
            )));
        }
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        if let Some(len) = form.cursor_len() {
            let row = form.active.row();
            let prefix = PRINT_FIELDS[row].0.chars().count() as u16 + 2;
            frame.set_cursor_position((inner.x + prefix + len as u16, inner.y + row as u16));
        }
    }

    fn draw_export_menu(&self, frame: &mut Frame, area: Rect, menu: &ExportMenu) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Export").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(2)])
            .split(inner);

        let items: Vec<ListItem> = ExportKind::ALL
            .iter()
            .map(|kind| ListItem::new(kind.label()))
            .collect();
        let list = List::new(items)
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(menu.selected));
        frame.render_stateful_widget(list, rows[0], &mut state);

        let target = Paragraph::new(Span::styled(
            format!("Files go to {}", self.config.export_dir().display()),
            Style::default().fg(Color::Gray),
        ))
        .wrap(Wrap { trim: true });
        frame.render_widget(target, rows[1]);
    }

    fn draw_import_prompt(&self, frame: &mut Frame, area: Rect, prompt: &ImportPrompt) {
        let popup_area = centered_rect(70, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Import").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            Line::from(format!("Path: {}", prompt.path)),
            Line::from(""),
        ];
        if let Some(error) = &prompt.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "A .json file restores an exported bundle. An .xml file or a folder imports songs.",
                Style::default().fg(Color::Gray),
            )));
        }
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        let cursor_x = inner.x + "Path: ".len() as u16 + prompt.path.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_projector(
        &self,
        frame: &mut Frame,
        area: Rect,
        view: &ProjectorView,
        settings: &ProjectorSettings,
    ) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(25),
                Constraint::Percentage(30),
                Constraint::Percentage(45),
            ])
            .split(area);

        let column_block = |title: &str, column: ProjectorColumn| {
            let border_style = if view.column == column {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            };
            Block::default()
                .borders(Borders::ALL)
                .title(title.to_string())
                .border_style(border_style)
        };
        let highlight = Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD);

        let order: Vec<ListItem> = self
            .program
            .items()
            .iter()
            .enumerate()
            .map(|(index, item)| ListItem::new(format!("{}. {}", index + 1, item.entry.title())))
            .collect();
        let list = List::new(order)
            .block(column_block("Order", ProjectorColumn::Order))
            .highlight_style(highlight)
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(view.item));
        frame.render_stateful_widget(list, columns[0], &mut state);

        let cues: Vec<ListItem> = view
            .cues
            .iter()
            .map(|cue| {
                let live = if view.is_live(cue) { "* " } else { "  " };
                let mut lines = vec![Line::from(vec![
                    Span::styled(live, Style::default().fg(Color::Red)),
                    Span::styled(
                        cue.label.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                ])];
                if let Some(preview) = &cue.preview {
                    lines.push(Line::from(Span::styled(
                        format!("  {preview}"),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
                ListItem::new(lines)
            })
            .collect();
        let list = List::new(cues)
            .block(column_block("Slides", ProjectorColumn::Slides))
            .highlight_style(highlight)
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(view.cue));
        frame.render_stateful_widget(list, columns[1], &mut state);

        let background = hex_color(&settings.background_color, Color::Black);
        let mut text_style = Style::default()
            .fg(hex_color(&settings.text_color, Color::White))
            .bg(background);
        if settings.is_bold {
            text_style = text_style.add_modifier(Modifier::BOLD);
        }
        let alignment = match settings.text_align {
            TextAlign::Left => Alignment::Left,
            TextAlign::Center => Alignment::Center,
            TextAlign::Right => Alignment::Right,
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Live")
            .style(Style::default().bg(background));
        let inner = block.inner(columns[2]);
        frame.render_widget(block, columns[2]);

        let slide = view.live.lines(settings.show_chords);
        let padding = (inner.height as usize).saturating_sub(slide.len()) / 2;
        let mut lines: Vec<Line> = vec![Line::from(""); padding];
        lines.extend(slide.into_iter().map(Line::from));
        let paragraph = Paragraph::new(lines)
            .style(text_style)
            .alignment(alignment)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, inner);
    }

    fn draw_projector_form(&self, frame: &mut Frame, area: Rect, form: &ProjectorForm) {
        let popup_area = centered_rect(50, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Projector Settings")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = ProjectorField::ORDER
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "The live screen previews the changes. Font and size apply to the browser page.",
                Style::default().fg(Color::Gray),
            )));
        }
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        if let Some(len) = form.cursor_len() {
            let row = form.active.row();
            let prefix = form.active.label().chars().count() as u16 + 2;
            frame.set_cursor_position((inner.x + prefix + len as u16, inner.y + row as u16));
        }
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn move_selection(&mut self, offset: isize) {
        match self.focus {
            Pane::Library => self.library.move_selection(offset),
            Pane::Program => {
                self.program_selected =
                    step_selection(self.program_selected, self.program.len(), offset)
            }
        }
    }

    fn clamp_program_selection(&mut self) {
        self.program_selected = step_selection(self.program_selected, self.program.len(), 0);
    }

    /// Store the program after a change. A failure is reported in the footer
    /// and replaces whatever status the change itself set.
    fn persist_program(&mut self) {
        if let Err(err) = save_program(&self.conn, &self.program) {
            error!(error = %err, "failed to save program");
            self.set_status(
                format!("Could not save the program: {}", surface_error(&err)),
                StatusKind::Error,
            );
        }
    }

    fn reload_library(&mut self, focus_id: Option<&str>) -> Result<()> {
        let songs = fetch_all_songs(&self.conn)?;
        self.library.set_songs(songs, focus_id);
        Ok(())
    }

    fn add_current_song(&mut self) {
        let Some(song) = self.library.current_song().cloned() else {
            self.set_status("No song selected.", StatusKind::Error);
            return;
        };
        self.set_status(format!("Added '{}' to the program.", song.title), StatusKind::Info);
        self.program.push_song(song);
        self.program_selected = self.program.len() - 1;
        self.persist_program();
    }

    fn remove_current_slot(&mut self) {
        let Some(item) = self.program.get(self.program_selected) else {
            self.set_status("No program item selected.", StatusKind::Error);
            return;
        };
        let instance_id = item.instance_id.clone();
        let title = item.entry.title().to_string();
        if self.program.remove(&instance_id) {
            self.clamp_program_selection();
            self.set_status(format!("Removed '{title}' from the program."), StatusKind::Info);
            self.persist_program();
        }
    }

    fn move_current_slot(&mut self, offset: isize) {
        if self.focus != Pane::Program {
            return;
        }
        let from = self.program_selected;
        let to = step_selection(from, self.program.len(), offset);
        if self.program.move_item(from, to) {
            self.program_selected = to;
            self.clear_status();
            self.persist_program();
        }
    }

    /// Open the editor on the focused song. Program slots resolve to the
    /// library copy so the editor always starts from stored data.
    fn open_editor(&mut self) -> Mode {
        let song = match self.focus {
            Pane::Library => self.library.current_song().cloned(),
            Pane::Program => match self.program.get(self.program_selected).map(|item| &item.entry) {
                Some(ProgramEntry::Song(song)) => {
                    Some(self.library.find(&song.id).unwrap_or(song).clone())
                }
                Some(ProgramEntry::Theme(_)) => {
                    self.set_status("Themes cannot be edited.", StatusKind::Error);
                    return Mode::Normal;
                }
                None => None,
            },
        };
        match song {
            Some(song) => {
                self.clear_status();
                Mode::EditingSong(Box::new(SongEditor::from_song(&song)))
            }
            None => {
                self.set_status("No song selected to edit.", StatusKind::Error);
                Mode::Normal
            }
        }
    }

    fn save_editor(&mut self, mut editor: Box<SongEditor>) -> Result<Mode> {
        let existing = fetch_song_ids(&self.conn)?;
        let (song, previous_id) = match editor.parse_inputs(&existing) {
            Ok(parsed) => parsed,
            Err(err) => {
                let message = surface_error(&err);
                editor.error = Some(message.clone());
                self.set_status(message, StatusKind::Error);
                return Ok(Mode::EditingSong(editor));
            }
        };

        if let Err(err) = save_song(&self.conn, &song, previous_id.as_deref()) {
            let message = surface_error(&err);
            editor.error = Some(message.clone());
            self.set_status(message, StatusKind::Error);
            return Ok(Mode::EditingSong(editor));
        }

        let renamed = previous_id
            .as_deref()
            .is_some_and(|previous| previous != song.id);
        info!(song_id = %song.id, new = editor.is_new(), renamed, "saved song");

        self.set_status(format!("Saved '{}'.", song.title), StatusKind::Info);
        if renamed {
            self.program = load_program(&self.conn)?;
            self.clamp_program_selection();
        } else {
            self.program.refresh_song(&song);
        }
        self.persist_program();
        self.reload_library(Some(&song.id))?;
        Ok(Mode::Normal)
    }

    fn open_print_view(&mut self) -> Result<()> {
        let html = print_html(&self.program, &self.print_options);
        let path = write_export(&self.config.export_dir(), PRINT_FILE_NAME, &html)?;
        match open_path(&path) {
            Ok(()) => self.set_status(
                format!("Print view opened: {}", path.display()),
                StatusKind::Info,
            ),
            Err(err) => {
                warn!(error = %err, path = %path.display(), "could not open print view");
                self.set_status(
                    format!(
                        "Print view written to {}, but it could not be opened: {err}",
                        path.display()
                    ),
                    StatusKind::Error,
                );
            }
        }
        Ok(())
    }

    fn open_slide_page(&mut self, view: &ProjectorView) -> Result<()> {
        let html = slide_html(&view.live, &view.settings);
        let path = write_export(&self.config.export_dir(), SLIDE_FILE_NAME, &html)?;
        match open_path(&path) {
            Ok(()) => self.set_status(
                format!("Slide opened: {}", path.display()),
                StatusKind::Info,
            ),
            Err(err) => {
                warn!(error = %err, path = %path.display(), "could not open slide page");
                self.set_status(
                    format!(
                        "Slide written to {}, but it could not be opened: {err}",
                        path.display()
                    ),
                    StatusKind::Error,
                );
            }
        }
        Ok(())
    }

    fn store_projector_settings(&mut self, settings: &ProjectorSettings) {
        match save_projector_settings(&self.conn, settings) {
            Ok(()) => self.set_status("Projector settings saved.", StatusKind::Info),
            Err(err) => {
                error!(error = %err, "failed to save projector settings");
                self.set_status(
                    format!("Could not save projector settings: {}", surface_error(&err)),
                    StatusKind::Error,
                );
            }
        }
    }

    fn export(&self, kind: ExportKind) -> Result<PathBuf> {
        let (file_name, content) = match kind {
            ExportKind::Text => (TEXT_FILE_NAME, order_as_text(&self.program)),
            ExportKind::Bundle => (
                BUNDLE_FILE_NAME,
                bundle_json(&self.program, &self.library.songs)?,
            ),
            ExportKind::Document => (
                DOC_FILE_NAME,
                editable_doc_html(&self.program, &self.print_options),
            ),
        };
        write_export(&self.config.export_dir(), file_name, &content)
    }

    fn run_import(&mut self, target: ImportTarget) -> Result<()> {
        match target {
            ImportTarget::Bundle(path) => {
                let result = import_bundle(&self.conn, &path)?;
                if result.order_items.is_some() {
                    self.program = load_program(&self.conn)?;
                    self.program_selected = 0;
                }
                self.reload_library(None)?;
                self.set_status(result.message(), StatusKind::Info);
            }
            ImportTarget::Xml(paths) => {
                let summary = import_xml_paths(&self.conn, &paths)?;
                self.reload_library(None)?;
                let kind = if summary.is_error() {
                    StatusKind::Error
                } else {
                    StatusKind::Info
                };
                self.set_status(summary.message(), kind);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_themes;
    use crate::db::{ensure_schema, load_or_seed_songs};
    use crate::projector::Slide;
    use std::fs;
    use tempfile::TempDir;

    fn app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let config = Config::with_data_dir(dir.path().to_path_buf());
        config.ensure_dirs().unwrap();
        let conn = ensure_schema(&config.db_path()).unwrap();
        let songs = load_or_seed_songs(&conn).unwrap();
        let program = load_program(&conn).unwrap();
        (dir, App::new(conn, config, songs, program, default_themes()))
    }

    fn press(app: &mut App, keys: &[KeyCode]) {
        for key in keys {
            app.handle_key(*key).unwrap();
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    fn status(app: &App) -> &str {
        app.status.as_ref().map_or("", |status| status.text.as_str())
    }

    #[test]
    fn program_changes_are_persisted() {
        let (_dir, mut app) = app();
        let first = app.library.current_song().unwrap().id.clone();
        press(
            &mut app,
            &[KeyCode::Enter, KeyCode::Char('t'), KeyCode::Down, KeyCode::Enter],
        );
        assert_eq!(app.program.len(), 2);
        assert_eq!(app.program.items()[1].entry.title(), "Kyrie");

        press(&mut app, &[KeyCode::Tab, KeyCode::Char('K')]);
        assert_eq!(app.program_selected, 0);

        let stored = load_program(&app.conn).unwrap();
        assert_eq!(stored, app.program);
        assert_eq!(stored.items()[1].entry.id(), first);
    }

    #[test]
    fn quit_keys_exit_only_from_normal_mode() {
        let (_dir, mut app) = app();
        assert!(!app.handle_key(KeyCode::Char('+')).unwrap());
        assert!(!app.handle_key(KeyCode::Char('q')).unwrap());
        assert!(!app.handle_key(KeyCode::Esc).unwrap());
        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
    }

    #[test]
    fn new_song_is_saved_from_the_editor() {
        let (_dir, mut app) = app();
        press(&mut app, &[KeyCode::Char('+')]);
        type_text(&mut app, "uj_enek.xml");
        press(&mut app, &[KeyCode::Tab]);
        type_text(&mut app, "Új ének");
        press(&mut app, &[KeyCode::Tab, KeyCode::Tab, KeyCode::Tab]);
        type_text(&mut app, "[V1]");
        press(&mut app, &[KeyCode::Enter]);
        type_text(&mut app, ".C");
        press(&mut app, &[KeyCode::F(3)]);
        app.handle_ctrl_s().unwrap();

        assert!(matches!(app.mode, Mode::Normal));
        let song = app.library.current_song().unwrap();
        assert_eq!(song.id, "uj_enek.xml");
        assert_eq!(song.content, "[V1]\n.C#");
        assert!(fetch_song_ids(&app.conn).unwrap().contains("uj_enek.xml"));
    }

    #[test]
    fn invalid_editor_input_keeps_the_editor_open() {
        let (_dir, mut app) = app();
        press(&mut app, &[KeyCode::Char('+')]);
        type_text(&mut app, "nincs_cim.xml");
        app.handle_ctrl_s().unwrap();
        match &app.mode {
            Mode::EditingSong(editor) => {
                assert_eq!(editor.error.as_deref(), Some("Title is required."))
            }
            _ => panic!("editor should stay open"),
        }
        app.handle_ctrl_z();
        assert_eq!(status(&app), "Nothing to undo.");
    }

    #[test]
    fn renaming_a_song_keeps_its_program_slots() {
        let (_dir, mut app) = app();
        let original = app.library.current_song().unwrap().clone();
        press(&mut app, &[KeyCode::Enter, KeyCode::Char('e')]);
        if let Mode::EditingSong(editor) = &mut app.mode {
            editor.file_name = "atnevezett.xml".to_string();
        }
        app.handle_ctrl_s().unwrap();

        let slot = app.program.items()[0].entry.as_song().unwrap();
        assert_eq!(slot.id, "atnevezett.xml");
        assert_eq!(slot.title, original.title);
        assert!(app.library.find(&original.id).is_none());
        assert_eq!(load_program(&app.conn).unwrap(), app.program);
    }

    #[test]
    fn deleting_a_song_clears_its_slots() {
        let (_dir, mut app) = app();
        let id = app.library.current_song().unwrap().id.clone();
        press(&mut app, &[KeyCode::Enter, KeyCode::Enter, KeyCode::Char('-')]);
        match &app.mode {
            Mode::ConfirmSongDelete(confirm) => assert_eq!(confirm.slots, 2),
            _ => panic!("expected delete confirmation"),
        }
        press(&mut app, &[KeyCode::Char('y')]);

        assert!(app.program.is_empty());
        assert!(app.library.find(&id).is_none());
        assert!(load_program(&app.conn).unwrap().is_empty());
        assert!(status(&app).contains("Removed 2 program slot(s)."));
    }

    #[test]
    fn search_filters_and_adds() {
        let (_dir, mut app) = app();
        press(&mut app, &[KeyCode::Char('f')]);
        type_text(&mut app, "zzz-no-match");
        assert!(app.library.current_song().is_none());
        press(&mut app, &[KeyCode::Enter]);
        assert!(app.program.is_empty());
        press(&mut app, &[KeyCode::Esc]);
        assert_eq!(app.library.filtered.len(), app.library.songs.len());
    }

    #[test]
    fn clear_asks_before_emptying() {
        let (_dir, mut app) = app();
        press(&mut app, &[KeyCode::Enter, KeyCode::Char('c'), KeyCode::Char('n')]);
        assert_eq!(app.program.len(), 1);
        press(&mut app, &[KeyCode::Char('c'), KeyCode::Char('y')]);
        assert!(app.program.is_empty());
        assert!(load_program(&app.conn).unwrap().is_empty());
    }

    #[test]
    fn export_menu_writes_the_text_order() {
        let (_dir, mut app) = app();
        press(&mut app, &[KeyCode::Char('x')]);
        assert_eq!(status(&app), "The program is empty.");

        press(&mut app, &[KeyCode::Enter, KeyCode::Char('x'), KeyCode::Enter]);
        let path = app.config.export_dir().join(TEXT_FILE_NAME);
        let text = fs::read_to_string(path).unwrap();
        assert!(text.starts_with("1. "));
        assert!(status(&app).starts_with("Exported to"));
    }

    #[test]
    fn xml_import_reloads_the_library() {
        let (dir, mut app) = app();
        let song_dir = dir.path().join("incoming");
        fs::create_dir_all(&song_dir).unwrap();
        fs::write(
            song_dir.join("K200_hozzad.xml"),
            "<song><title>Hozzád megyek</title><lyrics>Hozzád megyek</lyrics></song>",
        )
        .unwrap();
        let before = app.library.songs.len();

        press(&mut app, &[KeyCode::Char('i')]);
        type_text(&mut app, &song_dir.display().to_string());
        press(&mut app, &[KeyCode::Enter]);

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.library.songs.len(), before + 1);
        let song = app.library.find("K200_hozzad.xml").unwrap();
        assert_eq!(song.references, vec!["K200"]);
    }

    #[test]
    fn copy_chords_needs_two_verses() {
        let (_dir, mut app) = app();
        press(&mut app, &[KeyCode::Char('+'), KeyCode::F(7)]);
        assert!(matches!(app.mode, Mode::EditingSong(_)));
        assert_eq!(status(&app), "Copying chords needs at least two verses.");
    }

    #[test]
    fn projecting_needs_a_program() {
        let (_dir, mut app) = app();
        press(&mut app, &[KeyCode::Char('v')]);
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(status(&app), "The program is empty.");
    }

    #[test]
    fn projector_steps_through_slides_of_the_selected_item() {
        let (_dir, mut app) = app();
        let title = app.library.current_song().unwrap().title.clone();
        press(&mut app, &[KeyCode::Enter, KeyCode::Char('v')]);
        match &app.mode {
            Mode::Projecting(view) => {
                assert_eq!(view.live, Slide::Blank);
                assert!(view.cues.len() > 2);
            }
            _ => panic!("expected the projector"),
        }

        press(&mut app, &[KeyCode::Right]);
        match &app.mode {
            Mode::Projecting(view) => assert_eq!(view.live, Slide::Title(title)),
            _ => panic!("expected the projector"),
        }

        press(&mut app, &[KeyCode::Char('b'), KeyCode::Esc]);
        assert!(matches!(app.mode, Mode::Normal));
    }

    #[test]
    fn projector_settings_are_saved() {
        let (_dir, mut app) = app();
        press(&mut app, &[KeyCode::Enter, KeyCode::Char('v'), KeyCode::Char('s')]);
        press(
            &mut app,
            &[KeyCode::Down, KeyCode::Down, KeyCode::Down, KeyCode::Down],
        );
        type_text(&mut app, " ");
        press(&mut app, &[KeyCode::Enter]);

        match &app.mode {
            Mode::Projecting(view) => assert!(view.settings.is_bold),
            _ => panic!("expected the projector"),
        }
        assert_eq!(status(&app), "Projector settings saved.");
        assert!(load_projector_settings(&app.conn).unwrap().is_bold);
    }

    #[test]
    fn malformed_projector_colour_keeps_the_form_open() {
        let (_dir, mut app) = app();
        press(
            &mut app,
            &[KeyCode::Enter, KeyCode::Char('v'), KeyCode::Char('s'), KeyCode::Backspace],
        );
        press(&mut app, &[KeyCode::Enter]);
        match &app.mode {
            Mode::ProjectorSetup { form, .. } => assert!(form.error.is_some()),
            _ => panic!("expected the projector settings"),
        }
        assert_eq!(status(&app), "Background must be a colour like #000000.");

        press(&mut app, &[KeyCode::Esc]);
        match &app.mode {
            Mode::Projecting(view) => assert_eq!(view.settings, ProjectorSettings::default()),
            _ => panic!("expected the projector"),
        }
    }
}
