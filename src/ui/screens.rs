use crate::models::{Program, ProjectorSettings, Song, Theme};
use crate::projector::{slide_cues, Slide, SlideCue};

/// Which half of the program screen has keyboard focus.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Pane {
    Library,
    Program,
}

impl Pane {
    pub(crate) fn toggle(self) -> Self {
        match self {
            Pane::Library => Pane::Program,
            Pane::Program => Pane::Library,
        }
    }
}

/// Clamp-and-step selection shared by every list on screen.
pub(crate) fn step_selection(selected: usize, len: usize, offset: isize) -> usize {
    if len == 0 {
        return 0;
    }
    (selected as isize + offset).clamp(0, len as isize - 1) as usize
}

/// The song library with its search filter. Matching looks at title,
/// author, file name, and lyrics, case-insensitively.
pub(crate) struct LibraryPane {
    pub(crate) songs: Vec<Song>,
    pub(crate) filtered: Vec<usize>,
    pub(crate) filter: Option<String>,
    pub(crate) selected: usize,
}

impl LibraryPane {
    pub(crate) fn new(songs: Vec<Song>) -> Self {
        let mut pane = Self {
            songs,
            filtered: Vec::new(),
            filter: None,
            selected: 0,
        };
        pane.apply_filter();
        pane
    }

    pub(crate) fn apply_filter(&mut self) {
        let query = self
            .filter
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());

        self.filtered = self
            .songs
            .iter()
            .enumerate()
            .filter(|(_, song)| match &query {
                Some(q) => {
                    song.title.to_lowercase().contains(q)
                        || song
                            .author
                            .as_deref()
                            .is_some_and(|author| author.to_lowercase().contains(q))
                        || song.id.to_lowercase().contains(q)
                        || song.content.to_lowercase().contains(q)
                }
                None => true,
            })
            .map(|(index, _)| index)
            .collect();

        self.selected = step_selection(self.selected, self.filtered.len(), 0);
    }

    pub(crate) fn set_filter(&mut self, filter: Option<String>) {
        self.filter = filter;
        self.apply_filter();
    }

    /// Replace the songs after a reload, keeping the cursor on `focus_id`
    /// when it is still visible.
    pub(crate) fn set_songs(&mut self, songs: Vec<Song>, focus_id: Option<&str>) {
        self.songs = songs;
        self.apply_filter();
        if let Some(id) = focus_id {
            if let Some(pos) = self.filtered.iter().position(|i| self.songs[*i].id == id) {
                self.selected = pos;
            }
        }
    }

    pub(crate) fn visible(&self) -> impl Iterator<Item = &Song> {
        self.filtered.iter().map(|index| &self.songs[*index])
    }

    pub(crate) fn current_song(&self) -> Option<&Song> {
        self.filtered
            .get(self.selected)
            .map(|index| &self.songs[*index])
    }

    pub(crate) fn find(&self, id: &str) -> Option<&Song> {
        self.songs.iter().find(|song| song.id == id)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step_selection(self.selected, self.filtered.len(), offset);
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.filtered.len().saturating_sub(1);
    }
}

/// Popup list of the liturgical themes.
pub(crate) struct ThemePicker {
    pub(crate) themes: Vec<Theme>,
    pub(crate) selected: usize,
}

impl ThemePicker {
    pub(crate) fn new(themes: Vec<Theme>) -> Self {
        Self { themes, selected: 0 }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step_selection(self.selected, self.themes.len(), offset);
    }

    pub(crate) fn current(&self) -> Option<&Theme> {
        self.themes.get(self.selected)
    }
}

/// Which list of the projector screen has focus.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum ProjectorColumn {
    Order,
    Slides,
}

/// Projector screen: the order on the left, the slides of the selected item
/// next to it, and whatever is live on the right. The live slide only
/// changes when a slide is projected, not when the selection moves.
pub(crate) struct ProjectorView {
    pub(crate) item: usize,
    pub(crate) cues: Vec<SlideCue>,
    pub(crate) cue: usize,
    pub(crate) column: ProjectorColumn,
    pub(crate) live: Slide,
    pub(crate) settings: ProjectorSettings,
}

impl ProjectorView {
    pub(crate) fn new(program: &Program, item: usize, settings: ProjectorSettings) -> Self {
        let mut view = Self {
            item: 0,
            cues: Vec::new(),
            cue: 0,
            column: ProjectorColumn::Order,
            live: Slide::Blank,
            settings,
        };
        view.select_item(program, item);
        view
    }

    fn select_item(&mut self, program: &Program, item: usize) {
        self.item = item.min(program.len().saturating_sub(1));
        self.cues = program
            .items()
            .get(self.item)
            .map(|item| slide_cues(&item.entry))
            .unwrap_or_default();
        self.cue = 0;
    }

    pub(crate) fn toggle_column(&mut self) {
        self.column = match self.column {
            ProjectorColumn::Order => ProjectorColumn::Slides,
            ProjectorColumn::Slides => ProjectorColumn::Order,
        };
    }

    pub(crate) fn move_selection(&mut self, program: &Program, offset: isize) {
        match self.column {
            ProjectorColumn::Order => {
                let item = step_selection(self.item, program.len(), offset);
                if item != self.item {
                    self.select_item(program, item);
                }
            }
            ProjectorColumn::Slides => {
                self.cue = step_selection(self.cue, self.cues.len(), offset);
            }
        }
    }

    pub(crate) fn project_current(&mut self) {
        if let Some(cue) = self.cues.get(self.cue) {
            self.live = cue.slide.clone();
        }
    }

    /// Move to the neighbouring slide of the current item and put it live.
    pub(crate) fn step_and_project(&mut self, offset: isize) {
        self.column = ProjectorColumn::Slides;
        self.cue = step_selection(self.cue, self.cues.len(), offset);
        self.project_current();
    }

    pub(crate) fn blank(&mut self) {
        self.live = Slide::Blank;
    }

    pub(crate) fn is_live(&self, cue: &SlideCue) -> bool {
        cue.slide == self.live
    }
}
