//! Directory browser over the server's music database.

use crossterm::event::KeyCode;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use tracing::{debug, info};

use mpy_base::board::{Entry, Topic};
use mpy_base::config::constants::{NOT_IN_DATABASE, NO_SONG_SELECTED};
use mpy_base::module::{Cycle, Module, ModuleId, PaintContext};
use mpy_base::remote::{Command, play_uri};
use mpy_base::scroll::ScrollState;
use mpy_base::search;
use mpy_base::snapshot::{DirEntry, dirname};
use mpy_base::ui::{list_nav, paint_list, style};

pub struct DatabasePanel {
    dir: String,
    entries: Vec<DirEntry>,
    scroll: ScrollState,
    /// Set until the first listing succeeds.
    stale: bool,
}

impl Default for DatabasePanel {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabasePanel {
    pub fn new() -> Self {
        Self { dir: String::new(), entries: vec![DirEntry::Parent], scroll: ScrollState::with_selection(), stale: true }
    }

    /// List `self.dir` again. The synthetic parent row always comes first.
    fn rebuild(&mut self, cycle: &mut Cycle<'_>, keep_position: bool) {
        let result = cycle.remote.browse(&self.dir);
        let Some(listing) = cycle.report(result) else { return };
        self.entries = std::iter::once(DirEntry::Parent).chain(listing).collect();
        self.stale = false;
        if keep_position {
            self.scroll.revalidate(self.entries.len());
        } else {
            self.scroll.reset(self.entries.len());
        }
        debug!(dir = %self.dir, len = self.entries.len(), "database listing");
    }

    fn enter_dir(&mut self, dir: String, cycle: &mut Cycle<'_>) {
        self.dir = dir;
        self.rebuild(cycle, false);
    }

    /// Go to the parent directory with the one just left selected.
    fn go_up(&mut self, cycle: &mut Cycle<'_>) {
        let left = std::mem::take(&mut self.dir);
        self.dir = dirname(&left).to_string();
        self.rebuild(cycle, false);
        if let Some(i) = self.position(|e| matches!(e, DirEntry::Directory(d) if *d == left)) {
            self.scroll.locate(i);
        }
    }

    fn position(&self, pred: impl Fn(&DirEntry) -> bool) -> Option<usize> {
        self.entries.iter().position(pred)
    }

    fn selected(&self) -> Option<&DirEntry> {
        self.scroll.selected().and_then(|i| self.entries.get(i))
    }

    fn activate(&mut self, cycle: &mut Cycle<'_>) {
        match self.selected().cloned() {
            Some(DirEntry::Parent) => self.go_up(cycle),
            Some(DirEntry::Directory(dir)) => self.enter_dir(dir, cycle),
            Some(DirEntry::File(song)) => {
                let result = play_uri(cycle.remote, &song.uri);
                cycle.report(result);
            }
            Some(DirEntry::Playlist(name)) => {
                if cycle.execute(Command::Load(name.clone())) {
                    cycle.board.post_status(format!("Playlist {} loaded", name));
                }
            }
            None => {}
        }
    }

    fn add_selected(&mut self, cycle: &mut Cycle<'_>) {
        let command = match self.selected() {
            Some(DirEntry::Parent) => Command::Add(dirname(&self.dir).to_string()),
            Some(DirEntry::Directory(dir)) => Command::Add(dir.clone()),
            Some(DirEntry::File(song)) => Command::Add(song.uri.clone()),
            Some(DirEntry::Playlist(name)) => Command::Load(name.clone()),
            None => return,
        };
        cycle.execute(command);
    }

    fn delete_selected(&mut self, cycle: &mut Cycle<'_>) {
        let Some(DirEntry::Playlist(name)) = self.selected().cloned() else { return };
        if cycle.execute(Command::RemovePlaylist(name.clone())) {
            cycle.board.post_status(format!("Playlist {} deleted", name));
            self.rebuild(cycle, true);
        }
    }

    /// Show the directory holding `uri` with `uri` selected.
    fn reveal(&mut self, uri: &str, cycle: &mut Cycle<'_>) {
        self.dir = dirname(uri).to_string();
        self.rebuild(cycle, false);
        match self.position(|e| matches!(e, DirEntry::File(s) if s.uri == uri)) {
            Some(i) => {
                self.scroll.locate(i);
                cycle.board.post(Entry::Focus(ModuleId::Database));
            }
            None => cycle.board.post_status(NOT_IN_DATABASE),
        }
    }
}

impl Module for DatabasePanel {
    fn id(&self) -> ModuleId {
        ModuleId::Database
    }

    fn handle_input(&mut self, key: Option<KeyCode>, cycle: &mut Cycle<'_>) {
        if self.stale && cycle.online {
            self.rebuild(cycle, false);
        }

        if let Some(key) = key
            && !list_nav(&mut self.scroll, key)
            && !search::step(&mut self.scroll, key, cycle.search, cycle.board, |i| self.entries[i].label())
        {
            match key {
                KeyCode::Char('\'') => self.go_up(cycle),
                KeyCode::Char('"') => self.enter_dir(String::new(), cycle),
                KeyCode::Enter => self.activate(cycle),
                KeyCode::Char('a') => self.add_selected(cycle),
                KeyCode::Char('d') => self.delete_selected(cycle),
                KeyCode::Char('U') => {
                    if cycle.execute(Command::Update) {
                        info!("database update requested");
                        self.enter_dir(String::new(), cycle);
                        cycle.board.post_status("Database updated");
                        cycle.board.post(Entry::DatabaseUpdated);
                    }
                }
                KeyCode::Char(';') => match self.selected() {
                    Some(DirEntry::File(song)) => cycle.board.locate(ModuleId::Queue, song.uri.clone()),
                    _ => cycle.board.post_status(NO_SONG_SELECTED),
                },
                _ => {}
            }
        }

        let uri = match self.selected() {
            Some(DirEntry::File(song)) => Some(song.uri.clone()),
            _ => None,
        };
        cycle.board.post(Entry::DatabaseSelection(uri));
    }

    fn settle(&mut self, cycle: &mut Cycle<'_>) {
        if let Some(uri) = cycle.board.take_locate(ModuleId::Database) {
            self.reveal(&uri, cycle);
        }
        if cycle.board.take(Topic::PlaylistSaved).is_some() {
            self.rebuild(cycle, true);
        }
    }

    fn paint(&self, frame: &mut Frame, area: Rect, _ctx: &PaintContext<'_>) {
        paint_list(frame, area, &self.scroll, None, |i| match &self.entries[i] {
            DirEntry::Parent => ("..".to_string(), style::header()),
            DirEntry::Directory(_) => (format!("{}/", self.entries[i].label()), style::header().patch(style::accent())),
            DirEntry::File(song) => (song.display_title().to_string(), Style::default()),
            DirEntry::Playlist(name) => (format!("[{}]", name), style::muted()),
        });
    }

    fn on_resize(&mut self, area: Rect) {
        self.scroll.set_height(area.height as usize);
    }
}
