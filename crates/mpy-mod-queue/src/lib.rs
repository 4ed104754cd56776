//! Play queue panel.
//!
//! Deletes and moves are applied to the local list at once and sent later as
//! one batch, so a burst of edits costs a single round trip.

use crossterm::event::KeyCode;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use tracing::debug;

use mpy_base::board::Entry;
use mpy_base::config::constants::{NOT_IN_QUEUE, NO_SONG_SELECTED};
use mpy_base::module::{Cycle, Module, ModuleId, PaintContext};
use mpy_base::remote::Command;
use mpy_base::scroll::ScrollState;
use mpy_base::search;
use mpy_base::snapshot::{Snapshot, Song};
use mpy_base::ui::{format_time, list_nav, paint_list, spread};

const EXEMPT: &[KeyCode] = &[KeyCode::Char('l'), KeyCode::Char('\'')];
const PARTIAL: &[KeyCode] = &[KeyCode::Char('d'), KeyCode::Char('J'), KeyCode::Char('K')];

pub struct QueuePanel {
    songs: Vec<Song>,
    /// Playlist version `songs` was taken from; `None` forces a rebuild.
    version: Option<u32>,
    current: Option<usize>,
    scroll: ScrollState,
    auto_center: bool,
}

impl Default for QueuePanel {
    fn default() -> Self {
        Self::new()
    }
}

impl QueuePanel {
    pub fn new() -> Self {
        Self { songs: Vec::new(), version: None, current: None, scroll: ScrollState::with_selection(), auto_center: false }
    }

    fn selected_song(&self) -> Option<&Song> {
        self.scroll.selected().and_then(|i| self.songs.get(i))
    }

    fn delete_selected(&mut self, cycle: &mut Cycle<'_>) {
        let Some(sel) = self.scroll.selected() else { return };
        let Some(id) = self.songs[sel].id else { return };
        cycle.pending.push(Command::DeleteId(id));
        self.songs.remove(sel);
        self.current = match self.current {
            Some(cur) if sel < cur => Some(cur - 1),
            Some(cur) if sel == cur => None,
            other => other,
        };
        self.scroll.revalidate(self.songs.len());
    }

    /// Swap the selected song with its neighbour and follow it.
    fn move_selected(&mut self, down: bool, cycle: &mut Cycle<'_>) {
        let Some(sel) = self.scroll.selected() else { return };
        let other = if down {
            if sel + 1 >= self.songs.len() {
                return;
            }
            sel + 1
        } else {
            if sel == 0 {
                return;
            }
            sel - 1
        };
        cycle.pending.push(Command::Swap(sel, other));
        self.songs.swap(sel, other);
        if self.current == Some(sel) {
            self.current = Some(other);
        } else if self.current == Some(other) {
            self.current = Some(sel);
        }
        if down {
            self.scroll.line_down();
        } else {
            self.scroll.line_up();
        }
    }

    fn rate_current(&mut self, rating: u8, cycle: &mut Cycle<'_>) {
        if !cycle.config.ratings {
            return;
        }
        let Some(song) = self.current.and_then(|cur| self.songs.get_mut(cur)) else { return };
        if cycle.execute(Command::SetRating { uri: song.uri.clone(), rating }) {
            song.rating = rating;
        }
    }
}

impl Module for QueuePanel {
    fn id(&self) -> ModuleId {
        ModuleId::Queue
    }

    fn cycle_exempt_keys(&self) -> &'static [KeyCode] {
        EXEMPT
    }

    fn partial_sync_keys(&self) -> &'static [KeyCode] {
        PARTIAL
    }

    fn refresh(&mut self, snapshot: &Snapshot) {
        if snapshot.queue_version.is_some() && snapshot.queue_version != self.version {
            self.songs = snapshot.queue.clone();
            self.version = snapshot.queue_version;
            self.scroll.revalidate(self.songs.len());
            debug!(len = self.songs.len(), version = ?self.version, "queue rebuilt");
        }
        self.current = snapshot.status.song.filter(|&pos| pos < self.songs.len());
    }

    fn discard_speculative(&mut self) {
        self.version = None;
    }

    fn handle_input(&mut self, key: Option<KeyCode>, cycle: &mut Cycle<'_>) {
        if let Some(key) = key {
            if !list_nav(&mut self.scroll, key)
                && !search::step(&mut self.scroll, key, cycle.search, cycle.board, |i| self.songs[i].display_title())
            {
                match key {
                    KeyCode::Char('l') => {
                        if let Some(cur) = self.current {
                            self.scroll.locate(cur);
                        }
                    }
                    KeyCode::Char('\'') => self.auto_center = !self.auto_center,
                    KeyCode::Char('a') => {
                        cycle.execute(Command::Add(String::new()));
                    }
                    KeyCode::Char('c') => {
                        if cycle.execute(Command::Clear) {
                            self.songs.clear();
                            self.current = None;
                            self.scroll.reset(0);
                        }
                    }
                    KeyCode::Char('d') => self.delete_selected(cycle),
                    KeyCode::Char('J') => self.move_selected(true, cycle),
                    KeyCode::Char('K') => self.move_selected(false, cycle),
                    KeyCode::Char('e') => {
                        cycle.execute(Command::Shuffle);
                    }
                    KeyCode::Enter => {
                        if let Some(id) = self.selected_song().and_then(|s| s.id) {
                            cycle.execute(Command::PlayId(id));
                        }
                    }
                    KeyCode::Char(c @ '1'..='5') => self.rate_current(c as u8 - b'0', cycle),
                    KeyCode::Char(';') => match self.selected_song() {
                        Some(song) => cycle.board.locate(ModuleId::Database, song.uri.clone()),
                        None => cycle.board.post_status(NO_SONG_SELECTED),
                    },
                    _ => {}
                }
            }
        }

        if let Some(song) = self.selected_song() {
            cycle.board.post(Entry::QueueSelection(song.clone()));
        }
    }

    fn settle(&mut self, cycle: &mut Cycle<'_>) {
        if let Some(uri) = cycle.board.take_locate(ModuleId::Queue) {
            match self.songs.iter().position(|s| s.uri == uri) {
                Some(i) => {
                    self.scroll.locate(i);
                    cycle.board.post(Entry::Focus(ModuleId::Queue));
                }
                None => cycle.board.post_status(NOT_IN_QUEUE),
            }
        }
        if self.auto_center
            && let Some(cur) = self.current
        {
            self.scroll.locate(cur);
        }
    }

    fn paint(&self, frame: &mut Frame, area: Rect, _ctx: &PaintContext<'_>) {
        let width = area.width as usize;
        paint_list(frame, area, &self.scroll, self.current, |i| {
            let song = &self.songs[i];
            let title = match &song.artist {
                Some(artist) => format!("{:>4} {} - {}", i + 1, artist, song.display_title()),
                None => format!("{:>4} {}", i + 1, song.display_title()),
            };
            let stars = "*".repeat(song.rating as usize);
            let time = song.duration.map(|d| format_time(d as u64)).unwrap_or_default();
            (spread(&title, &format!("{:>5} {:>7} ", stars, time), width), Style::default())
        });
    }

    fn on_resize(&mut self, area: Rect) {
        self.scroll.set_height(area.height as usize);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpy_base::board::Topic;
    use mpy_base::testing::{FakeRemote, Rig};

    fn setup(uris: &[&str]) -> (QueuePanel, Rig, Snapshot) {
        let mut rig = Rig::new(FakeRemote::with_queue(uris));
        let mut snapshot = Snapshot::default();
        snapshot.refresh(&mut rig.remote, false, false).unwrap();
        let mut panel = QueuePanel::new();
        panel.on_resize(Rect::new(0, 2, 40, 5));
        panel.refresh(&snapshot);
        (panel, rig, snapshot)
    }

    #[test]
    fn deletes_are_local_until_flushed() {
        let (mut panel, mut rig, mut snapshot) = setup(&["a", "b", "c"]);
        panel.handle_input(Some(KeyCode::Char('j')), &mut rig.cycle());
        panel.handle_input(Some(KeyCode::Char('d')), &mut rig.cycle());
        assert_eq!(panel.songs.iter().map(|s| s.uri.as_str()).collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(rig.pending.commands(), &[Command::DeleteId(2)]);
        assert_eq!(rig.remote.queue.len(), 3);

        // A partial sync must not resurrect the deleted row.
        snapshot.refresh(&mut rig.remote, true, false).unwrap();
        panel.refresh(&snapshot);
        assert_eq!(panel.songs.len(), 2);

        rig.pending.flush(&mut rig.remote).unwrap();
        snapshot.refresh(&mut rig.remote, false, false).unwrap();
        panel.refresh(&snapshot);
        assert_eq!(rig.remote.queue_uris(), vec!["a", "c"]);
        assert_eq!(panel.songs.len(), 2);
    }

    #[test]
    fn moves_follow_the_song_and_current() {
        let (mut panel, mut rig, _) = setup(&["a", "b", "c"]);
        panel.current = Some(0);
        panel.handle_input(Some(KeyCode::Char('J')), &mut rig.cycle());
        panel.handle_input(Some(KeyCode::Char('J')), &mut rig.cycle());
        assert_eq!(panel.songs[2].uri, "a");
        assert_eq!(panel.current, Some(2));
        assert_eq!(panel.scroll.selected(), Some(2));
        panel.handle_input(Some(KeyCode::Char('J')), &mut rig.cycle());
        assert_eq!(rig.pending.commands(), &[Command::Swap(0, 1), Command::Swap(1, 2)]);
    }

    #[test]
    fn discard_restores_server_order() {
        let (mut panel, mut rig, snapshot) = setup(&["a", "b"]);
        panel.handle_input(Some(KeyCode::Char('K')), &mut rig.cycle());
        panel.handle_input(Some(KeyCode::Char('J')), &mut rig.cycle());
        assert_eq!(panel.songs[0].uri, "b");
        panel.discard_speculative();
        panel.refresh(&snapshot);
        assert_eq!(panel.songs[0].uri, "a");
    }

    #[test]
    fn locate_request_selects_and_focuses() {
        let (mut panel, mut rig, _) = setup(&["x/1", "x/2", "x/3"]);
        rig.board.locate(ModuleId::Queue, "x/3");
        panel.settle(&mut rig.cycle());
        assert_eq!(panel.scroll.selected(), Some(2));
        assert_eq!(rig.board.get(Topic::Focus), Some(&Entry::Focus(ModuleId::Queue)));
        assert!(!rig.board.contains(Topic::Locate));

        rig.board.clear();
        rig.board.locate(ModuleId::Queue, "y/9");
        panel.settle(&mut rig.cycle());
        assert_eq!(rig.board.status(), Some(NOT_IN_QUEUE));
        assert!(!rig.board.contains(Topic::Focus));
    }

    #[test]
    fn settle_is_idempotent() {
        let (mut panel, mut rig, _) = setup(&["a", "b", "c"]);
        panel.auto_center = true;
        panel.current = Some(2);
        rig.board.locate(ModuleId::Queue, "b");
        panel.settle(&mut rig.cycle());
        let after_first = (panel.scroll.clone(), rig.board.len());
        panel.settle(&mut rig.cycle());
        assert_eq!((panel.scroll.clone(), rig.board.len()), after_first);
    }

    #[test]
    fn publishes_selection_every_cycle() {
        let (mut panel, mut rig, _) = setup(&["a", "b"]);
        panel.handle_input(None, &mut rig.cycle());
        assert_eq!(rig.board.queue_selection().map(|s| s.uri.as_str()), Some("a"));
        panel.handle_input(Some(KeyCode::Char(';')), &mut rig.cycle());
        assert_eq!(rig.board.take_locate(ModuleId::Database).as_deref(), Some("a"));
    }

    #[test]
    fn enter_plays_and_rating_needs_config() {
        let (mut panel, mut rig, _) = setup(&["a", "b"]);
        panel.handle_input(Some(KeyCode::Char('j')), &mut rig.cycle());
        panel.handle_input(Some(KeyCode::Enter), &mut rig.cycle());
        assert_eq!(rig.remote.executed, vec![Command::PlayId(2)]);

        panel.current = Some(1);
        panel.handle_input(Some(KeyCode::Char('4')), &mut rig.cycle());
        assert_eq!(panel.songs[1].rating, 0);
        rig.config.ratings = true;
        panel.handle_input(Some(KeyCode::Char('4')), &mut rig.cycle());
        assert_eq!(panel.songs[1].rating, 4);
        assert_eq!(rig.remote.ratings.get("b"), Some(&4));
    }
}
