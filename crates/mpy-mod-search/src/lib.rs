//! Database search by exact tag value, entered as `<tag>:<value>`.

use crossterm::event::KeyCode;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use tracing::debug;

use mpy_base::config::constants::NO_SONG_SELECTED;
use mpy_base::module::{Cycle, Module, ModuleId, PaintContext};
use mpy_base::remote::{Command, play_uri};
use mpy_base::scroll::ScrollState;
use mpy_base::search;
use mpy_base::snapshot::Song;
use mpy_base::ui::{list_nav, paint_list, spread};

pub const INVALID_SYNTAX: &str = "Invalid Syntax >_< Syntax = <tag_name>:<tag_value>";
pub const NOTHING_FOUND: &str = "Nothing found :(";

/// Split `tag:value`. Both halves must be non-empty.
pub fn parse_query(query: &str) -> Option<(&str, &str)> {
    let (tag, value) = query.split_once(':')?;
    let tag = tag.trim();
    (!tag.is_empty() && !value.is_empty() && !tag.contains(char::is_whitespace)).then_some((tag, value))
}

pub struct SearchPanel {
    results: Vec<Song>,
    scroll: ScrollState,
}

impl Default for SearchPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchPanel {
    pub fn new() -> Self {
        Self { results: Vec::new(), scroll: ScrollState::with_selection() }
    }

    /// Malformed queries leave the previous results in place.
    fn run_query(&mut self, query: &str, cycle: &mut Cycle<'_>) {
        let Some((tag, value)) = parse_query(query) else {
            cycle.board.post_status(INVALID_SYNTAX);
            return;
        };
        let result = cycle.remote.find(&tag.to_lowercase(), value);
        let results = cycle.report(result).unwrap_or_default();
        if results.is_empty() && !cycle.board.contains(mpy_base::board::Topic::Status) {
            cycle.board.post_status(NOTHING_FOUND);
        }
        debug!(%query, hits = results.len(), "database search");
        self.results = results;
        self.scroll.reset(self.results.len());
    }

    fn selected(&self) -> Option<&Song> {
        self.scroll.selected().and_then(|i| self.results.get(i))
    }
}

impl Module for SearchPanel {
    fn id(&self) -> ModuleId {
        ModuleId::Search
    }

    fn handle_input(&mut self, key: Option<KeyCode>, cycle: &mut Cycle<'_>) {
        let Some(key) = key else { return };
        if list_nav(&mut self.scroll, key)
            || search::step(&mut self.scroll, key, cycle.search, cycle.board, |i| self.results[i].display_title())
        {
            return;
        }
        match key {
            KeyCode::Char('B') => {
                if let Some(query) = cycle.prompt.prompt("Database Search") {
                    self.run_query(&query, cycle);
                }
            }
            KeyCode::Enter => {
                if let Some(uri) = self.selected().map(|s| s.uri.clone()) {
                    let result = play_uri(cycle.remote, &uri);
                    cycle.report(result);
                }
            }
            KeyCode::Char('a') => {
                if let Some(uri) = self.selected().map(|s| s.uri.clone()) {
                    cycle.execute(Command::Add(uri));
                }
            }
            KeyCode::Char(';') => match self.selected() {
                Some(song) => cycle.board.locate(ModuleId::Queue, song.uri.clone()),
                None => cycle.board.post_status(NO_SONG_SELECTED),
            },
            _ => {}
        }
    }

    fn paint(&self, frame: &mut Frame, area: Rect, _ctx: &PaintContext<'_>) {
        let width = area.width as usize;
        paint_list(frame, area, &self.scroll, None, |i| {
            let song = &self.results[i];
            let right = match (&song.artist, &song.album) {
                (Some(artist), Some(album)) => format!("{} - {} ", artist, album),
                (Some(artist), None) => format!("{} ", artist),
                _ => String::new(),
            };
            (spread(song.display_title(), &right, width), Style::default())
        });
    }

    fn on_resize(&mut self, area: Rect) {
        self.scroll.set_height(area.height as usize);
    }
}
