//! Artist → album → song drill-down over database tags.

use crossterm::event::KeyCode;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::Span;
use tracing::debug;

use mpy_base::board::Topic;
use mpy_base::config::constants::NO_SONG_SELECTED;
use mpy_base::module::{Cycle, Module, ModuleId, PaintContext};
use mpy_base::remote::{Command, play_uri};
use mpy_base::scroll::ScrollState;
use mpy_base::search;
use mpy_base::snapshot::Song;
use mpy_base::ui::{list_nav, paint_list, style};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Level {
    Artists,
    Albums { artist: String },
    Songs { artist: String, album: String },
}

#[derive(Debug, Clone, PartialEq)]
enum Item {
    Tag(String),
    Song(Song),
}

impl Item {
    fn label(&self) -> &str {
        match self {
            Item::Tag(name) => name,
            Item::Song(song) => song.display_title(),
        }
    }
}

pub struct LibraryPanel {
    level: Level,
    items: Vec<Item>,
    scroll: ScrollState,
    stale: bool,
}

impl Default for LibraryPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl LibraryPanel {
    pub fn new() -> Self {
        Self { level: Level::Artists, items: Vec::new(), scroll: ScrollState::with_selection(), stale: true }
    }

    fn rebuild(&mut self, cycle: &mut Cycle<'_>) {
        let result: Result<Vec<Item>, _> = match &self.level {
            Level::Artists => cycle.remote.list("artist", None).map(|v| v.into_iter().map(Item::Tag).collect()),
            Level::Albums { artist } => cycle
                .remote
                .list("album", Some(("artist", artist.as_str())))
                .map(|v| v.into_iter().map(Item::Tag).collect()),
            Level::Songs { album, .. } => cycle.remote.find("album", album).map(|v| v.into_iter().map(Item::Song).collect()),
        };
        let Some(items) = cycle.report(result) else { return };
        self.items = items;
        self.stale = false;
        self.scroll.reset(self.items.len());
        debug!(level = ?self.level, len = self.items.len(), "library listing");
    }

    fn selected(&self) -> Option<&Item> {
        self.scroll.selected().and_then(|i| self.items.get(i))
    }

    fn drill(&mut self, cycle: &mut Cycle<'_>) {
        let Some(item) = self.selected().cloned() else { return };
        let next = match (&self.level, item) {
            (Level::Artists, Item::Tag(artist)) => Some(Level::Albums { artist }),
            (Level::Albums { artist }, Item::Tag(album)) => Some(Level::Songs { artist: artist.clone(), album }),
            (_, Item::Song(song)) => {
                let result = play_uri(cycle.remote, &song.uri);
                cycle.report(result);
                None
            }
            _ => None,
        };
        if let Some(level) = next {
            self.level = level;
            self.rebuild(cycle);
        }
    }

    /// One level up, with the entry just left selected again.
    fn climb(&mut self, cycle: &mut Cycle<'_>) {
        let (parent, left) = match &self.level {
            Level::Artists => return,
            Level::Albums { artist } => (Level::Artists, artist.clone()),
            Level::Songs { artist, album } => (Level::Albums { artist: artist.clone() }, album.clone()),
        };
        self.level = parent;
        self.rebuild(cycle);
        if let Some(i) = self.items.iter().position(|item| item.label() == left) {
            self.scroll.locate(i);
        }
    }

    fn add_selected(&mut self, cycle: &mut Cycle<'_>) {
        let command = match (&self.level, self.selected()) {
            (Level::Artists, Some(Item::Tag(artist))) => Command::FindAdd { tag: "artist".into(), value: artist.clone() },
            (Level::Albums { .. }, Some(Item::Tag(album))) => Command::FindAdd { tag: "album".into(), value: album.clone() },
            (_, Some(Item::Song(song))) => Command::Add(song.uri.clone()),
            _ => return,
        };
        cycle.execute(command);
    }
}

impl Module for LibraryPanel {
    fn id(&self) -> ModuleId {
        ModuleId::Library
    }

    fn handle_input(&mut self, key: Option<KeyCode>, cycle: &mut Cycle<'_>) {
        if self.stale && cycle.online {
            self.rebuild(cycle);
        }

        let Some(key) = key else { return };
        if list_nav(&mut self.scroll, key)
            || search::step(&mut self.scroll, key, cycle.search, cycle.board, |i| self.items[i].label())
        {
            return;
        }
        match key {
            KeyCode::Enter => self.drill(cycle),
            KeyCode::Char('\'') => self.climb(cycle),
            KeyCode::Char('"') => {
                self.level = Level::Artists;
                self.rebuild(cycle);
            }
            KeyCode::Char('a') => self.add_selected(cycle),
            KeyCode::Char(';') => match self.selected() {
                Some(Item::Song(song)) => cycle.board.locate(ModuleId::Queue, song.uri.clone()),
                _ => cycle.board.post_status(NO_SONG_SELECTED),
            },
            _ => {}
        }
    }

    fn settle(&mut self, cycle: &mut Cycle<'_>) {
        if cycle.board.contains(Topic::DatabaseUpdated) && !(self.stale && self.level == Level::Artists) {
            self.level = Level::Artists;
            self.stale = true;
        }
    }

    fn paint(&self, frame: &mut Frame, area: Rect, _ctx: &PaintContext<'_>) {
        let header = match &self.level {
            Level::Artists => "Artists".to_string(),
            Level::Albums { artist } => artist.clone(),
            Level::Songs { artist, album } => format!("{} / {}", artist, album),
        };
        let [title, body] = Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);
        frame.render_widget(Span::styled(header, style::header()), title);
        paint_list(frame, body, &self.scroll, None, |i| match &self.items[i] {
            Item::Tag(name) if name.is_empty() => ("<unknown>".to_string(), style::muted()),
            item => (item.label().to_string(), Style::default()),
        });
    }

    fn on_resize(&mut self, area: Rect) {
        self.scroll.set_height(area.height.saturating_sub(1) as usize);
    }
}
