//! Tag details for the playing and selected songs, plus server statistics.

use chrono::{Local, TimeZone};
use crossterm::event::KeyCode;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use tracing::debug;

use mpy_base::board::Entry;
use mpy_base::module::{Cycle, Module, ModuleId, PaintContext};
use mpy_base::scroll::ScrollState;
use mpy_base::snapshot::{Snapshot, Song, Stats};
use mpy_base::ui::{format_time, paint_list, style, viewport_nav};

#[derive(Debug, Clone, PartialEq)]
enum Row {
    Group(&'static str),
    Field(&'static str, String),
    Blank,
}

pub struct InfoPanel {
    current: Option<Song>,
    stats: Stats,
    queue_selection: Option<Song>,
    /// Uri last looked up, and what the lookup found.
    database_uri: Option<String>,
    database_song: Option<Song>,
    rows: Vec<Row>,
    scroll: ScrollState,
}

impl Default for InfoPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl InfoPanel {
    pub fn new() -> Self {
        Self {
            current: None,
            stats: Stats::default(),
            queue_selection: None,
            database_uri: None,
            database_song: None,
            rows: Vec::new(),
            scroll: ScrollState::viewport_only(),
        }
    }

    fn song_rows(rows: &mut Vec<Row>, title: &'static str, song: Option<&Song>) {
        rows.push(Row::Group(title));
        match song {
            Some(song) => {
                let tags = [
                    ("Title", &song.title),
                    ("Artist", &song.artist),
                    ("Album", &song.album),
                    ("Track", &song.track),
                    ("Genre", &song.genre),
                    ("Date", &song.date),
                ];
                for (name, value) in tags {
                    rows.push(Row::Field(name, value.clone().unwrap_or_default()));
                }
                rows.push(Row::Field("Time", song.duration.map(|d| format_time(d as u64)).unwrap_or_default()));
                let mut parts = song.uri.split('/');
                rows.push(Row::Field("File", parts.next().unwrap_or_default().to_string()));
                rows.extend(parts.map(|part| Row::Field("", format!("/{}", part))));
            }
            None => rows.push(Row::Field("", "-".into())),
        }
        rows.push(Row::Blank);
    }

    fn stats_rows(rows: &mut Vec<Row>, stats: &Stats) {
        rows.push(Row::Group("MPD Statistics"));
        let updated = Local
            .timestamp_opt(stats.db_update, 0)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        rows.extend([
            Row::Field("Songs", stats.songs.to_string()),
            Row::Field("Artists", stats.artists.to_string()),
            Row::Field("Albums", stats.albums.to_string()),
            Row::Field("Uptime", format_time(stats.uptime)),
            Row::Field("Playtime", format_time(stats.playtime)),
            Row::Field("DB_Playtime", format_time(stats.db_playtime)),
            Row::Field("DB_Update", updated),
        ]);
    }

    fn rebuild_rows(&mut self) {
        let mut rows = Vec::new();
        Self::song_rows(&mut rows, "Currently Playing", self.current.as_ref());
        Self::song_rows(&mut rows, "Currently Selected in Queue", self.queue_selection.as_ref());
        Self::song_rows(&mut rows, "Currently Selected in Database", self.database_song.as_ref());
        Self::stats_rows(&mut rows, &self.stats);
        self.rows = rows;
        self.scroll.revalidate(self.rows.len());
    }

    /// Look the database selection up again only when it moved.
    fn follow_database(&mut self, cycle: &mut Cycle<'_>) {
        let uri = cycle.board.database_selection().map(str::to_string);
        if uri == self.database_uri || !cycle.online {
            return;
        }
        self.database_song = match &uri {
            Some(uri) => {
                let result = cycle.remote.song_info(uri);
                cycle.report(result).flatten()
            }
            None => None,
        };
        debug!(uri = ?uri, "info lookup");
        self.database_uri = uri;
    }
}

impl Module for InfoPanel {
    fn id(&self) -> ModuleId {
        ModuleId::Info
    }

    fn refresh(&mut self, snapshot: &Snapshot) {
        self.current = snapshot.current.clone();
        self.stats = snapshot.stats.clone();
    }

    fn handle_input(&mut self, key: Option<KeyCode>, cycle: &mut Cycle<'_>) {
        let Some(key) = key else { return };
        if viewport_nav(&mut self.scroll, key) {
            return;
        }
        if key == KeyCode::Char('h') {
            cycle.board.post(Entry::Back);
        }
    }

    fn settle(&mut self, cycle: &mut Cycle<'_>) {
        if let Some(song) = cycle.board.queue_selection() {
            self.queue_selection = Some(song.clone());
        }
        self.follow_database(cycle);
        self.rebuild_rows();
    }

    fn paint(&self, frame: &mut Frame, area: Rect, _ctx: &PaintContext<'_>) {
        paint_list(frame, area, &self.scroll, None, |i| match &self.rows[i] {
            Row::Group(title) => (title.to_string(), style::header().patch(style::accent())),
            Row::Field(name, value) => (format!("  {:<12}{}", name, value), Style::default()),
            Row::Blank => (String::new(), Style::default()),
        });
    }

    fn on_resize(&mut self, area: Rect) {
        self.scroll.set_height(area.height as usize);
    }
}
