//! Timed lyrics for the playing song, looked up in the background.

pub mod lrc;
pub mod source;
pub mod worker;

use std::io;

use crossterm::event::KeyCode;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use tracing::warn;

use mpy_base::config::Config;
use mpy_base::module::{Cycle, Module, ModuleId, PaintContext};
use mpy_base::scroll::ScrollState;
use mpy_base::snapshot::Snapshot;
use mpy_base::ui::{paint_list, style, viewport_nav};

use crate::lrc::LrcLine;
use crate::source::{LrclibSource, LyricsSource, LyricsStore};
use crate::worker::{LyricsKey, LyricsWorker, NO_TAGS, Poll, ResultState, UNAVAILABLE};

pub const UPDATING: &str = "Updating...";
pub const SAVE_FAILED: &str = "Lyrics saving failed.";

const EXEMPT: &[KeyCode] = &[KeyCode::Char('l'), KeyCode::Char('\'')];

pub struct LyricsPanel {
    worker: LyricsWorker,
    store: LyricsStore,
    autosave_min_lines: usize,
    /// Song the lyrics should belong to, from the last sync.
    wanted: Option<LyricsKey>,
    /// Last key the worker accepted.
    sent: Option<LyricsKey>,
    /// Song whose lyrics are in `raw`.
    shown: Option<LyricsKey>,
    raw: String,
    lines: Vec<LrcLine>,
    updating: bool,
    elapsed: u64,
    current: Option<usize>,
    scroll: ScrollState,
    auto_center: bool,
}

impl LyricsPanel {
    pub fn new(config: &Config) -> io::Result<Self> {
        let source: Option<Box<dyn LyricsSource>> = if config.lyrics.fetch {
            match LrclibSource::new(config.lyrics.endpoint.clone()) {
                Ok(source) => Some(Box::new(source)),
                Err(e) => {
                    warn!(error = %e, "lyrics fetching disabled");
                    None
                }
            }
        } else {
            None
        };
        Self::with_parts(LyricsStore::new(config.lyrics_dir()), source, config.lyrics.autosave_min_lines)
    }

    pub fn with_parts(
        store: LyricsStore,
        source: Option<Box<dyn LyricsSource>>,
        autosave_min_lines: usize,
    ) -> io::Result<Self> {
        let worker = LyricsWorker::spawn(store.clone(), source)?;
        let raw = NO_TAGS.to_string();
        let lines = lrc::parse(&raw);
        let mut scroll = ScrollState::viewport_only();
        scroll.reset(lines.len());
        Ok(Self {
            worker,
            store,
            autosave_min_lines,
            wanted: None,
            sent: None,
            shown: None,
            raw,
            lines,
            updating: false,
            elapsed: 0,
            current: None,
            scroll,
            auto_center: true,
        })
    }

    /// Hand the wanted key to the worker and take any result it has.
    fn sync_worker(&mut self, cycle: &mut Cycle<'_>) {
        if self.sent != self.wanted && self.worker.request(self.wanted.clone()) {
            self.sent = self.wanted.clone();
        }
        match self.worker.poll() {
            Poll::Busy => self.updating = true,
            Poll::Unchanged => self.updating = self.sent != self.wanted,
            Poll::Ready(delivery) if delivery.key != self.wanted => self.updating = true,
            Poll::Ready(delivery) => {
                self.lines = lrc::parse(&delivery.payload);
                self.raw = delivery.payload;
                self.shown = delivery.key;
                self.updating = false;
                self.scroll.reset(self.lines.len());
                if delivery.state == ResultState::Fetched && self.lines.len() > self.autosave_min_lines {
                    self.save(cycle);
                }
            }
        }
    }

    fn save(&mut self, cycle: &mut Cycle<'_>) {
        let tags = self.shown.as_ref().and_then(|k| k.tags());
        let Some((artist, title)) = tags.filter(|_| !self.updating && self.raw != UNAVAILABLE) else {
            cycle.board.post_status(SAVE_FAILED);
            return;
        };
        match self.store.save(artist, title, &self.raw) {
            Ok(_) => cycle.board.post_status(format!("Lyrics {} saved.", LyricsStore::file_name(artist, title))),
            Err(e) => {
                warn!(error = %e, "lyrics save failed");
                cycle.board.post_status(SAVE_FAILED);
            }
        }
    }
}

impl Module for LyricsPanel {
    fn id(&self) -> ModuleId {
        ModuleId::Lyrics
    }

    fn cycle_exempt_keys(&self) -> &'static [KeyCode] {
        EXEMPT
    }

    fn refresh(&mut self, snapshot: &Snapshot) {
        self.wanted = snapshot.current.as_ref().map(|song| LyricsKey {
            uri: song.uri.clone(),
            artist: song.artist.clone(),
            title: song.title.clone(),
        });
        self.elapsed = snapshot.status.elapsed as u64;
    }

    fn handle_input(&mut self, key: Option<KeyCode>, cycle: &mut Cycle<'_>) {
        let Some(key) = key else { return };
        if viewport_nav(&mut self.scroll, key) {
            return;
        }
        match key {
            KeyCode::Char('l') => {
                if let Some(i) = self.current {
                    self.scroll.locate(i);
                }
            }
            KeyCode::Char('\'') => self.auto_center = !self.auto_center,
            KeyCode::Char('K') => self.save(cycle),
            _ => {}
        }
    }

    fn settle(&mut self, cycle: &mut Cycle<'_>) {
        self.sync_worker(cycle);
        self.current = lrc::current_line(&self.lines, self.elapsed);
        if self.auto_center
            && !self.updating
            && let Some(i) = self.current
        {
            self.scroll.locate(i);
        }
    }

    fn paint(&self, frame: &mut Frame, area: Rect, _ctx: &PaintContext<'_>) {
        if self.updating {
            let mut scroll = ScrollState::viewport_only();
            scroll.set_height(area.height as usize);
            scroll.reset(1);
            paint_list(frame, area, &scroll, None, |_| (UPDATING.to_string(), style::muted()));
            return;
        }
        paint_list(frame, area, &self.scroll, self.current, |i| {
            let look = if self.current == Some(i) { style::accent() } else { Style::default() };
            (self.lines[i].text.clone(), look)
        });
    }

    fn on_resize(&mut self, area: Rect) {
        self.scroll.set_height(area.height as usize);
    }
}
