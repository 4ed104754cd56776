use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use tracing::{debug, info};

use mpy_base::board::Board;
use mpy_base::config::Config;
use mpy_base::module::{Cycle, Module, PaintContext};
use mpy_base::pending::PendingQueue;
use mpy_base::remote::PlaybackService;
use mpy_base::search::SearchPattern;
use mpy_base::snapshot::Snapshot;

use super::AppError;
use super::controls::Controls;
use super::focus::Focus;
use super::sync::{Event, KeySets, Link, Verdict, classify};
use crate::ui::Areas;
use crate::ui::surface::{Input, Surface};

/// Borrow the per-cycle context out of the controller's fields, leaving
/// `modules`, `snapshot` and `focus` free.
macro_rules! cycle {
    ($this:ident, $online:expr) => {
        Cycle {
            board: &mut $this.board,
            remote: &mut $this.remote,
            pending: &mut $this.pending,
            prompt: &mut $this.surface,
            search: &$this.search,
            config: &$this.config,
            online: $online,
        }
    };
}

/// Owns the connection, the screen and every panel, and drives one cycle per
/// event until quit.
pub struct Controller<R, S> {
    pub(super) remote: R,
    pub(super) surface: S,
    pub(super) config: Config,
    pub(super) snapshot: Snapshot,
    pub(super) board: Board,
    pub(super) pending: PendingQueue,
    pub(super) search: SearchPattern,
    pub(super) modules: Vec<Box<dyn Module>>,
    pub(super) focus: Focus,
    controls: Controls,
    pub(super) link: Link,
    last_key: Option<KeyCode>,
    areas: Areas,
}

impl<R, S> Controller<R, S>
where
    R: PlaybackService + 'static,
    S: Surface + 'static,
{
    /// `modules` is the cycle order; the message line belongs last.
    pub fn new(remote: R, surface: S, config: Config, modules: Vec<Box<dyn Module>>) -> Self {
        Self {
            remote,
            surface,
            config,
            snapshot: Snapshot::default(),
            board: Board::new(),
            pending: PendingQueue::new(),
            search: SearchPattern::default(),
            modules,
            focus: Focus::default(),
            controls: Controls::default(),
            link: Link::default(),
            last_key: None,
            areas: Areas::default(),
        }
    }

    pub fn run(&mut self) -> Result<(), AppError> {
        self.handle_resize()?;
        info!(modules = self.modules.len(), "controller started");
        let mut event = Event::Startup;
        while self.run_cycle(event)? {
            event = self.next_event()?;
        }
        info!("quit");
        Ok(())
    }

    /// Re-layout every panel for the current screen size.
    pub fn handle_resize(&mut self) -> Result<(), AppError> {
        self.areas = Areas::split(self.surface.area()?);
        for module in &mut self.modules {
            module.on_resize(self.areas.of(module.id()));
        }
        Ok(())
    }

    /// Block until input, a server notification or the polling timeout.
    fn next_event(&mut self) -> Result<Event, AppError> {
        let deadline = Instant::now() + Duration::from_millis(self.config.poll_interval_ms);
        let slice = Duration::from_millis(self.config.input_slice_ms);
        loop {
            if self.link.is_idle() && self.remote.notification_pending() {
                return Ok(Event::Notification);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(Event::Timeout);
            }
            let wait = if self.link.is_idle() { slice.min(deadline - now) } else { deadline - now };
            match self.surface.poll_input(wait)? {
                Some(Input::Key(key)) => return Ok(Event::Input(key)),
                Some(Input::Resize(w, h)) => return Ok(Event::Resize(w, h)),
                None => {}
            }
        }
    }

    fn keys(&self) -> KeySets<'_> {
        let focused = self.focus.current();
        self.modules.iter().find(|m| m.id() == focused).map(|m| KeySets::of(m.as_ref())).unwrap_or_default()
    }

    /// One full cycle for `event`. Returns `false` once the user quits.
    pub fn run_cycle(&mut self, event: Event) -> Result<bool, AppError> {
        let verdict = classify(event, self.snapshot.status.is_playing(), self.last_key, &self.keys());
        if verdict == Verdict::Quit {
            return Ok(false);
        }
        let key = match event {
            Event::Input(key) => Some(key),
            _ => None,
        };
        self.last_key = key;

        if let Event::Resize(..) = event {
            self.handle_resize()?;
        }
        self.board.clear();

        let failure = match verdict {
            Verdict::Sync { partial } => self.sync(partial)?,
            _ => None,
        };
        let online = !self.link.is_idle();

        let found = self.controls.handle(key, &mut self.snapshot, &mut cycle!(self, online));
        if let Some((text, forward)) = found {
            self.search.set(text, forward);
        }

        let focused = self.focus.current();
        for module in &mut self.modules {
            let key = if module.id() == focused { key } else { None };
            module.handle_input(key, &mut cycle!(self, online));
        }
        if let Some(message) = failure {
            self.board.post_status(message);
        }
        self.focus.on_key(key);

        for module in &mut self.modules {
            module.settle(&mut cycle!(self, online));
        }
        self.focus.apply_board(&self.board);

        self.paint()?;

        if !matches!(event, Event::Input(_) | Event::Resize(..)) {
            self.link.enter_idle(&mut self.remote)?;
        }
        Ok(true)
    }

    /// Leave notification mode, send held-back writes and refresh every
    /// panel. A rejected batch is dropped whole; its message is returned for
    /// the board and the panels fall back to the server's state.
    fn sync(&mut self, partial: bool) -> Result<Option<String>, AppError> {
        self.link.leave_idle(&mut self.remote)?;

        let mut failure = None;
        if !partial && let Err(e) = self.pending.flush(&mut self.remote) {
            if e.is_fatal() {
                return Err(e.into());
            }
            for module in &mut self.modules {
                module.discard_speculative();
            }
            self.snapshot.invalidate_queue();
            failure = Some(e.to_string());
        }

        self.snapshot.refresh(&mut self.remote, partial, self.config.ratings)?;
        for module in &mut self.modules {
            module.refresh(&self.snapshot);
        }
        debug!(partial, state = self.snapshot.status.state.label(), "synced");
        Ok(failure)
    }

    /// Bars always, body panels only when focused.
    fn paint(&mut self) -> Result<(), AppError> {
        let focused = self.focus.current();
        let modules = &self.modules;
        let ctx = PaintContext { snapshot: &self.snapshot, focused };
        self.surface.draw(&mut |frame| {
            let areas = Areas::split(frame.area());
            for module in modules {
                let id = module.id();
                if id.is_bar() || id == focused {
                    module.paint(frame, areas.of(id), &ctx);
                }
            }
        })?;
        Ok(())
    }
}
