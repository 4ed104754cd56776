//! The contract every panel implements, and the per-cycle context it runs in.

use crossterm::event::KeyCode;
use ratatui::Frame;
use ratatui::layout::Rect;
use tracing::warn;

use crate::board::Board;
use crate::config::Config;
use crate::pending::PendingQueue;
use crate::remote::{Command, PlaybackService, RemoteError};
use crate::search::SearchPattern;
use crate::snapshot::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModuleId {
    Menu,
    Title,
    Progress,
    Status,
    Message,
    Help,
    Queue,
    Database,
    Lyrics,
    Library,
    Search,
    Info,
}

impl ModuleId {
    pub fn name(self) -> &'static str {
        match self {
            ModuleId::Menu => "Menu",
            ModuleId::Title => "Title",
            ModuleId::Progress => "Progress",
            ModuleId::Status => "Status",
            ModuleId::Message => "Message",
            ModuleId::Help => "Help",
            ModuleId::Queue => "Queue",
            ModuleId::Database => "Database",
            ModuleId::Lyrics => "Lyrics",
            ModuleId::Library => "Artist-Album",
            ModuleId::Search => "Search",
            ModuleId::Info => "Info",
        }
    }

    /// Bars are always painted; body panels only when focused.
    pub fn is_bar(self) -> bool {
        matches!(self, ModuleId::Menu | ModuleId::Title | ModuleId::Progress | ModuleId::Status | ModuleId::Message)
    }
}

/// Blocking single-line text entry on the message line.
pub trait Prompt {
    /// Returns `None` when the user cancels.
    fn prompt(&mut self, label: &str) -> Option<String>;
}

/// Everything a panel may touch during phase 1 and phase 2 of one cycle.
pub struct Cycle<'a> {
    pub board: &'a mut Board,
    pub remote: &'a mut dyn PlaybackService,
    pub pending: &'a mut PendingQueue,
    pub prompt: &'a mut dyn Prompt,
    pub search: &'a SearchPattern,
    pub config: &'a Config,
    /// Whether the connection is out of notification mode, so commands can be sent.
    pub online: bool,
}

impl Cycle<'_> {
    /// Turn a rejected request into a status message.
    pub fn report<T>(&mut self, result: Result<T, RemoteError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "remote request failed");
                self.board.post_status(e.to_string());
                None
            }
        }
    }

    /// Send `command` now, reporting any rejection. Returns whether it was accepted.
    pub fn execute(&mut self, command: Command) -> bool {
        let result = self.remote.execute(&command);
        self.report(result).is_some()
    }

    /// Send `command` now if the connection is usable, else hold it for the next sync.
    pub fn dispatch(&mut self, command: Command) {
        if self.online {
            self.execute(command);
        } else {
            self.pending.push(command);
        }
    }
}

/// Read-only inputs for painting.
pub struct PaintContext<'a> {
    pub snapshot: &'a Snapshot,
    pub focused: ModuleId,
}

/// A panel driven by the controller's three-phase cycle.
pub trait Module {
    fn id(&self) -> ModuleId;

    /// Keys that never need the server.
    fn cycle_exempt_keys(&self) -> &'static [KeyCode] {
        &[]
    }

    /// Keys whose effects are held back until a later sync.
    fn partial_sync_keys(&self) -> &'static [KeyCode] {
        &[]
    }

    /// Pull fresh server state. Runs at the start of every sync cycle and must not block.
    fn refresh(&mut self, _snapshot: &Snapshot) {}

    /// Drop local edits that were never confirmed by the server.
    fn discard_speculative(&mut self) {}

    /// Phase 1. `key` is `None` unless this panel has focus.
    fn handle_input(&mut self, key: Option<KeyCode>, cycle: &mut Cycle<'_>);

    /// Phase 2. Runs after every panel has seen phase 1.
    fn settle(&mut self, _cycle: &mut Cycle<'_>) {}

    /// Phase 3. Must not change model state.
    fn paint(&self, frame: &mut Frame, area: Rect, ctx: &PaintContext<'_>);

    fn on_resize(&mut self, _area: Rect) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakePrompt, FakeRemote};

    #[test]
    fn dispatch_defers_while_offline() {
        let mut board = Board::new();
        let mut remote = FakeRemote::default();
        let mut pending = PendingQueue::new();
        let mut prompt = FakePrompt::default();
        let search = SearchPattern::default();
        let config = Config::default();
        let mut cycle = Cycle {
            board: &mut board,
            remote: &mut remote,
            pending: &mut pending,
            prompt: &mut prompt,
            search: &search,
            config: &config,
            online: false,
        };
        cycle.dispatch(Command::Stop);
        cycle.online = true;
        cycle.dispatch(Command::Next);

        assert_eq!(pending.commands(), &[Command::Stop]);
        assert_eq!(remote.executed, vec![Command::Next]);
    }

    #[test]
    fn rejected_command_becomes_status() {
        let mut board = Board::new();
        let mut remote = FakeRemote::default();
        remote.reject("load", "No such playlist");
        let mut pending = PendingQueue::new();
        let mut prompt = FakePrompt::default();
        let search = SearchPattern::default();
        let config = Config::default();
        let mut cycle = Cycle {
            board: &mut board,
            remote: &mut remote,
            pending: &mut pending,
            prompt: &mut prompt,
            search: &search,
            config: &config,
            online: true,
        };
        assert!(!cycle.execute(Command::Load("missing".into())));
        assert_eq!(board.status(), Some("No such playlist"));
    }

    #[test]
    fn bar_classification() {
        assert!(ModuleId::Message.is_bar());
        assert!(!ModuleId::Queue.is_bar());
        assert_eq!(ModuleId::Library.name(), "Artist-Album");
    }
}
