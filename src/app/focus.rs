use crossterm::event::KeyCode;
use tracing::info;

use mpy_base::board::{Board, Entry, Topic};
use mpy_base::module::ModuleId;

/// Which body panel receives keys, and the one to go back to.
#[derive(Debug)]
pub struct Focus {
    current: ModuleId,
    previous: ModuleId,
}

impl Default for Focus {
    fn default() -> Self {
        Self { current: ModuleId::Queue, previous: ModuleId::Queue }
    }
}

impl Focus {
    pub fn current(&self) -> ModuleId {
        self.current
    }

    pub fn previous(&self) -> ModuleId {
        self.previous
    }

    fn switch(&mut self, to: ModuleId) {
        if to == self.current {
            return;
        }
        info!(from = self.current.name(), to = to.name(), "focus");
        self.previous = self.current;
        self.current = to;
    }

    /// Function keys and `h`, evaluated against the focus phase 1 ran with.
    pub fn on_key(&mut self, key: Option<KeyCode>) {
        let target = match key {
            Some(KeyCode::F(1)) => ModuleId::Help,
            Some(KeyCode::F(2)) => ModuleId::Queue,
            Some(KeyCode::F(3)) => ModuleId::Database,
            Some(KeyCode::F(4)) => ModuleId::Lyrics,
            Some(KeyCode::F(5)) => ModuleId::Library,
            Some(KeyCode::F(6)) => ModuleId::Search,
            // Inside Info, `h` is the panel's own back request.
            Some(KeyCode::Char('h')) if self.current != ModuleId::Info => ModuleId::Info,
            _ => return,
        };
        self.switch(target);
    }

    /// Requests posted during the cycle: a focus change, then a back request.
    pub fn apply_board(&mut self, board: &Board) {
        if let Some(Entry::Focus(to)) = board.get(Topic::Focus) {
            self.switch(*to);
        }
        if board.contains(Topic::Back) {
            self.switch(self.previous);
        }
    }
}
