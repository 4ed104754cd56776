pub mod surface;

use ratatui::layout::{Constraint, Layout, Rect};

use mpy_base::module::ModuleId;

/// Screen rows: menu, title rule, body, progress, status (shared with the
/// message line).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Areas {
    pub menu: Rect,
    pub title: Rect,
    pub body: Rect,
    pub progress: Rect,
    pub status: Rect,
}

impl Areas {
    pub fn split(area: Rect) -> Self {
        let [menu, title, body, progress, status] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);
        Self { menu, title, body, progress, status }
    }

    pub fn of(&self, id: ModuleId) -> Rect {
        match id {
            ModuleId::Menu => self.menu,
            ModuleId::Title => self.title,
            ModuleId::Progress => self.progress,
            ModuleId::Status | ModuleId::Message => self.status,
            _ => self.body,
        }
    }
}
