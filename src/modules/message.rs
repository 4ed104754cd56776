use crossterm::event::KeyCode;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Span;

use mpy_base::module::{Cycle, Module, ModuleId, PaintContext};
use mpy_base::ui::{spread, style};

/// Status messages, shown over the status bar for a few cycles.
///
/// Must settle after every other module so it sees messages they post in
/// phase 2.
#[derive(Default)]
pub struct MessageLine {
    text: String,
    countdown: u32,
}

impl MessageLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_showing(&self) -> bool {
        self.countdown > 0
    }
}

impl Module for MessageLine {
    fn id(&self) -> ModuleId {
        ModuleId::Message
    }

    fn handle_input(&mut self, _key: Option<KeyCode>, _cycle: &mut Cycle<'_>) {
        self.countdown = self.countdown.saturating_sub(1);
    }

    fn settle(&mut self, cycle: &mut Cycle<'_>) {
        if let Some(text) = cycle.board.status() {
            self.text = text.to_string();
            self.countdown = cycle.config.status_cycles;
        }
    }

    fn paint(&self, frame: &mut Frame, area: Rect, _ctx: &PaintContext<'_>) {
        if !self.is_showing() {
            return;
        }
        let text = spread(&self.text, "", area.width as usize);
        frame.render_widget(Span::styled(text, style::header()), area);
    }
}
