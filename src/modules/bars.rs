//! One-row bars around the body panel.

use crossterm::event::KeyCode;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Span;

use mpy_base::module::{Cycle, Module, ModuleId, PaintContext};
use mpy_base::snapshot::Status;
use mpy_base::ui::{format_time, spread, style};

fn flags(status: &Status) -> String {
    [(status.consume, "[con]"), (status.random, "[ran]"), (status.repeat, "[rep]"), (status.single, "[sin]")]
        .iter()
        .map(|&(on, tag)| if on { tag } else { "     " })
        .collect()
}

fn bar(frame: &mut Frame, area: Rect, text: String) {
    frame.render_widget(Span::styled(text, style::header()), area);
}

/// Focused panel name, mode flags and volume.
pub struct MenuBar;

impl Module for MenuBar {
    fn id(&self) -> ModuleId {
        ModuleId::Menu
    }

    fn handle_input(&mut self, _key: Option<KeyCode>, _cycle: &mut Cycle<'_>) {}

    fn paint(&self, frame: &mut Frame, area: Rect, ctx: &PaintContext<'_>) {
        let status = &ctx.snapshot.status;
        let volume = status.volume.map_or_else(|| "n/a".to_string(), |v| format!("{}%", v));
        let right = format!("{}    Volume: {}", flags(status), volume);
        bar(frame, area, spread(ctx.focused.name(), &right, area.width as usize));
    }
}

pub struct TitleBar;

impl Module for TitleBar {
    fn id(&self) -> ModuleId {
        ModuleId::Title
    }

    fn handle_input(&mut self, _key: Option<KeyCode>, _cycle: &mut Cycle<'_>) {}

    fn paint(&self, frame: &mut Frame, area: Rect, _ctx: &PaintContext<'_>) {
        frame.render_widget(Span::styled("-".repeat(area.width as usize), style::muted()), area);
    }
}

/// `===0----` proportional to the elapsed time.
pub struct ProgressBar;

impl ProgressBar {
    pub fn render(status: &Status, width: usize) -> String {
        if width == 0 {
            return String::new();
        }
        if !status.is_active() || status.duration == 0 {
            return "-".repeat(width);
        }
        let elapsed = status.elapsed.min(status.duration) as usize;
        let pos = elapsed * (width - 1) / status.duration as usize;
        format!("{}0{}", "=".repeat(pos), "-".repeat(width - pos - 1))
    }
}

impl Module for ProgressBar {
    fn id(&self) -> ModuleId {
        ModuleId::Progress
    }

    fn handle_input(&mut self, _key: Option<KeyCode>, _cycle: &mut Cycle<'_>) {}

    fn paint(&self, frame: &mut Frame, area: Rect, ctx: &PaintContext<'_>) {
        let text = Self::render(&ctx.snapshot.status, area.width as usize);
        frame.render_widget(Span::styled(text, style::accent()), area);
    }
}

/// Play state, current title and `[elapsed ~ total]`.
pub struct StatusBar;

impl Module for StatusBar {
    fn id(&self) -> ModuleId {
        ModuleId::Status
    }

    fn handle_input(&mut self, _key: Option<KeyCode>, _cycle: &mut Cycle<'_>) {}

    fn paint(&self, frame: &mut Frame, area: Rect, ctx: &PaintContext<'_>) {
        let status = &ctx.snapshot.status;
        let title = ctx.snapshot.current.as_ref().map_or("", |s| s.display_title());
        let left = format!("{} > {}", status.state.label(), title);
        let right = format!("[{} ~ {}]", format_time(status.elapsed as u64), format_time(status.duration as u64));
        bar(frame, area, spread(&left, &right, area.width as usize));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpy_base::snapshot::PlayState;

    #[test]
    fn progress_marker() {
        let mut status = Status::default();
        assert_eq!(ProgressBar::render(&status, 5), "-----");
        status.state = PlayState::Play;
        status.duration = 100;
        status.elapsed = 50;
        assert_eq!(ProgressBar::render(&status, 5), "==0--");
        status.elapsed = 100;
        assert_eq!(ProgressBar::render(&status, 5), "====0");
        assert_eq!(ProgressBar::render(&status, 0), "");
    }

    #[test]
    fn mode_flags_keep_their_columns() {
        let mut status = Status::default();
        status.random = true;
        status.single = true;
        assert_eq!(flags(&status), "     [ran]     [sin]");
    }
}
