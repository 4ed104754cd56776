use crossterm::event::KeyCode;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::scroll::ScrollState;

// =============================================================================
// Styles
// =============================================================================

pub mod style {
    use ratatui::style::{Color, Modifier, Style};

    pub fn selected() -> Style {
        Style::default().add_modifier(Modifier::REVERSED)
    }

    pub fn current() -> Style {
        Style::default().add_modifier(Modifier::BOLD)
    }

    pub fn header() -> Style {
        Style::default().add_modifier(Modifier::BOLD)
    }

    pub fn muted() -> Style {
        Style::default().fg(Color::DarkGray)
    }

    pub fn accent() -> Style {
        Style::default().fg(Color::Cyan)
    }
}

// =============================================================================
// Text helpers
// =============================================================================

/// `m:ss`, or `h:mm:ss` past an hour.
pub fn format_time(seconds: u64) -> String {
    let (h, m, s) = (seconds / 3600, seconds / 60 % 60, seconds % 60);
    if h > 0 { format!("{}:{:02}:{:02}", h, m, s) } else { format!("{}:{:02}", m, s) }
}

/// Truncate `text` to at most `width` terminal columns.
pub fn fit(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        out.push(ch);
    }
    out
}

/// `left` and `right` on one line of `width` columns, `left` truncated first.
pub fn spread(left: &str, right: &str, width: usize) -> String {
    let right = fit(right, width);
    let room = width - right.width();
    let left = fit(left, room);
    let gap = room - left.width();
    format!("{}{}{}", left, " ".repeat(gap), right)
}

// =============================================================================
// Lists
// =============================================================================

/// Cursor keys every list panel understands. Returns whether `key` was one.
pub fn list_nav(scroll: &mut ScrollState, key: KeyCode) -> bool {
    match key {
        KeyCode::Char('j') => scroll.line_down(),
        KeyCode::Char('k') => scroll.line_up(),
        KeyCode::Char('f') => scroll.page_down(),
        KeyCode::Char('b') => scroll.page_up(),
        KeyCode::Char('H') => scroll.to_top(),
        KeyCode::Char('M') => scroll.to_middle(),
        KeyCode::Char('L') => scroll.to_bottom(),
        KeyCode::Char('g') => scroll.to_first(),
        KeyCode::Char('G') => scroll.to_last(),
        _ => return false,
    }
    true
}

/// Viewport keys for panels without a cursor.
pub fn viewport_nav(scroll: &mut ScrollState, key: KeyCode) -> bool {
    match key {
        KeyCode::Char('j') => scroll.scroll_line_down(),
        KeyCode::Char('k') => scroll.scroll_line_up(),
        KeyCode::Char('f') => scroll.scroll_page_down(),
        KeyCode::Char('b') => scroll.scroll_page_up(),
        _ => return false,
    }
    true
}

/// Paint the visible slice of a list. `row` gives each row's text and base
/// style; the selected row is reversed and `current` (e.g. the playing song)
/// is bold.
pub fn paint_list(
    frame: &mut Frame,
    area: Rect,
    scroll: &ScrollState,
    current: Option<usize>,
    row: impl Fn(usize) -> (String, Style),
) {
    let width = area.width as usize;
    let lines: Vec<Line> = scroll
        .visible()
        .map(|i| {
            let (text, mut look) = row(i);
            if current == Some(i) {
                look = look.patch(style::current());
            }
            if scroll.selected() == Some(i) {
                look = look.patch(style::selected());
            }
            let text = fit(&text, width);
            let pad = width.saturating_sub(text.width());
            Line::from(Span::styled(format!("{}{}", text, " ".repeat(pad)), look))
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}
