//! Incremental search inside list panels (`/`, `?`, `n`, `N`).

use crossterm::event::KeyCode;

use crate::board::Board;
use crate::scroll::ScrollState;

pub const SEARCH_KEYS: &[KeyCode] = &[KeyCode::Char('/'), KeyCode::Char('?'), KeyCode::Char('n'), KeyCode::Char('N')];

/// Last pattern entered at the prompt and the direction it was entered with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPattern {
    text: String,
    forward: bool,
}

impl SearchPattern {
    pub fn set(&mut self, text: impl Into<String>, forward: bool) {
        self.text = text.into();
        self.forward = forward;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Direction `key` searches in, `None` if it is not a search key or no
    /// pattern has been entered yet.
    fn direction(&self, key: KeyCode) -> Option<bool> {
        if self.text.is_empty() {
            return None;
        }
        match key {
            KeyCode::Char('/') => Some(true),
            KeyCode::Char('?') => Some(false),
            KeyCode::Char('n') => Some(self.forward),
            KeyCode::Char('N') => Some(!self.forward),
            _ => None,
        }
    }
}

/// Move the selection to the next row whose label contains the pattern.
///
/// Returns `false` when `key` is not a search key. Wrapping past either end
/// and missing matches are reported on the board.
pub fn step<'a>(
    scroll: &mut ScrollState,
    key: KeyCode,
    pattern: &SearchPattern,
    board: &mut Board,
    label: impl Fn(usize) -> &'a str,
) -> bool {
    if !SEARCH_KEYS.contains(&key) {
        return false;
    }
    let Some(forward) = pattern.direction(key) else {
        return true;
    };
    let len = scroll.len();
    let from = scroll.selected().unwrap_or(0);

    for step in 1..=len {
        let i = if forward { (from + step) % len } else { (from + len * step - step) % len };
        if !label(i).contains(pattern.text()) {
            continue;
        }
        if forward && i <= from {
            board.post_status("search hit BOTTOM, continuing at TOP");
        } else if !forward && i >= from {
            board.post_status("search hit TOP, continuing at BOTTOM");
        }
        scroll.locate(i);
        return true;
    }

    board.post_status(format!("Pattern not found: {}", pattern.text()));
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITEMS: &[&str] = &["alpha", "beta", "gamma", "alphabet", "delta"];

    fn scroll_at(sel: usize) -> ScrollState {
        let mut s = ScrollState::with_selection();
        s.set_height(3);
        s.reset(ITEMS.len());
        s.locate(sel);
        s
    }

    #[test]
    fn forward_and_repeat() {
        let mut board = Board::new();
        let mut pattern = SearchPattern::default();
        pattern.set("alpha", true);
        let mut s = scroll_at(0);

        assert!(step(&mut s, KeyCode::Char('n'), &pattern, &mut board, |i| ITEMS[i]));
        assert_eq!(s.selected(), Some(3));
        assert!(board.is_empty());

        step(&mut s, KeyCode::Char('n'), &pattern, &mut board, |i| ITEMS[i]);
        assert_eq!(s.selected(), Some(0));
        assert_eq!(board.status(), Some("search hit BOTTOM, continuing at TOP"));
    }

    #[test]
    fn backward_wraps_to_bottom() {
        let mut board = Board::new();
        let mut pattern = SearchPattern::default();
        pattern.set("ta", false);
        let mut s = scroll_at(0);

        step(&mut s, KeyCode::Char('n'), &pattern, &mut board, |i| ITEMS[i]);
        assert_eq!(s.selected(), Some(4));
        assert_eq!(board.status(), Some("search hit TOP, continuing at BOTTOM"));

        board.clear();
        step(&mut s, KeyCode::Char('N'), &pattern, &mut board, |i| ITEMS[i]);
        assert_eq!(s.selected(), Some(1));
        assert!(board.status().unwrap().starts_with("search hit BOTTOM"));
    }

    #[test]
    fn no_match_and_non_search_keys() {
        let mut board = Board::new();
        let mut pattern = SearchPattern::default();
        let mut s = scroll_at(2);

        assert!(!step(&mut s, KeyCode::Char('j'), &pattern, &mut board, |i| ITEMS[i]));
        assert!(step(&mut s, KeyCode::Char('n'), &pattern, &mut board, |i| ITEMS[i]));
        assert!(board.is_empty());

        pattern.set("zeta", true);
        step(&mut s, KeyCode::Char('/'), &pattern, &mut board, |i| ITEMS[i]);
        assert_eq!(s.selected(), Some(2));
        assert_eq!(board.status(), Some("Pattern not found: zeta"));
    }
}
