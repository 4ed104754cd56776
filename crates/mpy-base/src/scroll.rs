//! Viewport and selection arithmetic shared by every list-like panel.
//!
//! A [`ScrollState`] tracks the first visible row (`top`), the number of items,
//! the viewport height and, for selectable panels, the selected row. Every
//! operation keeps `top` inside `[0, max(len - height, 0)]` and the selection
//! inside `[0, len)`. With no items every operation is a no-op.

use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollState {
    top: usize,
    len: usize,
    selected: usize,
    height: usize,
    selectable: bool,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self::with_selection()
    }
}

impl ScrollState {
    /// State for a list panel with a cursor row.
    pub fn with_selection() -> Self {
        Self { top: 0, len: 0, selected: 0, height: 1, selectable: true }
    }

    /// State for a read-only panel that only moves its viewport.
    pub fn viewport_only() -> Self {
        Self { selectable: false, ..Self::with_selection() }
    }

    pub fn top(&self) -> usize {
        self.top
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Selected row, absent for viewport-only panels and empty lists.
    pub fn selected(&self) -> Option<usize> {
        (self.selectable && self.len > 0).then_some(self.selected)
    }

    /// Indices of the rows currently inside the viewport.
    pub fn visible(&self) -> Range<usize> {
        self.top..(self.top + self.height).min(self.len)
    }

    fn max_top(&self) -> usize {
        self.len.saturating_sub(self.height)
    }

    fn last(&self) -> usize {
        self.len.saturating_sub(1)
    }

    /// Scroll by the minimum amount that brings the selection into view.
    fn follow_selection(&mut self) {
        if !self.selectable {
            return;
        }
        if self.selected < self.top {
            self.top = self.selected;
        } else if self.selected >= self.top + self.height {
            self.top = self.selected + 1 - self.height;
        }
        self.top = self.top.min(self.max_top());
    }

    // ========================================================================
    // Selection movement
    // ========================================================================

    pub fn line_down(&mut self) {
        if self.len == 0 || self.selected >= self.last() {
            return;
        }
        self.selected += 1;
        self.follow_selection();
    }

    pub fn line_up(&mut self) {
        if self.len == 0 || self.selected == 0 {
            return;
        }
        self.selected -= 1;
        self.follow_selection();
    }

    pub fn page_down(&mut self) {
        if self.len == 0 {
            return;
        }
        self.selected = (self.selected + self.height).min(self.last());
        self.top = (self.top + self.height).min(self.max_top());
        self.follow_selection();
    }

    pub fn page_up(&mut self) {
        if self.len == 0 {
            return;
        }
        self.selected = self.selected.saturating_sub(self.height);
        self.top = self.top.saturating_sub(self.height);
        self.follow_selection();
    }

    /// Select the first visible row.
    pub fn to_top(&mut self) {
        if self.len == 0 {
            return;
        }
        self.selected = self.top.min(self.last());
    }

    /// Select the middle visible row.
    pub fn to_middle(&mut self) {
        if self.len == 0 {
            return;
        }
        self.selected = (self.top + self.height / 2).min(self.last());
    }

    /// Select the last visible row.
    pub fn to_bottom(&mut self) {
        if self.len == 0 {
            return;
        }
        self.selected = (self.top + self.height - 1).min(self.last());
    }

    pub fn to_first(&mut self) {
        if self.len == 0 {
            return;
        }
        self.top = 0;
        self.selected = 0;
    }

    pub fn to_last(&mut self) {
        if self.len == 0 {
            return;
        }
        self.top = self.max_top();
        self.selected = self.last();
    }

    /// Select `index` and center it in the viewport when there is room.
    ///
    /// Viewport-only panels just center the viewport on `index`.
    pub fn locate(&mut self, index: usize) {
        if self.len == 0 {
            return;
        }
        let index = index.min(self.last());
        if self.selectable {
            self.selected = index;
        }
        self.top = index.saturating_sub(self.height / 2).min(self.max_top());
    }

    // ========================================================================
    // Viewport-only movement
    // ========================================================================

    pub fn scroll_line_down(&mut self) {
        self.top = (self.top + 1).min(self.max_top());
    }

    pub fn scroll_line_up(&mut self) {
        self.top = self.top.saturating_sub(1);
    }

    pub fn scroll_page_down(&mut self) {
        self.top = (self.top + self.height).min(self.max_top());
    }

    pub fn scroll_page_up(&mut self) {
        self.top = self.top.saturating_sub(self.height);
    }

    // ========================================================================
    // Housekeeping
    // ========================================================================

    /// Apply a new viewport height, keeping the selected item selected.
    pub fn set_height(&mut self, height: usize) {
        self.height = height.max(1);
        self.top = self.top.min(self.max_top());
        self.follow_selection();
    }

    /// Start over on a freshly built list.
    pub fn reset(&mut self, len: usize) {
        self.len = len;
        self.top = 0;
        self.selected = 0;
    }

    /// Keep the current position on a rebuilt list, clamped to its new length.
    pub fn revalidate(&mut self, len: usize) {
        self.len = len;
        self.selected = self.selected.min(self.last());
        self.top = self.top.min(self.max_top());
        self.follow_selection();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(len: usize, height: usize) -> ScrollState {
        let mut s = ScrollState::with_selection();
        s.set_height(height);
        s.reset(len);
        s
    }

    fn assert_bounds(s: &ScrollState) {
        assert!(s.top() <= s.len().saturating_sub(s.height()), "top out of range: {:?}", s);
        if let Some(sel) = s.selected() {
            assert!(sel < s.len(), "selection out of range: {:?}", s);
            assert!(s.visible().contains(&sel), "selection not visible: {:?}", s);
        }
    }

    #[test]
    fn page_down_clamps_at_the_end() {
        let mut s = list(100, 10);
        for _ in 0..9 {
            s.page_down();
        }
        assert_eq!(s.selected(), Some(90));
        assert_eq!(s.top(), 90);

        s.page_down();
        assert_eq!(s.selected(), Some(99));
        assert_eq!(s.top(), 90);

        s.page_down();
        assert_eq!(s.selected(), Some(99));
        assert_eq!(s.top(), 90);
    }

    #[test]
    fn line_down_scrolls_just_enough() {
        let mut s = list(20, 5);
        for _ in 0..4 {
            s.line_down();
        }
        assert_eq!((s.selected(), s.top()), (Some(4), 0));
        s.line_down();
        assert_eq!((s.selected(), s.top()), (Some(5), 1));
        for _ in 0..5 {
            s.line_up();
        }
        assert_eq!((s.selected(), s.top()), (Some(0), 0));
    }

    #[test]
    fn locate_centers_and_round_trips() {
        let mut s = list(50, 10);
        s.locate(20);
        assert_eq!((s.selected(), s.top()), (Some(20), 15));
        s.line_down();
        s.line_up();
        assert_eq!(s.selected(), Some(20));

        s.locate(2);
        assert_eq!(s.top(), 0);
        s.locate(48);
        assert_eq!(s.top(), 40);
    }

    #[test]
    fn viewport_jumps() {
        let mut s = list(30, 10);
        s.scroll_page_down();
        s.to_top();
        assert_eq!(s.selected(), Some(10));
        s.to_middle();
        assert_eq!(s.selected(), Some(15));
        s.to_bottom();
        assert_eq!(s.selected(), Some(19));
        s.to_last();
        assert_eq!((s.selected(), s.top()), (Some(29), 20));
        s.to_first();
        assert_eq!((s.selected(), s.top()), (Some(0), 0));
    }

    #[test]
    fn short_list_jumps_clamp_to_last_item() {
        let mut s = list(3, 10);
        s.to_bottom();
        assert_eq!(s.selected(), Some(2));
        s.to_middle();
        assert_eq!(s.selected(), Some(2));
        s.page_down();
        assert_eq!((s.selected(), s.top()), (Some(2), 0));
    }

    #[test]
    fn empty_list_is_inert() {
        let mut s = list(0, 10);
        s.line_down();
        s.page_down();
        s.to_last();
        s.locate(5);
        s.scroll_page_down();
        assert_eq!(s.selected(), None);
        assert_eq!(s.top(), 0);
    }

    #[test]
    fn viewport_only_has_no_selection() {
        let mut s = ScrollState::viewport_only();
        s.set_height(4);
        s.reset(10);
        assert_eq!(s.selected(), None);
        s.scroll_page_down();
        s.scroll_page_down();
        assert_eq!(s.top(), 6);
        s.scroll_line_down();
        assert_eq!(s.top(), 6);
        s.scroll_line_up();
        assert_eq!(s.top(), 5);
        s.locate(1);
        assert_eq!(s.top(), 0);
    }

    #[test]
    fn resize_keeps_selection() {
        let mut s = list(100, 20);
        s.locate(50);
        s.set_height(5);
        assert_eq!(s.selected(), Some(50));
        assert_bounds(&s);
        s.set_height(200);
        assert_eq!((s.selected(), s.top()), (Some(50), 0));
        s.set_height(0);
        assert_eq!(s.height(), 1);
        assert_bounds(&s);
    }

    #[test]
    fn revalidate_clamps_to_shorter_list() {
        let mut s = list(100, 10);
        s.to_last();
        s.revalidate(40);
        assert_eq!((s.selected(), s.top()), (Some(39), 30));
        s.revalidate(0);
        assert_eq!(s.selected(), None);
        assert_eq!(s.top(), 0);
    }

    #[test]
    fn bounds_hold_over_mixed_operations() {
        let mut s = list(37, 7);
        // Small LCG so the sequence is deterministic.
        let mut seed: u64 = 0x2545_f491;
        for step in 0..2000 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            match (seed >> 33) % 14 {
                0 => s.line_down(),
                1 => s.line_up(),
                2 => s.page_down(),
                3 => s.page_up(),
                4 => s.to_top(),
                5 => s.to_middle(),
                6 => s.to_bottom(),
                7 => s.to_first(),
                8 => s.to_last(),
                9 => s.locate((seed >> 40) as usize % 50),
                10 => s.set_height((seed >> 45) as usize % 12),
                11 => s.revalidate((seed >> 20) as usize % 60),
                12 => s.scroll_page_down(),
                _ => s.scroll_line_up(),
            }
            if step % 97 == 0 {
                s.reset((seed >> 10) as usize % 40);
            }
            if s.selected().is_some() {
                assert!(s.top() <= s.len().saturating_sub(s.height()));
                assert!(s.selected().is_some_and(|sel| sel < s.len()));
            }
        }
    }
}
