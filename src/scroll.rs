//! Pin-to-end auto-scroll bookkeeping for the transcript view.
//!
//! While a reply streams in, the transcript should follow the newest content,
//! but a user who scrolls up to reread something must not be yanked back
//! down. The controller keeps one bit of state: whether the view is pinned
//! to the end. Scrolling upward unpins; returning close enough to the end
//! re-pins.

/// Distance from the end, in scroll units, still considered "at the end".
pub const PIN_THRESHOLD: f64 = 25.0;

#[derive(Debug, Clone)]
pub struct AutoScrollController {
    pinned: bool,
    last_offset: f64,
}

impl Default for AutoScrollController {
    fn default() -> Self {
        Self {
            pinned: true,
            last_offset: 0.0,
        }
    }
}

impl AutoScrollController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called when content grows; `max_offset` is the new end-of-content
    /// scroll position. Returns the offset to scroll to, or `None` when the
    /// view is unpinned and must stay where the user put it.
    pub fn on_content_grown(&mut self, max_offset: f64) -> Option<f64> {
        if self.pinned {
            self.last_offset = max_offset;
            Some(max_offset)
        } else {
            None
        }
    }

    /// Called on every user-driven scroll with the current offset and the
    /// end-of-content offset.
    pub fn on_user_scroll(&mut self, offset: f64, max_offset: f64) {
        if offset >= max_offset - PIN_THRESHOLD {
            self.pinned = true;
        } else if offset < self.last_offset {
            self.pinned = false;
        }
        self.last_offset = offset;
    }

    /// Forces pinned state, used when a new message is submitted.
    pub fn pin(&mut self) {
        self.pinned = true;
    }

    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_pinned_and_follows_growth() {
        let mut scroll = AutoScrollController::new();
        assert!(scroll.is_pinned());
        assert_eq!(scroll.on_content_grown(100.0), Some(100.0));
        assert_eq!(scroll.on_content_grown(180.0), Some(180.0));
    }

    #[test]
    fn scrolling_up_unpins_and_growth_no_longer_moves_view() {
        let mut scroll = AutoScrollController::new();
        scroll.on_content_grown(200.0);

        scroll.on_user_scroll(150.0, 200.0);
        assert!(!scroll.is_pinned());
        assert_eq!(scroll.on_content_grown(260.0), None);
    }

    #[test]
    fn returning_within_threshold_of_end_repins() {
        let mut scroll = AutoScrollController::new();
        scroll.on_content_grown(200.0);
        scroll.on_user_scroll(100.0, 200.0);
        assert!(!scroll.is_pinned());

        scroll.on_user_scroll(180.0, 200.0);
        assert!(scroll.is_pinned());
        assert_eq!(scroll.on_content_grown(300.0), Some(300.0));
    }

    #[test]
    fn scrolling_down_but_short_of_threshold_stays_unpinned() {
        let mut scroll = AutoScrollController::new();
        scroll.on_content_grown(200.0);
        scroll.on_user_scroll(100.0, 200.0);

        scroll.on_user_scroll(150.0, 200.0);
        assert!(!scroll.is_pinned());
    }

    #[test]
    fn pin_forces_follow_regardless_of_position() {
        let mut scroll = AutoScrollController::new();
        scroll.on_content_grown(200.0);
        scroll.on_user_scroll(10.0, 200.0);
        assert!(!scroll.is_pinned());

        scroll.pin();
        assert_eq!(scroll.on_content_grown(240.0), Some(240.0));
    }
}
