//! Per-scan bookkeeping: cursor, records, scroll calibration, progress.

use image::RgbaImage;

use super::filter::ScanFilter;
use super::state::ScanState;
use crate::artifact::ArtifactRecord;
use crate::calibration::GridGeometry;

/// Learned scroll calibration and the sticky end-of-list flag.
#[derive(Debug, Clone, Default)]
pub struct ScrollTracker {
    ticks_per_page: Option<u32>,
    reached_end: bool,
}

impl ScrollTracker {
    /// Wheel ticks that can be sent blind before watching boundaries for the
    /// final card, once a full-page scroll has been measured.
    pub fn fast_forward_ticks(&self, cards: i32, rows: u32) -> Option<u32> {
        let ticks = self.ticks_per_page.filter(|&t| t > 0)?;
        if cards.unsigned_abs() <= 1 || rows == 0 {
            return None;
        }
        Some((ticks as f64 * (cards.unsigned_abs() as f64 - 0.5) / rows as f64) as u32)
    }

    /// Records the tick count of an uninterrupted full-page scroll.
    pub fn learn(&mut self, ticks: u32) {
        self.ticks_per_page = Some(ticks);
    }

    pub fn ticks_per_page(&self) -> Option<u32> {
        self.ticks_per_page
    }

    pub fn mark_end(&mut self) {
        self.reached_end = true;
    }

    pub fn reached_end(&self) -> bool {
        self.reached_end
    }
}

/// Counts card boundaries passing the anchor strip while scrolling.
///
/// The strip matches its reference while it shows the gap between card rows;
/// each return to the gap after leaving it is one card scrolled.
#[derive(Debug, Clone)]
pub struct BoundaryCounter {
    remaining: u32,
    in_gap: bool,
}

impl BoundaryCounter {
    pub fn new(cards: u32) -> Self {
        Self {
            remaining: cards,
            in_gap: true,
        }
    }

    /// Feeds one anchor observation; true once every requested card has passed.
    pub fn observe(&mut self, anchor_matches: bool) -> bool {
        if anchor_matches {
            if !self.in_gap {
                self.remaining = self.remaining.saturating_sub(1);
                self.in_gap = true;
            }
        } else {
            self.in_gap = false;
        }
        self.remaining == 0
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

/// Mutable state of one scan call.
pub struct ScanSession {
    pub state: ScanState,
    pub filter: ScanFilter,
    pub records: Vec<ArtifactRecord>,
    pub scroll: ScrollTracker,
    /// Cards left to scroll; negative scrolls down the list.
    pub pending_cards: i32,
    /// Anchor strip as it looks on a card boundary.
    pub anchor: RgbaImage,
    /// Last clicked cell, `None` before the first click of a page.
    pub cursor: Option<(u32, u32)>,
    /// Captured detail panel awaiting recognition and the cell it belongs to.
    pub frame: Option<(RgbaImage, (u32, u32))>,
    /// Client point of the last click.
    pub last_click: (i32, i32),
    total: u32,
    visited: u32,
    last_percent: Option<u8>,
    previous_page: Vec<Vec<String>>,
    current_page: Vec<Vec<String>>,
}

impl ScanSession {
    pub fn new(filter: ScanFilter, anchor: RgbaImage, total: u32) -> Self {
        Self {
            state: ScanState::Begin,
            filter,
            records: Vec::new(),
            scroll: ScrollTracker::default(),
            pending_cards: 0,
            anchor,
            cursor: None,
            frame: None,
            last_click: (0, 0),
            total,
            visited: 0,
            last_percent: None,
            previous_page: Vec::new(),
            current_page: Vec::new(),
        }
    }

    /// Moves the cursor to the next cell in row-major order, `None` past the last.
    pub fn advance(&mut self, grid: &GridGeometry) -> Option<(u32, u32)> {
        let next = match self.cursor {
            None => (0, 0),
            Some((row, col)) if col + 1 < grid.columns => (row, col + 1),
            Some((row, _)) => (row + 1, 0),
        };
        if next.0 >= grid.rows || grid.columns == 0 {
            return None;
        }
        self.cursor = Some(next);
        Some(next)
    }

    /// Starts enumerating a new page.
    pub fn begin_page(&mut self) {
        self.cursor = None;
        self.frame = None;
        self.previous_page = std::mem::take(&mut self.current_page);
    }

    /// A skipped page shares no cards with whatever is enumerated next.
    pub fn skip_page(&mut self) {
        self.previous_page.clear();
        self.current_page.clear();
    }

    /// Whether a card read now was already accumulated.
    ///
    /// Clicking an empty cell leaves the previous card selected, so a panel equal
    /// to the one just read on this page is the same card. Once the list end is
    /// reached the last page also overlaps the previous one.
    pub fn is_repeat(&self, raw: &[String]) -> bool {
        if self.current_page.last().is_some_and(|seen| seen == raw) {
            return true;
        }
        self.scroll.reached_end() && self.previous_page.iter().any(|seen| seen == raw)
    }

    pub fn remember(&mut self, raw: Vec<String>) {
        self.current_page.push(raw);
    }

    /// Counts a recognized card; returns the new percentage when it changed.
    pub fn record_visit(&mut self) -> Option<u8> {
        self.visited += 1;
        if self.total == 0 {
            return None;
        }
        let percent = (self.visited as u64 * 100 / self.total as u64).min(99) as u8;
        if self.last_percent == Some(percent) {
            return None;
        }
        self.last_percent = Some(percent);
        Some(percent)
    }

    pub fn visited(&self) -> u32 {
        self.visited
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::PixelRect;

    fn grid(rows: u32, columns: u32) -> GridGeometry {
        GridGeometry {
            rows,
            columns,
            bound: PixelRect::new(0, 0, 100, 100),
            card_width: 10,
            card_height: 10,
            spacing_x: 2,
            spacing_y: 2,
        }
    }

    fn session(total: u32) -> ScanSession {
        ScanSession::new(
            ScanFilter::new(0, 5, 0, 20).unwrap(),
            RgbaImage::new(1, 1),
            total,
        )
    }

    #[test]
    fn test_fast_forward_needs_learned_ticks() {
        let mut tracker = ScrollTracker::default();
        assert_eq!(tracker.fast_forward_ticks(-5, 5), None);
        tracker.learn(20);
        assert_eq!(tracker.fast_forward_ticks(-5, 5), Some(18));
        assert_eq!(tracker.fast_forward_ticks(-2, 2), Some(15));
        assert_eq!(tracker.fast_forward_ticks(1, 5), None);
        tracker.learn(0);
        assert_eq!(tracker.fast_forward_ticks(-5, 5), None);
    }

    #[test]
    fn test_boundary_counter() {
        let mut counter = BoundaryCounter::new(2);
        // resting on a boundary does not count
        assert!(!counter.observe(true));
        assert!(!counter.observe(false));
        assert!(!counter.observe(false));
        assert!(!counter.observe(true));
        assert_eq!(counter.remaining(), 1);
        assert!(!counter.observe(true));
        assert!(!counter.observe(false));
        assert!(counter.observe(true));
    }

    #[test]
    fn test_cursor_row_major() {
        let g = grid(2, 3);
        let mut s = session(10);
        let cells: Vec<_> = std::iter::from_fn(|| s.advance(&g)).collect();
        assert_eq!(
            cells,
            vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]
        );
        s.begin_page();
        assert_eq!(s.advance(&g), Some((0, 0)));
    }

    #[test]
    fn test_progress_capped_and_deduplicated() {
        let mut s = session(3);
        assert_eq!(s.record_visit(), Some(33));
        assert_eq!(s.record_visit(), Some(66));
        assert_eq!(s.record_visit(), Some(99));
        assert_eq!(s.record_visit(), None);

        let mut s = session(400);
        assert_eq!(s.record_visit(), Some(0));
        assert_eq!(s.record_visit(), None);
    }

    #[test]
    fn test_empty_cell_repeats_previous_card() {
        let mut s = session(10);
        let a = vec!["a".to_string()];
        let b = vec!["b".to_string()];
        s.begin_page();
        assert!(!s.is_repeat(&a));
        s.remember(a.clone());
        assert!(s.is_repeat(&a));
        assert!(!s.is_repeat(&b));
        s.remember(b.clone());
        // only the card right before counts within a page
        assert!(!s.is_repeat(&a));
    }

    #[test]
    fn test_page_overlap_only_after_list_end() {
        let mut s = session(10);
        let raw = vec!["a".to_string(), "b".to_string()];
        s.begin_page();
        s.remember(raw.clone());
        s.begin_page();
        assert!(!s.is_repeat(&raw));
        s.scroll.mark_end();
        assert!(s.is_repeat(&raw));
        s.skip_page();
        assert!(!s.is_repeat(&raw));
    }
}
