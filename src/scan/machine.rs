//! The scan state machine.
//!
//! One `step()` performs the work of the current state and moves to the next.
//! Cards are read in a pipeline: while the panel of card `k` is being recognized
//! card `k + 1` is already selected, so each capture only waits on the game once.

use image::RgbaImage;
use tracing::{debug, info, warn};

use super::events::ScanEvent;
use super::matching::{crop, similarity};
use super::runner::{CancelToken, ScanContext};
use super::session::{BoundaryCounter, ScanSession};
use super::state::ScanState;
use crate::artifact::{ArtifactRecord, DecodedArtifact};
use crate::calibration::{CalibratedLayout, PixelRect};
use crate::capture::Surface;
use crate::config::wait_ms;
use crate::error::{Result, ScanError};

/// Wheel ticks towards the top of the list before the first page.
const BEGIN_NUDGE_TICKS: u32 = 3;

fn surface_err(e: anyhow::Error) -> ScanError {
    ScanError::SwitchSurfaceFailed(e)
}

enum ScrollOutcome {
    Done,
    ListEnd,
    PointerMoved,
    Cancelled,
}

/// Records accumulated by a finished machine.
#[derive(Debug)]
pub struct ScanOutcome {
    pub records: Vec<ArtifactRecord>,
    pub interrupted: bool,
}

pub struct ScanMachine<'a> {
    ctx: &'a mut ScanContext,
    surface: &'a mut dyn Surface,
    layout: CalibratedLayout,
    boxes: Vec<PixelRect>,
    session: ScanSession,
    cancel: CancelToken,
    on_event: &'a mut dyn FnMut(ScanEvent),
}

impl<'a> ScanMachine<'a> {
    pub fn new(
        ctx: &'a mut ScanContext,
        surface: &'a mut dyn Surface,
        layout: CalibratedLayout,
        session: ScanSession,
        cancel: CancelToken,
        on_event: &'a mut dyn FnMut(ScanEvent),
    ) -> Self {
        let boxes = layout.info_boxes();
        Self {
            ctx,
            surface,
            layout,
            boxes,
            session,
            cancel,
            on_event,
        }
    }

    pub fn state(&self) -> ScanState {
        self.session.state
    }

    /// Executes one state and transitions.
    ///
    /// Returns `Ok(true)` while the scan should continue and `Ok(false)` once a
    /// terminal state is reached.
    pub fn step(&mut self) -> Result<bool> {
        let state = self.session.state;
        if state.is_terminal() {
            return Ok(false);
        }

        let next = if self.cancel.is_cancelled() {
            info!("Scan cancelled while in state: {}", state);
            ScanState::EndByUser
        } else {
            match state {
                ScanState::Begin => self.begin()?,
                ScanState::CheckPageSkippable => self.check_page_skippable()?,
                ScanState::IterStart => {
                    self.session.begin_page();
                    ScanState::IterClickNext
                }
                ScanState::IterClickNext => self.click_next()?,
                ScanState::IterCaptureScreenshot => self.capture_cell()?,
                ScanState::IterRecognize => self.recognize_cell()?,
                ScanState::ScrollNextPage => {
                    self.session.pending_cards = -(self.layout.grid.rows as i32);
                    ScanState::ScrollCards
                }
                ScanState::ScrollCards => self.scroll_cards()?,
                ScanState::EndByEnding | ScanState::EndByUser => state,
            }
        };

        if next != state {
            debug!("Scan state: {} -> {}", state, next);
        }
        self.session.state = next;
        Ok(!next.is_terminal())
    }

    /// Steps until a terminal state.
    pub fn run(&mut self) -> Result<()> {
        while self.step()? {}
        info!(
            "Scan ended ({}): {} cards visited, {} records kept",
            self.session.state,
            self.session.visited(),
            self.session.records.len()
        );
        Ok(())
    }

    pub fn into_outcome(self) -> ScanOutcome {
        ScanOutcome {
            interrupted: self.session.state == ScanState::EndByUser,
            records: self.session.records,
        }
    }

    fn begin(&mut self) -> Result<ScanState> {
        let (x, y) = self.layout.pointer_anchor();
        self.surface.move_to(x, y).map_err(surface_err)?;
        self.session.last_click = (x, y);
        for _ in 0..BEGIN_NUDGE_TICKS {
            self.surface.scroll(1).map_err(surface_err)?;
            wait_ms(self.ctx.timing.scroll_tick_ms);
        }
        Ok(ScanState::CheckPageSkippable)
    }

    fn check_page_skippable(&mut self) -> Result<ScanState> {
        let last_row = self.layout.grid.rows.saturating_sub(1);
        let last_col = self.layout.grid.columns.saturating_sub(1);

        let Some(first) = self.sample_rank(0, 0)? else {
            debug!("First card unreadable, enumerating page");
            return Ok(ScanState::IterStart);
        };
        let last = if self.session.scroll.reached_end() {
            0
        } else {
            match self.sample_rank(last_row, last_col)? {
                Some(rank) => rank,
                None => {
                    debug!("Last card unreadable, enumerating page");
                    return Ok(ScanState::IterStart);
                }
            }
        };

        let filter = self.session.filter;
        if filter.intersects(first, last) {
            return Ok(ScanState::IterStart);
        }

        debug!("Skipping page with ranks {}..={}", last, first);
        self.session.skip_page();
        if filter.floor() > first || self.session.scroll.reached_end() {
            Ok(ScanState::EndByEnding)
        } else {
            Ok(ScanState::ScrollNextPage)
        }
    }

    fn click_next(&mut self) -> Result<ScanState> {
        let Some((row, col)) = self.session.advance(&self.layout.grid) else {
            return Ok(ScanState::ScrollNextPage);
        };
        let (x, y) = self.layout.grid.cell_center(row, col);
        self.click(x, y)?;

        if (row, col) == (0, 0) {
            wait_ms(self.ctx.timing.settle_ms);
            Ok(ScanState::IterCaptureScreenshot)
        } else {
            Ok(ScanState::IterRecognize)
        }
    }

    fn capture_cell(&mut self) -> Result<ScanState> {
        let frame = self.surface.capture().map_err(surface_err)?;
        let Some(cell) = self.session.cursor else {
            return Ok(ScanState::IterClickNext);
        };
        self.session.frame = Some((frame, cell));

        if self.is_last_cell(cell) {
            Ok(ScanState::IterRecognize)
        } else {
            Ok(ScanState::IterClickNext)
        }
    }

    fn recognize_cell(&mut self) -> Result<ScanState> {
        let Some((frame, cell)) = self.session.frame.take() else {
            return Ok(ScanState::IterClickNext);
        };

        let decoded = self.read_panel(&frame);
        if let Some(percent) = self.session.record_visit() {
            (self.on_event)(ScanEvent::Progress { percent });
        }

        if let Some(decoded) = decoded {
            match decoded.to_record() {
                None => {
                    warn!("Unrecognized card at {:?}: {:?}", cell, decoded.raw);
                    (self.on_event)(ScanEvent::RecognizeWarning {
                        raw_fields: decoded.raw.clone(),
                    });
                }
                Some(record) => {
                    let rank = record.rank();
                    if self.session.is_repeat(&decoded.raw) {
                        debug!("Card at {:?} was already read", cell);
                    } else if self.session.filter.contains(record.star, record.level) {
                        self.session.records.push(record);
                    }
                    if rank < self.session.filter.floor() {
                        info!("Rank {} is below the requested range", rank);
                        return Ok(ScanState::EndByEnding);
                    }
                }
            }
            self.session.remember(decoded.raw);
        }

        if self.pointer_moved()? {
            info!("Pointer moved away from the selected card");
            return Ok(ScanState::EndByUser);
        }

        if self.is_last_cell(cell) {
            Ok(ScanState::ScrollNextPage)
        } else {
            Ok(ScanState::IterCaptureScreenshot)
        }
    }

    fn scroll_cards(&mut self) -> Result<ScanState> {
        let rows = self.layout.grid.rows;
        let mut cards = std::mem::take(&mut self.session.pending_cards);
        if cards == 0 {
            return Ok(ScanState::CheckPageSkippable);
        }
        let direction = cards.signum();

        if let Some(ticks) = self.session.scroll.fast_forward_ticks(cards, rows) {
            for _ in 0..ticks {
                self.surface.scroll(direction).map_err(surface_err)?;
                wait_ms(self.ctx.timing.fast_scroll_tick_ms);
            }
            cards = direction;
        }
        let learning = cards.unsigned_abs() == rows;

        let strip = self.layout.grid.anchor_strip();
        let mut counter = BoundaryCounter::new(cards.unsigned_abs());
        let mut previous: Option<RgbaImage> = None;
        let mut ticks = 0u32;

        let outcome = loop {
            if self.cancel.is_cancelled() {
                break ScrollOutcome::Cancelled;
            }

            let frame = self.surface.capture().map_err(surface_err)?;
            if let Some(prev) = &previous {
                if similarity(prev, &frame) > self.ctx.thresholds.frame_unchanged {
                    break ScrollOutcome::ListEnd;
                }
            }

            let on_boundary =
                similarity(&crop(&frame, &strip), &self.session.anchor) > self.ctx.thresholds.anchor_match;
            if counter.observe(on_boundary) {
                break ScrollOutcome::Done;
            }
            previous = Some(frame);

            if self.pointer_moved()? {
                break ScrollOutcome::PointerMoved;
            }

            self.surface.scroll(direction).map_err(surface_err)?;
            wait_ms(self.ctx.timing.scroll_tick_ms);
            ticks += 1;
        };

        match outcome {
            ScrollOutcome::Done => {
                if learning {
                    debug!("One page is {} wheel ticks", ticks);
                    self.session.scroll.learn(ticks);
                }
                Ok(ScanState::CheckPageSkippable)
            }
            ScrollOutcome::ListEnd if self.session.scroll.reached_end() => {
                Ok(ScanState::EndByEnding)
            }
            ScrollOutcome::ListEnd => {
                info!("Reached the end of the list");
                self.session.scroll.mark_end();
                Ok(ScanState::CheckPageSkippable)
            }
            ScrollOutcome::PointerMoved => {
                info!("Pointer moved while scrolling");
                Ok(ScanState::EndByUser)
            }
            ScrollOutcome::Cancelled => Ok(ScanState::EndByUser),
        }
    }

    /// Selects a card and reads its rank, `None` when star or level is unreadable.
    fn sample_rank(&mut self, row: u32, col: u32) -> Result<Option<u32>> {
        let (x, y) = self.layout.grid.cell_center(row, col);
        self.click(x, y)?;
        wait_ms(self.ctx.timing.sample_ms);
        let frame = self.surface.capture().map_err(surface_err)?;
        Ok(self.read_panel(&frame).and_then(|decoded| decoded.rank()))
    }

    /// Recognizes every detail box of `frame`; a model failure is a warning.
    fn read_panel(&mut self, frame: &RgbaImage) -> Option<DecodedArtifact> {
        match self.ctx.recognizer.recognize(frame, &self.boxes) {
            Ok(lines) => {
                let texts: Vec<String> = lines.into_iter().map(|line| line.text).collect();
                Some(self.ctx.mapper.map(&texts))
            }
            Err(e) => {
                warn!("Recognition failed: {:#}", e);
                (self.on_event)(ScanEvent::RecognizeWarning {
                    raw_fields: Vec::new(),
                });
                None
            }
        }
    }

    fn click(&mut self, x: i32, y: i32) -> Result<()> {
        self.surface.click(x, y).map_err(surface_err)?;
        self.session.last_click = (x, y);
        Ok(())
    }

    fn pointer_moved(&self) -> Result<bool> {
        let (x, y) = self.surface.position().map_err(surface_err)?;
        let (cx, cy) = self.session.last_click;
        let tolerance = self.ctx.thresholds.pointer_tolerance_px;
        Ok((x - cx).abs() > tolerance || (y - cy).abs() > tolerance)
    }

    fn is_last_cell(&self, (row, col): (u32, u32)) -> bool {
        row + 1 >= self.layout.grid.rows && col + 1 >= self.layout.grid.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::filter::ScanFilter;
    use crate::capture::CaptureProvider;
    use crate::scan::testing::{
        FakeInventory, test_context, test_layout, test_layout_with_columns,
    };

    fn run_machine(
        ranks: &[u32],
        filter: ScanFilter,
        inventory: &mut FakeInventory,
        cancel: CancelToken,
        events: &mut Vec<ScanEvent>,
    ) -> (ScanOutcome, ScanState) {
        run_machine_on(test_layout(), ranks, filter, inventory, cancel, events)
    }

    fn run_machine_on(
        layout: CalibratedLayout,
        ranks: &[u32],
        filter: ScanFilter,
        inventory: &mut FakeInventory,
        cancel: CancelToken,
        events: &mut Vec<ScanEvent>,
    ) -> (ScanOutcome, ScanState) {
        let mut ctx = test_context();
        let frame = inventory.capture().unwrap();
        let anchor = crop(&frame, &layout.grid.anchor_strip());
        let session = ScanSession::new(filter, anchor, ranks.len() as u32);
        let mut on_event = |e: ScanEvent| events.push(e);

        let mut machine = ScanMachine::new(
            &mut ctx,
            inventory,
            layout,
            session,
            cancel,
            &mut on_event,
        );
        machine.run().unwrap();
        let state = machine.state();
        (machine.into_outcome(), state)
    }

    fn ranks_of(records: &[ArtifactRecord]) -> Vec<u32> {
        records.iter().map(ArtifactRecord::rank).collect()
    }

    const INVENTORY: [u32; 8] = [520, 518, 515, 410, 408, 312, 305, 200];

    #[test]
    fn test_stops_below_requested_rarity() {
        let mut inventory = FakeInventory::new(&INVENTORY);
        let mut events = Vec::new();
        let (outcome, state) = run_machine(
            &INVENTORY,
            ScanFilter::new(5, 5, 0, 20).unwrap(),
            &mut inventory,
            CancelToken::new(),
            &mut events,
        );

        assert_eq!(state, ScanState::EndByEnding);
        assert!(!outcome.interrupted);
        assert_eq!(ranks_of(&outcome.records), vec![520, 518, 515]);
    }

    #[test]
    fn test_skips_pages_above_the_range() {
        let mut inventory = FakeInventory::new(&INVENTORY);
        let mut events = Vec::new();
        let (outcome, state) = run_machine(
            &INVENTORY,
            ScanFilter::new(3, 3, 0, 20).unwrap(),
            &mut inventory,
            CancelToken::new(),
            &mut events,
        );

        assert_eq!(state, ScanState::EndByEnding);
        assert_eq!(ranks_of(&outcome.records), vec![312, 305]);
        // the first two pages are only sampled, the end page only by its first card
        assert_eq!(
            inventory.selected_history(),
            &[0, 1, 2, 3, 4, 5, 4, 5, 6, 6, 7]
        );
    }

    #[test]
    fn test_reads_whole_list_without_duplicates() {
        let ranks = &INVENTORY[..7];
        let mut inventory = FakeInventory::new(ranks);
        let mut events = Vec::new();
        let (outcome, state) = run_machine(
            ranks,
            ScanFilter::new(0, 5, 0, 20).unwrap(),
            &mut inventory,
            CancelToken::new(),
            &mut events,
        );

        assert_eq!(state, ScanState::EndByEnding);
        let got = ranks_of(&outcome.records);
        assert_eq!(got, ranks.to_vec());
        assert!(got.windows(2).all(|w| w[0] >= w[1]));

        let percents: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                ScanEvent::Progress { percent } => Some(*percent),
                _ => None,
            })
            .collect();
        assert!(percents.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(percents.last(), Some(&99));
    }

    #[test]
    fn test_inventory_smaller_than_a_page() {
        let ranks = [520];
        let mut inventory = FakeInventory::new(&ranks);
        let mut events = Vec::new();
        let (outcome, state) = run_machine(
            &ranks,
            ScanFilter::new(0, 5, 0, 20).unwrap(),
            &mut inventory,
            CancelToken::new(),
            &mut events,
        );

        assert_eq!(state, ScanState::EndByEnding);
        assert_eq!(ranks_of(&outcome.records), vec![520]);
    }

    #[test]
    fn test_walks_columns_and_skips_trailing_empty_cell() {
        let ranks = &INVENTORY[..7];
        let mut inventory = FakeInventory::new(ranks).with_columns(2);
        let mut events = Vec::new();
        let (outcome, state) = run_machine_on(
            test_layout_with_columns(2),
            ranks,
            ScanFilter::new(0, 5, 0, 20).unwrap(),
            &mut inventory,
            CancelToken::new(),
            &mut events,
        );

        assert_eq!(state, ScanState::EndByEnding);
        assert_eq!(ranks_of(&outcome.records), ranks.to_vec());
        // skip check samples the first and the bottom-right card; the click on
        // the empty last cell selects nothing
        assert_eq!(
            inventory.selected_history(),
            &[0, 3, 0, 1, 2, 3, 4, 4, 5, 6]
        );
    }

    #[test]
    fn test_cancel_ends_with_partial_records() {
        let mut inventory = FakeInventory::new(&INVENTORY);
        let cancel = CancelToken::new();
        let trigger = cancel.clone();

        let mut ctx = test_context();
        let layout = test_layout();
        let frame = inventory.capture().unwrap();
        let anchor = crop(&frame, &layout.grid.anchor_strip());
        let session = ScanSession::new(ScanFilter::new(0, 5, 0, 20).unwrap(), anchor, 8);
        let mut on_event = |e: ScanEvent| {
            if matches!(e, ScanEvent::Progress { .. }) {
                trigger.cancel();
            }
        };

        let mut machine =
            ScanMachine::new(&mut ctx, &mut inventory, layout, session, cancel, &mut on_event);
        machine.run().unwrap();
        assert_eq!(machine.state(), ScanState::EndByUser);
        let outcome = machine.into_outcome();
        assert!(outcome.interrupted);
        assert_eq!(ranks_of(&outcome.records), vec![520]);
    }

    #[test]
    fn test_pointer_drift_interrupts() {
        let mut inventory = FakeInventory::new(&INVENTORY).drift_after_clicks(4);
        let mut events = Vec::new();
        let (outcome, state) = run_machine(
            &INVENTORY,
            ScanFilter::new(0, 5, 0, 20).unwrap(),
            &mut inventory,
            CancelToken::new(),
            &mut events,
        );

        assert_eq!(state, ScanState::EndByUser);
        assert!(outcome.interrupted);
        assert_eq!(ranks_of(&outcome.records), vec![520]);
    }

    #[test]
    fn test_unreadable_card_is_a_warning() {
        let mut inventory = FakeInventory::new(&INVENTORY).blank_item(1);
        let mut events = Vec::new();
        let (outcome, _) = run_machine(
            &INVENTORY,
            ScanFilter::new(5, 5, 0, 20).unwrap(),
            &mut inventory,
            CancelToken::new(),
            &mut events,
        );

        assert_eq!(ranks_of(&outcome.records), vec![520, 515]);
        assert!(events
            .iter()
            .any(|e| matches!(e, ScanEvent::RecognizeWarning { .. })));
    }

    #[test]
    fn test_fast_forwards_after_first_page() {
        let mut inventory = FakeInventory::new(&INVENTORY);
        let mut events = Vec::new();
        let (outcome, _) = run_machine(
            &INVENTORY,
            ScanFilter::new(0, 5, 0, 20).unwrap(),
            &mut inventory,
            CancelToken::new(),
            &mut events,
        );

        assert_eq!(outcome.records.len(), INVENTORY.len());
        assert_eq!(inventory.offset(), inventory.max_offset());
        // one measured page of 6 ticks, then every later scroll starts with 4 blind ticks
        assert_eq!(inventory.ticks_down(), 6 + (4 + 2) + (4 + 2) + (4 + 1));
    }
}
