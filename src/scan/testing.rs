//! Scripted inventory surface and recognizer for driving the scan engine in tests.
//!
//! The inventory is a 100×100 client area with a grid of two card rows and one
//! column unless widened. The list scrolls in wheel ticks, three per card row;
//! clicking an empty cell keeps the previous selection. The detail panel of the
//! selected card is
//! encoded in the bottom-left pixel (item + 1, star, level) so the recognizer can
//! read it back without any real text.

use anyhow::{Result, anyhow};
use image::{Rgba, RgbaImage};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};

use super::runner::ScanContext;
use crate::artifact::{FieldMapper, Localization};
use crate::calibration::layout::{GridDefinition, Resolution, TextRowsDefinition};
use crate::calibration::{CalibratedLayout, LayoutDefinition, LayoutRepository, PixelRect};
use crate::capture::{CaptureProvider, PointerDevice, Surface, SurfaceConnector};
use crate::config::{MatchThresholds, ScanTiming};
use crate::ocr::{Recognize, Recognized};

const SIZE: u32 = 100;
const GRID_ROWS: i32 = 2;
const GRID_TOP: f64 = 20.0;
const GRID_LEFT: f64 = 10.0;
const CARD_WIDTH: f64 = 30.0;
/// Card height plus row spacing.
const CARD_PITCH: f64 = 35.0;
/// Card width plus column spacing.
const COLUMN_PITCH: f64 = 35.0;
const TICKS_PER_CARD: i32 = 3;
const DRIFT: i32 = 50;

pub fn test_definition() -> LayoutDefinition {
    test_definition_with_columns(1)
}

pub fn test_definition_with_columns(columns: u32) -> LayoutDefinition {
    let right = GRID_LEFT + CARD_WIDTH + (columns - 1) as f64 * COLUMN_PITCH;
    LayoutDefinition {
        resolution: Resolution {
            width: SIZE,
            height: SIZE,
        },
        count: [0.0, 0.0, 10.0, 10.0],
        pos: [60.0, 10.0, 90.0, 20.0],
        level: [60.0, 20.0, 90.0, 30.0],
        main_attr: [60.0, 30.0, 90.0, 40.0],
        main_value: [60.0, 40.0, 90.0, 50.0],
        star: [60.0, 50.0, 90.0, 60.0],
        lock: [60.0, 60.0, 90.0, 70.0],
        equipper: [60.0, 90.0, 90.0, 100.0],
        text_rows: TextRowsDefinition {
            rows: 2,
            row_height: 5.0,
            bound: [60.0, 70.0, 90.0, 85.0],
        },
        grid: GridDefinition {
            rows: GRID_ROWS as u32,
            columns,
            bound: [GRID_LEFT, GRID_TOP, right, 80.0],
            card_width: CARD_WIDTH,
            card_height: 25.0,
        },
    }
}

pub fn test_layout() -> CalibratedLayout {
    test_definition().calibrate(SIZE, SIZE)
}

pub fn test_layout_with_columns(columns: u32) -> CalibratedLayout {
    test_definition_with_columns(columns).calibrate(SIZE, SIZE)
}

pub fn test_context() -> ScanContext {
    test_context_with(FakeRecognizer::default())
}

pub fn test_context_with(recognizer: FakeRecognizer) -> ScanContext {
    ScanContext {
        recognizer: Box::new(recognizer),
        mapper: FieldMapper::new(Localization::zh_cn()).unwrap(),
        layouts: LayoutRepository::new(vec![test_definition()]),
        timing: ScanTiming::immediate(),
        thresholds: MatchThresholds::default(),
        mapper_dir: None,
    }
}

/// Inventory list sorted by rank, as the game shows it.
pub struct FakeInventory {
    ranks: Vec<u32>,
    columns: usize,
    blank: Vec<usize>,
    size: (u32, u32),
    offset: i32,
    selected: Option<usize>,
    pointer: (i32, i32),
    clicks: u32,
    drift_after: Option<u32>,
    history: Vec<usize>,
    ticks_down: u32,
}

impl FakeInventory {
    pub fn new(ranks: &[u32]) -> Self {
        Self {
            ranks: ranks.to_vec(),
            columns: 1,
            blank: Vec::new(),
            size: (SIZE, SIZE),
            offset: 0,
            selected: None,
            pointer: (0, 0),
            clicks: 0,
            drift_after: None,
            history: Vec::new(),
            ticks_down: 0,
        }
    }

    /// Lays the items out row-major over `columns` cards per row.
    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }

    /// The pointer jumps away once `clicks` clicks have been sent.
    pub fn drift_after_clicks(mut self, clicks: u32) -> Self {
        self.drift_after = Some(clicks);
        self
    }

    /// The detail panel of `item` renders as unreadable.
    pub fn blank_item(mut self, item: usize) -> Self {
        self.blank.push(item);
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    /// Items selected by every click so far.
    pub fn selected_history(&self) -> &[usize] {
        &self.history
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }

    /// Scroll position at which the last card row touches the bottom of the grid.
    pub fn max_offset(&self) -> i32 {
        let item_rows = self.ranks.len().div_ceil(self.columns) as i32;
        ((item_rows - GRID_ROWS) * TICKS_PER_CARD - 1).max(0)
    }

    pub fn ticks_down(&self) -> u32 {
        self.ticks_down
    }

    fn item_at(&self, x: i32, y: i32) -> Option<usize> {
        let scrolled = self.offset as f64 * CARD_PITCH / TICKS_PER_CARD as f64;
        let row = ((y as f64 - GRID_TOP + scrolled) / CARD_PITCH).floor();
        let col = ((x as f64 - GRID_LEFT) / COLUMN_PITCH).floor();
        if row < 0.0 || col < 0.0 || col as usize >= self.columns {
            return None;
        }
        let index = row as usize * self.columns + col as usize;
        (index < self.ranks.len()).then_some(index)
    }

    fn marker(&self) -> Rgba<u8> {
        match self.selected {
            Some(item) if !self.blank.contains(&item) => {
                let rank = self.ranks[item];
                Rgba([item as u8 + 1, (rank / 100) as u8, (rank % 100) as u8, 255])
            }
            _ => Rgba([0, 0, 0, 255]),
        }
    }

    fn render(&self) -> RgbaImage {
        let (width, height) = self.size;
        let mut state = (self.offset as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        let mut img = RgbaImage::from_fn(width, height, |_, _| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            let v = (state >> 56) as u8;
            Rgba([v, v, v, 255])
        });

        // gap above the first row: a fixed pattern only while resting on a card boundary
        let on_boundary = self.offset % TICKS_PER_CARD == 0;
        for x in 10..19u32 {
            for y in 10..15u32 {
                let step = if on_boundary { x - 10 } else { 18 - x };
                let v = (step * 25) as u8;
                img.put_pixel(x, y, Rgba([v, v, v, 255]));
            }
        }

        img.put_pixel(0, height - 1, self.marker());
        img
    }
}

impl CaptureProvider for FakeInventory {
    fn client_size(&self) -> Result<(u32, u32)> {
        Ok(self.size)
    }

    fn capture(&mut self) -> Result<RgbaImage> {
        Ok(self.render())
    }
}

impl PointerDevice for FakeInventory {
    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        self.pointer = (x, y);
        Ok(())
    }

    fn click(&mut self, x: i32, y: i32) -> Result<()> {
        self.pointer = (x, y);
        self.clicks += 1;
        if self.drift_after.is_some_and(|n| self.clicks >= n) {
            self.pointer = (x + DRIFT, y + DRIFT);
        }
        if let Some(item) = self.item_at(x, y) {
            self.selected = Some(item);
            self.history.push(item);
        }
        Ok(())
    }

    fn scroll(&mut self, clicks: i32) -> Result<()> {
        if clicks < 0 {
            self.ticks_down += clicks.unsigned_abs();
        }
        self.offset = (self.offset - clicks).clamp(0, self.max_offset());
        Ok(())
    }

    fn position(&self) -> Result<(i32, i32)> {
        Ok(self.pointer)
    }
}

/// Reads the marker pixel back into detail-panel text.
pub struct FakeRecognizer {
    count_text: String,
}

impl Default for FakeRecognizer {
    fn default() -> Self {
        Self::with_count_text("圣遗物 8/1500")
    }
}

impl FakeRecognizer {
    pub fn with_count_text(text: &str) -> Self {
        Self {
            count_text: text.to_string(),
        }
    }
}

fn line(text: String) -> Recognized {
    Recognized {
        text,
        confidence: 1.0,
    }
}

impl Recognize for FakeRecognizer {
    fn recognize(&mut self, img: &RgbaImage, boxes: &[PixelRect]) -> Result<Vec<Recognized>> {
        if boxes.len() == 1 {
            return Ok(vec![line(self.count_text.clone())]);
        }

        let Rgba([marker, star, level, _]) = *img.get_pixel(0, img.height() - 1);
        let mut texts = if marker == 0 {
            Vec::new()
        } else {
            vec![
                "生之花".to_string(),
                format!("+{}", level),
                "攻击力".to_string(),
                "4,780".to_string(),
                "★".repeat(star as usize),
                "关的锁".to_string(),
                String::new(),
                format!("·元素精通+{}", 10 + marker as u32),
                "角斗士的终幕礼".to_string(),
            ]
        };
        texts.resize(boxes.len(), String::new());
        Ok(texts.into_iter().map(line).collect())
    }
}

/// Hands out a fresh `FakeInventory` per connection.
pub struct FakeConnector {
    ranks: Vec<u32>,
    size: (u32, u32),
    connects: Arc<AtomicU32>,
    gate: Option<Mutex<Receiver<()>>>,
    fail: bool,
}

impl FakeConnector {
    pub fn new(ranks: &[u32]) -> Self {
        Self {
            ranks: ranks.to_vec(),
            size: (SIZE, SIZE),
            connects: Arc::new(AtomicU32::new(0)),
            gate: None,
            fail: false,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    /// No game window to be found.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// The first connection blocks until the returned sender fires.
    pub fn gated(mut self) -> (Self, Sender<()>) {
        let (tx, rx) = channel();
        self.gate = Some(Mutex::new(rx));
        (self, tx)
    }

    pub fn connect_counter(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.connects)
    }
}

impl SurfaceConnector for FakeConnector {
    fn connect(&self) -> Result<Box<dyn Surface>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            if let Ok(rx) = gate.lock() {
                // later connections find the sender gone and pass straight through
                let _ = rx.recv();
            }
        }
        if self.fail {
            return Err(anyhow!("game window not found"));
        }
        Ok(Box::new(
            FakeInventory::new(&self.ranks).with_size(self.size.0, self.size.1),
        ))
    }
}
