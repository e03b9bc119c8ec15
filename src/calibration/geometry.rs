//! Pixel geometry derived from a layout definition at the capture's resolution.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in client pixels, right/bottom exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl PixelRect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Scales design-resolution edges and rounds each to the nearest pixel.
    pub fn scaled(edges: [f64; 4], scale: f64) -> Self {
        let [l, t, r, b] = edges.map(|v| (v * scale).round() as i32);
        Self::new(l, t, r, b)
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Intersection with a `width`×`height` image, or `None` when nothing remains.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let left = self.left.clamp(0, width as i32);
        let top = self.top.clamp(0, height as i32);
        let right = self.right.clamp(0, width as i32);
        let bottom = self.bottom.clamp(0, height as i32);
        if right <= left || bottom <= top {
            return None;
        }
        Some((
            left as u32,
            top as u32,
            (right - left) as u32,
            (bottom - top) as u32,
        ))
    }
}

/// Grid of inventory cards.
#[derive(Clone, Debug, PartialEq)]
pub struct GridGeometry {
    pub rows: u32,
    pub columns: u32,
    pub bound: PixelRect,
    pub card_width: i32,
    pub card_height: i32,
    pub spacing_x: i32,
    pub spacing_y: i32,
}

impl GridGeometry {
    /// Click target for the card at (`row`, `col`).
    pub fn cell_center(&self, row: u32, col: u32) -> (i32, i32) {
        let x = self.bound.left
            + col as i32 * (self.spacing_x + self.card_width)
            + self.card_width / 2;
        let y = self.bound.top
            + row as i32 * (self.spacing_y + self.card_height)
            + self.card_height / 2;
        (x, y)
    }

    /// Strip of the gap above the first card row.
    ///
    /// While the list rests on a card boundary this strip shows background only,
    /// so it matches its reference once per card scrolled past.
    pub fn anchor_strip(&self) -> PixelRect {
        let left = self.bound.left;
        let top = self.bound.top - self.spacing_y;
        let width = ((self.card_width as f64 * 0.3) as i32).max(1);
        let height = ((self.spacing_y as f64 * 0.5) as i32).max(1);
        PixelRect::new(left, top, left + width, top + height)
    }
}

/// A layout definition resolved against one capture size.
#[derive(Clone, Debug, PartialEq)]
pub struct CalibratedLayout {
    pub width: u32,
    pub height: u32,
    pub scale: f64,
    pub count: PixelRect,
    pub pos: PixelRect,
    pub level: PixelRect,
    pub main_attr: PixelRect,
    pub main_value: PixelRect,
    pub star: PixelRect,
    pub lock: PixelRect,
    pub equipper: PixelRect,
    pub text_rows: Vec<PixelRect>,
    pub grid: GridGeometry,
}

impl CalibratedLayout {
    /// Boxes of the detail panel in recognition order: position, level, main
    /// attribute, main value, star, lock, equipper, then the text rows.
    pub fn info_boxes(&self) -> Vec<PixelRect> {
        let mut boxes = vec![
            self.pos,
            self.level,
            self.main_attr,
            self.main_value,
            self.star,
            self.lock,
            self.equipper,
        ];
        boxes.extend_from_slice(&self.text_rows);
        boxes
    }

    /// Where the pointer rests for the initial scroll nudge.
    pub fn pointer_anchor(&self) -> (i32, i32) {
        (self.pos.left, self.pos.top)
    }
}
