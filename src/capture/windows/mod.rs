//! Windows implementation of the capture interface.
//!
//! - Window discovery and activation (`window`)
//! - Client-area screenshots through Windows Graphics Capture (`screenshot`)
//! - Pointer input through `SendInput` (`input`)

mod input;
mod screenshot;
mod window;

use anyhow::Result;
use image::RgbaImage;
use tracing::info;
use windows::Win32::Foundation::HWND;

use super::{CaptureProvider, PointerDevice, Surface, SurfaceConnector};

/// Finds the game window by title and activates it on `connect`.
pub struct WindowConnector {
    titles: Vec<String>,
}

impl WindowConnector {
    pub fn new(titles: Vec<String>) -> Self {
        Self { titles }
    }
}

impl SurfaceConnector for WindowConnector {
    fn connect(&self) -> Result<Box<dyn Surface>> {
        let hwnd = window::find_game_window(&self.titles)?;
        window::activate(hwnd)?;
        let (width, height) = window::client_size(hwnd)?;
        info!("Connected to game window {:?} ({}x{})", hwnd, width, height);
        Ok(Box::new(WindowSurface { hwnd }))
    }
}

/// An activated game window.
struct WindowSurface {
    hwnd: HWND,
}

impl CaptureProvider for WindowSurface {
    fn client_size(&self) -> Result<(u32, u32)> {
        window::ensure_valid(self.hwnd)?;
        window::client_size(self.hwnd)
    }

    fn capture(&mut self) -> Result<RgbaImage> {
        window::ensure_valid(self.hwnd)?;
        screenshot::capture_client_area(self.hwnd)
    }
}

impl PointerDevice for WindowSurface {
    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        input::move_to(self.hwnd, x, y)
    }

    fn click(&mut self, x: i32, y: i32) -> Result<()> {
        input::click(self.hwnd, x, y)
    }

    fn scroll(&mut self, clicks: i32) -> Result<()> {
        input::wheel(clicks)
    }

    fn position(&self) -> Result<(i32, i32)> {
        input::cursor_position(self.hwnd)
    }
}
