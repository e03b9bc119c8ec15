//! Capability interface over the game window.
//!
//! The scanning engine never talks to the OS directly. It consumes:
//! - `CaptureProvider`: client geometry and point-in-time screenshots
//! - `PointerDevice`: pointer moves, clicks, wheel ticks and position readback
//!
//! All coordinates are client-area pixels with the origin at the top-left corner.
//! A positive scroll moves the wheel away from the user (list scrolls up).

#[cfg(windows)]
mod windows;

use anyhow::Result;
use image::RgbaImage;

/// Screenshot source for the target window.
pub trait CaptureProvider {
    /// Size of the drawable client area in pixels.
    fn client_size(&self) -> Result<(u32, u32)>;

    /// Captures the client area as an RGBA image of `client_size()`.
    fn capture(&mut self) -> Result<RgbaImage>;
}

/// Pointer input targeted at the window's client area.
pub trait PointerDevice {
    fn move_to(&mut self, x: i32, y: i32) -> Result<()>;

    fn click(&mut self, x: i32, y: i32) -> Result<()>;

    /// Sends `clicks` wheel ticks; negative values scroll down.
    fn scroll(&mut self, clicks: i32) -> Result<()>;

    /// Current pointer position in client coordinates.
    fn position(&self) -> Result<(i32, i32)>;
}

/// A connected, activated game window.
pub trait Surface: CaptureProvider + PointerDevice {}

impl<T: CaptureProvider + PointerDevice> Surface for T {}

/// Locates the game window and brings it to the foreground.
///
/// Called on the scan worker, so the returned surface never crosses threads.
pub trait SurfaceConnector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn Surface>>;
}

/// Returns the connector for the current platform.
#[cfg(windows)]
pub fn platform_connector(window_titles: &[String]) -> Result<Box<dyn SurfaceConnector>> {
    Ok(Box::new(windows::WindowConnector::new(window_titles.to_vec())))
}

/// Returns the connector for the current platform.
#[cfg(not(windows))]
pub fn platform_connector(_window_titles: &[String]) -> Result<Box<dyn SurfaceConnector>> {
    Err(anyhow::anyhow!(
        "no capture backend is available on this platform"
    ))
}
