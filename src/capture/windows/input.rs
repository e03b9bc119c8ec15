//! Pointer input through `SendInput`.
//!
//! The game reads raw input, so window messages are ignored; hardware-level
//! events with absolute coordinates are required. This moves the real cursor.

use anyhow::{Result, anyhow};
use std::time::Duration;

use windows::Win32::Foundation::{HWND, POINT};
use windows::Win32::Graphics::Gdi::{ClientToScreen, ScreenToClient};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    INPUT, INPUT_0, INPUT_MOUSE, MOUSE_EVENT_FLAGS, MOUSEEVENTF_ABSOLUTE, MOUSEEVENTF_LEFTDOWN,
    MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MOVE, MOUSEEVENTF_WHEEL, MOUSEINPUT, SendInput,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetCursorPos, GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN, WHEEL_DELTA,
};

/// Moves the cursor to a client-area position.
pub fn move_to(hwnd: HWND, x: i32, y: i32) -> Result<()> {
    let (nx, ny) = normalized_screen_point(hwnd, x, y)?;
    send_mouse(nx, ny, 0, MOUSEEVENTF_MOVE | MOUSEEVENTF_ABSOLUTE)
}

/// Left click at a client-area position.
pub fn click(hwnd: HWND, x: i32, y: i32) -> Result<()> {
    let (nx, ny) = normalized_screen_point(hwnd, x, y)?;
    send_mouse(nx, ny, 0, MOUSEEVENTF_MOVE | MOUSEEVENTF_ABSOLUTE)?;
    std::thread::sleep(Duration::from_millis(10));
    send_mouse(
        nx,
        ny,
        0,
        MOUSEEVENTF_LEFTDOWN | MOUSEEVENTF_ABSOLUTE | MOUSEEVENTF_MOVE,
    )?;
    send_mouse(
        nx,
        ny,
        0,
        MOUSEEVENTF_LEFTUP | MOUSEEVENTF_ABSOLUTE | MOUSEEVENTF_MOVE,
    )
}

/// Sends wheel ticks at the current cursor position.
pub fn wheel(clicks: i32) -> Result<()> {
    let delta = clicks * WHEEL_DELTA as i32;
    send_mouse(0, 0, delta as u32, MOUSEEVENTF_WHEEL)
}

/// Cursor position relative to the client area.
pub fn cursor_position(hwnd: HWND) -> Result<(i32, i32)> {
    let mut pt = POINT::default();
    unsafe {
        GetCursorPos(&mut pt)?;
        if !ScreenToClient(hwnd, &mut pt).as_bool() {
            return Err(anyhow!("ScreenToClient failed"));
        }
    }
    Ok((pt.x, pt.y))
}

/// Converts a client point to the 0..65535 absolute range used by `MOUSEEVENTF_ABSOLUTE`.
fn normalized_screen_point(hwnd: HWND, x: i32, y: i32) -> Result<(i32, i32)> {
    let mut screen_point = POINT { x, y };
    unsafe {
        if !ClientToScreen(hwnd, &mut screen_point).as_bool() {
            return Err(anyhow!("ClientToScreen failed"));
        }
    }

    let screen_width = unsafe { GetSystemMetrics(SM_CXSCREEN) };
    let screen_height = unsafe { GetSystemMetrics(SM_CYSCREEN) };
    if screen_width <= 0 || screen_height <= 0 {
        return Err(anyhow!("Invalid screen metrics"));
    }

    let norm_x = ((screen_point.x as i64 * 65535) / screen_width as i64) as i32;
    let norm_y = ((screen_point.y as i64 * 65535) / screen_height as i64) as i32;
    Ok((norm_x, norm_y))
}

fn send_mouse(dx: i32, dy: i32, data: u32, flags: MOUSE_EVENT_FLAGS) -> Result<()> {
    let input = INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx,
                dy,
                mouseData: data,
                dwFlags: flags,
                ..Default::default()
            },
        },
    };
    let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
    if sent != 1 {
        return Err(anyhow!("SendInput rejected the mouse event"));
    }
    Ok(())
}
