//! Window discovery and activation for the game window.

use anyhow::{Result, anyhow};
use std::time::Duration;
use tracing::debug;

use windows::Win32::Foundation::{HWND, POINT, RECT};
use windows::Win32::Graphics::Gdi::ClientToScreen;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYEVENTF_KEYUP, SendInput, VK_MENU,
};
use windows::Win32::UI::WindowsAndMessaging::{
    FindWindowW, GetClientRect, GetWindowRect, IsWindow, SW_RESTORE, SetForegroundWindow,
    ShowWindow,
};
use windows::core::PCWSTR;

/// Finds the first top-level window whose title exactly matches one of `titles`.
pub fn find_game_window(titles: &[String]) -> Result<HWND> {
    for title in titles {
        let wide: Vec<u16> = title.encode_utf16().chain(std::iter::once(0)).collect();
        let found = unsafe { FindWindowW(PCWSTR::null(), PCWSTR(wide.as_ptr())) };
        match found {
            Ok(hwnd) if !hwnd.is_invalid() => {
                debug!("Found window \"{}\": {:?}", title, hwnd);
                return Ok(hwnd);
            }
            _ => debug!("No window titled \"{}\"", title),
        }
    }

    Err(anyhow!(
        "Could not find the game window (tried {:?}). Is the game running?",
        titles
    ))
}

/// Restores the window and brings it to the foreground.
///
/// Windows refuses `SetForegroundWindow` from a process that did not receive the
/// last input event; a synthetic Alt press lifts that restriction.
pub fn activate(hwnd: HWND) -> Result<()> {
    let alt = |flags| INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VK_MENU,
                dwFlags: flags,
                ..Default::default()
            },
        },
    };
    unsafe {
        SendInput(
            &[alt(Default::default()), alt(KEYEVENTF_KEYUP)],
            std::mem::size_of::<INPUT>() as i32,
        );
        let _ = ShowWindow(hwnd, SW_RESTORE);
        if !SetForegroundWindow(hwnd).as_bool() {
            return Err(anyhow!("SetForegroundWindow failed for {:?}", hwnd));
        }
    }
    std::thread::sleep(Duration::from_millis(100));
    Ok(())
}

/// Fails if the handle no longer refers to a window.
pub fn ensure_valid(hwnd: HWND) -> Result<()> {
    if unsafe { IsWindow(hwnd).as_bool() } {
        Ok(())
    } else {
        Err(anyhow!("Game window no longer exists"))
    }
}

/// Client area dimensions.
pub fn client_size(hwnd: HWND) -> Result<(u32, u32)> {
    let mut rect = RECT::default();
    unsafe { GetClientRect(hwnd, &mut rect)? };
    Ok((
        (rect.right - rect.left) as u32,
        (rect.bottom - rect.top) as u32,
    ))
}

/// Offset of the client area's top-left corner from the window's top-left corner.
///
/// Captured frames include the title bar and borders; this is the crop origin.
pub fn client_offset(hwnd: HWND) -> Result<POINT> {
    let mut client_origin = POINT { x: 0, y: 0 };
    unsafe {
        if !ClientToScreen(hwnd, &mut client_origin).as_bool() {
            return Err(anyhow!("ClientToScreen failed"));
        }
    }

    let mut window_rect = RECT::default();
    unsafe { GetWindowRect(hwnd, &mut window_rect)? };

    Ok(POINT {
        x: client_origin.x - window_rect.left,
        y: client_origin.y - window_rect.top,
    })
}
