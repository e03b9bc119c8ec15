//! Client-area screenshots through Windows Graphics Capture.
//!
//! Each call opens a short-lived capture session, waits for one frame, copies it
//! through a staging texture and crops the window chrome away.

use anyhow::{Context, Result, anyhow};
use image::RgbaImage;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::trace;

use windows::Foundation::TypedEventHandler;
use windows::Graphics::Capture::{Direct3D11CaptureFramePool, GraphicsCaptureItem};
use windows::Graphics::DirectX::Direct3D11::IDirect3DDevice;
use windows::Graphics::DirectX::DirectXPixelFormat;
use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Direct3D::D3D_DRIVER_TYPE_HARDWARE;
use windows::Win32::Graphics::Direct3D11::{
    D3D11_CPU_ACCESS_READ, D3D11_CREATE_DEVICE_BGRA_SUPPORT, D3D11_MAP_READ,
    D3D11_MAPPED_SUBRESOURCE, D3D11_SDK_VERSION, D3D11_TEXTURE2D_DESC, D3D11_USAGE_STAGING,
    D3D11CreateDevice, ID3D11Device, ID3D11DeviceContext, ID3D11Resource, ID3D11Texture2D,
};
use windows::Win32::Graphics::Dxgi::IDXGIDevice;
use windows::Win32::System::WinRT::Direct3D11::{
    CreateDirect3D11DeviceFromDXGIDevice, IDirect3DDxgiInterfaceAccess,
};
use windows::Win32::System::WinRT::Graphics::Capture::IGraphicsCaptureItemInterop;
use windows::Win32::System::WinRT::RoGetActivationFactory;
use windows::core::Interface;

use super::window::{client_offset, client_size};

const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Captures the client area of `hwnd`.
pub fn capture_client_area(hwnd: HWND) -> Result<RgbaImage> {
    let (width, height) = client_size(hwnd)?;
    let offset = client_offset(hwnd)?;

    let (device, context) = create_d3d11_device()?;
    let item = create_capture_item(hwnd)?;
    let size = item.Size()?;
    let frame_pool = Direct3D11CaptureFramePool::CreateFreeThreaded(
        &wrap_device(&device)?,
        DirectXPixelFormat::B8G8R8A8UIntNormalized,
        1,
        size,
    )?;
    let session = frame_pool.CreateCaptureSession(&item)?;

    let arrived = Arc::new(AtomicBool::new(false));
    let arrived_flag = arrived.clone();
    frame_pool.FrameArrived(&TypedEventHandler::new(
        move |_pool: &Option<Direct3D11CaptureFramePool>, _| {
            arrived_flag.store(true, Ordering::SeqCst);
            Ok(())
        },
    ))?;

    session.StartCapture()?;
    let start = Instant::now();
    while !arrived.load(Ordering::SeqCst) {
        if start.elapsed() > FRAME_TIMEOUT {
            let _ = session.Close();
            let _ = frame_pool.Close();
            return Err(anyhow!("Timed out waiting for a captured frame"));
        }
        std::thread::sleep(Duration::from_millis(5));
    }

    let frame = frame_pool.TryGetNextFrame()?;
    let access: IDirect3DDxgiInterfaceAccess = frame.Surface()?.cast()?;
    let texture: ID3D11Texture2D = unsafe { access.GetInterface()? };
    let image = read_texture(
        &device,
        &context,
        &texture,
        (offset.x.max(0) as u32, offset.y.max(0) as u32),
        (width, height),
    );

    session.Close()?;
    frame_pool.Close()?;
    trace!(
        "Captured {}x{} at offset ({}, {})",
        width, height, offset.x, offset.y
    );
    image
}

/// Copies `texture` to CPU memory and converts the cropped region from BGRA to RGBA.
fn read_texture(
    device: &ID3D11Device,
    context: &ID3D11DeviceContext,
    texture: &ID3D11Texture2D,
    origin: (u32, u32),
    size: (u32, u32),
) -> Result<RgbaImage> {
    let mut desc = D3D11_TEXTURE2D_DESC::default();
    unsafe { texture.GetDesc(&mut desc) };

    let staging_desc = D3D11_TEXTURE2D_DESC {
        MipLevels: 1,
        ArraySize: 1,
        Usage: D3D11_USAGE_STAGING,
        BindFlags: Default::default(),
        CPUAccessFlags: D3D11_CPU_ACCESS_READ.0 as u32,
        MiscFlags: Default::default(),
        ..desc
    };
    let staging = unsafe {
        let mut staging: Option<ID3D11Texture2D> = None;
        device.CreateTexture2D(&staging_desc, None, Some(&mut staging))?;
        staging.ok_or_else(|| anyhow!("Failed to create staging texture"))?
    };
    let staging_resource: ID3D11Resource = staging.cast()?;

    let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
    unsafe {
        context.CopyResource(&staging_resource, &texture.cast::<ID3D11Resource>()?);
        context.Map(&staging_resource, 0, D3D11_MAP_READ, 0, Some(&mut mapped))?;
    }

    let row_pitch = mapped.RowPitch as usize;
    let src = unsafe {
        std::slice::from_raw_parts(mapped.pData as *const u8, row_pitch * desc.Height as usize)
    };
    let (width, height) = size;
    let (ox, oy) = origin;
    let image = RgbaImage::from_fn(width, height, |x, y| {
        let (sx, sy) = (ox + x, oy + y);
        if sx >= desc.Width || sy >= desc.Height {
            return image::Rgba([0, 0, 0, 255]);
        }
        let i = sy as usize * row_pitch + sx as usize * 4;
        image::Rgba([src[i + 2], src[i + 1], src[i], src[i + 3]])
    });

    unsafe { context.Unmap(&staging_resource, 0) };
    Ok(image)
}

fn create_d3d11_device() -> Result<(ID3D11Device, ID3D11DeviceContext)> {
    let mut device: Option<ID3D11Device> = None;
    let mut context: Option<ID3D11DeviceContext> = None;
    unsafe {
        D3D11CreateDevice(
            None,
            D3D_DRIVER_TYPE_HARDWARE,
            None,
            D3D11_CREATE_DEVICE_BGRA_SUPPORT,
            None,
            D3D11_SDK_VERSION,
            Some(&mut device),
            None,
            Some(&mut context),
        )?;
    }
    Ok((
        device.ok_or_else(|| anyhow!("Failed to create D3D11 device"))?,
        context.ok_or_else(|| anyhow!("Failed to create D3D11 context"))?,
    ))
}

/// WinRT wrapper required by the capture frame pool.
fn wrap_device(device: &ID3D11Device) -> Result<IDirect3DDevice> {
    let dxgi: IDXGIDevice = device.cast()?;
    let inspectable = unsafe { CreateDirect3D11DeviceFromDXGIDevice(&dxgi)? };
    inspectable
        .cast()
        .context("Failed to cast to IDirect3DDevice")
}

fn create_capture_item(hwnd: HWND) -> Result<GraphicsCaptureItem> {
    let class_name = windows::core::h!("Windows.Graphics.Capture.GraphicsCaptureItem");
    let interop: IGraphicsCaptureItemInterop = unsafe {
        RoGetActivationFactory(class_name).context("Failed to get IGraphicsCaptureItemInterop")?
    };
    unsafe {
        interop
            .CreateForWindow(hwnd)
            .context("Failed to create capture item for window")
    }
}
