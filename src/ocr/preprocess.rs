//! Turns detail-panel boxes into the recognizer's input tensor.
//!
//! Every box becomes one `1×32×320` plane: grayscale, resized to height 32 with
//! the aspect ratio kept (width capped at 320), binarized with a local gaussian
//! threshold, scaled to [-1, 1] and right-padded with zeros.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbaImage};
use ndarray::{Array4, ArrayViewMut2, Axis};

use crate::calibration::PixelRect;

pub const INPUT_HEIGHT: u32 = 32;
pub const INPUT_WIDTH: u32 = 320;

/// Neighbourhood size of the adaptive threshold (odd, just under the input height).
const THRESHOLD_BLOCK: u32 = INPUT_HEIGHT + INPUT_HEIGHT % 2 - 1;
/// Subtracted from the local mean before comparing.
const THRESHOLD_OFFSET: f32 = 2.0;

/// Crops `rect` out of `img`, clamped to the image bounds.
pub fn crop_box(img: &RgbaImage, rect: &PixelRect) -> Option<RgbaImage> {
    let (x, y, w, h) = rect.clamp_to(img.width(), img.height())?;
    Some(imageops::crop_imm(img, x, y, w, h).to_image())
}

/// Grayscale and resize to the model's input height.
pub fn resize_to_input(crop: &RgbaImage) -> GrayImage {
    let gray = imageops::grayscale(crop);
    let (w, h) = gray.dimensions();
    let new_w = ((INPUT_HEIGHT as u64 * w as u64) / h.max(1) as u64).clamp(1, INPUT_WIDTH as u64);
    imageops::resize(&gray, new_w as u32, INPUT_HEIGHT, FilterType::Triangle)
}

/// Binarizes against a gaussian-weighted local mean: a pixel turns white when it
/// is brighter than `mean - offset` of its `block`×`block` neighbourhood.
pub fn adaptive_threshold(gray: &GrayImage, block: u32, offset: f32) -> GrayImage {
    // Same sigma OpenCV derives for a kernel of this size.
    let sigma = 0.3 * ((block as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let mean = imageops::blur(gray, sigma);

    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let value = gray.get_pixel(x, y)[0] as f32;
        let local = mean.get_pixel(x, y)[0] as f32;
        if value > local - offset {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Writes one binarized line into a zero-initialised `32×320` plane.
fn write_plane(line: &GrayImage, mut plane: ArrayViewMut2<f32>) {
    for (x, y, pixel) in line.enumerate_pixels() {
        plane[[y as usize, x as usize]] = pixel[0] as f32 / 127.5 - 1.0;
    }
}

/// Builds the `(n, 1, 32, 320)` batch for `boxes`, in order.
///
/// A box that falls entirely outside the image leaves its plane at zero.
pub fn prepare_batch(img: &RgbaImage, boxes: &[PixelRect]) -> Array4<f32> {
    let mut batch = Array4::<f32>::zeros((
        boxes.len(),
        1,
        INPUT_HEIGHT as usize,
        INPUT_WIDTH as usize,
    ));

    for (mut item, rect) in batch.axis_iter_mut(Axis(0)).zip(boxes) {
        let Some(crop) = crop_box(img, rect) else {
            continue;
        };
        let line = adaptive_threshold(&resize_to_input(&crop), THRESHOLD_BLOCK, THRESHOLD_OFFSET);
        write_plane(&line, item.index_axis_mut(Axis(0), 0));
    }

    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_threshold_block_size() {
        assert_eq!(THRESHOLD_BLOCK, 31);
    }

    #[test]
    fn test_crop_box_clamps() {
        let img = RgbaImage::from_fn(100, 50, |x, y| Rgba([x as u8, y as u8, 0, 255]));
        let crop = crop_box(&img, &PixelRect::new(90, 40, 120, 80)).unwrap();
        assert_eq!(crop.dimensions(), (10, 10));
        assert_eq!(crop.get_pixel(0, 0)[0], 90);
        assert!(crop_box(&img, &PixelRect::new(200, 0, 210, 10)).is_none());
    }

    #[test]
    fn test_resize_keeps_aspect_and_caps_width() {
        let narrow = RgbaImage::new(40, 16);
        assert_eq!(resize_to_input(&narrow).dimensions(), (80, 32));

        let wide = RgbaImage::new(2000, 20);
        assert_eq!(resize_to_input(&wide).dimensions(), (320, 32));
    }

    #[test]
    fn test_adaptive_threshold_separates_dark_text() {
        // light background with a dark vertical bar
        let gray = GrayImage::from_fn(64, 32, |x, _| {
            if (30..34).contains(&x) {
                Luma([20])
            } else {
                Luma([200])
            }
        });
        let out = adaptive_threshold(&gray, 31, 2.0);
        assert_eq!(out.get_pixel(31, 16)[0], 0);
        assert_eq!(out.get_pixel(5, 16)[0], 255);
    }

    #[test]
    fn test_prepare_batch_shape_and_padding() {
        let img = RgbaImage::from_pixel(200, 100, Rgba([255, 255, 255, 255]));
        let boxes = [
            PixelRect::new(0, 0, 32, 16),
            PixelRect::new(500, 500, 510, 510),
        ];
        let batch = prepare_batch(&img, &boxes);
        assert_eq!(batch.shape(), &[2, 1, 32, 320]);

        // 32x16 resizes to 64 wide; uniform white is above its own mean
        assert_eq!(batch[[0, 0, 10, 10]], 1.0);
        assert_eq!(batch[[0, 0, 10, 100]], 0.0);
        assert!(batch.index_axis(Axis(0), 1).iter().all(|&v| v == 0.0));
    }
}
