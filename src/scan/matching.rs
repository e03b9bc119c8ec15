//! Image similarity used for scroll boundary and end-of-list detection.

use image::RgbaImage;
use image::imageops;

use crate::calibration::PixelRect;

/// Normalized cross-correlation of two equally sized images on luminance.
///
/// 1.0 means identical up to brightness/contrast. Two flat images score 1.0
/// when equal and 0.0 otherwise; size mismatches score 0.0.
pub fn similarity(a: &RgbaImage, b: &RgbaImage) -> f64 {
    if a.dimensions() != b.dimensions() || a.width() == 0 || a.height() == 0 {
        return 0.0;
    }

    let la = imageops::grayscale(a);
    let lb = imageops::grayscale(b);
    let n = la.as_raw().len() as f64;

    let mean_a = la.as_raw().iter().map(|&v| v as f64).sum::<f64>() / n;
    let mean_b = lb.as_raw().iter().map(|&v| v as f64).sum::<f64>() / n;

    let (mut cross, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (&pa, &pb) in la.as_raw().iter().zip(lb.as_raw()) {
        let da = pa as f64 - mean_a;
        let db = pb as f64 - mean_b;
        cross += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return if var_a == var_b && la == lb { 1.0 } else { 0.0 };
    }
    cross / (var_a * var_b).sqrt()
}

/// Crops `rect` out of `img`; an out-of-bounds rect yields an empty image.
pub fn crop(img: &RgbaImage, rect: &PixelRect) -> RgbaImage {
    match rect.clamp_to(img.width(), img.height()) {
        Some((x, y, w, h)) => imageops::crop_imm(img, x, y, w, h).to_image(),
        None => RgbaImage::new(0, 0),
    }
}
