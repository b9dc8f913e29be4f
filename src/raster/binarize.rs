//! Binarization and the ink=255 polarity convention.
//!
//! Every binary mask in the pipeline is foreground ink at 255 on background
//! 0. Consumers normalize through [`ensure_ink_polarity`] so a mask that
//! arrives white-dominant is inverted instead of silently mis-read.

use image::{GrayImage, Luma};

use crate::error::PipelineError;
use crate::raster::foreground_fraction;

/// Otsu's threshold from the grayscale histogram: the cut that maximizes
/// between-class variance.
pub fn otsu_threshold(gray: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in gray.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }

    let total = gray.width() as u64 * gray.height() as u64;
    if total == 0 {
        return 128;
    }

    let mut sum_total = 0.0;
    for (i, &count) in histogram.iter().enumerate() {
        sum_total += i as f64 * count as f64;
    }

    let mut sum_background = 0.0;
    let mut weight_background = 0u64;
    let mut max_variance = 0.0;
    let mut best = 0u8;

    for (t, &count) in histogram.iter().enumerate() {
        weight_background += count;
        if weight_background == 0 {
            continue;
        }
        let weight_foreground = total - weight_background;
        if weight_foreground == 0 {
            break;
        }

        sum_background += t as f64 * count as f64;
        let mean_background = sum_background / weight_background as f64;
        let mean_foreground = (sum_total - sum_background) / weight_foreground as f64;

        let between = weight_background as f64
            * weight_foreground as f64
            * (mean_background - mean_foreground).powi(2);
        if between > max_variance {
            max_variance = between;
            best = t as u8;
        }
    }

    best
}

/// Threshold to a binary mask. With `invert` false, values above the
/// threshold become 255; with `invert` true, values at or below it do,
/// which maps dark ink on a light page to foreground.
pub fn binarize(gray: &GrayImage, threshold: u8, invert: bool) -> GrayImage {
    let mut out = GrayImage::new(gray.width(), gray.height());
    for (src, dst) in gray.pixels().zip(out.pixels_mut()) {
        let above = src.0[0] > threshold;
        let on = above != invert;
        *dst = Luma([if on { 255 } else { 0 }]);
    }
    out
}

/// Whether every pixel is 0 or 255.
pub fn is_binary(mask: &GrayImage) -> bool {
    mask.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255)
}

/// Normalize a binary mask to the ink=255 convention.
///
/// A mask where more than half the pixels are foreground is assumed to be
/// polarity-flipped (background white) and is inverted in place. Non-binary
/// input is a programming error upstream.
pub fn ensure_ink_polarity(mut mask: GrayImage) -> Result<GrayImage, PipelineError> {
    if !is_binary(&mask) {
        return Err(PipelineError::InvalidPolarity);
    }
    if foreground_fraction(&mask) > 0.5 {
        for pixel in mask.pixels_mut() {
            pixel.0[0] = 255 - pixel.0[0];
        }
    }
    Ok(mask)
}
