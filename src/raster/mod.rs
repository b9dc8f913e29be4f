//! Shared raster helpers: grayscale conversion and cropping.

mod binarize;
mod components;
mod diff;
mod morphology;

pub use binarize::{binarize, ensure_ink_polarity, is_binary, otsu_threshold};
pub use components::{ComponentStats, component_stats, filter_components};
pub use diff::subtract_template;
pub use morphology::{close, cleanup, dilate, erode, open};

use image::{GrayImage, Luma, RgbaImage};

/// Rec.601 luminance.
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let y = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
    y.round().clamp(0.0, 255.0) as u8
}

/// Convert an RGBA scan to grayscale. Alpha is ignored; scans are opaque.
pub fn to_gray(image: &RgbaImage) -> GrayImage {
    let mut out = GrayImage::new(image.width(), image.height());
    for (src, dst) in image.pixels().zip(out.pixels_mut()) {
        let [r, g, b, _] = src.0;
        *dst = Luma([luminance(r, g, b)]);
    }
    out
}

/// Crop a grayscale image, clamping the rectangle to the image bounds.
pub fn crop_gray(image: &GrayImage, x: u32, y: u32, width: u32, height: u32) -> GrayImage {
    let x = x.min(image.width());
    let y = y.min(image.height());
    let width = width.min(image.width() - x);
    let height = height.min(image.height() - y);
    image::imageops::crop_imm(image, x, y, width, height).to_image()
}

/// Fraction of pixels at 255 in a binary mask.
pub fn foreground_fraction(mask: &GrayImage) -> f64 {
    let total = mask.width() as u64 * mask.height() as u64;
    if total == 0 {
        return 0.0;
    }
    let on = mask.pixels().filter(|p| p.0[0] == 255).count() as u64;
    on as f64 / total as f64
}
