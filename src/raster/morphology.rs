//! Morphological cleanup with an elliptical structuring element.
//!
//! Closing (dilate then erode) bridges small stroke gaps; opening (erode
//! then dilate) removes specks. The disc-shaped kernel avoids the
//! axis-aligned artifacts a rectangle leaves on diagonal strokes.

use image::{GrayImage, Luma};

use crate::error::PipelineError;
use crate::raster::ensure_ink_polarity;

/// Offsets inside a disc of diameter `size`. Size 0 or 1 yields the single
/// center offset (identity kernel).
fn disc_kernel(size: u32) -> Vec<(i32, i32)> {
    let radius = (size / 2) as i32;
    let r_sq = radius * radius;
    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= r_sq {
                offsets.push((dx, dy));
            }
        }
    }
    offsets
}

fn apply_kernel(mask: &GrayImage, kernel: &[(i32, i32)], dilating: bool) -> GrayImage {
    let (width, height) = mask.dimensions();
    let mut out = GrayImage::new(width, height);
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            // Dilation: any kernel hit turns the pixel on.
            // Erosion: any kernel miss (or out-of-bounds) turns it off.
            let mut on = !dilating;
            for &(dx, dy) in kernel {
                let nx = x + dx;
                let ny = y + dy;
                let inside = nx >= 0 && ny >= 0 && nx < width as i32 && ny < height as i32;
                let value = inside && mask.get_pixel(nx as u32, ny as u32).0[0] == 255;
                if dilating && value {
                    on = true;
                    break;
                }
                if !dilating && !value {
                    on = false;
                    break;
                }
            }
            out.put_pixel(x as u32, y as u32, Luma([if on { 255 } else { 0 }]));
        }
    }
    out
}

/// Dilate an ink=255 mask with a disc of diameter `size`.
pub fn dilate(mask: &GrayImage, size: u32) -> GrayImage {
    if size < 2 {
        return mask.clone();
    }
    apply_kernel(mask, &disc_kernel(size), true)
}

/// Erode an ink=255 mask with a disc of diameter `size`.
pub fn erode(mask: &GrayImage, size: u32) -> GrayImage {
    if size < 2 {
        return mask.clone();
    }
    apply_kernel(mask, &disc_kernel(size), false)
}

/// Morphological closing: bridge gaps up to roughly `size` pixels.
pub fn close(mask: &GrayImage, size: u32) -> GrayImage {
    if size < 2 {
        return mask.clone();
    }
    erode(&dilate(mask, size), size)
}

/// Morphological opening: remove specks smaller than the kernel.
pub fn open(mask: &GrayImage, size: u32) -> GrayImage {
    if size < 2 {
        return mask.clone();
    }
    dilate(&erode(mask, size), size)
}

/// Denoise a binary ink mask: close first (so gaps bridge before anything is
/// eaten), then open. Either size 0 skips that operation. Polarity is
/// normalized before touching pixels.
pub fn cleanup(
    mask: GrayImage,
    close_size: u32,
    open_size: u32,
) -> Result<GrayImage, PipelineError> {
    let mask = ensure_ink_polarity(mask)?;
    let closed = close(&mask, close_size);
    let opened = open(&closed, open_size);
    tracing::debug!(close_size, open_size, "morphological cleanup applied");
    Ok(opened)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(w: u32, h: u32) -> GrayImage {
        GrayImage::from_pixel(w, h, Luma([0]))
    }

    fn fill_rect(mask: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..y1 {
            for x in x0..x1 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }

    #[test]
    fn disc_kernel_size_three_is_a_cross() {
        let kernel = disc_kernel(3);
        assert_eq!(kernel.len(), 5);
        assert!(kernel.contains(&(0, 0)));
        assert!(kernel.contains(&(1, 0)));
        assert!(!kernel.contains(&(1, 1)));
    }

    #[test]
    fn opening_removes_specks() {
        let mut mask = blank(30, 30);
        fill_rect(&mut mask, 5, 5, 15, 15);
        mask.put_pixel(25, 25, Luma([255])); // isolated speck
        let opened = open(&mask, 3);
        assert_eq!(opened.get_pixel(25, 25).0[0], 0);
        assert_eq!(opened.get_pixel(10, 10).0[0], 255);
    }

    #[test]
    fn closing_bridges_a_gap() {
        let mut mask = blank(30, 10);
        fill_rect(&mut mask, 2, 3, 14, 7);
        fill_rect(&mut mask, 16, 3, 28, 7); // 2px gap at x=14..16
        assert_eq!(mask.get_pixel(14, 5).0[0], 0);
        let closed = close(&mask, 3);
        assert_eq!(closed.get_pixel(14, 5).0[0], 255);
        assert_eq!(closed.get_pixel(15, 5).0[0], 255);
    }

    #[test]
    fn size_zero_is_a_no_op() {
        let mut mask = blank(12, 12);
        fill_rect(&mut mask, 2, 2, 5, 5);
        mask.put_pixel(9, 9, Luma([255]));
        let out = cleanup(mask.clone(), 0, 0).unwrap();
        assert_eq!(out.as_raw(), mask.as_raw());
    }

    #[test]
    fn cleanup_normalizes_inverted_polarity() {
        // White background with black ink: dominant-white triggers inversion.
        let mut inverted = GrayImage::from_pixel(20, 20, Luma([255]));
        for y in 8..12 {
            for x in 4..16 {
                inverted.put_pixel(x, y, Luma([0]));
            }
        }
        let out = cleanup(inverted, 3, 2).unwrap();
        assert_eq!(out.get_pixel(10, 10).0[0], 255);
        assert_eq!(out.get_pixel(1, 1).0[0], 0);
    }

    #[test]
    fn holes_survive_cleanup() {
        // A thick ring: the enclosed background must not be filled in.
        let mut mask = blank(40, 40);
        fill_rect(&mut mask, 5, 5, 35, 35);
        fill_rect_off(&mut mask, 14, 14, 26, 26);
        let out = cleanup(mask, 3, 2).unwrap();
        assert_eq!(out.get_pixel(20, 20).0[0], 0, "hole must stay background");
        assert_eq!(out.get_pixel(8, 20).0[0], 255);
    }

    fn fill_rect_off(mask: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..y1 {
            for x in x0..x1 {
                mask.put_pixel(x, y, Luma([0]));
            }
        }
    }
}
