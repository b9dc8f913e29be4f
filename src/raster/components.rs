//! Per-cell connected-component statistics and filtering.
//!
//! Filtering works by component id, never by erosion, so holes inside
//! letterforms survive: a hole is background and never becomes a foreground
//! component.

use image::{GrayImage, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};

/// Area, centroid and bbox for one 8-connected foreground component.
#[derive(Clone, Copy, Debug)]
pub struct ComponentStats {
    pub label: u32,
    pub area: u32,
    pub centroid: (f64, f64),
    /// Inclusive pixel bounds (min_x, min_y, max_x, max_y).
    pub bbox: (u32, u32, u32, u32),
}

/// Label the ink=255 components of a mask and accumulate their stats.
pub fn component_stats(mask: &GrayImage) -> Vec<ComponentStats> {
    let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));

    let mut stats: Vec<ComponentStats> = Vec::new();
    let mut index_of_label: Vec<Option<usize>> = Vec::new();
    let mut sums: Vec<(u64, u64)> = Vec::new();

    for (x, y, pixel) in labels.enumerate_pixels() {
        let label = pixel.0[0];
        if label == 0 {
            continue;
        }
        let slot = label as usize;
        if index_of_label.len() <= slot {
            index_of_label.resize(slot + 1, None);
        }
        let idx = match index_of_label[slot] {
            Some(idx) => idx,
            None => {
                let idx = stats.len();
                index_of_label[slot] = Some(idx);
                stats.push(ComponentStats {
                    label,
                    area: 0,
                    centroid: (0.0, 0.0),
                    bbox: (x, y, x, y),
                });
                sums.push((0, 0));
                idx
            }
        };
        let s = &mut stats[idx];
        s.area += 1;
        s.bbox.0 = s.bbox.0.min(x);
        s.bbox.1 = s.bbox.1.min(y);
        s.bbox.2 = s.bbox.2.max(x);
        s.bbox.3 = s.bbox.3.max(y);
        sums[idx].0 += x as u64;
        sums[idx].1 += y as u64;
    }

    for (s, &(sx, sy)) in stats.iter_mut().zip(sums.iter()) {
        s.centroid = (sx as f64 / s.area as f64, sy as f64 / s.area as f64);
    }
    stats
}

/// Keep only the components a handwriting cell should contain.
///
/// Drops components below the area floor and components whose centroid sits
/// in the top `reject_top_fraction` of the mask, which is residue of the printed
/// label glyph bleeding below the label band.
pub fn filter_components(
    mask: &GrayImage,
    min_area: u32,
    reject_top_fraction: f64,
) -> GrayImage {
    let stats = component_stats(mask);
    let reject_below_y = reject_top_fraction * mask.height() as f64;

    let keep: Vec<u32> = stats
        .iter()
        .filter(|s| s.area >= min_area && s.centroid.1 >= reject_below_y)
        .map(|s| s.label)
        .collect();

    if keep.len() == stats.len() {
        return mask.clone();
    }

    let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));
    let mut out = GrayImage::new(mask.width(), mask.height());
    for (dst, label) in out.pixels_mut().zip(labels.pixels()) {
        if label.0[0] != 0 && keep.contains(&label.0[0]) {
            dst.0[0] = 255;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_with_blobs() -> GrayImage {
        let mut mask = GrayImage::new(50, 100);
        // Main blob: 20x20 at (10, 40).
        for y in 40..60 {
            for x in 10..30 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        // Dust: 2x2 at (40, 80).
        for y in 80..82 {
            for x in 40..42 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        // Label residue: 10x6 near the top.
        for y in 2..8 {
            for x in 5..15 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        mask
    }

    #[test]
    fn stats_report_area_and_centroid() {
        let stats = component_stats(&mask_with_blobs());
        assert_eq!(stats.len(), 3);
        let main = stats.iter().find(|s| s.area == 400).expect("main blob");
        assert!((main.centroid.0 - 19.5).abs() < 1e-9);
        assert!((main.centroid.1 - 49.5).abs() < 1e-9);
        assert_eq!(main.bbox, (10, 40, 29, 59));
    }

    #[test]
    fn filter_drops_dust_and_label_residue() {
        let filtered = filter_components(&mask_with_blobs(), 50, 0.15);
        assert_eq!(filtered.get_pixel(20, 50).0[0], 255, "main blob kept");
        assert_eq!(filtered.get_pixel(40, 80).0[0], 0, "dust dropped");
        assert_eq!(filtered.get_pixel(10, 5).0[0], 0, "label residue dropped");
    }

    #[test]
    fn filter_keeps_everything_when_thresholds_allow() {
        let mut mask = GrayImage::new(20, 20);
        for y in 10..15 {
            for x in 5..15 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let filtered = filter_components(&mask, 1, 0.0);
        assert_eq!(filtered.as_raw(), mask.as_raw());
    }

    #[test]
    fn component_spanning_the_boundary_is_judged_by_centroid() {
        // One blob from y=0 to y=40 in a 100-tall mask: centroid y = 20,
        // above the 15% line, so it stays.
        let mut mask = GrayImage::new(30, 100);
        for y in 0..40 {
            for x in 10..20 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let filtered = filter_components(&mask, 50, 0.15);
        assert_eq!(filtered.get_pixel(15, 20).0[0], 255);
    }
}
