//! Outline tracing for filled glyph output.
//!
//! The cell mask is tight-cropped, lightly smoothed to knock down
//! stair-step edges, then traced with the Suzuki-Abe parent-tree tracer so
//! outline vs. hole is decided by topology rather than fill heuristics.

use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use imageproc::filter::gaussian_blur_f32;

use super::{Bounds, Contour, Point, VectorCell, simplify_closed};
use crate::raster::{binarize, crop_gray};

#[derive(Clone, Copy, Debug)]
pub struct TraceOptions {
    /// Padding around the ink bbox before tracing, pixels.
    pub pad: u32,
    /// Pre-trace smoothing sigma.
    pub presmooth_sigma: f32,
    /// Douglas-Peucker epsilon in cell pixels.
    pub simplify_epsilon: f64,
    /// Paths with a bbox smaller than this fraction of the cell are dust.
    pub min_bbox_fraction: f64,
    /// Outlines with a bbox larger than this fraction of the cell are
    /// spurious background captures.
    pub max_outline_fraction: f64,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            pad: 2,
            presmooth_sigma: 0.8,
            simplify_epsilon: 0.6,
            min_bbox_fraction: 0.0001,
            max_outline_fraction: 0.85,
        }
    }
}

/// Trace a cell's ink mask into outlines and holes, in mask coordinates.
///
/// Returns `None` when the mask holds no ink or nothing survives filtering.
/// Winding is normalized for the later y-flip into font space: outlines are
/// clockwise in y-down pixels (negative shoelace), holes counter-clockwise.
pub fn trace_cell_outlines(mask: &GrayImage, opts: &TraceOptions) -> Option<VectorCell> {
    let (ink_min, ink_max) = ink_bbox(mask)?;

    let crop_x = ink_min.0.saturating_sub(opts.pad);
    let crop_y = ink_min.1.saturating_sub(opts.pad);
    let crop_w = (ink_max.0 - crop_x + 1 + opts.pad).min(mask.width() - crop_x);
    let crop_h = (ink_max.1 - crop_y + 1 + opts.pad).min(mask.height() - crop_y);
    let cropped = crop_gray(mask, crop_x, crop_y, crop_w, crop_h);

    let smoothed = gaussian_blur_f32(&cropped, opts.presmooth_sigma);
    let rebinarized = binarize(&smoothed, 127, false);

    let cell_area = mask.width() as f64 * mask.height() as f64;
    let min_bbox_area = opts.min_bbox_fraction * cell_area;
    let max_outline_area = opts.max_outline_fraction * cell_area;

    let mut outlines = Vec::new();
    let mut holes = Vec::new();

    for traced in find_contours::<i32>(&rebinarized) {
        if traced.points.len() < 3 {
            continue;
        }
        let points: Vec<Point> = traced
            .points
            .iter()
            .map(|p| Point::new((p.x + crop_x as i32) as f64, (p.y + crop_y as i32) as f64))
            .collect();

        let bounds = Bounds::from_points(&points);
        let bbox_area = bounds.area();
        if bbox_area < min_bbox_area {
            continue; // dust
        }
        if traced.border_type == BorderType::Outer && bbox_area > max_outline_area {
            continue; // traced the cell background, not a glyph piece
        }

        let mut contour = Contour::new(simplify_closed(&points, opts.simplify_epsilon));
        match traced.border_type {
            BorderType::Outer => {
                // Outlines carry negative shoelace in y-down pixels; the
                // y-flip into font space then makes them positive (CCW).
                if contour.signed_area() > 0.0 {
                    contour.reverse();
                }
                outlines.push(contour);
            }
            BorderType::Hole => {
                if contour.signed_area() < 0.0 {
                    contour.reverse();
                }
                holes.push(contour);
            }
        }
    }

    if outlines.is_empty() {
        return None;
    }
    tracing::trace!(
        outlines = outlines.len(),
        holes = holes.len(),
        "cell contours traced"
    );

    // A hole only makes sense inside a surviving outline; anything else is
    // the child of a filtered path.
    let outline_bounds: Vec<Bounds> = outlines.iter().map(Contour::bounds).collect();
    holes.retain(|hole| {
        let hb = hole.bounds();
        outline_bounds.iter().any(|ob| expand(ob, 1.0).contains(&hb))
    });

    let bounds = outline_bounds
        .iter()
        .copied()
        .reduce(|a, b| a.union(&b))
        .unwrap_or_default();

    Some(VectorCell {
        outlines,
        holes,
        bounds,
    })
}

fn expand(b: &Bounds, by: f64) -> Bounds {
    Bounds {
        x: b.x - by,
        y: b.y - by,
        width: b.width + 2.0 * by,
        height: b.height + 2.0 * by,
    }
}

/// Inclusive min/max coordinates of ink pixels, or `None` for a blank mask.
fn ink_bbox(mask: &GrayImage) -> Option<((u32, u32), (u32, u32))> {
    let mut min = (u32::MAX, u32::MAX);
    let mut max = (0u32, 0u32);
    let mut any = false;
    for (x, y, pixel) in mask.enumerate_pixels() {
        if pixel.0[0] == 255 {
            any = true;
            min.0 = min.0.min(x);
            min.1 = min.1.min(y);
            max.0 = max.0.max(x);
            max.1 = max.1.max(y);
        }
    }
    any.then_some((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn blank(w: u32, h: u32) -> GrayImage {
        GrayImage::from_pixel(w, h, Luma([0]))
    }

    /// Thick ring centered at (cx, cy): outer radius r_out, inner r_in.
    fn draw_ring(mask: &mut GrayImage, cx: f64, cy: f64, r_out: f64, r_in: f64) {
        for (x, y, pixel) in mask.enumerate_pixels_mut() {
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            let d = (dx * dx + dy * dy).sqrt();
            if d <= r_out && d >= r_in {
                pixel.0[0] = 255;
            }
        }
    }

    #[test]
    fn blank_mask_traces_to_nothing() {
        assert!(trace_cell_outlines(&blank(50, 50), &TraceOptions::default()).is_none());
    }

    #[test]
    fn ring_yields_one_outline_and_one_hole() {
        let mut mask = blank(80, 80);
        draw_ring(&mut mask, 40.0, 40.0, 25.0, 15.0);

        let cell = trace_cell_outlines(&mask, &TraceOptions::default()).unwrap();
        assert_eq!(cell.outlines.len(), 1);
        assert_eq!(cell.holes.len(), 1);

        // Pixel-space winding: outlines negative, holes positive, so the
        // y-flip into font space lands on outline-positive / hole-negative.
        assert!(cell.outlines[0].signed_area() < 0.0);
        assert!(cell.holes[0].signed_area() > 0.0);

        let hole_bounds = cell.holes[0].bounds();
        let outline_bounds = cell.outlines[0].bounds();
        assert!(expand(&outline_bounds, 1.0).contains(&hole_bounds));
    }

    #[test]
    fn disjoint_pieces_stay_separate_outlines() {
        let mut mask = blank(100, 60);
        for y in 10..50 {
            for x in 10..25 {
                mask.put_pixel(x, y, Luma([255]));
            }
            for x in 60..75 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let cell = trace_cell_outlines(&mask, &TraceOptions::default()).unwrap();
        assert_eq!(cell.outlines.len(), 2);
        assert!(cell.holes.is_empty());
    }

    #[test]
    fn dust_is_filtered_out() {
        let mut mask = blank(200, 200);
        for y in 50..150 {
            for x in 50..150 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        mask.put_pixel(190, 190, Luma([255]));
        mask.put_pixel(191, 190, Luma([255]));

        let cell = trace_cell_outlines(&mask, &TraceOptions::default()).unwrap();
        assert_eq!(cell.outlines.len(), 1, "speck must not become an outline");
    }

    #[test]
    fn coordinates_are_in_mask_space() {
        // Ink far from the origin must come back at its true position, not
        // relative to the tight crop.
        let mut mask = blank(120, 120);
        for y in 80..100 {
            for x in 90..110 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let cell = trace_cell_outlines(&mask, &TraceOptions::default()).unwrap();
        let b = cell.bounds;
        assert!(b.x >= 85.0 && b.x <= 95.0, "bounds.x = {}", b.x);
        assert!(b.y >= 75.0 && b.y <= 85.0, "bounds.y = {}", b.y);
    }

    #[test]
    fn simplification_reduces_point_count() {
        let mut mask = blank(80, 80);
        draw_ring(&mut mask, 40.0, 40.0, 30.0, 0.0); // filled disc
        let raw = TraceOptions {
            simplify_epsilon: 0.0,
            ..TraceOptions::default()
        };
        let simplified = TraceOptions::default();
        let n_raw = trace_cell_outlines(&mask, &raw).unwrap().outlines[0].points.len();
        let n_simp = trace_cell_outlines(&mask, &simplified).unwrap().outlines[0]
            .points
            .len();
        assert!(n_simp < n_raw);
        assert!(n_simp >= 8, "a disc still needs a ring of points");
    }
}
