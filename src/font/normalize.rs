//! Baseline-anchored normalization from cell pixels to font units.
//!
//! One uniform scale per cell, derived from the template's cap-to-baseline
//! distance, maps every point of the cell. Because the same anchor and the
//! same scale apply everywhere, x-height letters, caps and descenders land
//! at geometrically correct relative heights.

use super::GlyphBounds;
use crate::vector::{Bounds, CellGeometry, Contour, Point, Stroke};

/// Abstract coordinate resolution of the output font.
pub const UNITS_PER_EM: i32 = 1000;
/// Cap height above the baseline, font units. The baseline itself is y=0.
pub const FONT_CAP_HEIGHT: f64 = 700.0;
pub const FONT_ASCENDER: f64 = 800.0;
pub const FONT_DESCENDER: f64 = -200.0;
/// Default left and right side bearing, font units.
pub const DEFAULT_SIDE_BEARING: f64 = 10.0;

/// A cell's geometry mapped into font units, y-up, baseline at zero.
#[derive(Clone, Debug, Default)]
pub struct NormalizedGlyph {
    pub outlines: Vec<Contour>,
    pub holes: Vec<Contour>,
    pub strokes: Vec<Stroke>,
    pub advance_width: i32,
    pub bounds: GlyphBounds,
}

/// Map cell geometry into font units.
///
/// `cap_height_px` and `baseline_px` are the guide offsets in the same
/// (writing-area) pixel frame as the geometry, y-down. Every point maps as
/// `((x - inkLeft)·s + bearing, (baseline - y)·s)` with
/// `s = FONT_CAP_HEIGHT / (baseline - capHeight)`.
pub fn normalize_cell(
    geometry: &CellGeometry,
    cap_height_px: f64,
    baseline_px: f64,
) -> NormalizedGlyph {
    let template_cap_to_baseline = baseline_px - cap_height_px;
    debug_assert!(template_cap_to_baseline > 0.0);
    let scale = FONT_CAP_HEIGHT / template_cap_to_baseline;

    let ink = geometry.bounds();
    let map = |p: Point| {
        Point::new(
            (p.x - ink.x) * scale + DEFAULT_SIDE_BEARING,
            (baseline_px - p.y) * scale,
        )
    };

    let mut glyph = NormalizedGlyph::default();
    let mut all_points: Vec<Point> = Vec::new();

    match geometry {
        CellGeometry::Outlines(cell) => {
            for contour in &cell.outlines {
                let mut mapped = Contour::new(contour.points.iter().map(|&p| map(p)).collect());
                // The y-flip mirrors orientation; re-assert the font-space
                // convention: outlines positive, holes negative.
                if mapped.signed_area() < 0.0 {
                    mapped.reverse();
                }
                all_points.extend_from_slice(&mapped.points);
                glyph.outlines.push(mapped);
            }
            for contour in &cell.holes {
                let mut mapped = Contour::new(contour.points.iter().map(|&p| map(p)).collect());
                if mapped.signed_area() > 0.0 {
                    mapped.reverse();
                }
                all_points.extend_from_slice(&mapped.points);
                glyph.holes.push(mapped);
            }
        }
        CellGeometry::Strokes(strokes) => {
            for stroke in strokes {
                let mapped = Stroke::new(stroke.points.iter().map(|&p| map(p)).collect());
                all_points.extend_from_slice(&mapped.points);
                glyph.strokes.push(mapped);
            }
        }
    }

    let bounds = Bounds::from_points(&all_points);
    glyph.bounds = GlyphBounds {
        x: bounds.x.round() as i32,
        y: bounds.y.round() as i32,
        width: bounds.width.round() as i32,
        height: bounds.height.round() as i32,
    };
    glyph.advance_width =
        (DEFAULT_SIDE_BEARING + ink.width * scale + DEFAULT_SIDE_BEARING).round() as i32;

    glyph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::VectorCell;

    /// A square ring outline in writing-area pixels, y-down, pixel-space
    /// winding (outline negative).
    fn square_cell(x0: f64, y0: f64, side: f64) -> CellGeometry {
        let mut outline = Contour::new(vec![
            Point::new(x0, y0),
            Point::new(x0 + side, y0),
            Point::new(x0 + side, y0 + side),
            Point::new(x0, y0 + side),
        ]);
        if outline.signed_area() > 0.0 {
            outline.reverse();
        }
        let bounds = outline.bounds();
        CellGeometry::Outlines(VectorCell {
            outlines: vec![outline],
            holes: Vec::new(),
            bounds,
        })
    }

    #[test]
    fn baseline_maps_to_zero_and_cap_to_cap_height() {
        // Square spanning cap height to baseline exactly.
        let cap = 30.0;
        let baseline = 130.0;
        let glyph = normalize_cell(&square_cell(10.0, cap, 100.0), cap, baseline);

        assert_eq!(glyph.bounds.y, 0, "bottom of ink sits on the baseline");
        assert_eq!(glyph.bounds.height, FONT_CAP_HEIGHT as i32);
        assert_eq!(glyph.bounds.x, DEFAULT_SIDE_BEARING as i32);
    }

    #[test]
    fn scale_is_uniform_across_axes() {
        // A 2:1 box must stay 2:1 after normalization.
        let glyph = normalize_cell(&square_cell(0.0, 50.0, 40.0), 20.0, 120.0);
        let cell = normalize_cell(
            &CellGeometry::Outlines(VectorCell {
                outlines: vec![Contour::new(vec![
                    Point::new(0.0, 50.0),
                    Point::new(0.0, 90.0),
                    Point::new(80.0, 90.0),
                    Point::new(80.0, 50.0),
                ])],
                holes: Vec::new(),
                bounds: Bounds {
                    x: 0.0,
                    y: 50.0,
                    width: 80.0,
                    height: 40.0,
                },
            }),
            20.0,
            120.0,
        );
        assert_eq!(cell.bounds.width, 2 * cell.bounds.height);
        assert_eq!(glyph.bounds.width, glyph.bounds.height);
    }

    #[test]
    fn advance_matches_scaled_width_plus_bearings() {
        let cap = 25.0;
        let baseline = 125.0;
        let side = 60.0;
        let glyph = normalize_cell(&square_cell(5.0, 40.0, side), cap, baseline);

        let scale = FONT_CAP_HEIGHT / (baseline - cap);
        let expected = (side * scale).round() as i32 + 2 * DEFAULT_SIDE_BEARING as i32;
        assert_eq!(glyph.advance_width, expected);
        assert!(glyph.advance_width >= 2 * DEFAULT_SIDE_BEARING as i32);
    }

    #[test]
    fn winding_is_positive_for_outlines_after_flip() {
        let glyph = normalize_cell(&square_cell(0.0, 30.0, 50.0), 20.0, 120.0);
        assert!(glyph.outlines[0].signed_area() > 0.0);
    }

    #[test]
    fn hole_winding_is_negative_and_contained() {
        let mut outline = Contour::new(vec![
            Point::new(0.0, 0.0),
            Point::new(60.0, 0.0),
            Point::new(60.0, 60.0),
            Point::new(0.0, 60.0),
        ]);
        if outline.signed_area() > 0.0 {
            outline.reverse();
        }
        let mut hole = Contour::new(vec![
            Point::new(20.0, 20.0),
            Point::new(40.0, 20.0),
            Point::new(40.0, 40.0),
            Point::new(20.0, 40.0),
        ]);
        if hole.signed_area() < 0.0 {
            hole.reverse();
        }
        let bounds = outline.bounds();
        let geometry = CellGeometry::Outlines(VectorCell {
            outlines: vec![outline],
            holes: vec![hole],
            bounds,
        });

        let glyph = normalize_cell(&geometry, 10.0, 90.0);
        assert!(glyph.outlines[0].signed_area() > 0.0);
        assert!(glyph.holes[0].signed_area() < 0.0);

        let ob = crate::vector::Bounds::from_points(&glyph.outlines[0].points);
        let hb = crate::vector::Bounds::from_points(&glyph.holes[0].points);
        assert!(ob.contains(&hb));
    }

    #[test]
    fn all_x_coordinates_are_non_negative() {
        let glyph = normalize_cell(&square_cell(37.0, 10.0, 25.0), 5.0, 105.0);
        for contour in &glyph.outlines {
            for p in &contour.points {
                assert!(p.x >= 0.0);
            }
        }
        assert_eq!(glyph.bounds.x, DEFAULT_SIDE_BEARING as i32);
    }
}
