//! Fiducial marker detection.
//!
//! Finds the four corner squares in a scan by global binarization, external
//! contour extraction, and shape filtering, then picks the best candidate
//! per corner quadrant. The binarized image is kept on the result so a host
//! can show the user what the detector actually saw.

use image::{GrayImage, RgbaImage};
use imageproc::contours::{BorderType, find_contours};
use imageproc::geometry::convex_hull;
use imageproc::point::Point as IPoint;

use crate::error::Corner;
use crate::raster::{binarize, otsu_threshold, to_gray};
use crate::vector::{Point, signed_area};

/// Candidate area bounds relative to the page area.
const MIN_AREA_FRACTION: f64 = 0.0001;
const MAX_AREA_FRACTION: f64 = 0.01;
/// Acceptable bbox aspect ratio for a square-ish marker.
const MIN_ASPECT: f64 = 0.5;
const MAX_ASPECT: f64 = 2.0;
/// Minimum filled-ness (contour area / convex hull area).
const MIN_SOLIDITY: f64 = 0.7;
/// Each corner search region is the outer 20% of the page per axis.
const QUADRANT_FRACTION: f64 = 0.2;

/// One detected fiducial.
#[derive(Clone, Debug)]
pub struct Marker {
    pub center: (f64, f64),
    pub area: f64,
    /// Axis-aligned bbox corners (TL, TR, BR, BL) in scan pixels.
    pub bbox: [(f64, f64); 4],
}

/// Result of scanning a page for its four corner markers.
#[derive(Clone, Debug)]
pub struct FiducialDetection {
    pub top_left: Option<Marker>,
    pub top_right: Option<Marker>,
    pub bottom_left: Option<Marker>,
    pub bottom_right: Option<Marker>,
    pub success: bool,
    /// The binarized scan the contour pass ran on, for diagnostics.
    pub binarized: GrayImage,
}

impl FiducialDetection {
    pub fn marker(&self, corner: Corner) -> Option<&Marker> {
        match corner {
            Corner::TopLeft => self.top_left.as_ref(),
            Corner::TopRight => self.top_right.as_ref(),
            Corner::BottomLeft => self.bottom_left.as_ref(),
            Corner::BottomRight => self.bottom_right.as_ref(),
        }
    }

    /// Corners that produced a marker.
    pub fn found(&self) -> Vec<Corner> {
        Corner::ALL
            .into_iter()
            .filter(|&c| self.marker(c).is_some())
            .collect()
    }
}

#[derive(Clone, Debug)]
struct Candidate {
    center: (f64, f64),
    area: f64,
    bbox: [(f64, f64); 4],
}

/// Locate the four corner markers in an RGBA scan.
pub fn detect_fiducials(scan: &RgbaImage) -> FiducialDetection {
    let gray = to_gray(scan);
    let threshold = otsu_threshold(&gray);
    // Inverted polarity: dark ink becomes foreground.
    let binarized = binarize(&gray, threshold, true);

    let width = scan.width() as f64;
    let height = scan.height() as f64;
    let page_area = width * height;

    let contours = find_contours::<i32>(&binarized);

    // Enclosed-hole area per outer contour, so hollow shapes (the stroked
    // outer squares, cell borders) are judged by their actual ink coverage.
    let mut hole_area = vec![0.0f64; contours.len()];
    for contour in &contours {
        if contour.border_type == BorderType::Hole
            && let Some(parent) = contour.parent
        {
            let points: Vec<Point> = contour
                .points
                .iter()
                .map(|p| Point::new(p.x as f64, p.y as f64))
                .collect();
            hole_area[parent] += signed_area(&points).abs();
        }
    }

    let mut candidates = Vec::new();
    for (index, contour) in contours.iter().enumerate() {
        if contour.border_type != BorderType::Outer || contour.points.len() < 3 {
            continue;
        }
        let points: Vec<Point> = contour
            .points
            .iter()
            .map(|p| Point::new(p.x as f64, p.y as f64))
            .collect();

        let area = (signed_area(&points).abs() - hole_area[index]).max(0.0);
        if area < MIN_AREA_FRACTION * page_area || area > MAX_AREA_FRACTION * page_area {
            continue;
        }

        let bounds = crate::vector::Bounds::from_points(&points);
        let aspect = (bounds.width + 1.0) / (bounds.height + 1.0);
        if !(MIN_ASPECT..=MAX_ASPECT).contains(&aspect) {
            continue;
        }

        let hull: Vec<IPoint<i32>> = convex_hull(contour.points.clone());
        let hull_points: Vec<Point> = hull
            .iter()
            .map(|p| Point::new(p.x as f64, p.y as f64))
            .collect();
        let hull_area = signed_area(&hull_points).abs();
        if hull_area <= 0.0 || area / hull_area < MIN_SOLIDITY {
            continue;
        }

        let x1 = bounds.x + bounds.width;
        let y1 = bounds.y + bounds.height;
        candidates.push(Candidate {
            center: (bounds.x + bounds.width / 2.0, bounds.y + bounds.height / 2.0),
            area,
            bbox: [
                (bounds.x, bounds.y),
                (x1, bounds.y),
                (x1, y1),
                (bounds.x, y1),
            ],
        });
    }

    tracing::debug!(candidates = candidates.len(), threshold, "fiducial candidates");

    let pick = |corner: (f64, f64), region_x: (f64, f64), region_y: (f64, f64)| {
        candidates
            .iter()
            .filter(|c| {
                c.center.0 >= region_x.0
                    && c.center.0 <= region_x.1
                    && c.center.1 >= region_y.0
                    && c.center.1 <= region_y.1
            })
            .min_by(|a, b| {
                let da = dist_sq(a.center, corner);
                let db = dist_sq(b.center, corner);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|c| Marker {
                center: c.center,
                area: c.area,
                bbox: c.bbox,
            })
    };

    let qx = QUADRANT_FRACTION * width;
    let qy = QUADRANT_FRACTION * height;
    let top_left = pick((0.0, 0.0), (0.0, qx), (0.0, qy));
    let top_right = pick((width, 0.0), (width - qx, width), (0.0, qy));
    let bottom_left = pick((0.0, height), (0.0, qx), (height - qy, height));
    let bottom_right = pick((width, height), (width - qx, width), (height - qy, height));

    let success = top_left.is_some()
        && top_right.is_some()
        && bottom_left.is_some()
        && bottom_right.is_some();

    FiducialDetection {
        top_left,
        top_right,
        bottom_left,
        bottom_right,
        success,
        binarized,
    }
}

fn dist_sq(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    dx * dx + dy * dy
}
