//! Template geometry: a pure function from config to page coordinates.
//!
//! Everything downstream (rendering, fiducial matching, cell cropping,
//! normalization) reads positions from the coordinates computed here, so
//! print-time and scan-time geometry can never drift apart.

use crate::config::TemplateConfig;
use crate::error::Corner;

/// Page margin on all sides, millimeters.
const PAGE_MARGIN_MM: f64 = 15.0;
/// Outer (stroked) fiducial square side, millimeters.
const MARKER_SIZE_MM: f64 = 6.0;
/// Inner (filled) fiducial square side, millimeters.
const MARKER_INNER_MM: f64 = 3.0;
/// Gap between the content rectangle and the fiducial square, millimeters.
const MARKER_OFFSET_MM: f64 = 2.0;

/// Horizontal and bottom inset of the writing area inside a cell, pixels.
pub const CELL_SIDE_INSET_PX: u32 = 4;

/// `round(mm * dpi / 25.4)`.
pub fn mm_to_pixels(mm: f64, dpi: u32) -> u32 {
    (mm * dpi as f64 / 25.4).round() as u32
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Margins {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

/// Fiducial centers and square sizes, pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerLayout {
    pub top_left: (f64, f64),
    pub top_right: (f64, f64),
    pub bottom_left: (f64, f64),
    pub bottom_right: (f64, f64),
    /// Stroked outer square side.
    pub outer_size: u32,
    /// Filled inner square side.
    pub inner_size: u32,
}

impl MarkerLayout {
    pub fn center(&self, corner: Corner) -> (f64, f64) {
        match corner {
            Corner::TopLeft => self.top_left,
            Corner::TopRight => self.top_right,
            Corner::BottomLeft => self.bottom_left,
            Corner::BottomRight => self.bottom_right,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLayout {
    pub cells_per_row: u32,
    pub rows_per_page: u32,
    pub cell_width: f64,
    pub cell_height: f64,
    pub start_x: f64,
    pub start_y: f64,
}

impl GridLayout {
    /// Top-left origin of a cell, page pixels.
    pub fn cell_origin(&self, row: u32, col: u32) -> (f64, f64) {
        (
            self.start_x + col as f64 * self.cell_width,
            self.start_y + row as f64 * self.cell_height,
        )
    }
}

/// Guide line y-offsets within a cell, pixels from the cell top.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellGuideOffsets {
    pub label_top: f64,
    pub cap_height: f64,
    pub x_height: f64,
    pub baseline: f64,
    pub descender: f64,
}

/// Everything derived from a `TemplateConfig`, in page pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TemplateCoordinates {
    pub page_width: u32,
    pub page_height: u32,
    pub margins: Margins,
    pub markers: MarkerLayout,
    pub grid: GridLayout,
    pub cell_guides: CellGuideOffsets,
}

/// Derive page coordinates from a config. Deterministic and self-consistent:
/// `grid.start_x == margins.left` and the cells exactly tile the content
/// rectangle up to floating-point division.
pub fn template_coordinates(config: &TemplateConfig) -> TemplateCoordinates {
    let (width_mm, height_mm) = config.page_size.dimensions_mm();
    let dpi = config.dpi;

    let page_width = mm_to_pixels(width_mm, dpi);
    let page_height = mm_to_pixels(height_mm, dpi);
    let margin = mm_to_pixels(PAGE_MARGIN_MM, dpi);
    let margins = Margins {
        top: margin,
        bottom: margin,
        left: margin,
        right: margin,
    };

    let outer_size = mm_to_pixels(MARKER_SIZE_MM, dpi);
    let inner_size = mm_to_pixels(MARKER_INNER_MM, dpi);
    let offset = mm_to_pixels(MARKER_OFFSET_MM, dpi) as f64 + outer_size as f64 / 2.0;

    // Marker centers sit diagonally outside the content rectangle, inside
    // the printable margin.
    let left = margins.left as f64;
    let right = (page_width - margins.right) as f64;
    let top = margins.top as f64;
    let bottom = (page_height - margins.bottom) as f64;
    let markers = MarkerLayout {
        top_left: (left - offset, top - offset),
        top_right: (right + offset, top - offset),
        bottom_left: (left - offset, bottom + offset),
        bottom_right: (right + offset, bottom + offset),
        outer_size,
        inner_size,
    };

    let content_width = (page_width - margins.left - margins.right) as f64;
    let content_height = (page_height - margins.top - margins.bottom) as f64;
    let grid = GridLayout {
        cells_per_row: config.cells_per_row,
        rows_per_page: config.rows_per_page,
        cell_width: content_width / config.cells_per_row as f64,
        cell_height: content_height / config.rows_per_page as f64,
        start_x: left,
        start_y: top,
    };

    let g = &config.guides;
    let cell_guides = CellGuideOffsets {
        label_top: g.label_top * grid.cell_height,
        cap_height: g.cap_height * grid.cell_height,
        x_height: g.x_height * grid.cell_height,
        baseline: g.baseline * grid.cell_height,
        descender: g.descender * grid.cell_height,
    };

    TemplateCoordinates {
        page_width,
        page_height,
        margins,
        markers,
        grid,
        cell_guides,
    }
}
