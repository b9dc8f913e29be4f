//! Blank template page rendering.
//!
//! The same function produces the printable page and the in-pipeline
//! reference image, so the two are identical by construction and the
//! differencer sees only user ink.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use std::hash::{Hash, Hasher};

use crate::config::TemplateConfig;
use crate::error::PipelineError;
use crate::template::TemplateCoordinates;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const MARKER_BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const BORDER_GRAY: Rgba<u8> = Rgba([210, 210, 210, 255]);
const GUIDE_LINE_GRAY: Rgba<u8> = Rgba([210, 210, 210, 255]);
const GUIDE_GLYPH_GRAY: Rgba<u8> = Rgba([222, 222, 222, 255]);
const LABEL_GRAY: Rgba<u8> = Rgba([90, 90, 90, 255]);

/// A font usable for template labels and guide glyphs, with a stable
/// fingerprint for cache keying.
pub struct TemplateFont {
    font: fontdue::Font,
    fingerprint: u64,
}

impl TemplateFont {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PipelineError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| PipelineError::FontLoad(e.to_string()))?;
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        bytes.hash(&mut hasher);
        Ok(Self {
            font,
            fingerprint: hasher.finish(),
        })
    }

    pub fn load(path: &std::path::Path) -> Result<Self, PipelineError> {
        let bytes = std::fs::read(path)
            .map_err(|e| PipelineError::FontLoad(format!("{}: {e}", path.display())))?;
        Self::from_bytes(&bytes)
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

/// Render the blank template page for one slice of characters.
///
/// Output is exactly `page_width x page_height`. White background, four
/// fiducials (filled inner square inside a stroked outer square), light-gray
/// cell borders, four guide lines per cell, and, when a font is given,
/// the label text and the large light-gray guide glyph.
pub fn render_blank_page(
    config: &TemplateConfig,
    coords: &TemplateCoordinates,
    page_chars: &[char],
    font: Option<&TemplateFont>,
) -> RgbaImage {
    let mut page = RgbaImage::from_pixel(coords.page_width, coords.page_height, WHITE);
    tracing::debug!(
        width = coords.page_width,
        height = coords.page_height,
        characters = page_chars.len(),
        with_font = font.is_some(),
        "rendering blank template page"
    );

    for corner in crate::error::Corner::ALL {
        draw_marker(&mut page, coords, corner);
    }

    let grid = &coords.grid;
    let guides = &coords.cell_guides;
    for row in 0..grid.rows_per_page {
        for col in 0..grid.cells_per_row {
            let (cx, cy) = grid.cell_origin(row, col);
            let cell_index = (row * grid.cells_per_row + col) as usize;
            let character = page_chars.get(cell_index).copied();

            draw_hollow_rect_mut(
                &mut page,
                Rect::at(cx.round() as i32, cy.round() as i32)
                    .of_size(grid.cell_width.round() as u32, grid.cell_height.round() as u32),
                BORDER_GRAY,
            );

            // Guide lines span the cell minus a small margin so neighbours
            // stay visually separate.
            let x0 = (cx + 2.0) as f32;
            let x1 = (cx + grid.cell_width - 2.0) as f32;
            for offset in [
                guides.cap_height,
                guides.x_height,
                guides.baseline,
                guides.descender,
            ] {
                let y = (cy + offset) as f32;
                draw_line_segment_mut(&mut page, (x0, y), (x1, y), GUIDE_LINE_GRAY);
            }

            if let (Some(font), Some(c)) = (font, character) {
                draw_label(&mut page, font, c, cx, cy, guides.label_top);
                draw_guide_glyph(&mut page, font, c, cx, cy, grid.cell_width, guides);
            }
        }
    }

    page
}

fn draw_marker(page: &mut RgbaImage, coords: &TemplateCoordinates, corner: crate::error::Corner) {
    let (cx, cy) = coords.markers.center(corner);
    let outer = coords.markers.outer_size;
    let inner = coords.markers.inner_size;

    let ox = (cx - outer as f64 / 2.0).round() as i32;
    let oy = (cy - outer as f64 / 2.0).round() as i32;
    // 2px stroke: two nested hollow rectangles.
    draw_hollow_rect_mut(page, Rect::at(ox, oy).of_size(outer, outer), MARKER_BLACK);
    if outer > 2 {
        draw_hollow_rect_mut(
            page,
            Rect::at(ox + 1, oy + 1).of_size(outer - 2, outer - 2),
            MARKER_BLACK,
        );
    }

    let ix = (cx - inner as f64 / 2.0).round() as i32;
    let iy = (cy - inner as f64 / 2.0).round() as i32;
    draw_filled_rect_mut(page, Rect::at(ix, iy).of_size(inner, inner), MARKER_BLACK);
}

/// Blit a fontdue coverage bitmap, alpha-blending `color` over the page.
fn blit_glyph(
    page: &mut RgbaImage,
    coverage: &[u8],
    metrics: &fontdue::Metrics,
    pen_x: f64,
    baseline_y: f64,
    color: Rgba<u8>,
) {
    // fontdue metrics are y-up; in the y-down page the glyph top sits at
    // baseline - height - ymin.
    let x0 = pen_x.round() as i64 + metrics.xmin as i64;
    let y0 = baseline_y.round() as i64 - metrics.height as i64 - metrics.ymin as i64;

    for row in 0..metrics.height {
        for col in 0..metrics.width {
            let alpha = coverage[row * metrics.width + col] as f64 / 255.0;
            if alpha <= 0.0 {
                continue;
            }
            let px = x0 + col as i64;
            let py = y0 + row as i64;
            if px < 0 || py < 0 || px >= page.width() as i64 || py >= page.height() as i64 {
                continue;
            }
            let dst = page.get_pixel_mut(px as u32, py as u32);
            for ch in 0..3 {
                let blended =
                    dst.0[ch] as f64 * (1.0 - alpha) + color.0[ch] as f64 * alpha;
                dst.0[ch] = blended.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

fn draw_label(
    page: &mut RgbaImage,
    font: &TemplateFont,
    character: char,
    cell_x: f64,
    cell_y: f64,
    label_band: f64,
) {
    let size = (label_band * 0.55).max(6.0) as f32;
    let baseline = cell_y + label_band * 0.78;
    let mut pen_x = cell_x + 6.0;

    let label = format!("{character} U+{:04X}", character as u32);
    for c in label.chars() {
        let (metrics, coverage) = font.font.rasterize(c, size);
        blit_glyph(page, &coverage, &metrics, pen_x, baseline, LABEL_GRAY);
        pen_x += metrics.advance_width as f64;
    }
}

fn draw_guide_glyph(
    page: &mut RgbaImage,
    font: &TemplateFont,
    character: char,
    cell_x: f64,
    cell_y: f64,
    cell_width: f64,
    guides: &crate::template::CellGuideOffsets,
) {
    // Scale the em so a typical cap height fills cap-to-baseline.
    let size = ((guides.baseline - guides.cap_height) * 1.35) as f32;
    let (metrics, coverage) = font.font.rasterize(character, size);
    let pen_x = cell_x + (cell_width - metrics.advance_width as f64) / 2.0;
    let baseline = cell_y + guides.baseline;
    blit_glyph(page, &coverage, &metrics, pen_x, baseline, GUIDE_GLYPH_GRAY);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::template_coordinates;

    #[test]
    fn page_has_exact_dimensions() {
        let config = TemplateConfig::default();
        let coords = template_coordinates(&config);
        let page = render_blank_page(&config, &coords, &['A'], None);
        assert_eq!(page.dimensions(), (coords.page_width, coords.page_height));
    }

    #[test]
    fn render_is_deterministic() {
        let config = TemplateConfig::default();
        let coords = template_coordinates(&config);
        let a = render_blank_page(&config, &coords, &['A', 'B'], None);
        let b = render_blank_page(&config, &coords, &['A', 'B'], None);
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn markers_are_black_at_their_centers() {
        let config = TemplateConfig::default();
        let coords = template_coordinates(&config);
        let page = render_blank_page(&config, &coords, &[], None);
        for corner in crate::error::Corner::ALL {
            let (cx, cy) = coords.markers.center(corner);
            let pixel = page.get_pixel(cx.round() as u32, cy.round() as u32);
            assert_eq!(pixel.0, [0, 0, 0, 255], "{corner} inner square filled");
        }
    }

    #[test]
    fn page_is_white_between_cells_and_markers() {
        let config = TemplateConfig::default();
        let coords = template_coordinates(&config);
        let page = render_blank_page(&config, &coords, &[], None);
        // A point in the top margin strip, clear of the markers.
        let x = coords.page_width / 2;
        let y = coords.margins.top / 2;
        assert_eq!(page.get_pixel(x, y).0, [255, 255, 255, 255]);
    }

    #[test]
    fn guide_lines_appear_inside_cells() {
        let config = TemplateConfig::default();
        let coords = template_coordinates(&config);
        let page = render_blank_page(&config, &coords, &[], None);
        let (cx, cy) = coords.grid.cell_origin(0, 0);
        let x = (cx + coords.grid.cell_width / 2.0) as u32;
        let y = (cy + coords.cell_guides.baseline) as u32;
        let pixel = page.get_pixel(x, y);
        assert!(pixel.0[0] < 255, "baseline guide should be drawn");
    }
}
