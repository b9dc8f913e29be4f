//! The staged page pipeline: geometry, reference render, fiducials,
//! rectification, differencing, morphology, then per-cell extraction,
//! vectorization and normalization.
//!
//! Single-threaded and synchronous per page. All buffers are owned by one
//! invocation; the only shared state is the reference-page cache. Glyph
//! records come out in row-major cell order.

use image::{GrayImage, RgbaImage};
use tracing::{debug, info, warn};

use crate::charset;
use crate::config::{ProcessingOptions, VectorMode};
use crate::error::PipelineError;
use crate::font::{GlyphRecord, fill_path, normalize_cell, stroke_path};
use crate::raster::{cleanup, crop_gray, filter_components, subtract_template};
use crate::register::{FiducialDetection, detect_fiducials, rectify};
use crate::template::{
    CELL_SIDE_INSET_PX, TemplateCache, TemplateFont, render_blank_page, template_coordinates,
};
use crate::vector::{
    CellGeometry, MonolineOptions, TraceOptions, monoline_from_mask, trace_cell_outlines,
};

/// Intermediate page images, kept for host-side diagnostics.
/// `thresholded` is the pre-morphology ink mask; `cleaned` is post-morphology.
#[derive(Clone, Debug, Default)]
pub struct DebugImages {
    pub warped: Option<RgbaImage>,
    pub subtracted: Option<GrayImage>,
    pub thresholded: Option<GrayImage>,
    pub cleaned: Option<GrayImage>,
}

/// The filtered mask of one cell together with its pre-morphology companion
/// crop, for host-side diagnostics only.
#[derive(Clone, Debug)]
pub struct CellDiagnostics {
    pub unicode: u32,
    pub row: u32,
    pub col: u32,
    /// Post-morphology, component-filtered writing-area mask.
    pub mask: GrayImage,
    /// The same rectangle cropped from the pre-morphology ink mask.
    pub raw: GrayImage,
}

/// Outcome of one page invocation.
///
/// Recoverable page failures come back as `success == false` with `error`
/// set and diagnostics populated as far as the pipeline got; a missing cell
/// is never an error and simply produces no record.
#[derive(Debug, Default)]
pub struct ProcessingResult {
    pub success: bool,
    pub glyphs: Vec<GlyphRecord>,
    pub markers: Option<FiducialDetection>,
    pub debug: DebugImages,
    /// Populated only when `collect_cell_diagnostics` is set.
    pub cells: Vec<CellDiagnostics>,
    pub error: Option<PipelineError>,
}

/// Host callbacks for one invocation. The progress callback receives a
/// stage label and 0..100; returning `false` requests a cooperative stop,
/// observed between cells.
#[derive(Default)]
pub struct PipelineHooks<'a> {
    pub on_progress: Option<&'a mut (dyn FnMut(&str, u32) -> bool + 'a)>,
}

impl<'a> PipelineHooks<'a> {
    fn report(&mut self, stage: &str, percent: u32) -> bool {
        match self.on_progress.as_mut() {
            Some(callback) => callback(stage, percent),
            None => true,
        }
    }
}

/// Run the full raster-to-vector pipeline over one scanned page.
///
/// `Err` is reserved for conditions that preclude processing entirely
/// (invalid config, unusable template font, polarity programming errors);
/// everything recoverable is reported through the result.
pub fn process_template_page(
    scan: &RgbaImage,
    opts: &ProcessingOptions,
    hooks: &mut PipelineHooks<'_>,
) -> Result<ProcessingResult, PipelineError> {
    opts.config.validate()?;
    let coords = template_coordinates(&opts.config);
    let mut result = ProcessingResult::default();

    let font = match &opts.template_font {
        Some(path) => Some(TemplateFont::load(path)?),
        None => None,
    };

    hooks.report("template", 0);
    let page_chars =
        charset::page_characters(opts.character_set, &opts.config, opts.page_number);
    let reference = TemplateCache::global().get_or_render(
        &opts.config,
        opts.page_number,
        opts.character_set,
        font.as_ref().map(TemplateFont::fingerprint),
        || render_blank_page(&opts.config, &coords, &page_chars, font.as_ref()),
    );

    hooks.report("fiducials", 10);
    let detection = detect_fiducials(scan);
    if !detection.success {
        warn!(found = ?detection.found(), "fiducial detection failed");
        result.error = Some(PipelineError::FiducialsMissing {
            found: detection.found(),
        });
        result.markers = Some(detection);
        return Ok(result);
    }

    hooks.report("rectify", 20);
    let warped = match rectify(scan, &detection, &coords) {
        Ok(warped) => warped,
        Err(error) => {
            result.error = Some(error);
            result.markers = Some(detection);
            return Ok(result);
        }
    };
    result.markers = Some(detection);

    hooks.report("subtract", 30);
    let (subtracted, thresholded) =
        subtract_template(&warped, &reference, opts.subtract_threshold);

    hooks.report("morphology", 40);
    let cleaned = cleanup(
        thresholded.clone(),
        opts.morphology_close_size,
        opts.morphology_open_size,
    )?;

    result.debug = DebugImages {
        warped: Some(warped),
        subtracted: Some(subtracted),
        thresholded: Some(thresholded),
        cleaned: Some(cleaned.clone()),
    };

    let grid = &coords.grid;
    let guides = &coords.cell_guides;
    let inset = CELL_SIDE_INSET_PX as f64;
    // Guide offsets translated into the writing-area frame.
    let cap_height_px = guides.cap_height - guides.label_top;
    let baseline_px = guides.baseline - guides.label_top;

    for (index, &character) in page_chars.iter().enumerate() {
        let percent = 50 + (index as u32 * 50) / page_chars.len().max(1) as u32;
        if !hooks.report("cells", percent) {
            info!(processed = result.glyphs.len(), "cancelled between cells");
            result.error = Some(PipelineError::Cancelled);
            return Ok(result);
        }

        let row = index as u32 / grid.cells_per_row;
        let col = index as u32 % grid.cells_per_row;
        let (cell_x, cell_y) = grid.cell_origin(row, col);

        // Writing area: the cell minus its label band and a side inset.
        let wa_x = (cell_x + inset).round() as u32;
        let wa_y = (cell_y + guides.label_top).round() as u32;
        let wa_w = (grid.cell_width - 2.0 * inset).max(1.0).round() as u32;
        let wa_h = (grid.cell_height - guides.label_top - inset).max(1.0).round() as u32;

        let crop = crop_gray(&cleaned, wa_x, wa_y, wa_w, wa_h);
        let mask = filter_components(&crop, opts.min_component_area, opts.reject_top_fraction);

        if opts.collect_cell_diagnostics {
            let raw = result
                .debug
                .thresholded
                .as_ref()
                .map(|pre| crop_gray(pre, wa_x, wa_y, wa_w, wa_h))
                .unwrap_or_default();
            result.cells.push(CellDiagnostics {
                unicode: character as u32,
                row,
                col,
                mask: mask.clone(),
                raw,
            });
        }

        if mask.pixels().all(|p| p.0[0] == 0) {
            debug!(%character, row, col, "cell empty, skipping");
            continue;
        }

        let geometry = match opts.vector_mode {
            VectorMode::Outline => {
                match trace_cell_outlines(&mask, &TraceOptions::default()) {
                    Some(cell) => CellGeometry::Outlines(cell),
                    None => {
                        debug!(%character, row, col, "no outlines traced, skipping");
                        continue;
                    }
                }
            }
            VectorMode::Monoline => {
                let strokes = monoline_from_mask(
                    &mask,
                    &MonolineOptions {
                        chaikin_iterations: opts.chaikin_iterations,
                        weld_radius: opts.weld_radius,
                        ..MonolineOptions::default()
                    },
                );
                if strokes.is_empty() {
                    debug!(%character, row, col, "no strokes extracted, skipping");
                    continue;
                }
                CellGeometry::Strokes(strokes)
            }
        };

        let normalized = normalize_cell(&geometry, cap_height_px, baseline_px);
        let svg_path = match &geometry {
            CellGeometry::Outlines(_) => {
                fill_path(&normalized.outlines, &normalized.holes, opts.emit_curves)
            }
            CellGeometry::Strokes(_) => stroke_path(&normalized.strokes),
        };
        if svg_path.is_empty() {
            continue;
        }

        debug!(
            %character,
            row,
            col,
            advance = normalized.advance_width,
            "glyph extracted"
        );
        result.glyphs.push(GlyphRecord {
            unicode: character as u32,
            svg_path,
            advance_width: normalized.advance_width,
            bounds: normalized.bounds,
        });
    }

    hooks.report("done", 100);
    info!(glyphs = result.glyphs.len(), "page processed");
    result.success = true;
    Ok(result)
}
