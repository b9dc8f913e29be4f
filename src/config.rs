//! Template and processing configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::PipelineError;

/// Supported template page sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    Letter,
    A4,
}

impl PageSize {
    /// Physical page dimensions in millimeters (width, height).
    pub fn dimensions_mm(self) -> (f64, f64) {
        match self {
            PageSize::Letter => (215.9, 279.4),
            PageSize::A4 => (210.0, 297.0),
        }
    }
}

/// Which slice of the character repertoire the template covers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterSet {
    /// Letters, digits and basic punctuation: the mandatory glyphs.
    #[default]
    Required,
    /// Required plus extended Latin.
    All,
}

/// How cell ink is converted to vector geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorMode {
    /// Filled outlines with holes, the path used for font output.
    #[default]
    Outline,
    /// Skeleton centerlines: open strokes for plotter/stroke art.
    Monoline,
}

/// Guide line positions inside a cell, as fractions of the cell height.
///
/// These were hand-tuned against the printed template; they are configuration
/// rather than constants so alternative templates can move them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellGuides {
    #[serde(default = "default_label_top")]
    pub label_top: f64,
    #[serde(default = "default_cap_height")]
    pub cap_height: f64,
    #[serde(default = "default_x_height")]
    pub x_height: f64,
    #[serde(default = "default_baseline")]
    pub baseline: f64,
    #[serde(default = "default_descender")]
    pub descender: f64,
}

fn default_label_top() -> f64 {
    0.18
}
fn default_cap_height() -> f64 {
    0.25
}
fn default_x_height() -> f64 {
    0.45
}
fn default_baseline() -> f64 {
    0.75
}
fn default_descender() -> f64 {
    0.90
}

impl Default for CellGuides {
    fn default() -> Self {
        Self {
            label_top: default_label_top(),
            cap_height: default_cap_height(),
            x_height: default_x_height(),
            baseline: default_baseline(),
            descender: default_descender(),
        }
    }
}

/// Immutable description of the template grid on one page.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemplateConfig {
    #[serde(default = "default_page_size")]
    pub page_size: PageSize,
    #[serde(default = "default_cells_per_row")]
    pub cells_per_row: u32,
    #[serde(default = "default_rows_per_page")]
    pub rows_per_page: u32,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    #[serde(default)]
    pub guides: CellGuides,
}

fn default_page_size() -> PageSize {
    PageSize::Letter
}
fn default_cells_per_row() -> u32 {
    8
}
fn default_rows_per_page() -> u32 {
    10
}
fn default_dpi() -> u32 {
    150
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            cells_per_row: default_cells_per_row(),
            rows_per_page: default_rows_per_page(),
            dpi: default_dpi(),
            guides: CellGuides::default(),
        }
    }
}

impl TemplateConfig {
    /// Reject configurations that cannot describe a printable grid.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.cells_per_row == 0 {
            return Err(PipelineError::ConfigInvalid(
                "cells_per_row must be at least 1".to_string(),
            ));
        }
        if self.rows_per_page == 0 {
            return Err(PipelineError::ConfigInvalid(
                "rows_per_page must be at least 1".to_string(),
            ));
        }
        if self.dpi == 0 {
            return Err(PipelineError::ConfigInvalid(
                "dpi must be positive".to_string(),
            ));
        }
        let g = &self.guides;
        let ordered = g.label_top < g.cap_height
            && g.cap_height < g.x_height
            && g.x_height < g.baseline
            && g.baseline < g.descender;
        if !ordered || g.label_top <= 0.0 || g.descender >= 1.0 {
            return Err(PipelineError::ConfigInvalid(
                "cell guides must be ordered fractions inside (0, 1)".to_string(),
            ));
        }
        Ok(())
    }

    pub fn cells_per_page(&self) -> usize {
        self.cells_per_row as usize * self.rows_per_page as usize
    }
}

/// Options for one pipeline invocation, with the documented defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingOptions {
    pub config: TemplateConfig,
    pub character_set: CharacterSet,
    /// Which slice of the character list this page holds.
    pub page_number: usize,
    /// Binarization cutoff for the template difference, 0-255.
    pub subtract_threshold: u8,
    /// Closing kernel size in pixels; 0 disables.
    pub morphology_close_size: u32,
    /// Opening kernel size in pixels; 0 disables.
    pub morphology_open_size: u32,
    /// Connected-component area floor in pixels.
    pub min_component_area: u32,
    /// Components whose centroid falls in this top fraction of the writing
    /// area are treated as label residue and dropped.
    pub reject_top_fraction: f64,
    pub vector_mode: VectorMode,
    /// Emit quadratic curve segments for filled outlines instead of raw
    /// polylines.
    pub emit_curves: bool,
    /// Chaikin corner-cutting iterations on monoline strokes.
    pub chaikin_iterations: u32,
    /// Endpoint weld radius for monoline strokes, in cell pixels.
    pub weld_radius: f64,
    /// TTF used for template labels and guide glyphs. When unset, both the
    /// printable page and the reference image omit text identically.
    pub template_font: Option<PathBuf>,
    /// Keep per-cell mask/raw crops on the result for host diagnostics.
    pub collect_cell_diagnostics: bool,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            config: TemplateConfig::default(),
            character_set: CharacterSet::Required,
            page_number: 0,
            subtract_threshold: 30,
            morphology_close_size: 3,
            morphology_open_size: 2,
            min_component_area: 50,
            reject_top_fraction: 0.15,
            vector_mode: VectorMode::Outline,
            emit_curves: true,
            chaikin_iterations: 2,
            weld_radius: 3.0,
            template_font: None,
            collect_cell_diagnostics: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(TemplateConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_dimensions_rejected() {
        let config = TemplateConfig {
            cells_per_row: 0,
            ..TemplateConfig::default()
        };
        assert!(config.validate().is_err());

        let config = TemplateConfig {
            dpi: 0,
            ..TemplateConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unordered_guides_rejected() {
        let mut config = TemplateConfig::default();
        config.guides.baseline = 0.20; // above cap height
        assert!(config.validate().is_err());
    }

    #[test]
    fn options_roundtrip_through_json() {
        let opts = ProcessingOptions::default();
        let json = serde_json::to_string(&opts).unwrap();
        let back: ProcessingOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back.subtract_threshold, 30);
        assert_eq!(back.config.cells_per_row, 8);
    }

    #[test]
    fn partial_options_fill_defaults() {
        let opts: ProcessingOptions =
            serde_json::from_str(r#"{"subtract_threshold": 40}"#).unwrap();
        assert_eq!(opts.subtract_threshold, 40);
        assert_eq!(opts.morphology_close_size, 3);
        assert_eq!(opts.min_component_area, 50);
    }
}
