//! inktrace converts a scanned, handwritten character template into clean,
//! baseline-aligned vector glyph outlines in font units.
//!
//! The core is a staged pipeline: template geometry and reference render,
//! fiducial detection, perspective rectification, template differencing,
//! morphological cleanup, then per-cell component filtering, contour (or
//! skeleton) vectorization and baseline-anchored normalization. The entry
//! point is [`process_template_page`]; the output is a list of
//! [`GlyphRecord`]s ready for an external font assembler.

pub mod charset;
pub mod config;
pub mod error;
pub mod font;
pub mod pipeline;
pub mod raster;
pub mod register;
pub mod template;
pub mod vector;

pub use config::{CharacterSet, PageSize, ProcessingOptions, TemplateConfig, VectorMode};
pub use error::{Corner, PipelineError};
pub use font::{GlyphBounds, GlyphRecord};
pub use pipeline::{DebugImages, PipelineHooks, ProcessingResult, process_template_page};
pub use register::FiducialDetection;
pub use template::{TemplateCache, TemplateFont};
