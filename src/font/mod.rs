//! Font-space normalization and the glyph output boundary.

mod glyph;
mod normalize;
mod path;

pub use glyph::{GlyphBounds, GlyphRecord};
pub use normalize::{
    DEFAULT_SIDE_BEARING, FONT_ASCENDER, FONT_CAP_HEIGHT, FONT_DESCENDER, NormalizedGlyph,
    UNITS_PER_EM, normalize_cell,
};
pub use path::{fill_path, stroke_path};
