//! The per-character record handed to the external font assembler.

use serde::Serialize;

/// Glyph extent in font units, y-up with the baseline at zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GlyphBounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// One finished glyph. The path string uses absolute commands from
/// {M, L, Q, C, Z} in font units; the assembler converts it to its own
/// primitives and owns all font-level tables.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlyphRecord {
    pub unicode: u32,
    pub svg_path: String,
    pub advance_width: i32,
    pub bounds: GlyphBounds,
}
