//! Template geometry, blank-page rendering and the reference-page cache.

mod cache;
mod geometry;
mod render;

pub use cache::TemplateCache;
pub use geometry::{
    CELL_SIDE_INSET_PX, CellGuideOffsets, GridLayout, Margins, MarkerLayout, TemplateCoordinates,
    mm_to_pixels, template_coordinates,
};
pub use render::{TemplateFont, render_blank_page};
