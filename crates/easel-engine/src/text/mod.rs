//! Fonts and the shared glyph atlas.

mod atlas;
mod font_system;

pub use atlas::{ATLAS_SIZE, FONT_DATA_BYTES, GLYPH_SLOTS, GlyphAtlas, GlyphInstance, RASTER_PX};
pub use font_system::{FontId, FontLoadError, FontSystem};
