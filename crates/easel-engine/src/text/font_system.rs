use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use thiserror::Error;

use crate::coords::Vec2;

/// Error returned by [`FontSystem::load_font`].
#[derive(Debug, Clone, Error)]
#[error("font load error: {0}")]
pub struct FontLoadError(pub String);

/// Opaque handle to a font loaded into a [`FontSystem`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FontId(pub(crate) usize);

/// One character of a laid-out string.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct PlacedChar {
    pub ch: char,
    /// Top-left of the glyph bitmap relative to the text origin, +Y down.
    pub position: Vec2,
    /// `false` for whitespace, control characters and empty bitmaps.
    pub visible: bool,
}

/// Owns a collection of loaded fonts.
///
/// Fonts are immutable after loading. Text calls refer to them by [`FontId`];
/// the glyph atlas rasterizes from here on demand.
#[derive(Default)]
pub struct FontSystem {
    fonts: Vec<fontdue::Font>,
}

impl FontSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and stores a TrueType or OpenType font from raw bytes.
    pub fn load_font(&mut self, bytes: &[u8]) -> Result<FontId, FontLoadError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontLoadError(e.to_string()))?;
        let id = FontId(self.fonts.len());
        self.fonts.push(font);
        log::debug!("loaded font {id:?} ({} glyphs)", self.fonts[id.0].glyph_count());
        Ok(id)
    }

    pub(crate) fn get(&self, id: FontId) -> Option<&fontdue::Font> {
        self.fonts.get(id.0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Lays `text` out at `px` and returns exactly one entry per `char`.
    ///
    /// Characters the layout skips (newlines, for one) come back invisible at
    /// the origin so instance counts stay aligned with `chars()`.
    pub(crate) fn place(&self, id: FontId, text: &str, px: f32) -> Option<Vec<PlacedChar>> {
        let font = self.get(id)?;

        let mut layout: Layout<()> = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings::default());
        layout.append(&[font], &TextStyle::new(text, px, 0));

        let mut glyphs = layout.glyphs().iter().peekable();
        let placed = text
            .char_indices()
            .map(|(offset, ch)| {
                while glyphs.peek().is_some_and(|g| g.byte_offset < offset) {
                    glyphs.next();
                }
                match glyphs.peek() {
                    Some(g) if g.byte_offset == offset => PlacedChar {
                        ch,
                        position: Vec2::new(g.x, g.y),
                        visible: g.char_data.rasterize() && g.width > 0 && g.height > 0,
                    },
                    _ => PlacedChar { ch, position: Vec2::ZERO, visible: false },
                }
            })
            .collect();
        Some(placed)
    }

    /// Bounding box of `text` at `size`, in logical pixels.
    ///
    /// Width follows the pen position after each glyph rather than the bitmap
    /// edge, so trailing spaces count.
    #[must_use]
    pub fn measure(&self, text: &str, id: FontId, size: f32) -> Vec2 {
        let Some(font) = self.get(id) else {
            return Vec2::new(0.0, size * 1.2);
        };

        let mut layout: Layout<()> = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings::default());
        layout.append(&[font], &TextStyle::new(text, size, 0));

        let glyphs = layout.glyphs();
        if glyphs.is_empty() {
            return Vec2::new(0.0, size * 1.2);
        }

        let w = glyphs
            .iter()
            .map(|g| {
                let m = font.metrics_indexed(g.key.glyph_index, size);
                (g.x - m.xmin as f32 + m.advance_width).max(0.0)
            })
            .fold(0.0f32, f32::max);
        let h = glyphs.iter().map(|g| g.y + g.height as f32).fold(size, f32::max);
        Vec2::new(w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_fail_to_load() {
        let mut fonts = FontSystem::new();
        let err = fonts.load_font(b"definitely not a font").unwrap_err();
        assert!(err.to_string().starts_with("font load error"));
        assert!(fonts.is_empty());
    }

    #[test]
    fn unknown_font_places_nothing() {
        let fonts = FontSystem::new();
        assert!(fonts.place(FontId(3), "abc", 32.0).is_none());
        assert_eq!(fonts.measure("abc", FontId(3), 10.0), Vec2::new(0.0, 12.0));
    }
}
