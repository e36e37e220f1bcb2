use glam::{Mat3, Vec2};

use crate::paint::Color;
use crate::scene::ClipArea;
use crate::text::{FontId, RASTER_PX};

/// A run of text. Expands to one GPU instance per character.
///
/// The font handle travels with the call; renderers never infer it from
/// previously drawn batches.
#[derive(Debug, Clone, PartialEq)]
pub struct TextCall {
    pub text: String,
    pub font: FontId,
    /// Font size in logical pixels.
    pub size: f32,
    pub color: Color,
    /// Top-left of the text block in local pixels.
    pub origin: Vec2,
    pub depth: f32,
    pub transform: Mat3,
    pub clip: ClipArea,
}

impl TextCall {
    pub fn new(text: impl Into<String>, font: FontId, size: f32, color: Color, origin: Vec2) -> Self {
        Self {
            text: text.into(),
            font,
            size,
            color,
            origin,
            depth: 0.0,
            transform: Mat3::IDENTITY,
            clip: ClipArea::UNBOUNDED,
        }
    }

    #[inline]
    pub fn clip(mut self, clip: impl Into<ClipArea>) -> Self {
        self.clip = clip.into();
        self
    }

    #[inline]
    pub fn depth(mut self, depth: f32) -> Self {
        self.depth = depth;
        self
    }

    #[inline]
    pub fn transform(mut self, transform: Mat3) -> Self {
        self.transform = transform;
        self
    }

    /// Number of glyph instances: one per `char`, whitespace included.
    #[inline]
    pub fn glyph_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Font size over the atlas raster size.
    #[inline]
    pub fn raster_scale(&self) -> f32 {
        self.size / RASTER_PX
    }

    /// The origin in raster pixels, added to every glyph position so the
    /// origin stays out of the group key.
    #[inline]
    pub fn raster_origin(&self) -> Vec2 {
        let scale = self.raster_scale();
        if scale > 0.0 { self.origin / scale } else { Vec2::ZERO }
    }
}
