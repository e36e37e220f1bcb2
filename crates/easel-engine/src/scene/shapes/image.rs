use glam::Mat3;

use crate::coords::Rect;
use crate::paint::Color;
use crate::scene::ClipArea;
use crate::texture::TextureId;

use super::Placement;

/// Textured rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCall {
    pub placement: Placement,
    pub texture: TextureId,
    /// Multiplied with the sampled texel.
    pub tint: Color,
    pub clip: ClipArea,
    /// Sampler slot, assigned by the frame when the call is added.
    pub(crate) sampler: u32,
}

impl ImageCall {
    #[inline]
    pub fn new(rect: Rect, texture: TextureId) -> Self {
        Self {
            placement: Placement::new(rect),
            texture,
            tint: Color::WHITE,
            clip: ClipArea::UNBOUNDED,
            sampler: 0,
        }
    }

    #[inline]
    pub fn tint(mut self, tint: Color) -> Self {
        self.tint = tint;
        self
    }

    #[inline]
    pub fn clip(mut self, clip: impl Into<ClipArea>) -> Self {
        self.clip = clip.into();
        self
    }

    #[inline]
    pub fn depth(mut self, depth: f32) -> Self {
        self.placement.depth = depth;
        self
    }

    #[inline]
    pub fn transform(mut self, transform: Mat3) -> Self {
        self.placement.transform = transform;
        self
    }

    /// Sampler slot this call was bound to for the current frame.
    #[inline]
    pub fn sampler(&self) -> u32 {
        self.sampler
    }
}
