use glam::Mat3;

use crate::coords::Rect;
use crate::paint::Color;
use crate::scene::ClipArea;

use super::Placement;

/// Rectangle outline stroked inward from the edge.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineCall {
    pub placement: Placement,
    pub color: Color,
    /// Stroke weight in local pixels.
    pub weight: f32,
    pub clip: ClipArea,
}

impl OutlineCall {
    #[inline]
    pub fn new(rect: Rect, color: Color, weight: f32) -> Self {
        Self {
            placement: Placement::new(rect),
            color,
            weight: weight.max(0.0),
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
        self.placement.depth = depth;
        self
    }

    #[inline]
    pub fn transform(mut self, transform: Mat3) -> Self {
        self.placement.transform = transform;
        self
    }
}
