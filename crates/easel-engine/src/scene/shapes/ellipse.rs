use glam::Mat3;

use crate::coords::Rect;
use crate::paint::Color;
use crate::scene::ClipArea;

use super::Placement;

/// Ellipse inscribed in a rectangle. Shares the fill group layout.
#[derive(Debug, Clone, PartialEq)]
pub struct EllipseCall {
    pub placement: Placement,
    pub color: Color,
    pub secondary: Color,
    pub checker_size: f32,
    pub clip: ClipArea,
}

impl EllipseCall {
    #[inline]
    pub fn new(bounds: Rect, color: Color) -> Self {
        Self {
            placement: Placement::new(bounds),
            color,
            secondary: Color::TRANSPARENT,
            checker_size: 0.0,
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
