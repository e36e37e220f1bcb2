use glam::Mat3;

use crate::coords::Rect;
use crate::paint::Color;
use crate::scene::ClipArea;

use super::Placement;

/// Solid (or checkerboard) rectangle fill.
#[derive(Debug, Clone, PartialEq)]
pub struct FillCall {
    pub placement: Placement,
    pub color: Color,
    /// Alternate cell color when `checker_size > 0`.
    pub secondary: Color,
    /// Checkerboard cell edge in local pixels; `0` disables the pattern.
    pub checker_size: f32,
    pub clip: ClipArea,
}

impl FillCall {
    #[inline]
    pub fn new(rect: Rect, color: Color) -> Self {
        Self {
            placement: Placement::new(rect),
            color,
            secondary: Color::TRANSPARENT,
            checker_size: 0.0,
            clip: ClipArea::UNBOUNDED,
        }
    }

    /// Transparency backdrop: alternating `color` / `secondary` cells.
    #[inline]
    pub fn checkerboard(mut self, secondary: Color, cell: f32) -> Self {
        self.secondary = secondary;
        self.checker_size = cell.max(0.0);
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
}
