use glam::{Mat3, Vec2};

/// Viewport size in logical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// View transform mapping logical pixels (top-left origin, +Y down) to NDC
    /// (+Y up).
    ///
    /// Degenerate sizes are clamped to one pixel.
    pub fn view_transform(self) -> Mat3 {
        let w = self.width.max(1.0);
        let h = self.height.max(1.0);
        Mat3::from_translation(Vec2::new(-1.0, 1.0)) * Mat3::from_scale(Vec2::new(2.0 / w, -2.0 / h))
    }
}
